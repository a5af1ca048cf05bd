// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! The per-package control-information database under `/var/lib/dpkg/info`:
//! one `name.list`, `name.md5sums`, `name.conffiles`, … per package, or
//! `name:arch.list` once [InfoDb::upgrade_to_multiarch] has run.
//!
//! The directory carries its own one-byte `format` file: `0` (absent file,
//! pre-multiarch), `1` (mid-upgrade: both old and new names may exist), or
//! `2` (fully converted, `Multi-Arch: same` packages are always arch-
//! qualified). [InfoDb::open] reads it; nothing triggers the upgrade
//! automatically, since this crate has no read/write mode distinction to
//! gate it the way `modstatdb_rw` does.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::arch::Arch;
use crate::cleanup::{CleanupStack, Trigger};
use crate::db::{Database, MultiArch, Package, Status};
use crate::interner::Id;

/// Everything that can go wrong reading or writing the info database.
#[derive(Debug, thiserror::Error)]
pub enum InfoDbError {
    /// An I/O error, with the path it happened on.
    #[error("error accessing {path}: {source}")]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// `format` exists but doesn't hold a plain integer.
    #[error("{0} is corrupted, it should contain the database format version (an integer)")]
    CorruptFormat(PathBuf),
}

fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> InfoDbError {
    let path = path.into();
    move |source| InfoDbError::Io { path, source }
}

/// Selects which package's files [InfoDb::foreach] (or [InfoDb::has_file])
/// should look at -- the same `(name, arch)` shape [Database::find_pkg]
/// resolves against, since that's what names an info-file stem.
#[derive(Clone, Copy, Debug)]
pub struct InfoDbFilter<'a> {
    /// The package set's name.
    pub name: &'a str,
    /// Its architecture, when the instance is `Multi-Arch: same`.
    pub arch: Option<&'a Arch>,
    /// Whether this instance is `Multi-Arch: same` -- only then does the
    /// stem get arch-qualified, and only once [InfoDb::format] is above 0.
    pub multiarch_same: bool,
}

impl<'a> InfoDbFilter<'a> {
    fn stem(&self, format: u32) -> String {
        match (self.arch, self.multiarch_same && format > 0) {
            (Some(arch), true) => format!("{}:{}", self.name, arch.name()),
            _ => self.name.to_owned(),
        }
    }
}

/// A handle onto one package's (or, un-filtered, every package's) control
/// information files.
pub struct InfoDb {
    admindir: PathBuf,
    format: u32,
}

impl InfoDb {
    /// Open the info database rooted at `admindir` (typically
    /// `/var/lib/dpkg/info`), reading its `format` marker. A missing marker
    /// means format `0`.
    pub fn open(admindir: impl Into<PathBuf>) -> Result<Self, InfoDbError> {
        let admindir = admindir.into();
        let format_path = admindir.join("format");

        let format = match std::fs::read_to_string(&format_path) {
            Ok(contents) => {
                let trimmed = contents.trim_end_matches('\n').trim();
                trimmed
                    .parse()
                    .map_err(|_| InfoDbError::CorruptFormat(format_path.clone()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(io_err(format_path)(e)),
        };

        Ok(InfoDb { admindir, format })
    }

    /// The database format version: `0`, `1`, or `2`. See the module
    /// documentation.
    pub fn format(&self) -> u32 {
        self.format
    }

    fn format_path(&self) -> PathBuf {
        self.admindir.join("format")
    }

    fn record_format(&mut self, version: u32) -> Result<(), InfoDbError> {
        let path = self.format_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(io_err(&path))?;
        file.write_all(version.to_string().as_bytes()).map_err(io_err(&path))?;
        file.sync_all().map_err(io_err(&path))?;
        self.format = version;
        Ok(())
    }

    fn file_path(&self, filter: InfoDbFilter<'_>, kind: &str) -> PathBuf {
        self.admindir.join(format!("{}.{kind}", filter.stem(self.format)))
    }

    /// Does `filter`'s package have a `.{kind}` info file (e.g. `"list"`,
    /// `"md5sums"`, `"conffiles"`)?
    pub fn has_file(&self, filter: InfoDbFilter<'_>, kind: &str) -> Result<bool, InfoDbError> {
        let path = self.file_path(filter, kind);
        match std::fs::symlink_metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(path)(e)),
        }
    }

    /// Visit every info file under the admin directory, or (if `filter` is
    /// given) only those belonging to one package. `visit` receives the
    /// file's full path and its extension (`"list"`, `"md5sums"`, …), and
    /// may fail; the first failure stops the walk.
    pub fn foreach<F>(&self, filter: Option<InfoDbFilter<'_>>, mut visit: F) -> Result<(), InfoDbError>
    where
        F: FnMut(&Path, &str) -> Result<(), InfoDbError>,
    {
        let want_stem = filter.map(|f| f.stem(self.format));

        let entries = std::fs::read_dir(&self.admindir).map_err(io_err(&self.admindir))?;
        for entry in entries {
            let entry = entry.map_err(io_err(&self.admindir))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };

            if file_name.starts_with('.') {
                continue;
            }
            let Some(dot) = file_name.rfind('.') else { continue };
            let (stem, kind) = (&file_name[..dot], &file_name[dot + 1..]);

            if let Some(want_stem) = &want_stem {
                if stem != want_stem {
                    continue;
                }
            }

            visit(&entry.path(), kind)?;
        }
        Ok(())
    }

    /// Once-off migration from format `0`/`1` to `2`: every info file
    /// belonging to a `Multi-Arch: same` package is hard-linked under its
    /// arch-qualified name, the format marker is bumped to `1`, the old
    /// names are unlinked, and the marker is bumped to `2`. If the process
    /// is interrupted before the final bump, the next call re-derives the
    /// same link plan and finishes the job; if it's interrupted and this
    /// method is instead torn down via an early error return, the
    /// [CleanupStack] guard reverses whatever linking had happened and
    /// resets the marker back to `0`.
    ///
    /// A no-op once [InfoDb::format] is already `2`.
    pub fn upgrade_to_multiarch(&mut self, db: &mut Database) -> Result<(), InfoDbError> {
        if self.format >= 2 {
            return Ok(());
        }

        let mut links: Vec<(PathBuf, PathBuf)> = Vec::new();
        self.foreach(None, |path, kind| {
            if let Some(pair) = self.plan_multiarch_link(db, path, kind)? {
                links.push(pair);
            }
            Ok(())
        })?;

        let mut cleanup = CleanupStack::new();
        let undo_links = links.clone();
        let format_path = self.format_path();
        cleanup.push(Trigger::OnAbort, move || {
            for (old, new) in undo_links.iter().rev() {
                if !old.exists() {
                    let _ = std::fs::hard_link(new, old);
                }
                let _ = std::fs::remove_file(new);
            }
            let _ = std::fs::write(&format_path, b"0");
        });

        self.record_format(1)?;
        for (old, _new) in &links {
            std::fs::remove_file(old).map_err(io_err(old.clone()))?;
        }
        self.record_format(2)?;
        cleanup.discard();

        Ok(())
    }

    /// If `path` names a not-yet-converted info file belonging to a
    /// `Multi-Arch: same` package, hard-link it under its arch-qualified
    /// name (if that name doesn't already exist) and return the
    /// `(old, new)` pair to record. Returns `None` for anything else:
    /// already-converted files, and files with no installed owner.
    fn plan_multiarch_link(
        &self,
        db: &mut Database,
        path: &Path,
        kind: &str,
    ) -> Result<Option<(PathBuf, PathBuf)>, InfoDbError> {
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        let stem_len = file_name.len().saturating_sub(kind.len() + 1);
        let stem = &file_name[..stem_len];

        if stem.contains(':') {
            return Ok(None);
        }

        let set_id = db.find_set(stem);
        let mut cursor = Some(db.set(set_id).head());
        let mut found: Option<Id<Package>> = None;
        while let Some(id) = cursor {
            let pkg = db.package(id);
            if pkg.status != Status::NotInstalled {
                found = Some(id);
                break;
            }
            cursor = pkg.arch_next();
        }

        let Some(pkg_id) = found else {
            log::warn!("info file {} not associated to any package", path.display());
            return Ok(None);
        };

        let pkg = db.package(pkg_id);
        if pkg.installed.multiarch != MultiArch::Same {
            return Ok(None);
        }
        let arch_name = pkg.installed.arch.as_ref().map(Arch::name).unwrap_or_default();

        let new_path = self.admindir.join(format!("{stem}:{arch_name}.{kind}"));
        if !new_path.exists() {
            std::fs::hard_link(path, &new_path).map_err(io_err(&new_path))?;
        }
        Ok(Some((path.to_owned(), new_path)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::BinMeta;

    fn temp_admindir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn open_defaults_to_format_zero_when_marker_absent() {
        let dir = temp_admindir();
        let db = InfoDb::open(dir.path()).unwrap();
        assert_eq!(db.format(), 0);
    }

    #[test]
    fn open_reads_existing_marker() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("format"), "2").unwrap();
        let db = InfoDb::open(dir.path()).unwrap();
        assert_eq!(db.format(), 2);
    }

    #[test]
    fn open_rejects_corrupt_marker() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("format"), "not-a-number").unwrap();
        assert!(matches!(InfoDb::open(dir.path()), Err(InfoDbError::CorruptFormat(_))));
    }

    #[test]
    fn has_file_checks_unqualified_name_below_format_one() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("hello.list"), "").unwrap();
        let info = InfoDb::open(dir.path()).unwrap();
        let filter = InfoDbFilter { name: "hello", arch: None, multiarch_same: false };
        assert!(info.has_file(filter, "list").unwrap());
        assert!(!info.has_file(filter, "md5sums").unwrap());
    }

    #[test]
    fn foreach_filters_by_package_when_given() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("hello.list"), "").unwrap();
        std::fs::write(dir.path().join("world.list"), "").unwrap();
        let info = InfoDb::open(dir.path()).unwrap();

        let mut seen = Vec::new();
        let filter = InfoDbFilter { name: "hello", arch: None, multiarch_same: false };
        info.foreach(Some(filter), |path, kind| {
            seen.push((path.to_owned(), kind.to_owned()));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.file_name().unwrap(), "hello.list");
    }

    #[test]
    fn upgrade_links_multiarch_same_packages_and_bumps_format() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("hello.list"), "x").unwrap();

        let mut db = Database::new("amd64");
        let native = db.archs.native();
        let pkg_id = db.find_pkg("hello", Some(&native));
        {
            let pkg = db.package_mut(pkg_id);
            pkg.status = Status::Installed;
            pkg.installed = BinMeta { arch: Some(native.clone()), multiarch: MultiArch::Same, ..BinMeta::default() };
        }

        let mut info = InfoDb::open(dir.path()).unwrap();
        info.upgrade_to_multiarch(&mut db).unwrap();

        assert_eq!(info.format(), 2);
        assert!(dir.path().join("hello:amd64.list").exists());
        assert!(!dir.path().join("hello.list").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("format")).unwrap(), "2");
    }

    #[test]
    fn upgrade_is_a_no_op_at_format_two() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("format"), "2").unwrap();
        std::fs::write(dir.path().join("hello.list"), "x").unwrap();

        let mut db = Database::new("amd64");
        let mut info = InfoDb::open(dir.path()).unwrap();
        info.upgrade_to_multiarch(&mut db).unwrap();

        assert!(dir.path().join("hello.list").exists());
    }

    #[test]
    fn cleanup_reverses_a_failed_upgrade() {
        let dir = temp_admindir();
        std::fs::write(dir.path().join("hello.list"), "x").unwrap();

        let mut db = Database::new("amd64");
        let native = db.archs.native();
        let pkg_id = db.find_pkg("hello", Some(&native));
        {
            let pkg = db.package_mut(pkg_id);
            pkg.status = Status::Installed;
            pkg.installed = BinMeta { arch: Some(native.clone()), multiarch: MultiArch::Same, ..BinMeta::default() };
        }

        let mut cleanup = CleanupStack::new();
        let old = dir.path().join("hello.list");
        let new = dir.path().join("hello:amd64.list");
        std::fs::hard_link(&old, &new).unwrap();
        let format_path = dir.path().join("format");
        std::fs::write(&format_path, "1").unwrap();
        {
            let old = old.clone();
            let new = new.clone();
            let format_path = format_path.clone();
            cleanup.push(Trigger::OnAbort, move || {
                if !old.exists() {
                    let _ = std::fs::hard_link(&new, &old);
                }
                let _ = std::fs::remove_file(&new);
                let _ = std::fs::write(&format_path, b"0");
            });
        }
        drop(cleanup);

        assert!(old.exists());
        assert!(!new.exists());
        assert_eq!(std::fs::read_to_string(&format_path).unwrap(), "0");
    }
}

// vim: foldmethod=marker
