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

//! The per-entry decision tree, grounded on `dpkg`'s `tarobject`: for one
//! [TarEntry], decide whether it may be placed at all, stage it next to its
//! final name, and leave enough [FileFlags] behind that a later
//! [UnpackEngine::commit] pass can rename everything into place and fsync
//! the directories that changed (`tar_deferred_extract` /
//! `tar_writeback_barrier`).
//!
//! One [UnpackEngine] handles one package's archive. Nothing here executes a
//! maintainer script or mutates [crate::db::Database] beyond the
//! [crate::db::ClientData] scratch fields it's handed -- the orchestrator
//! above this crate owns that.

use std::io::Read;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::db::{Database, DepKind, Package, PackageSet, Status};
use crate::depeval::{arch_satisfied, version_satisfied};
use crate::filenames::{FileFlags, FileNameNode, FileNameTable};
use crate::interner::Id;

use super::entry::{EntryKind, TarEntry};
use super::error::{io_err, UnpackError};
use super::fs::{Filesystem, ProbeKind};
use super::force::ForceFlags;

/// The `.dpkg-new` suffix every staged object is written under before the
/// commit pass renames it to its final name.
const NEW_SUFFIX: &str = ".dpkg-new";

fn staged_path(real: &Path) -> PathBuf {
    let mut staged = real.as_os_str().to_owned();
    staged.push(NEW_SUFFIX);
    PathBuf::from(staged)
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// One package's archive-unpack operation.
pub struct UnpackEngine<'f, F: Filesystem> {
    fs: &'f F,
    instdir: PathBuf,
    force: ForceFlags,
}

impl<'f, F: Filesystem> UnpackEngine<'f, F> {
    /// Begin unpacking into `instdir` (typically `/`), downgrading whatever
    /// `force` names to a warning instead of a fatal [UnpackError].
    pub fn new(fs: &'f F, instdir: impl Into<PathBuf>, force: ForceFlags) -> Self {
        UnpackEngine { fs, instdir: instdir.into(), force }
    }

    fn real_path(&self, name: &str) -> PathBuf {
        self.instdir.join(name)
    }

    /// `does_replace`: does `installing`'s *available* metadata carry a
    /// `Replaces` clause that covers `owner`'s currently-installed version?
    /// An unversioned `Replaces` always covers; a versioned one is checked
    /// with the same relation [crate::depeval] uses for `Depends`.
    pub fn does_replace(&self, db: &Database, installing: Id<PackageSet>, owner: Id<Package>) -> bool {
        let installing_head = db.package(db.set(installing).head());
        let owner_pkg = db.package(owner);

        installing_head.available.dependencies.iter().any(|dep_id| {
            let dep = db.dependency(*dep_id);
            if dep.kind != DepKind::Replaces {
                return false;
            }
            dep.possibilities.iter().any(|alt| {
                if alt.target != owner_pkg.set() {
                    return false;
                }
                let alt_arch = alt.arch.clone().unwrap_or_else(|| db.archs.any());
                arch_satisfied(&owner_pkg.installed, &alt_arch, DepKind::Replaces, &db.archs.native())
                    && version_satisfied(&owner_pkg.installed.version, alt)
            })
        })
    }

    /// Walk `set`'s architecture chain (the same technique
    /// [crate::infodb::InfoDb::upgrade_to_multiarch] uses) and return every
    /// instance currently installed, coarser [FileNameNode::owners] having
    /// recorded only the set.
    fn installed_instances(&self, db: &Database, set: Id<PackageSet>) -> Vec<Id<Package>> {
        let mut found = Vec::new();
        let mut cursor = Some(db.set(set).head());
        while let Some(id) = cursor {
            let pkg = db.package(id);
            if pkg.status != Status::NotInstalled {
                found.push(id);
            }
            cursor = pkg.arch_next();
        }
        found
    }

    /// Every currently-installed package instance, other than `pkgset`
    /// itself, that already claims `node`.
    fn other_owners(&self, db: &Database, node: &FileNameNode, pkgset: Id<PackageSet>) -> Vec<Id<Package>> {
        node.owners
            .iter()
            .filter(|&&owner| owner != pkgset)
            .flat_map(|&owner| self.installed_instances(db, owner))
            .collect()
    }

    /// Is `kind` one this engine stages under `.dpkg-new` and defers the
    /// final rename on? Directories are created (or merged into) directly,
    /// since a directory can't be swapped into place atomically the way a
    /// file, device, fifo or symlink can.
    fn is_staged(kind: EntryKind) -> bool {
        !matches!(kind, EntryKind::Dir)
    }

    /// Place one archive member. `pkgset` is the package the archive belongs
    /// to; `content` supplies a [EntryKind::File]'s payload (ignored for
    /// every other kind). `expected_md5`, when given, is the hash an
    /// already-installed `Multi-Arch: same` peer recorded for this same
    /// path -- a mismatch against the incoming `content` is
    /// [UnpackError::NotInSync] rather than a silent overwrite. `is_conffile`
    /// marks `entry` as a path this instance's `Conffiles:` list names: it's
    /// staged under `.dpkg-new` the same as anything else, but flagged
    /// `NEW_CONFFILE | ELIDE_OTHER_LISTS` instead of `DEFERRED_RENAME`, so
    /// [UnpackEngine::commit] leaves the rename for `--configure` to do.
    pub fn place(
        &self,
        db: &Database,
        table: &mut FileNameTable,
        pkgset: Id<PackageSet>,
        entry: &TarEntry,
        mut content: impl Read,
        expected_md5: Option<&str>,
        is_conffile: bool,
    ) -> Result<(), UnpackError> {
        let node_id = table.intern(&entry.name);

        // Diversions: a path diverted away from (`came_from`) is never
        // written by anyone but the diversion's own owner; everyone else's
        // archive entry for it is silently redirected to `use_instead`.
        let (write_path, real_name) = {
            let node = table.get(node_id);
            match &node.divert {
                Some(divert) if divert.came_from == node_id && divert.pkgset != pkgset => {
                    let redirected = table.get(divert.use_instead).name().to_owned();
                    (self.real_path(&redirected), redirected)
                }
                _ => (self.real_path(&entry.name), entry.name.clone()),
            }
        };

        // Is `write_path` itself the *target* of a diversion owned by
        // someone other than us? Writing it directly steps on whatever that
        // diversion is protecting.
        if let Some(divert) = table.get(node_id).divert.clone() {
            if divert.use_instead == node_id
                && divert.pkgset != pkgset
                && !self.force.contains(ForceFlags::OVERWRITE_DIVERTED)
            {
                let came_from = table.get(divert.came_from).name().to_owned();
                return Err(UnpackError::DivertedOverwrite { path: real_name, came_from });
            }
        }

        let existing = self.fs.lstat(&write_path).map_err(io_err(write_path.clone()))?;
        let existing_is_dir = existing.map(|p| p.kind == ProbeKind::Dir).unwrap_or(false);

        // File-conflict check: every other package that already owns this
        // path must either be replaced by the one we're unpacking, or we
        // need the matching force flag.
        for other in self.other_owners(db, table.get(node_id), pkgset) {
            if self.does_replace(db, pkgset, other) {
                continue;
            }
            let forced = if entry.kind == EntryKind::Dir || existing_is_dir {
                self.force.contains(ForceFlags::OVERWRITE_DIR)
            } else {
                self.force.contains(ForceFlags::OVERWRITE)
            };
            if !forced {
                let other_name = db.set(db.package(other).set()).name().to_owned();
                return Err(UnpackError::FileConflict { path: real_name, other: other_name });
            }
        }

        if entry.kind == EntryKind::Dir {
            self.place_directory(&write_path, entry, existing_is_dir)?;
        } else if entry.kind == EntryKind::File && expected_md5.is_some() {
            // `ensure_same_file`: the peer's recorded hash is checked against
            // what we're about to unpack, not whatever already happens to be
            // on disk -- the existing file may well *be* the peer's copy,
            // which would make every check trivially pass.
            let expected = expected_md5.unwrap();
            let mut buf = Vec::new();
            content.read_to_end(&mut buf).map_err(io_err(write_path.clone()))?;
            if md5_hex(&buf) != expected {
                return Err(UnpackError::NotInSync { path: real_name });
            }
            self.place_staged(&write_path, entry, &mut std::io::Cursor::new(buf))?;
        } else {
            self.place_staged(&write_path, entry, &mut content)?;
        }

        {
            let node = table.get_mut(node_id);
            node.flags.insert(FileFlags::NEW_IN_ARCHIVE);
            if is_conffile {
                node.flags.insert(FileFlags::NEW_CONFFILE | FileFlags::ELIDE_OTHER_LISTS);
            } else if Self::is_staged(entry.kind) {
                node.flags.insert(FileFlags::DEFERRED_RENAME | FileFlags::DEFERRED_FSYNC);
            } else {
                node.flags.insert(FileFlags::PLACED_ON_DISK);
            }
        }
        table.add_owner(node_id, pkgset);

        Ok(())
    }

    fn place_directory(&self, path: &Path, entry: &TarEntry, existing_is_dir: bool) -> Result<(), UnpackError> {
        if !existing_is_dir {
            if self.fs.lstat(path).map_err(io_err(path.to_owned()))?.is_some() {
                self.fs.remove_file(path).map_err(io_err(path.to_owned()))?;
            }
            match self.fs.mkdir(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(io_err(path.to_owned())(e)),
            }
        }
        self.apply_metadata(path, entry, false)
    }

    fn place_staged(&self, real: &Path, entry: &TarEntry, content: &mut impl Read) -> Result<(), UnpackError> {
        let staged = staged_path(real);
        if self.fs.lstat(&staged).map_err(io_err(staged.clone()))?.is_some() {
            self.fs.remove_file(&staged).map_err(io_err(staged.clone()))?;
        }

        match entry.kind {
            EntryKind::File => {
                let mut file = self.fs.create_new_file(&staged).map_err(io_err(staged.clone()))?;
                std::io::copy(content, &mut file).map_err(io_err(staged.clone()))?;
            }
            EntryKind::Symlink => {
                self.fs.symlink(&entry.linkname, &staged).map_err(io_err(staged.clone()))?;
            }
            EntryKind::HardLink => {
                let target = self.real_path(&entry.linkname);
                self.fs.hard_link(&target, &staged).map_err(io_err(staged.clone()))?;
            }
            EntryKind::Fifo => {
                self.fs.mkfifo(&staged, entry.stat.mode).map_err(io_err(staged.clone()))?;
            }
            EntryKind::CharDev | EntryKind::BlockDev => {
                let dev = entry
                    .dev
                    .ok_or_else(|| UnpackError::Internal(format!("{} has no device number", entry.name)))?;
                self.fs.mknod(&staged, entry.kind, dev, entry.stat.mode).map_err(io_err(staged.clone()))?;
            }
            EntryKind::Dir => unreachable!("handled by place_directory"),
        }

        self.apply_metadata(&staged, entry, entry.kind == EntryKind::Symlink)
    }

    fn apply_metadata(&self, path: &Path, entry: &TarEntry, is_symlink: bool) -> Result<(), UnpackError> {
        if is_symlink {
            self.fs.lchown(path, entry.stat.uid, entry.stat.gid).map_err(io_err(path.to_owned()))?;
            self.fs.set_symlink_mtime(path, entry.stat.mtime).map_err(io_err(path.to_owned()))?;
            return Ok(());
        }
        if entry.kind != EntryKind::HardLink {
            self.fs.chown(path, entry.stat.uid, entry.stat.gid).map_err(io_err(path.to_owned()))?;
            self.fs.set_mode(path, entry.stat.mode).map_err(io_err(path.to_owned()))?;
        }
        self.fs.set_mtime(path, entry.stat.mtime).map_err(io_err(path.to_owned()))
    }

    /// `tar_writeback_barrier` + `tar_deferred_extract`: rename every staged
    /// object onto its final name, in the order the archive placed them.
    /// Skipped entirely (both the fsync and the rename stay merely staged
    /// until the orchestrator calls this again) only by never calling it --
    /// there's no partial-commit mode, everything in the archive gets
    /// renamed into place together or not at all.
    ///
    /// Conffiles (`NEW_CONFFILE`) are never renamed here: they stay under
    /// `.dpkg-new` until `--configure` resolves them against the old
    /// conffile, the same way `tarobject` defers a conffile's rename past
    /// the rest of the archive's unpack entirely.
    ///
    /// `--force-unsafe-io` only removes the `fsync` calls, not the rename
    /// itself: the directory entry still has to move for the package to be
    /// considered unpacked at all.
    pub fn commit(&self, table: &mut FileNameTable) -> Result<(), UnpackError> {
        let pending: Vec<Id<FileNameNode>> = table
            .iter()
            .filter(|(_, node)| {
                node.flags.contains(FileFlags::DEFERRED_RENAME) && !node.flags.contains(FileFlags::NEW_CONFFILE)
            })
            .map(|(id, _)| id)
            .collect();

        for id in pending {
            let name = table.get(id).name().to_owned();
            let real = self.real_path(&name);
            let staged = staged_path(&real);

            if !self.force.contains(ForceFlags::UNSAFE_IO) {
                let file = std::fs::File::open(&staged).map_err(io_err(staged.clone()))?;
                file.sync_all().map_err(io_err(staged.clone()))?;
            }

            self.fs.rename(&staged, &real).map_err(io_err(real.clone()))?;

            if !self.force.contains(ForceFlags::UNSAFE_IO) {
                if let Some(parent) = real.parent() {
                    if let Ok(dir) = std::fs::File::open(parent) {
                        let _ = dir.sync_all();
                    }
                }
            }

            let node = table.get_mut(id);
            node.flags.remove(FileFlags::DEFERRED_RENAME | FileFlags::DEFERRED_FSYNC);
            node.flags.insert(FileFlags::PLACED_ON_DISK);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::{BinMeta, DepPossibility, Dependency, VersionRel};
    use crate::unpack::entry::{DeviceNumber, FileStat};
    use crate::unpack::fs::StdFilesystem;

    fn blank_entry(name: &str, kind: EntryKind) -> TarEntry {
        // `chown` to our own uid/gid is a permitted no-op for an
        // unprivileged test runner; chowning to root would not be.
        let uid = nix::unistd::getuid().as_raw();
        let gid = nix::unistd::getgid().as_raw();
        TarEntry {
            name: name.to_owned(),
            kind,
            linkname: String::new(),
            size: 0,
            stat: FileStat { uid, gid, mode: 0o644, mtime: 0 },
            dev: None,
        }
    }

    fn installed(db: &mut Database, name: &str) -> Id<PackageSet> {
        let pkg = db.find_pkg(name, None);
        db.package_mut(pkg).status = Status::Installed;
        db.package(pkg).set()
    }

    #[test]
    fn does_replace_matches_unversioned_clause() {
        let mut db = Database::new("amd64");
        let old = installed(&mut db, "old-package");
        let new = db.find_set("new-package");

        let dep = Dependency {
            up: db.set(new).head(),
            kind: DepKind::Replaces,
            possibilities: vec![DepPossibility {
                target: old,
                version_rel: VersionRel::None,
                version: Default::default(),
                arch: None,
                arch_is_implicit: true,
            }],
        };
        let dep_id = db.alloc_dependency(dep);
        db.package_mut(db.set(new).head()).available = BinMeta { dependencies: vec![dep_id], ..BinMeta::default() };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, "/", ForceFlags::empty());
        let old_instance = db.set(old).head();
        assert!(engine.does_replace(&db, new, old_instance));
    }

    #[test]
    fn does_replace_is_false_with_no_clause() {
        let mut db = Database::new("amd64");
        let old = installed(&mut db, "old-package");
        let new = db.find_set("new-package");

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, "/", ForceFlags::empty());
        let old_instance = db.set(old).head();
        assert!(!engine.does_replace(&db, new, old_instance));
    }

    #[test]
    fn place_directory_on_fresh_tree_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/share/doc")).unwrap();
        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/share/doc/hello", EntryKind::Dir);
        engine.place(&db, &mut table, pkgset, &entry, std::io::empty(), None, false).unwrap();

        assert!(dir.path().join("usr/share/doc/hello").is_dir());
    }

    #[test]
    fn place_file_stages_under_dpkg_new_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/bin/hello", EntryKind::File);
        engine
            .place(&db, &mut table, pkgset, &entry, "hi\n".as_bytes(), None, false)
            .unwrap();

        assert!(!dir.path().join("usr/bin/hello").exists());
        assert!(dir.path().join("usr/bin/hello.dpkg-new").exists());

        engine.commit(&mut table).unwrap();
        assert!(dir.path().join("usr/bin/hello").exists());
        assert!(!dir.path().join("usr/bin/hello.dpkg-new").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("usr/bin/hello")).unwrap(), "hi\n");
    }

    #[test]
    fn conflicting_owner_without_replaces_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let mut db = Database::new("amd64");
        let owner = installed(&mut db, "owner-package");
        let incoming = db.find_set("incoming-package");

        let mut table = FileNameTable::new();
        let node = table.intern("usr/bin/shared");
        table.add_owner(node, owner);

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/bin/shared", EntryKind::File);
        let err = engine
            .place(&db, &mut table, incoming, &entry, "hi\n".as_bytes(), None, false)
            .unwrap_err();
        assert!(matches!(err, UnpackError::FileConflict { .. }));
    }

    #[test]
    fn force_overwrite_allows_the_conflict_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let mut db = Database::new("amd64");
        let owner = installed(&mut db, "owner-package");
        let incoming = db.find_set("incoming-package");

        let mut table = FileNameTable::new();
        let node = table.intern("usr/bin/shared");
        table.add_owner(node, owner);

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::OVERWRITE);
        let entry = blank_entry("usr/bin/shared", EntryKind::File);
        engine
            .place(&db, &mut table, incoming, &entry, "hi\n".as_bytes(), None, false)
            .unwrap();
        engine.commit(&mut table).unwrap();
        assert!(dir.path().join("usr/bin/shared").exists());
    }

    #[test]
    fn diverted_overwrite_is_rejected_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let mut db = Database::new("amd64");
        let diversion_owner = db.find_set("dpkg-divert-owner");
        let incoming = db.find_set("incoming-package");

        let mut table = FileNameTable::new();
        let real = table.intern("usr/bin/editor");
        let diverted = table.intern("usr/bin/editor.distrib");
        table.set_divert(real, diverted, diversion_owner);

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/bin/editor.distrib", EntryKind::File);
        let err = engine
            .place(&db, &mut table, incoming, &entry, "hi\n".as_bytes(), None, false)
            .unwrap_err();
        assert!(matches!(err, UnpackError::DivertedOverwrite { .. }));
    }

    #[test]
    fn multiarch_peer_mismatch_is_not_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/share")).unwrap();
        std::fs::write(dir.path().join("usr/share/shared.txt"), "old content").unwrap();

        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/share/shared.txt", EntryKind::File);
        let err = engine
            .place(&db, &mut table, pkgset, &entry, "new content".as_bytes(), Some("deadbeef"), false)
            .unwrap_err();
        assert!(matches!(err, UnpackError::NotInSync { .. }));
    }

    #[test]
    fn multiarch_check_hashes_incoming_content_not_the_file_already_on_disk() {
        // The peer's recorded hash matches what's already on disk (as it
        // would right after the peer's own unpack), but what we're about to
        // write is different -- `ensure_same_file` has to catch this even
        // though a hash of the existing file would say everything's fine.
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/share")).unwrap();
        std::fs::write(dir.path().join("usr/share/shared.txt"), "old content").unwrap();
        let peer_hash = "0f5f13cf0b14c88bd431ef163b63d68d"; // md5("old content")

        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/share/shared.txt", EntryKind::File);
        let err = engine
            .place(&db, &mut table, pkgset, &entry, "new content".as_bytes(), Some(peer_hash), false)
            .unwrap_err();
        assert!(matches!(err, UnpackError::NotInSync { .. }));
    }

    #[test]
    fn multiarch_check_passes_when_incoming_content_matches_peer_hash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/share")).unwrap();
        std::fs::write(dir.path().join("usr/share/shared.txt"), "old content").unwrap();
        let peer_hash = "96c15c2bb2921193bf290df8cd85e2ba"; // md5("new content")

        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("usr/share/shared.txt", EntryKind::File);
        engine
            .place(&db, &mut table, pkgset, &entry, "new content".as_bytes(), Some(peer_hash), false)
            .unwrap();
        engine.commit(&mut table).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("usr/share/shared.txt")).unwrap(), "new content");
    }

    #[test]
    fn conffile_is_staged_but_not_renamed_by_commit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let entry = blank_entry("etc/hello.conf", EntryKind::File);
        engine
            .place(&db, &mut table, pkgset, &entry, "key = value\n".as_bytes(), None, true)
            .unwrap();

        let node = table.find("etc/hello.conf").unwrap();
        assert!(table.get(node).flags.contains(FileFlags::NEW_CONFFILE));
        assert!(table.get(node).flags.contains(FileFlags::ELIDE_OTHER_LISTS));
        assert!(!table.get(node).flags.contains(FileFlags::DEFERRED_RENAME));
        assert!(dir.path().join("etc/hello.conf.dpkg-new").exists());

        engine.commit(&mut table).unwrap();
        assert!(dir.path().join("etc/hello.conf.dpkg-new").exists());
        assert!(!dir.path().join("etc/hello.conf").exists());
    }

    #[test]
    fn char_device_entry_needs_a_device_number() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new("amd64");
        let mut table = FileNameTable::new();
        let pkgset = {
            let mut db = Database::new("amd64");
            db.find_set("hello")
        };

        let fs = StdFilesystem;
        let engine = UnpackEngine::new(&fs, dir.path(), ForceFlags::empty());
        let mut entry = blank_entry("dev/null", EntryKind::CharDev);
        entry.dev = Some(DeviceNumber { major: 1, minor: 3 });
        // Actually placing a device node requires privileges this test
        // environment doesn't have; exercise the error path that fires
        // before any syscall when the device number is missing instead.
        entry.dev = None;
        let err = engine.place(&db, &mut table, pkgset, &entry, std::io::empty(), None, false).unwrap_err();
        assert!(matches!(err, UnpackError::Internal(_)));
    }
}

// vim: foldmethod=marker
