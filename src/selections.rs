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

//! `dpkg --get-selections` / `--set-selections` / `--clear-selections`: the
//! `NAME[:ARCH]\tSTATE` stream the administrator edits by hand, grounded on
//! `select.c`'s `getselections`/`setselections`/`clearselections`.
//!
//! A selections stream is line-oriented text, one package per line, `#`
//! lines and blank lines ignored on read. [get_selections] and
//! [set_selections] don't own a stream themselves -- they take any
//! [std::io::Write]/[std::io::Read] -- so a front-end can point either one
//! at a file, a pipe, or an in-memory buffer in tests.

use std::io::{BufRead, Write};

use crate::db::{Database, Want};
use crate::pkgspec::{PkgSpec, PkgSpecFlags};

/// Everything [get_selections] or [set_selections] can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SelectionsError {
    /// An I/O error reading or writing the stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line of `set_selections` input didn't parse as `name\tstate`.
    #[error("line {line}: {message}")]
    Malformed {
        /// 1-based line number within the stream.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

/// Render one `Want` the way a selections stream spells it. `Want::Unknown`
/// has no textual form -- `getselections` skips those packages entirely,
/// and `setselections` rejects any other spelling as unrecognised.
fn want_name(want: Want) -> Option<&'static str> {
    match want {
        Want::Unknown => None,
        Want::Install => Some("install"),
        Want::Hold => Some("hold"),
        Want::Deinstall => Some("deinstall"),
        Want::Purge => Some("purge"),
    }
}

fn want_from_name(name: &str) -> Option<Want> {
    match name {
        "install" => Some(Want::Install),
        "hold" => Some(Want::Hold),
        "deinstall" => Some(Want::Deinstall),
        "purge" => Some(Want::Purge),
        _ => None,
    }
}

/// `name[:arch]` exactly as `getsel1package` renders it: the `:arch`
/// suffix is only present once the instance has been claimed for a
/// specific (non-native, non-`all`) architecture.
fn describe(db: &Database, id: crate::interner::Id<crate::db::Package>) -> String {
    let pkg = db.package(id);
    let set = db.set(pkg.set());
    match pkg.installed.arch.as_ref().or(pkg.available.arch.as_ref()) {
        Some(arch) if !arch.is_special() => format!("{}:{}", set.name(), arch.name()),
        _ => set.name().to_owned(),
    }
}

/// `getselections`: with no `patterns`, write every installed-or-selected
/// instance (anything whose [Want] isn't [Want::Unknown]), sorted by name.
/// With one or more patterns, resolve each against `db` via [PkgSpec] (glob
/// patterns allowed, a bare name defaults to the native architecture) and
/// write only the matches, returning the patterns that matched nothing so
/// the caller can report them the way `select.c` does ("No packages found
/// matching %s.") without this module dealing in process exit codes.
pub fn get_selections<W: Write>(
    db: &mut Database,
    patterns: &[&str],
    out: &mut W,
) -> Result<Vec<String>, SelectionsError> {
    let mut ids: Vec<crate::interner::Id<crate::db::Package>> = Vec::new();
    let mut not_found = Vec::new();

    if patterns.is_empty() {
        ids.extend(db.iter_pkgs().map(|(id, _)| id));
    } else {
        for pattern in patterns {
            let spec = PkgSpec::parse(&db.archs, PkgSpecFlags::DEF_NATIVE | PkgSpecFlags::PATTERNS, pattern)
                .map_err(|_| ())
                .ok();
            let matched = spec.map(|spec| spec.matches(db)).unwrap_or_default();
            if matched.is_empty() {
                not_found.push((*pattern).to_owned());
            } else {
                ids.extend(matched);
            }
        }
    }

    let mut rows: Vec<(String, Want)> = ids
        .into_iter()
        .map(|id| (describe(db, id), db.package(id).want))
        .filter(|(_, want)| *want != Want::Unknown)
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, want) in rows {
        if let Some(state) = want_name(want) {
            writeln!(out, "{name}\t{state}")?;
        }
    }
    Ok(not_found)
}

/// `setselections`: read `input` line by line, updating `db`'s `want`
/// field for each named package. Blank lines and `#`-prefixed comment
/// lines are skipped. Every other line must be exactly `name[:arch]`,
/// whitespace, then one of `install`/`hold`/`deinstall`/`purge` -- no
/// trailing data after the state, matching `setselections`' own
/// "unexpected data after package and selection" check.
pub fn set_selections<R: BufRead>(db: &mut Database, input: R) -> Result<(), SelectionsError> {
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or_else(|| SelectionsError::Malformed {
            line: lineno + 1,
            message: "missing package name".to_owned(),
        })?;
        let state = parts.next().ok_or_else(|| SelectionsError::Malformed {
            line: lineno + 1,
            message: "missing wanted status".to_owned(),
        })?;
        if parts.next().is_some() {
            return Err(SelectionsError::Malformed {
                line: lineno + 1,
                message: "unexpected data after package and selection".to_owned(),
            });
        }

        let spec = PkgSpec::parse(&db.archs, PkgSpecFlags::DEF_NATIVE | PkgSpecFlags::NO_CHECK, name)
            .map_err(|err| SelectionsError::Malformed {
                line: lineno + 1,
                message: err.to_string(),
            })?;
        if let Some(msg) = spec.is_illegal() {
            return Err(SelectionsError::Malformed { line: lineno + 1, message: msg });
        }

        let want = want_from_name(state).ok_or_else(|| SelectionsError::Malformed {
            line: lineno + 1,
            message: format!("unknown wanted status: {state}"),
        })?;

        let id = spec.find_pkg(db).map_err(|err| SelectionsError::Malformed {
            line: lineno + 1,
            message: err.to_string(),
        })?;
        // `pkg_spec_find_pkg` in the original always allocates the
        // instance it names; a non-pattern spec never returns `None`.
        let id = id.expect("non-pattern PkgSpec::find_pkg always resolves");
        db.package_mut(id).want = want;
    }
    Ok(())
}

/// `clearselections`: set every package's `want` to [Want::Deinstall],
/// except instances marked `Essential: yes` in their installed metadata,
/// which are left untouched.
pub fn clear_selections(db: &mut Database) {
    let ids: Vec<_> = db.iter_pkgs().map(|(id, _)| id).collect();
    for id in ids {
        let pkg = db.package_mut(id);
        if !pkg.installed.essential {
            pkg.want = Want::Deinstall;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn db_with(packages: &[(&str, Want)]) -> Database {
        let mut db = Database::new("amd64");
        for (name, want) in packages {
            let id = db.find_pkg(name, None);
            db.package_mut(id).want = *want;
        }
        db
    }

    #[test]
    fn get_selections_skips_unknown_and_sorts() {
        let mut db = db_with(&[("zeta", Want::Install), ("alpha", Want::Hold), ("beta", Want::Unknown)]);
        let mut out = Vec::new();
        let not_found = get_selections(&mut db, &[], &mut out).unwrap();
        assert!(not_found.is_empty());
        assert_eq!(
            "alpha\thold\nzeta\tinstall\n",
            String::from_utf8(out).unwrap()
        );
    }

    #[test]
    fn get_selections_with_pattern_reports_no_match() {
        let mut db = db_with(&[("hello", Want::Install)]);
        let mut out = Vec::new();
        let not_found = get_selections(&mut db, &["nonexistent"], &mut out).unwrap();
        assert_eq!(vec!["nonexistent".to_owned()], not_found);
        assert!(out.is_empty());
    }

    #[test]
    fn get_selections_with_matching_pattern() {
        let mut db = db_with(&[("hello", Want::Install), ("world", Want::Hold)]);
        let mut out = Vec::new();
        let not_found = get_selections(&mut db, &["hello"], &mut out).unwrap();
        assert!(not_found.is_empty());
        assert_eq!("hello\tinstall\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn set_selections_updates_want() {
        let mut db = Database::new("amd64");
        db.find_pkg("hello", None);
        let input = "hello\tpurge\n";
        set_selections(&mut db, input.as_bytes()).unwrap();
        let id = db.find_pkg("hello", None);
        assert_eq!(Want::Purge, db.package(id).want);
    }

    #[test]
    fn set_selections_skips_comments_and_blank_lines() {
        let mut db = Database::new("amd64");
        let input = "# a comment\n\nhello\tinstall\n";
        set_selections(&mut db, input.as_bytes()).unwrap();
        let id = db.find_pkg("hello", None);
        assert_eq!(Want::Install, db.package(id).want);
    }

    #[test]
    fn set_selections_rejects_unknown_state() {
        let mut db = Database::new("amd64");
        let input = "hello\tbroken\n";
        let err = set_selections(&mut db, input.as_bytes()).unwrap_err();
        assert!(matches!(err, SelectionsError::Malformed { line: 1, .. }));
    }

    #[test]
    fn set_selections_rejects_trailing_data() {
        let mut db = Database::new("amd64");
        let input = "hello\tinstall\textra\n";
        let err = set_selections(&mut db, input.as_bytes()).unwrap_err();
        assert!(matches!(err, SelectionsError::Malformed { line: 1, .. }));
    }

    #[test]
    fn clear_selections_spares_essential() {
        let mut db = Database::new("amd64");
        let id = db.find_pkg("hello", None);
        db.package_mut(id).want = Want::Install;
        let essential_id = db.find_pkg("essential-pkg", None);
        db.package_mut(essential_id).want = Want::Install;
        db.package_mut(essential_id).installed.essential = true;

        clear_selections(&mut db);

        assert_eq!(Want::Deinstall, db.package(id).want);
        assert_eq!(Want::Install, db.package(essential_id).want);
    }
}

// vim: foldmethod=marker
