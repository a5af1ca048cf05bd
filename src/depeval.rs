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

//! Evaluates whether a [Dependency] clause is currently satisfied against a
//! [Database].
//!
//! Positive clauses (`Depends`, `Pre-Depends`, `Recommends`, `Suggests`) are
//! satisfied if any one alternative is; negative clauses (`Conflicts`,
//! `Breaks`) are satisfied unless some alternative matches an installed
//! package. `Replaces` and `Provides` aren't evaluated here -- `Replaces`
//! only matters to the unpack engine's file-conflict resolution, and
//! `Provides` is consulted as a satisfier of *other* packages' clauses, not
//! evaluated in its own right.

use crate::arch::{Arch, ArchKind};
use crate::db::{BinMeta, DepKind, DepPossibility, Dependency, Database, MultiArch, Package, PackageSet, Status};
use crate::interner::Id;
use crate::version::Version;

/// Outcome of [dep_is_ok].
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Whether the clause is currently satisfied.
    pub ok: bool,
    /// Human-readable explanation of the first failing alternative, empty
    /// when `ok` is true.
    pub why: String,
    /// A single installed package whose removal or deconfiguration would
    /// resolve the failure, if the evaluator could identify exactly one.
    /// This is the hook the unpack engine's auto-deconfiguration uses.
    pub fixable: Option<Id<PackageSet>>,
}

fn is_conflict_like(kind: DepKind) -> bool {
    matches!(kind, DepKind::Conflicts | DepKind::Breaks | DepKind::Replaces)
}

fn normalize_arch(arch: &Arch, native: &Arch) -> Arch {
    if matches!(arch.kind(), ArchKind::None | ArchKind::All) {
        native.clone()
    } else {
        arch.clone()
    }
}

/// §4.6 `arch_satisfied(pkg_bin, alt)`.
pub(crate) fn arch_satisfied(pkg_bin: &BinMeta, alt_arch: &Arch, kind: DepKind, native: &Arch) -> bool {
    if pkg_bin.multiarch == MultiArch::Foreign {
        return true;
    }
    if matches!(alt_arch.kind(), ArchKind::Wildcard)
        && (pkg_bin.multiarch == MultiArch::Allowed || is_conflict_like(kind))
    {
        return true;
    }

    let pkg_arch = pkg_bin.arch.clone().unwrap_or_else(|| native.clone());
    normalize_arch(&pkg_arch, native).is_same(&normalize_arch(alt_arch, native))
}

/// §4.6 version satisfaction: `ver_rel == none` is always true, otherwise
/// compare with [Version]'s `Ord` and apply the relation.
pub(crate) fn version_satisfied(candidate: &Version, alt: &DepPossibility) -> bool {
    use crate::db::VersionRel;
    use std::cmp::Ordering;

    match alt.version_rel {
        VersionRel::None => true,
        VersionRel::EarlierEqual => candidate.cmp(&alt.version) != Ordering::Greater,
        VersionRel::EarlierStrict => candidate.cmp(&alt.version) == Ordering::Less,
        VersionRel::LaterEqual => candidate.cmp(&alt.version) != Ordering::Less,
        VersionRel::LaterStrict => candidate.cmp(&alt.version) == Ordering::Greater,
        VersionRel::Exact => candidate.cmp(&alt.version) == Ordering::Equal,
    }
}

/// The architecture an alternative names, per [DepPossibility]'s own
/// documented resolution: an explicit name is used as-is; an implicit
/// `any` (unqualified on `Conflicts`/`Breaks`/`Replaces`) resolves to the
/// `any` wildcard; an implicit same-arch (unqualified everywhere else)
/// resolves to `up`'s own architecture.
fn alternative_arch(alt: &DepPossibility, up: &Package, db: &Database) -> Arch {
    match &alt.arch {
        Some(arch) => arch.clone(),
        None if alt.arch_is_implicit => db.archs.any(),
        None => up
            .installed
            .arch
            .clone()
            .unwrap_or_else(|| db.archs.native()),
    }
}

/// Does `candidate` (an instance of the set `alt` targets) satisfy `alt`,
/// whether directly (the set's own version) or via a `Provides` edge with
/// no version constraint?
fn possibility_matches(db: &Database, alt: &DepPossibility, up: &Package, kind: DepKind, candidate: &Package) -> bool {
    let alt_arch = alternative_arch(alt, up, db);
    if !arch_satisfied(&candidate.installed, &alt_arch, kind, &db.archs.native()) {
        return false;
    }
    version_satisfied(&candidate.installed.version, alt)
}

/// Is `alt` satisfied by any currently-installed package, directly or via a
/// `Provides` edge (only meaningful when `alt.version_rel` is
/// [crate::db::VersionRel::None] -- a `Provides` line never carries a
/// version)?
fn alternative_satisfied(db: &Database, up: &Package, kind: DepKind, alt: &DepPossibility) -> Option<Id<PackageSet>> {
    let set = db.set(alt.target);

    let mut cursor = Some(set.head());
    while let Some(id) = cursor {
        let candidate = db.package(id);
        if candidate.status != Status::NotInstalled && possibility_matches(db, alt, up, kind, candidate) {
            return Some(alt.target);
        }
        cursor = candidate.arch_next();
    }

    if !matches!(alt.version_rel, crate::db::VersionRel::None) {
        return None;
    }
    set.depended_installed
        .iter()
        .chain(set.depended_available.iter())
        .find_map(|depref| {
            let provider_dep = db.dependency(depref.dependency);
            if provider_dep.kind != DepKind::Provides {
                return None;
            }
            let provider = db.package(provider_dep.up);
            (provider.status != Status::NotInstalled).then(|| provider.set())
        })
}

/// Evaluate a `Depends`-family [Dependency] clause (`dep_is_ok`).
///
/// `Provides` and `Replaces` clauses are never satisfied or violated by
/// this function -- see the module documentation.
pub fn dep_is_ok(db: &Database, dependency: &Dependency) -> Evaluation {
    let up = db.package(dependency.up);

    if dependency.kind.is_negative() {
        for alt in &dependency.possibilities {
            if let Some(culprit) = alternative_satisfied(db, up, dependency.kind, alt) {
                return Evaluation {
                    ok: false,
                    why: format!(
                        "{:?} violated by installed package {:?}",
                        dependency.kind, culprit
                    ),
                    fixable: Some(culprit),
                };
            }
        }
        return Evaluation {
            ok: true,
            why: String::new(),
            fixable: None,
        };
    }

    let mut first_failure = None;
    for alt in &dependency.possibilities {
        if alternative_satisfied(db, up, dependency.kind, alt).is_some() {
            return Evaluation {
                ok: true,
                why: String::new(),
                fixable: None,
            };
        }
        if first_failure.is_none() {
            first_failure = Some(alt.target);
        }
    }

    Evaluation {
        ok: false,
        why: format!("no alternative of {:?} is satisfied", dependency.kind),
        fixable: first_failure,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::{DepPossibility, VersionRel};

    fn parse_ver(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn depends_satisfied_by_installed_package() {
        let mut db = Database::new("amd64");
        let up = db.find_pkg("a", None);
        let target = db.find_set("b");
        let target_pkg = db.package_mut(db.set(target).head());
        target_pkg.status = Status::Installed;
        target_pkg.installed.version = parse_ver("1.0-1");

        let dep = Dependency {
            up,
            kind: DepKind::Depends,
            possibilities: vec![DepPossibility {
                target,
                version_rel: VersionRel::None,
                version: Version::default(),
                arch: None,
                arch_is_implicit: false,
            }],
        };

        let eval = dep_is_ok(&db, &dep);
        assert!(eval.ok);
    }

    #[test]
    fn depends_unsatisfied_when_not_installed() {
        let mut db = Database::new("amd64");
        let up = db.find_pkg("a", None);
        let target = db.find_set("b");

        let dep = Dependency {
            up,
            kind: DepKind::Depends,
            possibilities: vec![DepPossibility {
                target,
                version_rel: VersionRel::None,
                version: Version::default(),
                arch: None,
                arch_is_implicit: false,
            }],
        };

        let eval = dep_is_ok(&db, &dep);
        assert!(!eval.ok);
        assert_eq!(eval.fixable, Some(target));
    }

    #[test]
    fn version_relation_is_enforced() {
        let mut db = Database::new("amd64");
        let up = db.find_pkg("a", None);
        let target = db.find_set("b");
        let target_pkg = db.package_mut(db.set(target).head());
        target_pkg.status = Status::Installed;
        target_pkg.installed.version = parse_ver("1.0-1");

        let dep = Dependency {
            up,
            kind: DepKind::Depends,
            possibilities: vec![DepPossibility {
                target,
                version_rel: VersionRel::LaterStrict,
                version: parse_ver("2.0-1"),
                arch: None,
                arch_is_implicit: false,
            }],
        };

        assert!(!dep_is_ok(&db, &dep).ok);
    }

    #[test]
    fn conflicts_is_violated_by_installed_match() {
        let mut db = Database::new("amd64");
        let up = db.find_pkg("a", None);
        let target = db.find_set("b");
        let target_pkg = db.package_mut(db.set(target).head());
        target_pkg.status = Status::Installed;

        let dep = Dependency {
            up,
            kind: DepKind::Conflicts,
            possibilities: vec![DepPossibility {
                target,
                version_rel: VersionRel::None,
                version: Version::default(),
                arch: None,
                arch_is_implicit: true,
            }],
        };

        let eval = dep_is_ok(&db, &dep);
        assert!(!eval.ok);
        assert_eq!(eval.fixable, Some(target));
    }

    #[test]
    fn foreign_multiarch_satisfies_any_requesting_arch() {
        let mut db = Database::new("amd64");
        let i386 = db.archs.find("i386");
        let up = db.find_pkg("a", Some(&i386));
        let target = db.find_set("b");
        let target_pkg = db.package_mut(db.set(target).head());
        target_pkg.status = Status::Installed;
        target_pkg.installed.multiarch = MultiArch::Foreign;

        let dep = Dependency {
            up,
            kind: DepKind::Depends,
            possibilities: vec![DepPossibility {
                target,
                version_rel: VersionRel::None,
                version: Version::default(),
                arch: None,
                arch_is_implicit: false,
            }],
        };

        assert!(dep_is_ok(&db, &dep).ok);
    }
}

// vim: foldmethod=marker
