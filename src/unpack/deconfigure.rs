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

//! Auto-deconfigure protocol. The engine never deconfigures a
//! package itself -- it decides *whether* a package could be deconfigured to
//! resolve a `Breaks`/`Conflicts` problem and hands the resulting list back
//! to whatever orchestrates the install. Executing that list (running
//! `prerm`/updating `status`) is outside this crate.

use crate::db::{Database, DepKind, Package, PackageSet};
use crate::depeval::dep_is_ok;
use crate::interner::Id;

use super::force::ForceFlags;

/// Why a package is being considered for deconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeconfigureReason {
    /// Installing the package currently being unpacked would violate a
    /// `Breaks` clause on this package.
    Installation,
    /// Removing `removal` (to resolve a `Conflicts` clause) would break one
    /// of this package's `Depends`/`Pre-Depends`.
    Removal(Id<Package>),
}

/// One package the orchestrator is asked to deconfigure.
#[derive(Debug, Clone)]
pub struct DeconfigureRequest {
    /// The package to deconfigure.
    pub pkg: Id<Package>,
    /// Why.
    pub reason: DeconfigureReason,
}

/// Result of asking whether one package can be deconfigured.
#[derive(Debug)]
pub enum DeconfigureOutcome {
    /// Queued for the orchestrator to act on.
    Queued(DeconfigureRequest),
    /// A force flag made deconfiguration unnecessary; proceed, no action
    /// required of the orchestrator.
    Forced {
        /// Message to log as a warning.
        why: String,
    },
    /// Not possible; the caller should treat the original problem as fatal.
    Impossible {
        /// Message explaining why.
        why: String,
    },
}

/// `try_deconfigure_can`: can `pkg` be deconfigured (or is the problem it
/// would resolve already forced away)?
///
/// `force_allows` is whether the *caller's* force class (`force-breaks` for
/// a [DeconfigureReason::Installation], `force-depends` for a
/// [DeconfigureReason::Removal]) is set for this dependency -- checked
/// first, since a forced dependency never needs deconfiguration at all.
pub fn try_deconfigure(
    db: &Database,
    pkg: Id<Package>,
    reason: DeconfigureReason,
    force_allows: bool,
    auto_deconfigure: bool,
    force: ForceFlags,
    why: &str,
) -> DeconfigureOutcome {
    if force_allows {
        return DeconfigureOutcome::Forced { why: why.to_owned() };
    }
    if !auto_deconfigure {
        return DeconfigureOutcome::Impossible { why: why.to_owned() };
    }

    let candidate = db.package(pkg);
    if candidate.installed.essential && !force.contains(ForceFlags::REMOVE_ESSENTIAL) {
        let name = db.set(candidate.set()).name().to_owned();
        return DeconfigureOutcome::Impossible {
            why: format!("{name} is essential, will not deconfigure it"),
        };
    }

    DeconfigureOutcome::Queued(DeconfigureRequest { pkg, reason })
}

/// Every `Depends`/`Pre-Depends` clause (direct, or reached through one of
/// `fixbyrm`'s `Provides` edges) that isn't currently satisfied and would
/// stop `fixbyrm` from being removed.
fn blocking_reverse_dependents(db: &Database, fixbyrm: Id<Package>) -> Vec<Id<Package>> {
    let mut blocking = Vec::new();
    let mut visit_set = |set_id: Id<PackageSet>, blocking: &mut Vec<Id<Package>>| {
        for depref in &db.set(set_id).depended_installed {
            let dep = db.dependency(depref.dependency);
            if !matches!(dep.kind, DepKind::Depends | DepKind::PreDepends) {
                continue;
            }
            if !dep_is_ok(db, dep).ok {
                blocking.push(dep.up);
            }
        }
    };

    visit_set(db.package(fixbyrm).set(), &mut blocking);

    for dep_id in &db.package(fixbyrm).installed.dependencies {
        let dep = db.dependency(*dep_id);
        if dep.kind != DepKind::Provides {
            continue;
        }
        for alt in &dep.possibilities {
            visit_set(alt.target, &mut blocking);
        }
    }

    blocking
}

/// `check_conflict`'s removal-feasibility walk: can `fixbyrm` be removed in
/// favour of the package currently being installed? Returns the set of
/// reverse dependents that would need deconfiguring, or the first
/// unresolvable blocker.
pub fn plan_removal(
    db: &Database,
    fixbyrm: Id<Package>,
    auto_deconfigure: bool,
    force: ForceFlags,
) -> Result<Vec<DeconfigureRequest>, String> {
    let mut queued = Vec::new();
    for dependent in blocking_reverse_dependents(db, fixbyrm) {
        let why = format!(
            "{} depends on {}, which would be removed",
            db.set(db.package(dependent).set()).name(),
            db.set(db.package(fixbyrm).set()).name(),
        );
        match try_deconfigure(
            db,
            dependent,
            DeconfigureReason::Removal(fixbyrm),
            force.contains(ForceFlags::DEPENDS),
            auto_deconfigure,
            force,
            &why,
        ) {
            DeconfigureOutcome::Queued(req) => queued.push(req),
            DeconfigureOutcome::Forced { .. } => continue,
            DeconfigureOutcome::Impossible { why } => return Err(why),
        }
    }
    Ok(queued)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::Status;

    fn essential_pkg(db: &mut Database, name: &str) -> Id<Package> {
        let id = db.find_pkg(name, None);
        db.package_mut(id).status = Status::Installed;
        db.package_mut(id).installed.essential = true;
        id
    }

    #[test]
    fn essential_package_blocks_without_force() {
        let mut db = Database::new("amd64");
        let pkg = essential_pkg(&mut db, "dpkg");
        let outcome = try_deconfigure(
            &db,
            pkg,
            DeconfigureReason::Installation,
            false,
            true,
            ForceFlags::empty(),
            "would break dpkg",
        );
        assert!(matches!(outcome, DeconfigureOutcome::Impossible { .. }));
    }

    #[test]
    fn essential_package_allowed_when_forced() {
        let mut db = Database::new("amd64");
        let pkg = essential_pkg(&mut db, "dpkg");
        let outcome = try_deconfigure(
            &db,
            pkg,
            DeconfigureReason::Installation,
            false,
            true,
            ForceFlags::REMOVE_ESSENTIAL,
            "would break dpkg",
        );
        assert!(matches!(outcome, DeconfigureOutcome::Queued(_)));
    }

    #[test]
    fn force_allows_skips_auto_deconfigure_entirely() {
        let mut db = Database::new("amd64");
        let pkg = db.find_pkg("libfoo", None);
        db.package_mut(pkg).status = Status::Installed;
        let outcome = try_deconfigure(
            &db,
            pkg,
            DeconfigureReason::Installation,
            true,
            false,
            ForceFlags::empty(),
            "ignored",
        );
        assert!(matches!(outcome, DeconfigureOutcome::Forced { .. }));
    }

    #[test]
    fn without_auto_deconfigure_flag_nothing_can_be_queued() {
        let mut db = Database::new("amd64");
        let pkg = db.find_pkg("libfoo", None);
        db.package_mut(pkg).status = Status::Installed;
        let outcome = try_deconfigure(
            &db,
            pkg,
            DeconfigureReason::Installation,
            false,
            false,
            ForceFlags::empty(),
            "no auto-deconfigure",
        );
        assert!(matches!(outcome, DeconfigureOutcome::Impossible { .. }));
    }
}

// vim: foldmethod=marker
