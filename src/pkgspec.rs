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

//! Package specifiers: `name[:arch]`, with optional glob matching, the way
//! `dpkg`'s command-line front-ends accept a package argument.
//!
//! A [PkgSpec] is parsed once and can then either resolve a single package
//! instance ([PkgSpec::find_pkg]) or enumerate every instance it matches
//! ([PkgSpec::matches]). The two are mutually exclusive: a pattern spec (or
//! one that defaults a missing `:arch` to a wildcard) can only be iterated,
//! matching `pkg_spec_find_pkg`'s own `internerr` guard against exactly that
//! combination.

use crate::arch::{Arch, ArchKind, ArchRegistry};
use crate::db::{Database, Package, PackageSet, Status};
use crate::interner::Id;

bitflags::bitflags! {
    /// Parsing and matching behaviour for a [PkgSpec], equivalent to
    /// `dpkg`'s `enum pkg_spec_flags`. There is no Rust equivalent of
    /// `psf_no_copy`: a [PkgSpec] always owns its name, since there's no
    /// idiomatic substitute for "borrow the caller's buffer for my
    /// lifetime" that's worth the lifetime parameter it would add to every
    /// caller.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PkgSpecFlags: u8 {
        /// Don't fail on an illegal package or architecture name; leave the
        /// diagnostic in [PkgSpec::is_illegal] instead.
        const NO_CHECK = 1 << 0;
        /// Detect `*`, `?`, `[...]` and `\` as glob metacharacters in either
        /// half of the specifier.
        const PATTERNS = 1 << 1;
        /// Matching excludes instances in [Status::NotInstalled].
        const SKIP_NOT_INSTALLED = 1 << 2;
        /// Matching excludes instances in [Status::ConfigFiles].
        const SKIP_CONFIG_FILES = 1 << 3;
        /// A missing `:arch` means "native, `all`, or unqualified only".
        const DEF_NATIVE = 1 << 4;
        /// A missing `:arch` means "any architecture".
        const DEF_WILDCARD = 1 << 5;
    }
}

/// Error constructing or resolving a [PkgSpec].
#[derive(Debug, thiserror::Error)]
pub enum PkgSpecError {
    /// The package or architecture name in the specifier is malformed, and
    /// [PkgSpecFlags::NO_CHECK] was not given.
    #[error("{0}")]
    Illegal(String),
    /// [PkgSpec::find_pkg] was called on a specifier that can only be
    /// iterated (a pattern, or one defaulting a missing `:arch` to a
    /// wildcard).
    #[error("package specifier is a pattern; use PkgSpec::matches instead")]
    IsPattern,
}

/// A parsed `name[:arch]` package specifier.
///
/// Two independent "is this a glob" bits are tracked, one per half, since a
/// specifier may pattern-match its name, its architecture, both, or
/// neither. [PkgSpec::is_pattern] folds both together with the
/// [PkgSpecFlags::DEF_WILDCARD] case, which also requires iteration.
#[derive(Debug, Clone)]
pub struct PkgSpec {
    name: String,
    arch: Arch,
    flags: PkgSpecFlags,
    name_is_pattern: bool,
    arch_is_pattern: bool,
}

impl PkgSpec {
    /// Parse `spec` (`name` or `name:arch`) under `flags`, interning any
    /// architecture name against `archs`.
    ///
    /// Fails with [PkgSpecError::Illegal] unless [PkgSpecFlags::NO_CHECK] is
    /// set, in which case the illegal name is kept and surfaces later from
    /// [PkgSpec::is_illegal].
    pub fn parse(archs: &ArchRegistry, flags: PkgSpecFlags, spec: &str) -> Result<Self, PkgSpecError> {
        let (name, arch_name) = match spec.split_once(':') {
            Some((name, arch)) => (name, Some(arch)),
            None => (spec, None),
        };
        let arch = archs.find_opt(arch_name);

        let name_is_pattern = flags.contains(PkgSpecFlags::PATTERNS) && has_glob_metachars(name);
        let arch_is_pattern = flags.contains(PkgSpecFlags::PATTERNS) && has_glob_metachars(arch.name());

        let spec = PkgSpec {
            name: name.to_owned(),
            arch,
            flags,
            name_is_pattern,
            arch_is_pattern,
        };

        if let Some(msg) = spec.is_illegal() {
            if !flags.contains(PkgSpecFlags::NO_CHECK) {
                return Err(PkgSpecError::Illegal(msg));
            }
        }
        Ok(spec)
    }

    /// True if this specifier can only be resolved by iteration: either
    /// half is a glob, or a missing `:arch` defaults to "any architecture".
    pub fn is_pattern(&self) -> bool {
        self.name_is_pattern
            || self.arch_is_pattern
            || (self.flags.contains(PkgSpecFlags::DEF_WILDCARD) && matches!(self.arch.kind(), ArchKind::None))
    }

    /// A description of why this specifier is malformed, or `None` if it's
    /// legal. The illegal half is whichever one isn't itself a pattern --
    /// a glob is never checked against the name grammar.
    pub fn is_illegal(&self) -> Option<String> {
        if !self.name_is_pattern {
            if let Some(msg) = validate_pkg_name(&self.name) {
                return Some(format!(
                    "package name in specifier '{}{}' is illegal: {}",
                    self.name,
                    arch_suffix(&self.arch),
                    msg
                ));
            }
        }
        if !self.arch_is_pattern {
            if let ArchKind::Illegal = self.arch.kind() {
                return Some(format!(
                    "architecture name in specifier '{}{}' is illegal: {}",
                    self.name,
                    arch_suffix(&self.arch),
                    ArchRegistry::validate_name(self.arch.name()).unwrap_or_default(),
                ));
            }
        }
        None
    }

    /// Resolve a single, concrete instance, per spec's "else look up the
    /// set directly" rule: never allocates beyond what
    /// [Database::find_pkg] would for a normal lookup.
    ///
    /// Fails with [PkgSpecError::IsPattern] if [PkgSpec::is_pattern] is
    /// true -- use [PkgSpec::matches] for those instead, matching
    /// `pkg_spec_find_pkg`'s own refusal to mix the two modes.
    pub fn find_pkg(&self, db: &mut Database) -> Result<Option<Id<Package>>, PkgSpecError> {
        if self.is_pattern() {
            return Err(PkgSpecError::IsPattern);
        }
        let id = db.find_pkg(&self.name, Some(&self.arch));
        Ok(self.match_flags(db.package(id)).then_some(id))
    }

    /// Every instance this specifier matches: if the name is a glob, every
    /// set is considered; otherwise only the (looked-up-or-created) set
    /// named, matching `pkg_spec_iter_start`/`pkg_spec_iter_next_pkg`'s own
    /// "look up by name, else walk every set" split. Within a matching
    /// set, its architecture chain is walked and each instance checked
    /// against the architecture predicate and the skip flags.
    pub fn matches(&self, db: &mut Database) -> Vec<Id<Package>> {
        let target_sets: Vec<Id<PackageSet>> = if self.name_is_pattern {
            db.iter_sets()
                .filter(|(_, set)| self.match_pkgname(set.name()))
                .map(|(id, _)| id)
                .collect()
        } else {
            vec![db.find_set(&self.name)]
        };

        let mut out = Vec::new();
        for set_id in target_sets {
            let mut cursor = Some(db.set(set_id).head());
            while let Some(id) = cursor {
                let pkg = db.package(id);
                if self.match_flags(pkg) && self.match_arch(pkg.installed.arch.as_ref()) {
                    out.push(id);
                }
                cursor = pkg.arch_next();
            }
        }
        out
    }

    fn match_pkgname(&self, name: &str) -> bool {
        if self.name_is_pattern {
            glob_matches(&self.name, name)
        } else {
            self.name == name
        }
    }

    fn match_arch(&self, arch: Option<&Arch>) -> bool {
        if self.arch_is_pattern {
            let name = arch.map(Arch::name).unwrap_or("");
            return glob_matches(self.arch.name(), name);
        }
        if !matches!(self.arch.kind(), ArchKind::None) {
            return match arch {
                Some(a) => self.arch.is_same(a),
                None => false,
            };
        }

        match (
            self.flags.contains(PkgSpecFlags::DEF_NATIVE),
            self.flags.contains(PkgSpecFlags::DEF_WILDCARD),
        ) {
            (true, false) => match arch {
                Some(a) => matches!(a.kind(), ArchKind::Native | ArchKind::All),
                None => true,
            },
            (false, true) => true,
            _ => panic!("PkgSpec must set exactly one of DEF_NATIVE or DEF_WILDCARD"),
        }
    }

    fn match_flags(&self, pkg: &Package) -> bool {
        if self.flags.contains(PkgSpecFlags::SKIP_NOT_INSTALLED) && pkg.status == Status::NotInstalled {
            return false;
        }
        if self.flags.contains(PkgSpecFlags::SKIP_CONFIG_FILES) && pkg.status == Status::ConfigFiles {
            return false;
        }
        true
    }
}

fn arch_suffix(arch: &Arch) -> String {
    if matches!(arch.kind(), ArchKind::None) {
        String::new()
    } else {
        format!(":{}", arch.name())
    }
}

fn has_glob_metachars(s: &str) -> bool {
    s.contains(['*', '?', '[', '\\'])
}

fn glob_matches(pattern: &str, text: &str) -> bool {
    glob::Pattern::new(pattern).map(|p| p.matches(text)).unwrap_or(false)
}

/// Validate a package name against Debian's naming grammar: lowercase
/// letters, digits, `+`, `-` and `.`, starting with an alphanumeric. There
/// is no filtered copy of `pkg_name_is_illegal`'s implementation in this
/// crate's corpus, so this follows Debian Policy §5.6.7's grammar directly.
fn validate_pkg_name(name: &str) -> Option<String> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Some("may not be empty string".to_owned()),
        Some(c) if !c.is_ascii_alphanumeric() => {
            return Some("must start with an alphanumeric".to_owned())
        }
        Some(_) => {}
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            return Some("uppercase characters are not allowed".to_owned());
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return Some(format!(
                "character `{c}' not allowed (only lowercase letters, digits and characters `-+.')"
            ));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_splits_name_and_arch() {
        let archs = ArchRegistry::new("amd64");
        let spec = PkgSpec::parse(&archs, PkgSpecFlags::DEF_NATIVE, "hello:i386").unwrap();
        assert!(!spec.is_pattern());
        assert_eq!(spec.arch.name(), "i386");
    }

    #[test]
    fn no_arch_with_def_wildcard_is_a_pattern() {
        let archs = ArchRegistry::new("amd64");
        let spec = PkgSpec::parse(&archs, PkgSpecFlags::DEF_WILDCARD, "hello").unwrap();
        assert!(spec.is_pattern());
        assert!(spec.find_pkg(&mut Database::new("amd64")).is_err());
    }

    #[test]
    fn illegal_name_fails_without_no_check() {
        let archs = ArchRegistry::new("amd64");
        assert!(PkgSpec::parse(&archs, PkgSpecFlags::empty(), "Hello World").is_err());
        let lax = PkgSpec::parse(&archs, PkgSpecFlags::NO_CHECK, "Hello World").unwrap();
        assert!(lax.is_illegal().is_some());
    }

    #[test]
    fn find_pkg_resolves_concrete_instance() {
        let archs = ArchRegistry::new("amd64");
        let mut db = Database::new("amd64");
        db.find_pkg("hello", None);

        let spec = PkgSpec::parse(&archs, PkgSpecFlags::DEF_NATIVE, "hello").unwrap();
        let found = spec.find_pkg(&mut db).unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn matches_filters_by_glob_name() {
        let archs = ArchRegistry::new("amd64");
        let mut db = Database::new("amd64");
        db.find_pkg("libfoo", None);
        db.find_pkg("libbar", None);

        let spec = PkgSpec::parse(&archs, PkgSpecFlags::PATTERNS | PkgSpecFlags::DEF_NATIVE, "lib*").unwrap();
        assert!(spec.is_pattern());
        assert_eq!(spec.matches(&mut db).len(), 2);
    }

    #[test]
    fn matches_skips_not_installed_when_flagged() {
        let archs = ArchRegistry::new("amd64");
        let mut db = Database::new("amd64");
        db.find_pkg("hello", None);

        let spec = PkgSpec::parse(
            &archs,
            PkgSpecFlags::DEF_NATIVE | PkgSpecFlags::SKIP_NOT_INSTALLED,
            "hello",
        )
        .unwrap();
        assert_eq!(spec.matches(&mut db).len(), 0);
    }

    #[test]
    fn def_native_excludes_foreign_arch_instance_on_iteration() {
        let archs = ArchRegistry::new("amd64");
        let mut db = Database::new("amd64");
        let i386 = db.archs.find("i386");
        let head = db.find_pkg("libfoo", None);
        db.find_pkg("libfoo", Some(&i386));

        let spec = PkgSpec::parse(&archs, PkgSpecFlags::DEF_NATIVE, "libfoo").unwrap();
        assert_eq!(spec.matches(&mut db), vec![head]);
    }
}

// vim: foldmethod=marker
