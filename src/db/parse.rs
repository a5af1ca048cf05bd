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

//! Turns a [crate::control::RawParagraph] into a populated [Package]: the
//! `status`/`available` control-file grammar, dependency-clause parsing, and
//! `Conffiles:` parsing.
//!
//! Grounded on `lib/dpkg/fields.c`'s per-field parse functions (`f_status`,
//! `f_dependency`, `f_conffiles`, …) and the parser mode flags in
//! `dpkg-db.h`'s `enum parsedbflags`.

use std::str::FromStr;

use super::binmeta::ConfFile;
use super::database::Database;
use super::dependency::{DepKind, DepPossibility, Dependency, VersionRel};
use super::package::{EFlag, MultiArch, Package, Status, Want};
use crate::arch::Arch;
use crate::control::{Priority, RawParagraph};
use crate::interner::Id;
use crate::version::Version;

bitflags::bitflags! {
    /// Parser mode, equivalent to `dpkg`'s `enum parsedbflags`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ParseFlags: u8 {
        /// Populate `available` rather than `installed`.
        const RECORD_AVAILABLE = 1 << 0;
        /// Error out if a `Status:` field is seen.
        const REJECT_STATUS = 1 << 1;
        /// Don't overwrite `priority`/`section` if already set.
        const WEAK_CLASSIFICATION = 1 << 2;
        /// Ignore file-provenance fields if already set.
        const IGNORE_FILES = 1 << 3;
        /// Discard a paragraph whose version is older than what's recorded.
        const IGNORE_OLDER = 1 << 4;
        /// Relax a handful of checks, for transitioning to stricter parsing.
        const LAX_PARSER = 1 << 5;
    }
}

/// Everything that can go wrong turning a [RawParagraph] into a [Package].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A required field was missing entirely.
    #[error("{0} is missing")]
    MissingField(&'static str),

    /// A field's value didn't match the grammar expected for it.
    #[error("{field}: {message}")]
    Field {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of what went wrong.
        message: String,
    },

    /// `Status:` was seen under [ParseFlags::REJECT_STATUS].
    #[error("value for 'status' field not allowed in this context")]
    StatusNotAllowed,

    /// `Config-Version:` was seen under [ParseFlags::REJECT_STATUS].
    #[error("value for 'config-version' field not allowed in this context")]
    ConfigVersionNotAllowed,

    /// A name/value word wasn't one of the fixed set allowed for its field.
    #[error("'{value}' is not allowed for {field}")]
    NotAllowed {
        /// Name of the offending field.
        field: &'static str,
        /// The unrecognised word.
        value: String,
    },
}

fn want_from_word(word: &str) -> Option<Want> {
    Some(match word {
        "unknown" => Want::Unknown,
        "install" => Want::Install,
        "hold" => Want::Hold,
        "deinstall" => Want::Deinstall,
        "purge" => Want::Purge,
        _ => return None,
    })
}

fn eflag_from_word(word: &str) -> Option<EFlag> {
    Some(match word {
        "ok" => EFlag::empty(),
        "reinstreq" => EFlag::REINSTREQ,
        _ => return None,
    })
}

/// `priorityinfos`: unlike `want`/`status`, dpkg's own table has a
/// catch-all `other` entry for an administrator-defined priority string;
/// [Priority] has no such variant, so an unrecognised word is logged and
/// dropped rather than stored, per [ParseFlags::LAX_PARSER]-style leniency.
fn priority_from_word(word: &str) -> Option<Priority> {
    Some(match word {
        "required" => Priority::Required,
        "important" => Priority::Important,
        "standard" => Priority::Standard,
        "optional" => Priority::Optional,
        "extra" => Priority::Extra,
        _ => return None,
    })
}

fn status_from_word(word: &str) -> Option<Status> {
    Some(match word {
        "not-installed" => Status::NotInstalled,
        "config-files" => Status::ConfigFiles,
        "half-installed" => Status::HalfInstalled,
        "unpacked" => Status::Unpacked,
        "half-configured" => Status::HalfConfigured,
        "triggers-awaited" => Status::TriggersAwaited,
        "triggers-pending" => Status::TriggersPending,
        "installed" => Status::Installed,
        _ => return None,
    })
}

/// `f_status`: splits `"want eflag status"` into its three fixed-vocabulary
/// words.
fn parse_status_field(value: &str) -> Result<(Want, EFlag, Status), ParseError> {
    let mut words = value.split_whitespace();

    let want_word = words.next().ok_or(ParseError::MissingField("status"))?;
    let want = want_from_word(want_word).ok_or_else(|| ParseError::NotAllowed {
        field: "status",
        value: want_word.to_owned(),
    })?;

    let eflag_word = words.next().ok_or(ParseError::MissingField("status"))?;
    let eflag = eflag_from_word(eflag_word).ok_or_else(|| ParseError::NotAllowed {
        field: "status",
        value: eflag_word.to_owned(),
    })?;

    let status_word = words.next().ok_or(ParseError::MissingField("status"))?;
    let status = status_from_word(status_word).ok_or_else(|| ParseError::NotAllowed {
        field: "status",
        value: status_word.to_owned(),
    })?;

    Ok((want, eflag, status))
}

/// `f_conffiles`: one entry per continuation line, `PATH HASH [obsolete]`,
/// path canonicalised by stripping a leading `./` and re-adding the `/`
/// dpkg always stores conffile paths with.
fn parse_conffiles_field(value: &str) -> Result<Vec<ConfFile>, ParseError> {
    let mut out = vec![];
    for line in value.lines() {
        let line = line.trim_start_matches(' ');
        if line.is_empty() {
            continue;
        }
        let mut words: Vec<&str> = line.split(' ').filter(|w| !w.is_empty()).collect();
        if words.is_empty() {
            continue;
        }

        let obsolete = words.last() == Some(&"obsolete");
        if obsolete {
            words.pop();
        }
        let hash = words.pop().ok_or_else(|| ParseError::Field {
            field: "conffiles",
            message: format!("malformatted line '{line}'"),
        })?;
        if words.is_empty() {
            return Err(ParseError::Field {
                field: "conffiles",
                message: format!("malformatted line '{line}'"),
            });
        }
        let mut path = words.join(" ");
        while let Some(stripped) = path.strip_prefix("./") {
            path = stripped.to_owned();
        }
        path = path.trim_start_matches('/').to_owned();
        if path.is_empty() {
            return Err(ParseError::Field {
                field: "conffiles",
                message: "root or null directory is listed as a conffile".to_owned(),
            });
        }

        out.push(ConfFile {
            path: format!("/{path}"),
            hash: hash.to_owned(),
            obsolete,
        });
    }
    Ok(out)
}

/// A single parsed `name[:arch] (rel ver)?` alternative, before it is
/// threaded into the graph (it still names its target by string, not by
/// [Id]).
struct RawPossibility<'a> {
    name: &'a str,
    arch: Option<&'a str>,
    rel: VersionRel,
    version: &'a str,
}

/// Splits one possibility out of a `|`-joined alternatives list, consuming
/// `s` up to (but not including) the next unconsumed `|` or end of clause.
fn parse_possibility(s: &str) -> Result<RawPossibility<'_>, ParseError> {
    let s = s.trim();
    let name_end = s
        .find(|c: char| c.is_whitespace() || c == ':' || c == '(')
        .unwrap_or(s.len());
    let (name, rest) = s.split_at(name_end);
    if name.is_empty() {
        return Err(ParseError::Field {
            field: "dependency",
            message: "missing package name, or garbage where package name expected".to_owned(),
        });
    }

    let mut rest = rest.trim_start();
    let mut arch = None;
    if let Some(tail) = rest.strip_prefix(':') {
        let arch_end = tail
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(tail.len());
        let (arch_name, tail) = tail.split_at(arch_end);
        if arch_name.is_empty() {
            return Err(ParseError::Field {
                field: "dependency",
                message: "missing architecture name, or garbage where architecture name expected"
                    .to_owned(),
            });
        }
        arch = Some(arch_name);
        rest = tail.trim_start();
    }

    let (rel, version) = if let Some(tail) = rest.strip_prefix('(') {
        let close = tail.find(')').ok_or_else(|| ParseError::Field {
            field: "dependency",
            message: "version unterminated".to_owned(),
        })?;
        let inner = tail[..close].trim();
        let (rel, version) = if let Some(v) = inner.strip_prefix("<<") {
            (VersionRel::EarlierStrict, v)
        } else if let Some(v) = inner.strip_prefix("<=") {
            (VersionRel::EarlierEqual, v)
        } else if let Some(v) = inner.strip_prefix(">>") {
            (VersionRel::LaterStrict, v)
        } else if let Some(v) = inner.strip_prefix(">=") {
            (VersionRel::LaterEqual, v)
        } else if let Some(v) = inner.strip_prefix('=') {
            (VersionRel::Exact, v)
        } else if let Some(v) = inner.strip_prefix('<') {
            // Obsolete bare relations: accepted with a warning, interpreted
            // as the closed form.
            log::warn!("'<' is obsolete, use '<=' or '<<' instead");
            (VersionRel::EarlierEqual, v)
        } else if let Some(v) = inner.strip_prefix('>') {
            log::warn!("'>' is obsolete, use '>=' or '>>' instead");
            (VersionRel::LaterEqual, v)
        } else {
            (VersionRel::Exact, inner)
        };
        (rel, version.trim())
    } else {
        (VersionRel::None, "")
    };

    Ok(RawPossibility {
        name,
        arch,
        rel,
        version,
    })
}

/// `f_dependency`: comma-separated clauses, each a `|`-separated list of
/// possibilities.
fn parse_dependency_field(
    db: &mut Database,
    up: Id<Package>,
    kind: DepKind,
    value: &str,
) -> Result<Vec<Id<Dependency>>, ParseError> {
    let mut deps = vec![];
    for clause in value.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        let alternatives: Vec<&str> = clause.split('|').collect();
        if alternatives.len() > 1 && !kind.allows_alternatives() {
            return Err(ParseError::Field {
                field: "dependency",
                message: format!("alternatives ('|') not allowed in {kind:?} field"),
            });
        }

        let mut possibilities = vec![];
        for alt in alternatives {
            let raw = parse_possibility(alt)?;
            let target = db.find_set(raw.name);

            let (arch, arch_is_implicit) = match raw.arch {
                Some(name) => (Some(db.archs.find(name)), false),
                None if matches!(kind, DepKind::Conflicts | DepKind::Breaks | DepKind::Replaces) => {
                    (Some(db.archs.any()), true)
                }
                None => (None, true),
            };

            let version = if raw.version.is_empty() {
                Version::blank()
            } else {
                Version::from_str(raw.version).map_err(|e| ParseError::Field {
                    field: "dependency",
                    message: format!("error in version: {e}"),
                })?
            };

            if raw.rel != VersionRel::None && kind == DepKind::Provides && raw.rel != VersionRel::Exact {
                return Err(ParseError::Field {
                    field: "dependency",
                    message: "only exact versions may be used for Provides".to_owned(),
                });
            }

            possibilities.push(DepPossibility {
                target,
                version_rel: raw.rel,
                version,
                arch,
                arch_is_implicit,
            });
        }

        deps.push(db.alloc_dependency(Dependency {
            up,
            kind,
            possibilities,
        }));
    }
    Ok(deps)
}

/// Thread every [DepPossibility] of `dep` onto its target set's reverse
/// list, so the target can find every clause naming it without scanning
/// every dependency in the database.
fn link_dependency(db: &mut Database, dep: Id<Dependency>, available: bool) {
    let count = db.dependency(dep).possibilities.len();
    for index in 0..count {
        let target = db.dependency(dep).possibilities[index].target;
        let dep_ref = super::dependency::DepPossibilityRef { dependency: dep, index };
        let set = db.set_mut(target);
        if available {
            set.depended_available.push(dep_ref);
        } else {
            set.depended_installed.push(dep_ref);
        }
    }
}

const DEP_FIELDS: &[(&str, DepKind)] = &[
    ("Depends", DepKind::Depends),
    ("Pre-Depends", DepKind::PreDepends),
    ("Recommends", DepKind::Recommends),
    ("Suggests", DepKind::Suggests),
    ("Breaks", DepKind::Breaks),
    ("Conflicts", DepKind::Conflicts),
    ("Provides", DepKind::Provides),
    ("Replaces", DepKind::Replaces),
    ("Enhances", DepKind::Enhances),
];

/// Recognised non-dependency, non-status fields, so leftovers fall through
/// to `unknown_fields` rather than being silently dropped.
const KNOWN_SCALAR_FIELDS: &[&str] = &[
    "Package",
    "Status",
    "Config-Version",
    "Version",
    "Architecture",
    "Multi-Arch",
    "Essential",
    "Maintainer",
    "Description",
    "Source",
    "Installed-Size",
    "Origin",
    "Bugs",
    "Priority",
    "Section",
    "Conffiles",
    "Triggers-Awaited",
    "Triggers-Pending",
    "Filename",
    "Size",
    "MD5sum",
];

/// Parse one [RawParagraph] into the [Package] it describes, creating or
/// updating the instance in `db`. Returns the [Id] of the instance that was
/// populated.
///
/// Mirrors `parsedb()`'s per-paragraph body: read `Package`/`Architecture`
/// to resolve which [Package] this describes, dispatch every other field
/// through its `f_*`-equivalent, then link the freshly parsed dependency
/// graph into the database.
pub fn parse_paragraph_into(
    db: &mut Database,
    paragraph: &RawParagraph,
    flags: ParseFlags,
) -> Result<Id<Package>, ParseError> {
    let name = paragraph
        .field("Package")
        .next()
        .ok_or(ParseError::MissingField("Package"))?
        .value
        .clone();

    let arch_field = paragraph.field("Architecture").next();
    let arch: Option<Arch> = match arch_field {
        Some(f) if !f.value.is_empty() => Some(db.archs.find(&f.value)),
        _ => None,
    };

    let pkg_id = db.find_pkg(&name, arch.as_ref());

    let available = flags.contains(ParseFlags::RECORD_AVAILABLE);

    if let Some(status_field) = paragraph.field("Status").next() {
        if flags.contains(ParseFlags::REJECT_STATUS) {
            return Err(ParseError::StatusNotAllowed);
        }
        if !available {
            let (want, eflag, status) = parse_status_field(&status_field.value)?;
            let pkg = db.package_mut(pkg_id);
            pkg.want = want;
            pkg.eflag = eflag;
            pkg.status = status;
        }
    }

    if let Some(cv_field) = paragraph.field("Config-Version").next() {
        if flags.contains(ParseFlags::REJECT_STATUS) {
            return Err(ParseError::ConfigVersionNotAllowed);
        }
        if !available {
            let version = Version::from_str(&cv_field.value).map_err(|e| ParseError::Field {
                field: "Config-Version",
                message: e.to_string(),
            })?;
            db.package_mut(pkg_id).configversion = version;
        }
    }

    if let Some(priority_field) = paragraph.field("Priority").next() {
        let skip = flags.contains(ParseFlags::WEAK_CLASSIFICATION)
            && db.package(pkg_id).priority.is_some();
        if !skip {
            match priority_from_word(&priority_field.value) {
                Some(priority) => db.package_mut(pkg_id).priority = Some(priority),
                None => log::warn!("'{}' is not a known priority, ignoring", priority_field.value),
            }
        }
    }

    if let Some(section_field) = paragraph.field("Section").next() {
        let skip = flags.contains(ParseFlags::WEAK_CLASSIFICATION)
            && db.package(pkg_id).section.is_some();
        if !skip && !section_field.value.is_empty() {
            db.package_mut(pkg_id).section = Some(section_field.value.clone());
        }
    }

    if let Some(trig_awaited) = paragraph.field("Triggers-Awaited").next() {
        db.package_mut(pkg_id).trigger_awaited = trig_awaited
            .value
            .split_whitespace()
            .map(str::to_owned)
            .collect();
    }
    if let Some(trig_pending) = paragraph.field("Triggers-Pending").next() {
        db.package_mut(pkg_id).trigger_pending = trig_pending
            .value
            .split_whitespace()
            .map(str::to_owned)
            .collect();
    }

    let mut dep_ids = vec![];
    for (field_name, kind) in DEP_FIELDS {
        for field in paragraph.field(field_name) {
            dep_ids.extend(parse_dependency_field(db, pkg_id, *kind, &field.value)?);
        }
    }
    for dep in &dep_ids {
        link_dependency(db, *dep, available);
    }

    let bin = if available {
        &mut db.package_mut(pkg_id).available
    } else {
        &mut db.package_mut(pkg_id).installed
    };
    if let Some(arch) = arch {
        bin.arch = Some(arch);
    }
    if let Some(f) = paragraph.field("Version").next() {
        bin.version = Version::from_str(&f.value).map_err(|e| ParseError::Field {
            field: "Version",
            message: e.to_string(),
        })?;
    }
    if let Some(f) = paragraph.field("Multi-Arch").next() {
        bin.multiarch = match f.value.as_str() {
            "no" => MultiArch::No,
            "same" => MultiArch::Same,
            "allowed" => MultiArch::Allowed,
            "foreign" => MultiArch::Foreign,
            other => {
                return Err(ParseError::NotAllowed {
                    field: "Multi-Arch",
                    value: other.to_owned(),
                })
            }
        };
    }
    if let Some(f) = paragraph.field("Essential").next() {
        bin.essential = match f.value.as_str() {
            "yes" => true,
            "no" => false,
            other => {
                return Err(ParseError::NotAllowed {
                    field: "Essential",
                    value: other.to_owned(),
                })
            }
        };
    }
    if let Some(f) = paragraph.field("Maintainer").next() {
        bin.maintainer = Some(f.value.clone());
    }
    if let Some(f) = paragraph.field("Description").next() {
        bin.description = Some(f.value.clone());
    }
    if let Some(f) = paragraph.field("Source").next() {
        bin.source = Some(f.value.clone());
    }
    if let Some(f) = paragraph.field("Installed-Size").next() {
        bin.installed_size = Some(f.value.trim().parse().map_err(|_| ParseError::Field {
            field: "Installed-Size",
            message: format!("'{}' is not a number", f.value),
        })?);
    }
    if let Some(f) = paragraph.field("Origin").next() {
        bin.origin = Some(f.value.clone());
    }
    if let Some(f) = paragraph.field("Bugs").next() {
        bin.bugs = Some(f.value.clone());
    }
    if let Some(f) = paragraph.field("Size").next() {
        if !flags.contains(ParseFlags::IGNORE_FILES) {
            bin.file_size = Some(f.value.trim().parse().map_err(|_| ParseError::Field {
                field: "Size",
                message: format!("'{}' is not a number", f.value),
            })?);
        }
    }
    if let Some(f) = paragraph.field("MD5sum").next() {
        if !flags.contains(ParseFlags::IGNORE_FILES) {
            bin.file_md5sum = Some(f.value.clone());
        }
    }
    if let Some(f) = paragraph.field("Conffiles").next() {
        bin.conffiles = parse_conffiles_field(&f.value)?;
    }
    bin.dependencies = dep_ids;

    for field in paragraph.iter() {
        if !KNOWN_SCALAR_FIELDS.contains(&field.key.as_str())
            && !DEP_FIELDS.iter().any(|(name, _)| *name == field.key)
        {
            bin.unknown_fields.push((field.key.clone(), field.value.clone()));
        }
    }

    Ok(pkg_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::control::RawParagraph;

    fn parse(db: &mut Database, text: &str, flags: ParseFlags) -> Id<Package> {
        let para = RawParagraph::parse(text).unwrap();
        parse_paragraph_into(db, &para, flags).unwrap()
    }

    #[test]
    fn status_paragraph_sets_want_and_status() {
        let mut db = Database::new("amd64");
        let id = parse(
            &mut db,
            "Package: hello\nStatus: install ok installed\nVersion: 1.0-1\nArchitecture: amd64\n",
            ParseFlags::empty(),
        );
        let pkg = db.package(id);
        assert_eq!(pkg.want, Want::Install);
        assert_eq!(pkg.status, Status::Installed);
        assert_eq!(pkg.installed.version, Version::from_str("1.0-1").unwrap());
    }

    #[test]
    fn available_paragraph_never_touches_status() {
        let mut db = Database::new("amd64");
        let id = parse(
            &mut db,
            "Package: hello\nVersion: 2.0-1\n",
            ParseFlags::RECORD_AVAILABLE,
        );
        let pkg = db.package(id);
        assert_eq!(pkg.status, Status::NotInstalled);
        assert_eq!(pkg.available.version, Version::from_str("2.0-1").unwrap());
    }

    #[test]
    fn dependency_field_parses_alternatives() {
        let mut db = Database::new("amd64");
        let id = parse(
            &mut db,
            "Package: editor\nDepends: libfoo (>= 1.0) | libfoo-compat\n",
            ParseFlags::RECORD_AVAILABLE,
        );
        let pkg = db.package(id);
        assert_eq!(pkg.available.dependencies.len(), 1);
        let dep = db.dependency(pkg.available.dependencies[0]);
        assert_eq!(dep.kind, DepKind::Depends);
        assert_eq!(dep.possibilities.len(), 2);
        assert_eq!(dep.possibilities[0].version_rel, VersionRel::LaterEqual);
    }

    #[test]
    fn conflicts_rejects_alternatives() {
        let mut db = Database::new("amd64");
        let para = RawParagraph::parse("Package: a\nConflicts: b | c\n").unwrap();
        assert!(parse_paragraph_into(&mut db, &para, ParseFlags::RECORD_AVAILABLE).is_err());
    }

    #[test]
    fn conflicts_gets_implicit_any_arch() {
        let mut db = Database::new("amd64");
        let id = parse(
            &mut db,
            "Package: a\nConflicts: b\n",
            ParseFlags::RECORD_AVAILABLE,
        );
        let pkg = db.package(id);
        let dep = db.dependency(pkg.available.dependencies[0]);
        assert!(dep.possibilities[0].arch_is_implicit);
        assert!(dep.possibilities[0].arch.is_some());
    }

    #[test]
    fn conffiles_parses_path_hash_and_obsolete() {
        let mut db = Database::new("amd64");
        let id = parse(
            &mut db,
            "Package: hello\nConffiles:\n /etc/hello.conf abc123\n /etc/old.conf def456 obsolete\n",
            ParseFlags::empty(),
        );
        let pkg = db.package(id);
        assert_eq!(pkg.installed.conffiles.len(), 2);
        assert_eq!(pkg.installed.conffiles[0].path, "/etc/hello.conf");
        assert_eq!(pkg.installed.conffiles[0].hash, "abc123");
        assert!(!pkg.installed.conffiles[0].obsolete);
        assert!(pkg.installed.conffiles[1].obsolete);
    }

    #[test]
    fn reverse_dependency_list_is_threaded() {
        let mut db = Database::new("amd64");
        parse(
            &mut db,
            "Package: editor\nDepends: libfoo\n",
            ParseFlags::RECORD_AVAILABLE,
        );
        let libfoo = db.find_set("libfoo");
        assert_eq!(db.set(libfoo).depended_available.len(), 1);
    }
}

// vim: foldmethod=marker
