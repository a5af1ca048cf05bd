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

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Classification of an [Arch], decided the moment it is first interned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArchKind {
    /// The architecture the registry was built with.
    Native,

    /// A known, legally-formed architecture name other than the native one.
    Foreign,

    /// The `all` singleton -- architecture-independent content.
    All,

    /// The `any` singleton -- matches every concrete architecture.
    Wildcard,

    /// The empty-name singleton, returned for a missing/unset architecture.
    None,

    /// A name that was looked up but fails [ArchRegistry::validate_name].
    Illegal,

    /// A legally-formed name the registry has not classified any further.
    Unknown,
}

impl ArchKind {
    /// True for the [ArchKind::Native] singleton.
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// True for the `any` wildcard singleton.
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// True for the `all` singleton.
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// True for a name that failed validation.
    pub const fn is_illegal(&self) -> bool {
        matches!(self, Self::Illegal)
    }
}

impl fmt::Display for ArchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "native",
            Self::Foreign => "foreign",
            Self::All => "all",
            Self::Wildcard => "wildcard",
            Self::None => "none",
            Self::Illegal => "illegal",
            Self::Unknown => "unknown",
        })
    }
}

struct ArchData {
    name: String,
    kind: Cell<ArchKind>,
}

/// An interned architecture name.
///
/// `Arch` is a cheap, `Rc`-backed handle; cloning it does not allocate, and
/// two handles returned by the same [ArchRegistry] for the same name are
/// pointer-identical -- compare them with [Arch::is_same] (or `==`, which is
/// defined the same way) rather than comparing [Arch::name] strings.
#[derive(Clone, Debug)]
pub struct Arch(Rc<ArchData>);

impl Arch {
    fn new(name: impl Into<String>, kind: ArchKind) -> Self {
        Self(Rc::new(ArchData {
            name: name.into(),
            kind: Cell::new(kind),
        }))
    }

    /// The architecture name, e.g. `"amd64"`, or the empty string for the
    /// `none` singleton.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// This handle's [ArchKind].
    pub fn kind(&self) -> ArchKind {
        self.0.kind.get()
    }

    /// True if `self` and `other` are the same interned entry.
    pub fn is_same(&self, other: &Arch) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// True for `all`, `any`, and `none` -- the singletons that don't name a
    /// concrete, buildable architecture.
    pub fn is_special(&self) -> bool {
        matches!(
            self.kind(),
            ArchKind::All | ArchKind::Wildcard | ArchKind::None
        )
    }

    /// True if `self` satisfies an architecture qualifier of `other`: equal
    /// architectures always match, and the `any` wildcard matches every
    /// non-special architecture.
    pub fn is(&self, other: &Arch) -> bool {
        if self.is_same(other) {
            return true;
        }
        other.kind().is_wildcard() && !self.is_special()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PartialEq for Arch {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for Arch {}

impl Hash for Arch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

struct Inner {
    by_name: HashMap<String, Arch>,
    list: Vec<Arch>,
    none: Arch,
    all: Arch,
    any: Arch,
    native: Arch,
}

impl Inner {
    fn builtins(native_name: &str) -> (HashMap<String, Arch>, Vec<Arch>, Arch, Arch, Arch, Arch) {
        let none = Arch::new("", ArchKind::None);
        let any = Arch::new("any", ArchKind::Wildcard);
        let all = Arch::new("all", ArchKind::All);
        let native = Arch::new(native_name, ArchKind::Native);

        let mut by_name = HashMap::new();
        by_name.insert(String::new(), none.clone());
        by_name.insert("any".to_owned(), any.clone());
        by_name.insert("all".to_owned(), all.clone());
        by_name.insert(native_name.to_owned(), native.clone());

        // dpkg's own list order: native, all, any.
        let list = vec![native.clone(), all.clone(), any.clone()];

        (by_name, list, none, all, any, native)
    }
}

/// Registry of every architecture name seen during a process's lifetime.
///
/// Three singletons (`none`, `all`, `any`) plus the native architecture
/// always exist; every other name is allocated lazily the first time
/// [ArchRegistry::find] sees it and classified [ArchKind::Illegal] or
/// [ArchKind::Unknown] depending on [ArchRegistry::validate_name].
pub struct ArchRegistry {
    inner: RefCell<Inner>,
}

impl ArchRegistry {
    /// Build a registry whose native architecture is `native_name` (e.g.
    /// `"amd64"`).
    pub fn new(native_name: impl AsRef<str>) -> Self {
        let (by_name, list, none, all, any, native) = Inner::builtins(native_name.as_ref());
        Self {
            inner: RefCell::new(Inner {
                by_name,
                list,
                none,
                all,
                any,
                native,
            }),
        }
    }

    /// Intern `name`, allocating a new entry classified [ArchKind::Illegal]
    /// or [ArchKind::Unknown] if it has not been seen before. An empty name
    /// returns the `none` singleton.
    pub fn find(&self, name: &str) -> Arch {
        if name.is_empty() {
            return self.none();
        }

        let mut inner = self.inner.borrow_mut();
        if let Some(arch) = inner.by_name.get(name) {
            return arch.clone();
        }

        let kind = if Self::validate_name(name).is_some() {
            ArchKind::Illegal
        } else {
            ArchKind::Unknown
        };
        let arch = Arch::new(name, kind);
        inner.by_name.insert(name.to_owned(), arch.clone());
        inner.list.push(arch.clone());
        arch
    }

    /// Convenience over [ArchRegistry::find] for an optional architecture
    /// name, e.g. a missing `Architecture:` field.
    pub fn find_opt(&self, name: Option<&str>) -> Arch {
        self.find(name.unwrap_or(""))
    }

    /// The native architecture singleton.
    pub fn native(&self) -> Arch {
        self.inner.borrow().native.clone()
    }

    /// The `all` singleton.
    pub fn all(&self) -> Arch {
        self.inner.borrow().all.clone()
    }

    /// The `any` wildcard singleton.
    pub fn any(&self) -> Arch {
        self.inner.borrow().any.clone()
    }

    /// The empty-name `none` singleton.
    pub fn none(&self) -> Arch {
        self.inner.borrow().none.clone()
    }

    /// Every interned architecture, head first: native, then all, then any,
    /// then every other name in discovery order.
    pub fn list(&self) -> Vec<Arch> {
        self.inner.borrow().list.clone()
    }

    /// `dpkg --add-architecture`: intern `name` if it isn't already known,
    /// and mark it [ArchKind::Foreign] so [ArchRegistry::foreign] reports
    /// it. Re-adding an already-foreign (or the native) architecture is a
    /// no-op beyond interning.
    pub fn add_foreign(&self, name: &str) -> Arch {
        let arch = self.find(name);
        if matches!(arch.kind(), ArchKind::Unknown) {
            arch.0.kind.set(ArchKind::Foreign);
        }
        arch
    }

    /// Every architecture previously passed to [ArchRegistry::add_foreign],
    /// in the order they were added.
    pub fn foreign(&self) -> Vec<Arch> {
        self.inner
            .borrow()
            .list
            .iter()
            .filter(|a| a.kind() == ArchKind::Foreign)
            .cloned()
            .collect()
    }

    /// Truncate the registry back to its three singletons plus the native
    /// architecture, as if freshly constructed.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        let native_name = inner.native.name().to_owned();
        let (by_name, list, none, all, any, native) = Inner::builtins(&native_name);
        *inner = Inner {
            by_name,
            list,
            none,
            all,
            any,
            native,
        };
    }

    /// Validate an architecture name against dpkg's grammar: must start with
    /// an alphanumeric, and contain only alphanumerics and `-` thereafter.
    /// Returns `None` if valid, or `Some(message)` describing the violation.
    pub fn validate_name(name: &str) -> Option<String> {
        let mut chars = name.chars();
        match chars.next() {
            None => return Some("may not be empty string".to_owned()),
            Some(c) if !c.is_ascii_alphanumeric() => {
                return Some("must start with an alphanumeric".to_owned())
            }
            Some(_) => {}
        }
        for c in chars {
            if !c.is_ascii_alphanumeric() && c != '-' {
                return Some(format!(
                    "character `{c}' not allowed (only letters, digits and characters `-')"
                ));
            }
        }
        None
    }
}


// vim: foldmethod=marker
