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

use super::package::Package;
use super::PackageSet;
use crate::arch::Arch;
use crate::interner::Id;
use crate::version::Version;

/// Which field a [Dependency] was parsed from. Order matches `dpkg`'s own
/// `enum deptype`, not alphabetical, since a few call sites care about
/// relative strength (e.g. `Pre-Depends` outranks `Depends`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepKind {
    /// `Suggests:`
    Suggests,
    /// `Recommends:`
    Recommends,
    /// `Depends:`
    Depends,
    /// `Pre-Depends:`
    PreDepends,
    /// `Breaks:`
    Breaks,
    /// `Conflicts:`
    Conflicts,
    /// `Provides:`
    Provides,
    /// `Replaces:`
    Replaces,
    /// `Enhances:`
    Enhances,
}

impl DepKind {
    /// Alternatives (`a | b`) are only meaningful for the four "positive"
    /// relations; the others describe a single unwanted package each.
    pub fn allows_alternatives(&self) -> bool {
        matches!(
            self,
            DepKind::Suggests | DepKind::Recommends | DepKind::Depends | DepKind::PreDepends
        )
    }

    /// `Conflicts`/`Breaks` are violated when an alternative matches,
    /// rather than satisfied.
    pub fn is_negative(&self) -> bool {
        matches!(self, DepKind::Breaks | DepKind::Conflicts)
    }
}

/// Version relation carried by a [DepPossibility].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionRel {
    /// No version constraint; any version of the target satisfies this.
    None,
    /// `<=`
    EarlierEqual,
    /// `<<`
    EarlierStrict,
    /// `>=`
    LaterEqual,
    /// `>>`
    LaterStrict,
    /// `=`
    Exact,
}

/// One alternative within a [Dependency]'s clause: `name[:arch] (rel ver)`.
#[derive(Clone, Debug)]
pub struct DepPossibility {
    /// The package set this alternative names.
    pub target: Id<PackageSet>,
    /// Version relation, or [VersionRel::None] if unconstrained.
    pub version_rel: VersionRel,
    /// Version operand of [Self::version_rel]; meaningless when it is
    /// [VersionRel::None].
    pub version: Version,

    /// `None` means "unqualified": for `Conflicts`/`Breaks`/`Replaces` this
    /// is recorded as an *implicit* `any` (see [Self::arch_is_implicit]);
    /// for every other kind it means "same architecture as the depending
    /// package".
    pub arch: Option<Arch>,
    /// `true` if [Self::arch] is `any` by implication (an unqualified name
    /// on a `Conflicts`/`Breaks`/`Replaces` clause) rather than an explicit
    /// `:any` in the source text.
    pub arch_is_implicit: bool,
}

/// A reference to one [DepPossibility] living inside some [Dependency]'s
/// alternatives list. Stands in for `dpkg`'s `deppossi::{rev_next,rev_prev}`
/// intrusive list pointers: the arena has no per-object address, so the
/// reverse-dependency chains in [PackageSet] store `(dependency, index)`
/// pairs instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepPossibilityRef {
    /// The owning [Dependency].
    pub dependency: Id<Dependency>,
    /// Index into [Dependency::possibilities].
    pub index: usize,
}

/// One `Depends:`-family clause: a non-empty, ordered list of alternatives
/// that must be jointly treated as a single constraint (any one alternative
/// satisfies the whole clause, except for the negative kinds, where any one
/// match violates it).
#[derive(Clone, Debug)]
pub struct Dependency {
    /// The package instance this clause was parsed from.
    pub up: Id<Package>,
    /// Which control-file field this clause came from.
    pub kind: DepKind,
    /// Non-empty list of `|`-separated alternatives.
    pub possibilities: Vec<DepPossibility>,
}

// vim: foldmethod=marker
