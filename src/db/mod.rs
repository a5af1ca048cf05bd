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

//! The `db` module is the in-core package database: the set of all known
//! package names (each a [PackageSet]), their per-architecture instances
//! ([Package]), and the dependency graph strung between them.
//!
//! The graph is cyclic -- a [Dependency] points at the [PackageSet] it
//! targets, and that set threads a reverse list back to every
//! [DepPossibility] that names it -- so every long-lived node lives in a
//! [crate::interner::Arena] and is addressed by [crate::interner::Id]
//! rather than by reference or `Rc`.

mod binmeta;
mod database;
mod dependency;
mod package;
mod parse;

pub use binmeta::{BinMeta, ConfFile};
pub use database::Database;
pub use dependency::{DepKind, DepPossibility, DepPossibilityRef, Dependency, VersionRel};
pub use package::{ClientData, EFlag, MultiArch, Package, PackageSet, Status, Want};
pub use parse::{parse_paragraph_into, ParseError, ParseFlags};

// vim: foldmethod=marker
