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

#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! `dpkg-core` is the in-core package database and archive-unpack engine of
//! a Debian-style binary package manager: the data model `dpkg` keeps for
//! every known package, the control-file parser that populates it, and the
//! state machine that walks a `.deb` through unpack, configure and removal.
//!
//! It is not a drop-in `dpkg` replacement -- there is no `main`, no on-disk
//! lock file, and no APT-style dependency solver. What it provides is the
//! engine those tools sit on top of:
//!
//! - [arch]: architecture name interning ([arch::Arch], [arch::ArchRegistry]).
//! - [version]: Debian version parsing and comparison ([version::Version]).
//! - [interner]: the arena allocator the package database is built on.
//! - [db]: the package database itself ([db::Database], [db::PackageSet],
//!   [db::Package]) and its dependency graph.
//! - [control]: the RFC2822-style ("deb822") control-file grammar shared by
//!   `status`, `available`, and `.deb` control members.
//! - [pkgspec]: `name[:arch]` specifiers, with optional glob matching, the
//!   way `dpkg`'s command-line front-ends accept a package argument.
//! - [depeval]: whether a dependency clause is currently satisfied
//!   ([depeval::dep_is_ok]).
//! - [infodb]: the per-package `.list`/`.md5sums`/`.conffiles` etc. files
//!   under `/var/lib/dpkg/info`, including the one-time upgrade to
//!   multi-arch-qualified filenames ([infodb::InfoDb::upgrade_to_multiarch]).
//! - [cleanup]: the LIFO undo-closure stack ([cleanup::CleanupStack]) that
//!   backs [infodb]'s crash-recoverable upgrade.
//! - [filenames]: the interned path namespace ([filenames::FileNameTable])
//!   the archive unpack engine places files through, with diversions and
//!   `dpkg-statoverride` entries attached.
//! - [unpack]: the archive unpack engine itself
//!   ([unpack::engine::UnpackEngine]), its filesystem abstraction
//!   ([unpack::fs::Filesystem]), and the auto-deconfigure protocol
//!   ([unpack::deconfigure]) a `Breaks`/`Conflicts` resolution falls back on.
//! - [selections]: the `NAME[:ARCH]\tSTATE` stream `--get-selections` /
//!   `--set-selections` / `--clear-selections` read and write.
//!
//! # Feature Flags
//!
//! | Flag      | Description                                              |
//! | --------- | --------------------------------------------------------- |
//! | `full`    | Enable all optional features.                              |
//! | `hex`     | Enable parsing ASCII hex digests using the [hex] crate.    |
//! | `serde`   | Enable (de)serialisation for the value types in this crate.|
//! | `tokio`   | Enable async I/O at the boundaries that otherwise use [std::io]. |
//!
//! # Feature `serde`
//!
//! This exports two new modules for working with control files, [control::de],
//! and [control::ser] to read or write (respectively) control files in the
//! Debian RFC2822-style format, as is our convention.
//!
//! # Feature `tokio`
//!
//! Enable functions to handle places where there's an i/o boundary that is
//! handled by [tokio::io] rather than [std::io].

pub mod arch;
pub mod cleanup;
pub mod control;
pub mod db;
pub mod depeval;
pub(crate) mod errors;
pub mod filenames;
pub mod infodb;
pub mod interner;
pub mod pkgspec;
pub mod selections;
pub mod unpack;
pub mod version;

// vim: foldmethod=marker
