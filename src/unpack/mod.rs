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

//! The archive unpack engine: given one package's already-parsed
//! tar entries, decide how each one may be placed alongside whatever else on
//! disk already claims its path, stage it, and commit the result.
//!
//! This module does not decode the tar wire format, read a `.deb`'s `ar`
//! container, or run maintainer scripts -- it starts from a [entry::TarEntry]
//! already produced by something upstream, and stops once every entry has
//! either landed on disk or been rejected. What it does own:
//!
//! - [entry]: the engine's own view of one tar header.
//! - [fs]: the [fs::Filesystem] trait every syscall goes through, so
//!   [engine::UnpackEngine] can be driven by an in-memory fake in tests that
//!   don't have root, device nodes, or real ownership changes available.
//! - [force]: the `--force-*` policy bitmask.
//! - [error]: everything [engine::UnpackEngine::place] can fail with.
//! - [deconfigure]: the auto-deconfigure protocol a `Breaks`/
//!   `Conflicts` resolution falls back on.
//! - [engine]: the decision tree and two-pass commit themselves.

pub mod deconfigure;
pub mod engine;
pub mod entry;
pub mod error;
pub mod force;
pub mod fs;

pub use deconfigure::{try_deconfigure, DeconfigureOutcome, DeconfigureReason, DeconfigureRequest};
pub use engine::UnpackEngine;
pub use entry::{DeviceNumber, EntryKind, FileStat, TarEntry};
pub use error::UnpackError;
pub use force::ForceFlags;
pub use fs::{Filesystem, StdFilesystem};

// vim: foldmethod=marker
