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

//! Architecture interning registry.
//!
//! Every architecture name the database ever sees -- parsed from a control
//! file, typed on a command line, or compiled in as the native arch -- is
//! interned exactly once per [ArchRegistry]. The resulting [Arch] handles are
//! cheap to clone and compare by pointer, never by string, so a dependency
//! evaluator can test architecture compatibility with a handful of `Rc`
//! pointer comparisons instead of re-parsing or re-hashing names on every
//! query.
//!
//! ```
//! use dpkg_core::arch::ArchRegistry;
//!
//! let reg = ArchRegistry::new("amd64");
//! let a = reg.find("amd64");
//! let b = reg.find("amd64");
//! assert!(a.is_same(&b));
//! assert!(a.kind().is_native());
//! ```

mod registry;

pub use registry::{Arch, ArchKind, ArchRegistry};

// vim: foldmethod=marker
