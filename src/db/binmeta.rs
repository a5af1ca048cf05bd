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

use super::dependency::Dependency;
use super::package::MultiArch;
use crate::arch::Arch;
use crate::interner::Id;
use crate::version::Version;

/// `(path, hash, obsolete)` entry from a `Conffiles:` field.
///
/// `path` is absolute and canonicalised (no leading `./`). `hash` is a
/// lowercase hex MD5, the literal `"newconffile"` during a first-install
/// transition, or `"-"` if the file didn't exist at packaging time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfFile {
    pub path: String,
    pub hash: String,
    pub obsolete: bool,
}

/// Per-instance binary metadata: everything the database knows about one
/// `(package, architecture)` pair's installed or candidate binary.
///
/// `BinMeta::blank()` is the placeholder state used before any control
/// paragraph has been parsed into it; `arch` stays `None` until the
/// instance is claimed for a specific architecture (see
/// [crate::db::Database::find_pkg]).
#[derive(Clone, Debug, Default)]
pub struct BinMeta {
    /// Architecture this instance is claimed for, or `None` if unclaimed.
    pub arch: Option<Arch>,
    /// `Multi-Arch:` annotation.
    pub multiarch: MultiArch,
    /// `Essential: yes`, or absent.
    pub essential: bool,
    /// `Version:`
    pub version: Version,
    /// `Maintainer:`
    pub maintainer: Option<String>,
    /// `Description:`, first line and synopsis joined as one string.
    pub description: Option<String>,
    /// `Source:`, when it differs from the package name.
    pub source: Option<String>,
    /// `Installed-Size:`, in kibibytes.
    pub installed_size: Option<u64>,
    /// `Origin:`
    pub origin: Option<String>,
    /// `Bugs:`
    pub bugs: Option<String>,
    /// Every `Dependency` clause parsed for this instance, in field order.
    pub dependencies: Vec<Id<Dependency>>,
    /// `Conffiles:`, one entry per line.
    pub conffiles: Vec<ConfFile>,

    /// Unrecognised fields, preserved verbatim so a round-trip write
    /// doesn't silently drop them.
    pub unknown_fields: Vec<(String, String)>,

    /// Size of the `.deb` file this metadata was read from.
    pub file_size: Option<u64>,
    /// MD5 digest of the `.deb` file this metadata was read from.
    pub file_md5sum: Option<String>,
}

impl BinMeta {
    pub(super) fn blank() -> Self {
        Self::default()
    }

    /// `true` once this instance has been claimed for a specific
    /// architecture (head instances start unclaimed; alternates are
    /// claimed the first time [crate::db::Database::find_pkg] walks past
    /// them).
    pub fn is_claimed(&self) -> bool {
        self.arch.is_some()
    }
}

// vim: foldmethod=marker
