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

use super::binmeta::BinMeta;
use super::dependency::DepPossibilityRef;
use crate::control::Priority;
use crate::interner::Id;
use crate::version::Version;

bitflags::bitflags! {
    /// Error flags carried on a [Package]. Only one bit is defined today,
    /// but this mirrors `dpkg`'s `enum pkgeflag`, which is a bitmask rather
    /// than a closed enum.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EFlag: u8 {
        /// Package needs to be reinstalled; a previous removal or upgrade
        /// was interrupted in a way that left it unsafe to configure.
        const REINSTREQ = 1 << 0;
    }
}

/// All packages sharing one name, regardless of architecture.
///
/// Keyed by a lowercased name in [super::Database]; always has a `head`
/// instance (the native/all/none slot), plus zero or more architecture-
/// specific instances threaded through [Package::arch_next].
#[derive(Debug)]
pub struct PackageSet {
    pub(super) name: String,
    pub(super) head: Id<Package>,

    /// Every [DepPossibility] naming this set as a target, reached via some
    /// other package's `installed` metadata.
    pub depended_installed: Vec<DepPossibilityRef>,

    /// Same as [Self::depended_installed], but reached via `available`
    /// metadata.
    pub depended_available: Vec<DepPossibilityRef>,
}

impl PackageSet {
    pub(super) fn new(name: String, head: Id<Package>) -> Self {
        PackageSet {
            name,
            head,
            depended_installed: vec![],
            depended_available: vec![],
        }
    }

    /// The set's lowercased name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The head instance: always present, and always the native/all/none
    /// slot (see [super::Database::find_pkg]).
    pub fn head(&self) -> Id<Package> {
        self.head
    }
}

/// What the administrator asked for: one of the five states `dpkg
/// --set-selections` accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Want {
    /// No selection has been recorded.
    #[default]
    Unknown,
    /// Install, or keep installed.
    Install,
    /// Keep the current version; refuse upgrades and removals.
    Hold,
    /// Remove, but leave configuration files in place.
    Deinstall,
    /// Remove everything, including configuration files.
    Purge,
}

/// Where a package instance currently sits in the install/remove state
/// machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// No trace of the package remains.
    #[default]
    NotInstalled,
    /// Removed, but configuration files remain.
    ConfigFiles,
    /// Unpack was interrupted partway through.
    HalfInstalled,
    /// Unpacked, not yet configured.
    Unpacked,
    /// Configure was interrupted partway through.
    HalfConfigured,
    /// Configured, waiting for another package's trigger to fire.
    TriggersAwaited,
    /// Configured, with its own triggers queued to run.
    TriggersPending,
    /// Fully unpacked and configured.
    Installed,
}

/// `Multi-Arch` annotation on a [BinMeta].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiArch {
    /// No multi-arch behaviour; the default.
    #[default]
    No,
    /// May coexist with other architectures of the same package, provided
    /// their shared files match byte-for-byte.
    Same,
    /// May satisfy a `:any`-qualified dependency from a foreign package.
    Allowed,
    /// Satisfies dependencies from any requesting architecture.
    Foreign,
}

/// Scratch state owned by the current high-level operation (the unpack
/// engine, today). Cleared between operations; never persisted.
#[derive(Clone, Debug, Default)]
pub struct ClientData {
    /// Paths newly claimed by this package during the archive currently
    /// being unpacked. Becomes a list of filename-node handles once the
    /// filename namespace exists; a path is an adequate stand-in today.
    pub new_files: Vec<String>,

    /// Set to `1` once we've announced "Replacing files in old package …"
    /// for this instance, `2` once we've announced "Replaced by files in
    /// installed package …".
    pub replacing_files_and_said: u8,
}

/// One concrete package row, keyed by `(set, architecture)`.
///
/// Exactly one per (set, arch): the first instance of a set (its `head`)
/// always exists, even for names never seen in any control file; further
/// instances are allocated lazily by [super::Database::find_pkg] as
/// architecture-qualified references to the name are resolved.
#[derive(Debug)]
pub struct Package {
    pub(super) set: Id<PackageSet>,
    pub(super) arch_next: Option<Id<Package>>,

    /// What the administrator asked for.
    pub want: Want,
    /// Error-flag bitmask.
    pub eflag: EFlag,
    /// Current state-machine status.
    pub status: Status,
    /// Priority as last parsed; `weak-classification` mode
    /// leaves this untouched rather than overwriting it.
    pub priority: Option<Priority>,
    /// Section as last parsed, under the same `weak-classification` rule.
    pub section: Option<String>,
    /// Version this instance was configured at, for crash-recovery checks.
    pub configversion: Version,

    /// The database's knowledge of the currently-installed binary.
    pub installed: BinMeta,
    /// The database's knowledge of the most recently seen candidate binary.
    pub available: BinMeta,

    /// Scratch state for the current high-level operation.
    pub clientdata: Option<ClientData>,

    /// Names this package's `Triggers-Awaited` mentions.
    pub trigger_awaited: Vec<String>,
    /// Names whose `Triggers-Pending` mentions this package.
    pub trigger_pending: Vec<String>,
}

impl Package {
    pub(super) fn blank(set: Id<PackageSet>) -> Self {
        Package {
            set,
            arch_next: None,
            want: Want::default(),
            eflag: EFlag::empty(),
            status: Status::default(),
            priority: None,
            section: None,
            configversion: Version::blank(),
            installed: BinMeta::blank(),
            available: BinMeta::blank(),
            clientdata: None,
            trigger_awaited: vec![],
            trigger_pending: vec![],
        }
    }

    /// The set this instance belongs to.
    pub fn set(&self) -> Id<PackageSet> {
        self.set
    }

    /// The next instance in this set's architecture chain, if any.
    pub fn arch_next(&self) -> Option<Id<Package>> {
        self.arch_next
    }

    /// `true` if any `reinstreq`-class error flag is set. dpkg's own
    /// `bsyn_reinstreq` macro reads suspiciously like a typo'd `&` for
    /// `&=`; we treat the intent as "any bit of this class is set".
    pub fn reinstall_required(&self) -> bool {
        self.eflag.intersects(EFlag::REINSTREQ)
    }
}

// vim: foldmethod=marker
