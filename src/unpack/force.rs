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

//! Per-operation policy set that downgrades a class of fatal errors to
//! warnings. One bit per `--force-*` flag `dpkg` recognises.

bitflags::bitflags! {
    /// Which classes of forcible error this unpack operation should
    /// downgrade to a warning rather than abort on.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ForceFlags: u16 {
        /// `--force-overwrite`: take over a plain file with no `Replaces`.
        const OVERWRITE = 1 << 0;
        /// `--force-overwrite-dir`: take over a directory with no `Replaces`.
        const OVERWRITE_DIR = 1 << 1;
        /// `--force-overwrite-diverted`: overwrite a diversion's rename target.
        const OVERWRITE_DIVERTED = 1 << 2;
        /// `--force-breaks`: install despite an unresolved `Breaks`.
        const BREAKS = 1 << 3;
        /// `--force-depends`: install despite an unresolved `Depends`.
        const DEPENDS = 1 << 4;
        /// `--force-conflicts`: install despite an unresolved `Conflicts`.
        const CONFLICTS = 1 << 5;
        /// `--force-remove-essential`: deconfigure or remove an essential package.
        const REMOVE_ESSENTIAL = 1 << 6;
        /// `--force-remove-reinstreq`: remove a package that requires reinstallation.
        const REMOVE_REINSTREQ = 1 << 7;
        /// `--force-downgrade`: install an earlier version over a later one.
        const DOWNGRADE = 1 << 8;
        /// `--force-configure-any`: configure any package that needs it, not
        /// just the one named on the command line.
        const CONFIGURE_ANY = 1 << 9;
        /// `--force-unsafe-io`: skip the deferred-fsync writeback pass.
        const UNSAFE_IO = 1 << 10;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(ForceFlags::default().is_empty());
    }

    #[test]
    fn intersects_checks_a_single_class() {
        let f = ForceFlags::OVERWRITE | ForceFlags::DOWNGRADE;
        assert!(f.contains(ForceFlags::OVERWRITE));
        assert!(!f.contains(ForceFlags::BREAKS));
    }
}

// vim: foldmethod=marker
