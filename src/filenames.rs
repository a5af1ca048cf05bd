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

//! The filename namespace: every path ever mentioned by an archive, a
//! diversion, a conffile, or a stat-override is interned exactly once,
//! keyed by its canonical absolute form.
//!
//! A [FileNameNode]'s [FileFlags] bitmask is scratch state for the archive
//! unpack engine -- set as each tar entry is placed, and meaningless
//! outside one unpack operation -- while its [Divert]/[StatOverride]/owner
//! list are loaded once, up front, and read (never mutated) by the engine.
//! [FileNameTable::reset] clears all three kinds of state in one step, the
//! same way [crate::db::Database::reset] clears the package database.

use crate::db::PackageSet;
use crate::interner::{Arena, Id};

bitflags::bitflags! {
    /// Per-node scratch flags, set and cleared by the archive unpack engine
    /// as it walks one tar stream. Mirrors `dpkg`'s `fnnf_*` bitmask.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FileFlags: u16 {
        /// This path appears in the archive currently being unpacked.
        const NEW_IN_ARCHIVE = 1 << 0;
        /// This path is a conffile newly introduced by the current unpack.
        const NEW_CONFFILE = 1 << 1;
        /// The pre-extraction backup couldn't be made atomically (an old
        /// directory had to be renamed aside rather than hard-linked).
        const NO_ATOMIC_OVERWRITE = 1 << 2;
        /// The final `rename(.dpkg-new → path)` is deferred to a later pass.
        const DEFERRED_RENAME = 1 << 3;
        /// An `fsync` on the containing directory is still owed.
        const DEFERRED_FSYNC = 1 << 4;
        /// The file has reached its final on-disk name.
        const PLACED_ON_DISK = 1 << 5;
        /// Other packages' file lists should treat this path as elsewhere.
        const ELIDE_OTHER_LISTS = 1 << 6;
        /// The filter subsystem excluded this path; its payload was
        /// drained from the tar stream but never written.
        const FILTERED = 1 << 7;
    }
}

/// Ownership override recorded by `dpkg-statoverride`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatOverride {
    /// Owning user id to apply instead of the archive's.
    pub uid: u32,
    /// Owning group id to apply instead of the archive's.
    pub gid: u32,
    /// Permission bits to apply instead of the archive's.
    pub mode: u32,
}

/// A diversion: `came_from` is redirected to `use_instead`, on behalf of
/// `pkgset`. The same record is attached to both nodes; a decision-tree
/// check like "is this path a diversion's source" is `node_id ==
/// divert.came_from` rather than a pointer comparison, since nodes are
/// addressed by [Id] here rather than by pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divert {
    /// The path being diverted away from.
    pub came_from: Id<FileNameNode>,
    /// The path it's diverted to instead.
    pub use_instead: Id<FileNameNode>,
    /// The package set that owns the diversion.
    pub pkgset: Id<PackageSet>,
}

/// One interned path.
#[derive(Debug, Default)]
pub struct FileNameNode {
    name: String,

    /// Scratch flags for the current unpack operation.
    pub flags: FileFlags,
    /// Diversion record, if this path is either side of one.
    pub divert: Option<Divert>,
    /// Ownership override, if `dpkg-statoverride` has one for this path.
    pub statoverride: Option<StatOverride>,
    /// Every package set that currently claims this path in its file list.
    pub owners: Vec<Id<PackageSet>>,
}

impl FileNameNode {
    fn new(name: String) -> Self {
        FileNameNode { name, ..Default::default() }
    }

    /// The canonical absolute path this node represents.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Strip a leading `./`, the same canonicalisation rule [crate::db::ConfFile]
/// applies to `Conffiles:` entries, so a path read from an archive header
/// and one read from a conffile record intern to the same node.
fn canonicalize(path: &str) -> String {
    path.strip_prefix("./").unwrap_or(path).to_owned()
}

/// The interning table behind every [FileNameNode] the database knows
/// about.
#[derive(Default)]
pub struct FileNameTable {
    arena: Arena<FileNameNode>,
    by_name: std::collections::HashMap<String, Id<FileNameNode>>,
}

impl FileNameTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `path`, allocating a fresh (flagless, ownerless) node the
    /// first time it's seen.
    pub fn intern(&mut self, path: &str) -> Id<FileNameNode> {
        let key = canonicalize(path);
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }
        let id = self.arena.alloc(FileNameNode::new(key.clone()));
        self.by_name.insert(key, id);
        id
    }

    /// Look up an already-interned path without allocating.
    pub fn find(&self, path: &str) -> Option<Id<FileNameNode>> {
        self.by_name.get(&canonicalize(path)).copied()
    }

    /// Borrow the node behind `id`.
    pub fn get(&self, id: Id<FileNameNode>) -> &FileNameNode {
        self.arena.get(id)
    }

    /// Mutably borrow the node behind `id`.
    pub fn get_mut(&mut self, id: Id<FileNameNode>) -> &mut FileNameNode {
        self.arena.get_mut(id)
    }

    /// Attach one [Divert] record to both the `came_from` and `use_instead`
    /// nodes.
    pub fn set_divert(&mut self, came_from: Id<FileNameNode>, use_instead: Id<FileNameNode>, pkgset: Id<PackageSet>) {
        let record = Divert { came_from, use_instead, pkgset };
        self.arena.get_mut(came_from).divert = Some(record.clone());
        self.arena.get_mut(use_instead).divert = Some(record);
    }

    /// Record `pkgset` as an owner of `id`, unless it already is.
    pub fn add_owner(&mut self, id: Id<FileNameNode>, pkgset: Id<PackageSet>) {
        let node = self.arena.get_mut(id);
        if !node.owners.contains(&pkgset) {
            node.owners.push(pkgset);
        }
    }

    /// Every interned node, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<FileNameNode>, &FileNameNode)> {
        self.arena.iter()
    }

    /// Free every interned node and clear the name index, the same way
    /// [crate::db::Database::reset] frees the package database.
    pub fn reset(&mut self) {
        self.arena = Arena::new();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = FileNameTable::new();
        let a = table.intern("/etc/hello.conf");
        let b = table.intern("/etc/hello.conf");
        assert_eq!(a, b);
    }

    #[test]
    fn intern_strips_leading_dot_slash() {
        let mut table = FileNameTable::new();
        let a = table.intern("./etc/hello.conf");
        let b = table.intern("etc/hello.conf");
        assert_eq!(a, b);
        assert_eq!(table.get(a).name(), "etc/hello.conf");
    }

    #[test]
    fn divert_cross_links_both_nodes() {
        let mut db = crate::db::Database::new("amd64");
        let pkgset = db.find_set("dpkg-divert-owner");

        let mut table = FileNameTable::new();
        let real = table.intern("/usr/bin/editor");
        let diverted = table.intern("/usr/bin/editor.distrib");
        table.set_divert(real, diverted, pkgset);

        assert_eq!(table.get(real).divert.as_ref().unwrap().came_from, real);
        assert_eq!(table.get(diverted).divert.as_ref().unwrap().use_instead, diverted);
    }

    #[test]
    fn add_owner_deduplicates() {
        let mut db = crate::db::Database::new("amd64");
        let pkgset = db.find_set("hello");

        let mut table = FileNameTable::new();
        let path = table.intern("/usr/bin/hello");
        table.add_owner(path, pkgset);
        table.add_owner(path, pkgset);
        assert_eq!(table.get(path).owners.len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut table = FileNameTable::new();
        table.intern("/usr/bin/hello");
        table.reset();
        assert_eq!(table.iter().count(), 0);
        assert!(table.find("/usr/bin/hello").is_none());
    }
}

// vim: foldmethod=marker
