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

use std::collections::HashMap;
use std::io::Write;

use super::dependency::Dependency;
use super::package::{Package, PackageSet, Status};
use crate::arch::{Arch, ArchRegistry};
use crate::interner::{Arena, Id};

/// The in-core package database: every known [PackageSet], its instances,
/// and the dependency graph strung between them, plus the architecture
/// registry they're built against.
///
/// `Database` is an explicit value threaded through the call graph rather
/// than a process global -- there's exactly one arena of each kind, owned
/// here, and [Database::reset] is the only sanctioned way to free them.
/// Tests that want isolation just construct their own `Database`.
pub struct Database {
    /// Every architecture name this database has interned.
    pub archs: ArchRegistry,
    sets: Arena<PackageSet>,
    packages: Arena<Package>,
    dependencies: Arena<Dependency>,
    by_name: HashMap<String, Id<PackageSet>>,
}

impl Database {
    /// A fresh, empty database with `native_name` installed as the native
    /// architecture.
    pub fn new(native_name: &str) -> Self {
        Database {
            archs: ArchRegistry::new(native_name),
            sets: Arena::new(),
            packages: Arena::new(),
            dependencies: Arena::new(),
            by_name: HashMap::new(),
        }
    }

    /// Look up (or allocate) the [PackageSet] for `name`, always keyed by
    /// its lowercased form.
    pub fn find_set(&mut self, name: &str) -> Id<PackageSet> {
        let key = name.to_lowercase();
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }

        let set_id = self.sets.next_id();
        let head_id = self.packages.alloc(Package::blank(set_id));
        let allocated = self.sets.alloc(PackageSet::new(key.clone(), head_id));
        debug_assert_eq!(set_id, allocated);
        self.by_name.insert(key, set_id);
        set_id
    }

    /// Look up (or allocate) the [Package] instance for `(name, arch)`: a
    /// missing or native/all/none `arch` always returns the
    /// set's head; otherwise the architecture chain is walked, claiming
    /// the first never-differentiated slot, matching an already-claimed
    /// one, or appending a fresh instance.
    pub fn find_pkg(&mut self, name: &str, arch: Option<&Arch>) -> Id<Package> {
        let set_id = self.find_set(name);
        let head = self.sets.get(set_id).head();

        let arch = match arch {
            None => return head,
            Some(arch) if arch.is_special() => return head,
            Some(arch) => arch,
        };

        let mut cursor = head;
        loop {
            let next = self.packages.get(cursor).arch_next();
            let Some(candidate) = next else { break };

            if !self.packages.get(candidate).installed.is_claimed() {
                let pkg = self.packages.get_mut(candidate);
                pkg.installed.arch = Some(arch.clone());
                pkg.available.arch = Some(arch.clone());
                return candidate;
            }
            if self
                .packages
                .get(candidate)
                .installed
                .arch
                .as_ref()
                .map(|a| a.is_same(arch))
                .unwrap_or(false)
            {
                return candidate;
            }
            cursor = candidate;
        }

        let mut fresh = Package::blank(set_id);
        fresh.installed.arch = Some(arch.clone());
        fresh.available.arch = Some(arch.clone());
        let fresh_id = self.packages.alloc(fresh);
        self.packages.get_mut(cursor).arch_next = Some(fresh_id);
        fresh_id
    }

    /// Allocate a new [Dependency] owned by `up`.
    pub fn alloc_dependency(&mut self, dependency: Dependency) -> Id<Dependency> {
        self.dependencies.alloc(dependency)
    }

    /// Borrow the [PackageSet] behind `id`.
    pub fn set(&self, id: Id<PackageSet>) -> &PackageSet {
        self.sets.get(id)
    }

    /// Mutably borrow the [PackageSet] behind `id`.
    pub fn set_mut(&mut self, id: Id<PackageSet>) -> &mut PackageSet {
        self.sets.get_mut(id)
    }

    /// Borrow the [Package] behind `id`.
    pub fn package(&self, id: Id<Package>) -> &Package {
        self.packages.get(id)
    }

    /// Mutably borrow the [Package] behind `id`.
    pub fn package_mut(&mut self, id: Id<Package>) -> &mut Package {
        self.packages.get_mut(id)
    }

    /// Borrow the [Dependency] behind `id`.
    pub fn dependency(&self, id: Id<Dependency>) -> &Dependency {
        self.dependencies.get(id)
    }

    /// Mutably borrow the [Dependency] behind `id`.
    pub fn dependency_mut(&mut self, id: Id<Dependency>) -> &mut Dependency {
        self.dependencies.get_mut(id)
    }

    /// Every package set, in arena (discovery) order -- unspecified across
    /// sets.
    pub fn iter_sets(&self) -> impl Iterator<Item = (Id<PackageSet>, &PackageSet)> {
        self.sets.iter()
    }

    /// Every package instance, head first within each set, then its
    /// architecture chain in insertion order.
    pub fn iter_pkgs(&self) -> impl Iterator<Item = (Id<Package>, &Package)> + '_ {
        self.sets.iter().flat_map(move |(_, set)| {
            std::iter::successors(Some(set.head()), move |&id| self.packages.get(id).arch_next())
                .map(move |id| (id, self.packages.get(id)))
        })
    }

    /// Instances whose [Status] is not [Status::NotInstalled].
    pub fn installed(&self) -> impl Iterator<Item = (Id<Package>, &Package)> + '_ {
        self.iter_pkgs().filter(|(_, pkg)| pkg.status != Status::NotInstalled)
    }

    /// Instances whose [Status] is [Status::NotInstalled].
    pub fn not_installed(&self) -> impl Iterator<Item = (Id<Package>, &Package)> + '_ {
        self.iter_pkgs().filter(|(_, pkg)| pkg.status == Status::NotInstalled)
    }

    /// Instances in exactly the given [Status].
    pub fn in_status(&self, status: Status) -> impl Iterator<Item = (Id<Package>, &Package)> + '_ {
        self.iter_pkgs().filter(move |(_, pkg)| pkg.status == status)
    }

    /// Free every arena-allocated object and the name index in one step,
    /// then reset the architecture registry back to its built-ins, so no
    /// dangling [Arch] handle from before the reset can be compared
    /// against one allocated after it.
    pub fn reset(&mut self) {
        self.sets = Arena::new();
        self.packages = Arena::new();
        self.dependencies = Arena::new();
        self.by_name.clear();
        self.archs.reset();
    }

    /// Write a one-line-per-instance diagnostic dump: `name[:arch] want
    /// status`. Not a stable serialisation format -- see [crate::selections]
    /// for that.
    pub fn report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (_, pkg) in self.iter_pkgs() {
            let set = self.sets.get(pkg.set());
            let arch = pkg
                .installed
                .arch
                .as_ref()
                .map(|a| a.name().to_owned())
                .unwrap_or_else(|| "-".to_owned());
            writeln!(out, "{}:{} {:?} {:?}", set.name(), arch, pkg.want, pkg.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn find_set_is_idempotent_and_lowercases() {
        let mut db = Database::new("amd64");
        let a = db.find_set("Hello");
        let b = db.find_set("hello");
        assert_eq!(a, b);
        assert_eq!(db.set(a).name(), "hello");
    }

    #[test]
    fn find_pkg_native_returns_head() {
        let mut db = Database::new("amd64");
        let native = db.archs.native();
        let head = db.find_pkg("hello", None);
        let again = db.find_pkg("hello", Some(&native));
        assert_eq!(head, again);
    }

    #[test]
    fn find_pkg_claims_then_matches_foreign_arch() {
        let mut db = Database::new("amd64");
        let i386 = db.archs.find("i386");

        let first = db.find_pkg("libfoo", Some(&i386));
        let second = db.find_pkg("libfoo", Some(&i386));
        assert_eq!(first, second);

        let native = db.find_pkg("libfoo", None);
        assert_ne!(first, native);
    }

    #[test]
    fn find_pkg_appends_additional_arches() {
        let mut db = Database::new("amd64");
        let i386 = db.archs.find("i386");
        let armhf = db.archs.find("armhf");

        let a = db.find_pkg("libfoo", Some(&i386));
        let b = db.find_pkg("libfoo", Some(&armhf));
        assert_ne!(a, b);
        assert_eq!(db.package(a).installed.arch.as_ref().unwrap().name(), "i386");
        assert_eq!(db.package(b).installed.arch.as_ref().unwrap().name(), "armhf");
    }

    #[test]
    fn reset_clears_everything() {
        let mut db = Database::new("amd64");
        db.find_pkg("hello", None);
        db.reset();
        assert_eq!(db.iter_sets().count(), 0);
    }

    #[test]
    fn in_status_filters() {
        let mut db = Database::new("amd64");
        let id = db.find_pkg("hello", None);
        db.package_mut(id).status = Status::Installed;
        assert_eq!(db.installed().count(), 1);
        assert_eq!(db.not_installed().count(), 0);
    }
}

// vim: foldmethod=marker
