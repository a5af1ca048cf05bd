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

//! A minimal arena allocator shared by [crate::db] and [crate::filenames].
//!
//! The package database's graph is cyclic -- a [crate::db::Dependency]
//! points at the [crate::db::PackageSet] it targets, and that set threads a
//! reverse list back through every dependency that targets it. `Rc<RefCell<_>>`
//! makes that kind of graph painful (reference cycles never drop, and every
//! traversal pays a `RefCell` borrow check). Instead, every long-lived object
//! lives in a flat [Arena], addressed by a small `Copy` [Id] handle -- plain
//! `usize` underneath, so a reverse-dependency list is just a `Vec<Id<Dependency>>`.
//!
//! The arena has no per-object destructor. Objects live until the whole
//! arena is thrown away with [Arena::reset], mirroring the database's own
//! `reset()` operation: both free everything in one step and invalidate
//! every handle at once, rather than tracking individual lifetimes.

use std::fmt;
use std::marker::PhantomData;

/// A handle into an [Arena]. Cheap to copy, compare, and hash; carries no
/// borrow of the arena itself.
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// The raw slot index backing this handle.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    fn from_index(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

/// Append-only storage for `T`, addressed by [Id].
#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, returning the [Id] to retrieve it later.
    pub fn alloc(&mut self, value: T) -> Id<T> {
        let id = Id::from_index(self.items.len());
        self.items.push(value);
        id
    }

    /// The [Id] that the next [Arena::alloc] call will hand back, without
    /// allocating anything. Useful when two objects need each other's
    /// handle to construct (a set's head needs the set's own id, and vice
    /// versa): compute this one first, build the other, then alloc here.
    pub fn next_id(&self) -> Id<T> {
        Id::from_index(self.items.len())
    }

    /// Borrow the object behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was allocated by a different arena, or by this one
    /// before a [Arena::reset].
    pub fn get(&self, id: Id<T>) -> &T {
        &self.items[id.index()]
    }

    /// Mutably borrow the object behind `id`. Panics under the same
    /// conditions as [Arena::get].
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.items[id.index()]
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the arena holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate every `(Id, &T)` pair in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, value)| (Id::from_index(index), value))
    }

    /// Free every object and invalidate every [Id] previously handed out.
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alloc_and_get_roundtrip() {
        let mut arena: Arena<&'static str> = Arena::new();
        let a = arena.alloc("alpha");
        let b = arena.alloc("beta");
        assert_eq!(&"alpha", arena.get(a));
        assert_eq!(&"beta", arena.get(b));
        assert_ne!(a, b);
    }

    #[test]
    fn get_mut_and_iter() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        *arena.get_mut(a) += 41;
        assert_eq!(&42, arena.get(a));
        assert_eq!(1, arena.iter().count());
    }

    #[test]
    fn reset_clears_arena() {
        let mut arena: Arena<u32> = Arena::new();
        arena.alloc(1);
        arena.alloc(2);
        assert_eq!(2, arena.len());
        arena.reset();
        assert!(arena.is_empty());
    }
}

// vim: foldmethod=marker
