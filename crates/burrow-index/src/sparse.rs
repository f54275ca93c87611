//! Key to dense-index map with swap-remove compaction.

use std::fmt;

use bytemuck::Pod;
use burrow_arena::{Arena, List};
use burrow_core::Violation;

use crate::displaced::DisplacedSet;

const NO_INDEX: u32 = u32::MAX;

/// Where a dense element's key comes from.
enum KeySource<T> {
    /// A parallel list of back-pointers, one per dense element.
    Stored(List<u32>),
    /// Derived from the element itself ("integer" mode). `base` is
    /// subtracted from the derived key.
    Derived { extract: fn(&T) -> u32, base: u32 },
}

/// A sparse set: elements packed densely, addressed by key.
///
/// `index` maps key to dense position; `keys` maps dense position back to
/// key so that removal can swap the last element into the hole and patch
/// its index entry. For every present key `k`, `key_at(dense_index(k)) == k`.
pub struct SparseSet<T> {
    dense: List<T>,
    keys: KeySource<T>,
    index: DisplacedSet<u32>,
}

impl<T: Pod> SparseSet<T> {
    /// Create an empty set that stores keys alongside elements.
    pub fn new() -> Self {
        Self::with_keys(KeySource::Stored(List::new()))
    }

    /// Create an empty set whose elements are their own keys.
    ///
    /// `extract` recovers the key from an element, so no parallel key list
    /// is kept. [`SparseSet::set`] checks that the supplied key matches.
    pub fn integer(extract: fn(&T) -> u32) -> Self {
        Self::integer_with_base(extract, 0)
    }

    /// Integer mode where stored keys are `extract(value) - base`.
    pub(crate) fn integer_with_base(extract: fn(&T) -> u32, base: u32) -> Self {
        Self::with_keys(KeySource::Derived { extract, base })
    }

    fn with_keys(keys: KeySource<T>) -> Self {
        Self {
            dense: List::new(),
            keys,
            index: DisplacedSet::new(NO_INDEX),
        }
    }

    /// Whether the set runs in integer mode.
    pub fn is_integer(&self) -> bool {
        matches!(self.keys, KeySource::Derived { .. })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Whether `key` is present.
    pub fn contains(&self, arena: &Arena, key: u32) -> bool {
        self.index.contains(arena, key)
    }

    /// Dense position of `key`.
    pub fn dense_index(&self, arena: &Arena, key: u32) -> Option<usize> {
        self.index.get(arena, key).map(|&i| i as usize)
    }

    /// Key of the element at dense position `index`.
    pub fn key_at(&self, arena: &Arena, index: usize) -> u32 {
        match &self.keys {
            KeySource::Stored(keys) => *keys.get(arena, index),
            KeySource::Derived { extract, base } => extract(self.dense.get(arena, index)) - base,
        }
    }

    /// The element at `key`.
    pub fn get<'a>(&self, arena: &'a Arena, key: u32) -> Option<&'a T> {
        let i = self.dense_index(arena, key)?;
        Some(self.dense.get(arena, i))
    }

    /// The element at `key`, mutably.
    ///
    /// In integer mode the caller must not change the element's key.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, key: u32) -> Option<&'a mut T> {
        let i = self.dense_index(arena, key)?;
        Some(self.dense.get_mut(arena, i))
    }

    /// Insert or overwrite the element at `key`.
    ///
    /// # Panics
    ///
    /// In integer mode, panics with [`Violation::KeyMismatch`] if the key
    /// derived from `value` differs from `key`.
    pub fn set(&mut self, arena: &mut Arena, key: u32, value: T) {
        if let KeySource::Derived { extract, base } = &self.keys {
            let value_key = extract(&value).wrapping_sub(*base);
            if value_key != key {
                Violation::KeyMismatch { key, value_key }.raise();
            }
        }
        if let Some(i) = self.dense_index(arena, key) {
            self.dense.set(arena, i, value);
            return;
        }
        let i = self.dense.len();
        self.dense.push(arena, value);
        if let KeySource::Stored(keys) = &mut self.keys {
            keys.push(arena, key);
        }
        self.index.set(arena, key, i as u32);
    }

    /// Remove `key`, moving the last element into its slot.
    pub fn remove(&mut self, arena: &mut Arena, key: u32) -> Option<T> {
        let i = self.index.remove(arena, key)? as usize;
        let last = self.dense.len() - 1;
        let value = self.dense.swap_remove(arena, i);
        if let KeySource::Stored(keys) = &mut self.keys {
            keys.swap_remove(arena, i);
        }
        if i != last {
            let moved = self.key_at(arena, i);
            self.index.set(arena, moved, i as u32);
        }
        Some(value)
    }

    /// Elements in dense order.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        self.dense.as_slice(arena)
    }

    /// Keys in dense order.
    pub fn keys<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = u32> + 'a {
        (0..self.len()).map(move |i| self.key_at(arena, i))
    }

    /// `(key, element)` pairs in dense order.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = (u32, &'a T)> + 'a {
        self.keys(arena).zip(self.dense.iter(arena))
    }

    /// Remove every element.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.dense.clear(arena);
        if let KeySource::Stored(keys) = &mut self.keys {
            keys.clear(arena);
        }
        self.index.clear(arena);
    }
}

impl<T: Pod> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SparseSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseSet")
            .field("dense", &self.dense)
            .field("integer", &matches!(self.keys, KeySource::Derived { .. }))
            .field("index", &self.index)
            .finish()
    }
}
