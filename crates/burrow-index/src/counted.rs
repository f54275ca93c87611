//! Reference-counted displaced set.

use std::fmt;

use bytemuck::Pod;
use burrow_arena::Arena;

use crate::displaced::DisplacedSet;

/// Two parallel [`DisplacedSet`]s: values and their reference counts.
///
/// A key is present iff its count is non-zero. Decrementing to zero leaves
/// the value slot in place; only the count slot is tombstoned.
pub struct CountedSet<T> {
    values: DisplacedSet<T>,
    counts: DisplacedSet<u32>,
}

impl<T: Pod> CountedSet<T> {
    /// Create an empty set whose absent value slots hold `null`.
    pub fn new(null: T) -> Self {
        Self {
            values: DisplacedSet::new(null),
            counts: DisplacedSet::new(0),
        }
    }

    /// Current count at `key` (0 if absent).
    pub fn count(&self, arena: &Arena, key: u32) -> u32 {
        self.counts.get(arena, key).copied().unwrap_or(0)
    }

    /// Whether `key` has a non-zero count.
    pub fn contains(&self, arena: &Arena, key: u32) -> bool {
        self.count(arena, key) > 0
    }

    /// The value at `key`, if its count is non-zero.
    pub fn get<'a>(&self, arena: &'a Arena, key: u32) -> Option<&'a T> {
        if !self.contains(arena, key) {
            return None;
        }
        self.values.get(arena, key)
    }

    /// Store `value` at `key` with a count of one. See [`CountedSet::set_many`].
    pub fn set(&mut self, arena: &mut Arena, key: u32, value: T) -> u32 {
        self.set_many(arena, key, value, 1)
    }

    /// Add `n` references to `value` at `key`, returning the new count.
    ///
    /// If the key already holds a bit-identical value with a live count the
    /// counts merge. Otherwise the value is overwritten and the count reset
    /// to `n`.
    pub fn set_many(&mut self, arena: &mut Arena, key: u32, value: T, n: u32) -> u32 {
        let current = self.count(arena, key);
        let same = current > 0
            && self
                .values
                .get(arena, key)
                .is_some_and(|v| bytemuck::bytes_of(v) == bytemuck::bytes_of(&value));
        let count = if same { current + n } else { n };
        if !same {
            self.values.set(arena, key, value);
        }
        if count == 0 {
            self.counts.remove(arena, key);
        } else {
            self.counts.set(arena, key, count);
        }
        count
    }

    /// Drop one reference at `key`, returning the count before the call.
    pub fn remove(&mut self, arena: &mut Arena, key: u32) -> u32 {
        let previous = self.count(arena, key);
        match previous {
            0 => {}
            1 => {
                self.counts.remove(arena, key);
            }
            n => self.counts.set(arena, key, n - 1),
        }
        previous
    }

    /// Drop every reference at `key` and tombstone its value.
    pub fn remove_all(&mut self, arena: &mut Arena, key: u32) -> Option<T> {
        let present = self.counts.remove(arena, key).is_some();
        let value = self.values.remove(arena, key);
        value.filter(|_| present)
    }

    /// Iterate over `(key, value, count)` for every live key.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = (u32, &'a T, u32)> + 'a {
        self.counts
            .iter(arena)
            .filter_map(move |(k, c)| self.values.get(arena, k).map(|v| (k, v, *c)))
    }

    /// Remove every key.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.values.clear(arena);
        self.counts.clear(arena);
    }
}

impl<T> fmt::Debug for CountedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountedSet")
            .field("values", &self.values)
            .field("counts", &self.counts)
            .finish()
    }
}
