//! Dense storage over a sliding window of absolute keys.

use std::fmt;

use bytemuck::Pod;
use burrow_arena::{Arena, List, Span};
use burrow_core::Violation;

/// A dense array addressed by `key - window.start`.
///
/// The window grows in either direction on the first write outside it and
/// never shrinks. Absent keys inside the window hold the tombstone value
/// supplied at construction; keys outside the window are implicitly absent.
/// Writing a value whose bytes equal the tombstone is a [`Violation`].
pub struct DisplacedSet<T> {
    list: List<T>,
    window: Span,
    null: T,
}

impl<T: Pod> DisplacedSet<T> {
    /// Create an empty set whose absent slots hold `null`.
    pub fn new(null: T) -> Self {
        Self {
            list: List::new(),
            window: Span::EMPTY,
            null,
        }
    }

    /// The tombstone value.
    pub fn null(&self) -> T {
        self.null
    }

    /// The key range currently backed by storage.
    pub fn window(&self) -> Span {
        self.window
    }

    /// Whether `key` holds a live value.
    pub fn contains(&self, arena: &Arena, key: u32) -> bool {
        self.get(arena, key).is_some()
    }

    /// The value at `key`, if present.
    pub fn get<'a>(&self, arena: &'a Arena, key: u32) -> Option<&'a T> {
        self.slot(arena, key).filter(|v| !self.is_null(v))
    }

    /// The value at `key`, mutably, if present.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, key: u32) -> Option<&'a mut T> {
        let index = self.index_of(key)?;
        let null = self.null;
        let value = self.list.get_mut(arena, index);
        (bytemuck::bytes_of(&*value) != bytemuck::bytes_of(&null)).then_some(value)
    }

    /// The raw slot at `key`, tombstone included. `None` outside the window.
    pub fn slot<'a>(&self, arena: &'a Arena, key: u32) -> Option<&'a T> {
        let index = self.index_of(key)?;
        Some(self.list.get(arena, index))
    }

    /// Store `value` at `key`, growing the window if needed.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::TombstoneValue`] if `value` is bit-identical
    /// to the tombstone.
    pub fn set(&mut self, arena: &mut Arena, key: u32, value: T) {
        if self.is_null(&value) {
            Violation::TombstoneValue { key }.raise();
        }
        self.expand(arena, key);
        let index = (u64::from(key) - self.window.start()) as usize;
        self.list.set(arena, index, value);
    }

    /// Tombstone the slot at `key`, returning the previous value.
    pub fn remove(&mut self, arena: &mut Arena, key: u32) -> Option<T> {
        let index = self.index_of(key)?;
        let slot = self.list.get_mut(arena, index);
        let previous = *slot;
        *slot = self.null;
        (!self.is_null(&previous)).then_some(previous)
    }

    /// Grow the window to cover `key`, filling new slots with the tombstone.
    pub fn expand(&mut self, arena: &mut Arena, key: u32) {
        let wanted = self.window.union(&Span::unit(u64::from(key)));
        if wanted == self.window {
            return;
        }
        let (below, above) = wanted.difference(&self.window);
        if let Some(gap) = below {
            self.list.fill_front(arena, gap.len() as usize, self.null);
        }
        if let Some(gap) = above {
            self.list.fill_back(arena, gap.len() as usize, self.null);
        }
        self.window = wanted;
    }

    /// Iterate over present `(key, value)` pairs in key order.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = (u32, &'a T)> + 'a {
        let start = self.window.start();
        self.list
            .iter(arena)
            .enumerate()
            .filter(move |(_, v)| !self.is_null(v))
            .map(move |(i, v)| ((start + i as u64) as u32, v))
    }

    /// Number of present values. Linear in the window size.
    pub fn count(&self, arena: &Arena) -> usize {
        self.iter(arena).count()
    }

    /// Drop every value and collapse the window.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.list.clear(arena);
        self.window = Span::EMPTY;
    }

    fn index_of(&self, key: u32) -> Option<usize> {
        let key = u64::from(key);
        self.window
            .contains(key)
            .then(|| (key - self.window.start()) as usize)
    }

    fn is_null(&self, value: &T) -> bool {
        bytemuck::bytes_of(value) == bytemuck::bytes_of(&self.null)
    }
}

impl<T> fmt::Debug for DisplacedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplacedSet")
            .field("window", &format_args!("{}", self.window))
            .field("list", &self.list)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NULL: u32 = u32::MAX;

    #[test]
    fn set_get_remove() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        set.set(&mut arena, 10, 100);
        assert_eq!(set.get(&arena, 10), Some(&100));
        assert_eq!(set.window(), Span::new(10, 11));
        assert_eq!(set.remove(&mut arena, 10), Some(100));
        assert!(!set.contains(&arena, 10));
        assert_eq!(set.window(), Span::new(10, 11), "remove never shrinks");
    }

    #[test]
    fn expands_in_both_directions() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        set.set(&mut arena, 50, 5);
        set.set(&mut arena, 47, 4);
        set.set(&mut arena, 53, 6);
        assert_eq!(set.window(), Span::new(47, 54));
        assert_eq!(set.get(&arena, 47), Some(&4));
        assert_eq!(set.get(&arena, 50), Some(&5));
        assert_eq!(set.get(&arena, 53), Some(&6));
        assert_eq!(set.get(&arena, 48), None);
        assert_eq!(set.slot(&arena, 48), Some(&NULL));
        assert_eq!(set.slot(&arena, 54), None);
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        for k in [3u32, 5, 7] {
            set.set(&mut arena, k, k * 10);
        }
        set.remove(&mut arena, 5);
        let pairs: Vec<(u32, u32)> = set.iter(&arena).map(|(k, v)| (k, *v)).collect();
        assert_eq!(pairs, vec![(3, 30), (7, 70)]);
        assert_eq!(set.count(&arena), 2);
    }

    #[test]
    fn get_mut_ignores_tombstone() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(0u64);
        set.expand(&mut arena, 2);
        assert!(set.get_mut(&mut arena, 2).is_none());
        set.set(&mut arena, 2, 7);
        *set.get_mut(&mut arena, 2).unwrap() += 1;
        assert_eq!(set.get(&arena, 2), Some(&8));
    }

    #[test]
    fn remove_outside_window_is_none() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        assert_eq!(set.remove(&mut arena, 3), None);
        assert!(set.window().is_empty());
    }

    #[test]
    #[should_panic(expected = "tombstone")]
    fn writing_tombstone_panics() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        set.set(&mut arena, 1, NULL);
    }

    #[test]
    fn clear_collapses_window() {
        let mut arena = Arena::default();
        let mut set = DisplacedSet::new(NULL);
        set.set(&mut arena, 9, 1);
        set.clear(&mut arena);
        assert!(set.window().is_empty());
        assert_eq!(set.get(&arena, 9), None);
        set.set(&mut arena, 2, 3);
        assert_eq!(set.window(), Span::new(2, 3));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        proptest! {
            #[test]
            fn get_after_set_until_remove(
                ops in proptest::collection::vec((any::<bool>(), 0u32..256, 0u32..1000), 1..200)
            ) {
                let mut arena = Arena::default();
                let mut set = DisplacedSet::new(NULL);
                let mut model = HashMap::new();
                for (insert, key, value) in ops {
                    if insert {
                        set.set(&mut arena, key, value);
                        model.insert(key, value);
                    } else {
                        prop_assert_eq!(set.remove(&mut arena, key), model.remove(&key));
                        prop_assert!(!set.contains(&arena, key));
                    }
                }
                for key in 0..256u32 {
                    prop_assert_eq!(set.get(&arena, key), model.get(&key));
                }
            }
        }
    }
}
