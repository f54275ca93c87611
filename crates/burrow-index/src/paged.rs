//! Sparse set partitioned into pages by key bit-length.

use std::fmt;

use bytemuck::Pod;
use burrow_arena::Arena;

use crate::sparse::SparseSet;

/// Number of pages.
pub const PAGE_COUNT: usize = 8;

/// Key bit-length covered by one page.
pub const PAGE_WIDTH: u32 = 4;

/// Page holding `key`: `⌊log2 key⌋ / PAGE_WIDTH`, with key 0 on page 0.
pub fn page_of(key: u32) -> usize {
    match key.checked_ilog2() {
        Some(log) => (log / PAGE_WIDTH) as usize,
        None => 0,
    }
}

/// Smallest key routed to `page`.
pub fn page_base(page: usize) -> u32 {
    if page == 0 {
        0
    } else {
        1 << (PAGE_WIDTH * page as u32)
    }
}

/// Eight [`SparseSet`]s, each covering keys of similar magnitude.
///
/// A page stores keys relative to its base, so a page's index window spans
/// at most the width of its magnitude band no matter how sparse the whole
/// key space is.
pub struct PagedSparseSet<T> {
    pages: [SparseSet<T>; PAGE_COUNT],
}

impl<T: Pod> PagedSparseSet<T> {
    /// Create an empty set that stores keys alongside elements.
    pub fn new() -> Self {
        Self {
            pages: std::array::from_fn(|_| SparseSet::new()),
        }
    }

    /// Create an empty set whose elements are their own (absolute) keys.
    pub fn integer(extract: fn(&T) -> u32) -> Self {
        Self {
            pages: std::array::from_fn(|p| SparseSet::integer_with_base(extract, page_base(p))),
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.pages.iter().map(SparseSet::len).sum()
    }

    /// Whether every page is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(SparseSet::is_empty)
    }

    /// The page sets, lowest magnitude first.
    pub fn pages(&self) -> &[SparseSet<T>; PAGE_COUNT] {
        &self.pages
    }

    /// Whether `key` is present.
    pub fn contains(&self, arena: &Arena, key: u32) -> bool {
        let (page, local) = route(key);
        self.pages[page].contains(arena, local)
    }

    /// The element at `key`.
    pub fn get<'a>(&self, arena: &'a Arena, key: u32) -> Option<&'a T> {
        let (page, local) = route(key);
        self.pages[page].get(arena, local)
    }

    /// The element at `key`, mutably.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, key: u32) -> Option<&'a mut T> {
        let (page, local) = route(key);
        self.pages[page].get_mut(arena, local)
    }

    /// Insert or overwrite the element at `key`.
    pub fn set(&mut self, arena: &mut Arena, key: u32, value: T) {
        let (page, local) = route(key);
        self.pages[page].set(arena, local, value);
    }

    /// Remove the element at `key`.
    pub fn remove(&mut self, arena: &mut Arena, key: u32) -> Option<T> {
        let (page, local) = route(key);
        self.pages[page].remove(arena, local)
    }

    /// Absolute keys, page by page in dense order.
    pub fn keys<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = u32> + 'a {
        self.iter(arena).map(|(k, _)| k)
    }

    /// `(absolute key, element)` pairs, page by page in dense order.
    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = (u32, &'a T)> + 'a {
        self.pages.iter().enumerate().flat_map(move |(p, page)| {
            let base = page_base(p);
            page.iter(arena).map(move |(local, v)| (local + base, v))
        })
    }

    /// Remove every element.
    pub fn clear(&mut self, arena: &mut Arena) {
        for page in &mut self.pages {
            page.clear(arena);
        }
    }
}

impl<T: Pod> Default for PagedSparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PagedSparseSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pages.iter()).finish()
    }
}

fn route(key: u32) -> (usize, u32) {
    let page = page_of(key);
    (page, key - page_base(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_by_magnitude() {
        assert_eq!(page_of(0), 0);
        assert_eq!(page_of(15), 0);
        assert_eq!(page_of(16), 1);
        assert_eq!(page_of(255), 1);
        assert_eq!(page_of(256), 2);
        assert_eq!(page_of(u32::MAX), 7);
        assert_eq!(route(300), (2, 300 - 256));
    }

    #[test]
    fn sparse_large_keys_stay_bounded() {
        let mut arena = Arena::default();
        let mut set = PagedSparseSet::new();
        set.set(&mut arena, 3, 'a' as u32);
        set.set(&mut arena, 1 << 28, 'b' as u32);
        set.set(&mut arena, (1 << 28) + 5, 'c' as u32);
        assert_eq!(set.get(&arena, 3), Some(&('a' as u32)));
        assert_eq!(set.get(&arena, (1 << 28) + 5), Some(&('c' as u32)));
        assert_eq!(set.len(), 3);
        let page = &set.pages()[7];
        assert_eq!(page.len(), 2);
    }

    #[test]
    fn integer_mode_uses_absolute_keys() {
        let mut arena = Arena::default();
        let mut set = PagedSparseSet::integer(|v: &u32| *v);
        for k in [0u32, 17, 4096, 70_000] {
            set.set(&mut arena, k, k);
        }
        assert!(set.contains(&arena, 4096));
        assert_eq!(set.remove(&mut arena, 17), Some(17));
        let mut keys: Vec<u32> = set.keys(&arena).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![0, 4096, 70_000]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn agrees_with_btreeset(
                ops in proptest::collection::vec((any::<bool>(), 0usize..PAGE_COUNT, 0u32..64), 1..200)
            ) {
                let mut arena = Arena::default();
                let mut set = PagedSparseSet::integer(|v: &u32| *v);
                let mut model = BTreeSet::new();
                for (insert, page, offset) in ops {
                    let key = page_base(page) + offset;
                    if insert {
                        set.set(&mut arena, key, key);
                        model.insert(key);
                    } else {
                        prop_assert_eq!(set.remove(&mut arena, key).is_some(), model.remove(&key));
                    }
                }
                let mut keys: Vec<u32> = set.keys(&arena).collect();
                keys.sort_unstable();
                prop_assert_eq!(keys, model.into_iter().collect::<Vec<_>>());
            }
        }
    }
}
