//! Growable flat buffer backed by an arena region.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;
use burrow_core::Violation;

use crate::arena::Arena;
use crate::handle::Region;

/// A growable array of plain-old-data elements living in an [`Arena`].
///
/// The list stores only a [`Region`] handle plus its count and capacity;
/// every operation takes the arena explicitly. Capacity doubles on growth
/// and halves once occupancy falls to a quarter, so a list hovering around
/// a power-of-two boundary does not thrash.
///
/// Lists are not `Clone`: two copies would alias the same region.
pub struct List<T> {
    region: Region,
    len: usize,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> List<T> {
    /// Smallest non-zero capacity.
    pub const MIN_CAPACITY: usize = 4;

    /// Create an empty list. Nothing is allocated until the first push.
    pub fn new() -> Self {
        assert!(
            std::mem::size_of::<T>() > 0,
            "List cannot hold zero-sized elements"
        );
        Self {
            region: Region::EMPTY,
            len: 0,
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Create an empty list with room for at least `capacity` elements.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        let mut list = Self::new();
        if capacity > 0 {
            list.resize_to(arena, capacity.max(Self::MIN_CAPACITY).next_power_of_two());
        }
        list
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current region can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The backing region.
    pub fn region(&self) -> Region {
        self.region
    }

    /// The live elements.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        &arena.slice::<T>(self.region)[..self.len]
    }

    /// The live elements, mutably.
    pub fn as_mut_slice<'a>(&self, arena: &'a mut Arena) -> &'a mut [T] {
        &mut arena.slice_mut::<T>(self.region)[..self.len]
    }

    /// Iterate over the live elements.
    pub fn iter<'a>(&self, arena: &'a Arena) -> std::slice::Iter<'a, T> {
        self.as_slice(arena).iter()
    }

    /// Borrow the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::OutOfBounds`] if `index >= len`.
    pub fn get<'a>(&self, arena: &'a Arena, index: usize) -> &'a T {
        self.bounds(index);
        &self.as_slice(arena)[index]
    }

    /// Mutably borrow the element at `index`.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, index: usize) -> &'a mut T {
        self.bounds(index);
        &mut self.as_mut_slice(arena)[index]
    }

    /// Overwrite the element at `index`.
    pub fn set(&self, arena: &mut Arena, index: usize, value: T) {
        *self.get_mut(arena, index) = value;
    }

    /// The last element, if any.
    pub fn last<'a>(&self, arena: &'a Arena) -> Option<&'a T> {
        self.as_slice(arena).last()
    }

    /// Append an element.
    pub fn push(&mut self, arena: &mut Arena, value: T) {
        self.reserve(arena, 1);
        self.len += 1;
        let last = self.len - 1;
        self.as_mut_slice(arena)[last] = value;
    }

    /// Remove and return the last element.
    pub fn pop(&mut self, arena: &mut Arena) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = *self.get(arena, self.len - 1);
        self.len -= 1;
        self.shrink_check(arena);
        Some(value)
    }

    /// Insert an element at `index`, shifting later elements right.
    pub fn insert(&mut self, arena: &mut Arena, index: usize, value: T) {
        if index > self.len {
            Violation::OutOfBounds {
                index,
                len: self.len,
            }
            .raise();
        }
        self.reserve(arena, 1);
        self.len += 1;
        let slice = self.as_mut_slice(arena);
        slice.copy_within(index..slice.len() - 1, index + 1);
        slice[index] = value;
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn remove(&mut self, arena: &mut Arena, index: usize) -> T {
        self.bounds(index);
        let slice = self.as_mut_slice(arena);
        let value = slice[index];
        slice.copy_within(index + 1.., index);
        self.len -= 1;
        self.shrink_check(arena);
        value
    }

    /// Remove the element at `index` by moving the last element into its slot.
    pub fn swap_remove(&mut self, arena: &mut Arena, index: usize) -> T {
        self.bounds(index);
        let slice = self.as_mut_slice(arena);
        let value = slice[index];
        slice[index] = slice[slice.len() - 1];
        self.len -= 1;
        self.shrink_check(arena);
        value
    }

    /// Prepend `count` copies of `value`.
    pub fn fill_front(&mut self, arena: &mut Arena, count: usize, value: T) {
        if count == 0 {
            return;
        }
        self.reserve(arena, count);
        let old_len = self.len;
        self.len += count;
        let slice = self.as_mut_slice(arena);
        slice.copy_within(..old_len, count);
        slice[..count].fill(value);
    }

    /// Append `count` copies of `value`.
    pub fn fill_back(&mut self, arena: &mut Arena, count: usize, value: T) {
        if count == 0 {
            return;
        }
        self.reserve(arena, count);
        let old_len = self.len;
        self.len += count;
        self.as_mut_slice(arena)[old_len..].fill(value);
    }

    /// Drop the first `count` elements, shifting the rest to the front.
    pub fn drain_front(&mut self, arena: &mut Arena, count: usize) {
        let count = count.min(self.len);
        if count == 0 {
            return;
        }
        let slice = self.as_mut_slice(arena);
        slice.copy_within(count.., 0);
        self.len -= count;
        self.shrink_check(arena);
    }

    /// Remove every element.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.len = 0;
        self.shrink_check(arena);
    }

    /// Ensure room for `additional` more elements, doubling as needed.
    pub fn reserve(&mut self, arena: &mut Arena, additional: usize) {
        let needed = self.len + additional;
        if needed <= self.capacity {
            return;
        }
        let mut capacity = self.capacity.max(Self::MIN_CAPACITY);
        while capacity < needed {
            capacity *= 2;
        }
        self.resize_to(arena, capacity);
    }

    /// Halve the capacity once if occupancy is at or below a quarter.
    fn shrink_check(&mut self, arena: &mut Arena) {
        if self.capacity > Self::MIN_CAPACITY && self.len <= self.capacity / 4 {
            self.resize_to(arena, self.capacity / 2);
        }
    }

    fn resize_to(&mut self, arena: &mut Arena, capacity: usize) {
        let bytes = capacity * std::mem::size_of::<T>();
        self.region = arena.realloc(self.region, bytes);
        self.capacity = capacity;
    }

    fn bounds(&self, index: usize) {
        if index >= self.len {
            Violation::OutOfBounds {
                index,
                len: self.len,
            }
            .raise();
        }
    }
}

impl<T: Pod> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("region", &self.region)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}
