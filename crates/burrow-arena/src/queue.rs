//! Double-ended buffer layered on [`List`].

use std::fmt;

use bytemuck::Pod;

use crate::arena::Arena;
use crate::list::List;

/// A FIFO buffer that also supports pushing and popping at either end.
///
/// Elements live in `list[first..]`. Popping from the front advances
/// `first`; when the queue drains the list is cleared, and once more than
/// half the list has been consumed the live tail is shifted back to the
/// start. Both paths let the list reconsider its capacity.
pub struct Queue<T> {
    list: List<T>,
    first: usize,
}

impl<T: Pod> Queue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            list: List::new(),
            first: 0,
        }
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.list.len() - self.first
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the underlying list.
    pub fn capacity(&self) -> usize {
        self.list.capacity()
    }

    /// Append at the back.
    pub fn push_back(&mut self, arena: &mut Arena, value: T) {
        self.list.push(arena, value);
    }

    /// Insert at the front.
    pub fn push_front(&mut self, arena: &mut Arena, value: T) {
        if self.first > 0 {
            self.first -= 1;
            self.list.set(arena, self.first, value);
        } else {
            self.list.insert(arena, 0, value);
        }
    }

    /// Remove and return the front element.
    pub fn pop_front(&mut self, arena: &mut Arena) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = *self.list.get(arena, self.first);
        self.first += 1;
        if self.first == self.list.len() {
            self.first = 0;
            self.list.clear(arena);
        } else if self.first > self.list.len() / 2 {
            self.list.drain_front(arena, self.first);
            self.first = 0;
        }
        Some(value)
    }

    /// Remove and return the back element.
    pub fn pop_back(&mut self, arena: &mut Arena) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.list.pop(arena);
        if self.is_empty() {
            self.first = 0;
            self.list.clear(arena);
        }
        value
    }

    /// The front element, if any.
    pub fn front<'a>(&self, arena: &'a Arena) -> Option<&'a T> {
        self.as_slice(arena).first()
    }

    /// The back element, if any.
    pub fn back<'a>(&self, arena: &'a Arena) -> Option<&'a T> {
        self.as_slice(arena).last()
    }

    /// Queued elements, front first.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        &self.list.as_slice(arena)[self.first..]
    }

    /// Iterate front to back.
    pub fn iter<'a>(&self, arena: &'a Arena) -> std::slice::Iter<'a, T> {
        self.as_slice(arena).iter()
    }

    /// Remove every element.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.first = 0;
        self.list.clear(arena);
    }
}

impl<T: Pod> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("list", &self.list)
            .field("first", &self.first)
            .finish()
    }
}
