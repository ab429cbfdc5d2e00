// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chunked arena list used for quad and shared-state storage.
//!
//! A [`ListContainer`] stores its elements in a sequence of *inner lists*.
//! Every inner list has a fixed logical capacity chosen when it is created;
//! when the tail inner list fills up, a new one with twice the capacity is
//! appended. Elements never move between inner lists, so growth never
//! relocates existing elements.
//!
//! Two operations deliberately break that stability and say so in their
//! names: [`ListContainer::erase_and_invalidate_all_pointers`] shifts the
//! remainder of one inner list down by one slot, and
//! [`ListContainer::replace_existing_element`] swaps the value stored in a
//! slot.

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};
use core::{fmt, mem, slice};

/// Number of elements reserved by the first inner list when the caller does
/// not ask for a specific count.
pub const DEFAULT_NUM_ELEMENTS: usize = 32;

#[derive(Clone)]
struct InnerList<T> {
    items: Vec<T>,
    /// Logical capacity. Shrinks by one on every erase and never grows.
    capacity: usize,
}

impl<T> InnerList<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

/// An insertion-ordered arena of `T` grown in geometrically sized chunks.
///
/// The slot size of the arena is `size_of::<T>()`; for a closed family of
/// variants stored as one enum this is the size of the largest variant.
#[derive(Clone)]
pub struct ListContainer<T> {
    lists: Vec<InnerList<T>>,
    /// Index of the inner list that receives the next element. Every inner
    /// list after it is empty.
    last_list_index: usize,
    size: usize,
}

impl<T: fmt::Debug> fmt::Debug for ListContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for ListContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListContainer<T> {
    /// Creates an empty container whose first inner list holds
    /// [`DEFAULT_NUM_ELEMENTS`] elements.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NUM_ELEMENTS)
    }

    /// Creates an empty container whose first inner list holds `count`
    /// elements (or [`DEFAULT_NUM_ELEMENTS`] when `count` is zero).
    #[must_use]
    pub fn with_capacity(count: usize) -> Self {
        let count = if count == 0 {
            DEFAULT_NUM_ELEMENTS
        } else {
            count
        };
        Self {
            lists: alloc::vec![InnerList::with_capacity(count)],
            last_list_index: 0,
            size: 0,
        }
    }

    /// Size in bytes of one element slot.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        size_of::<T>()
    }

    /// Number of live elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the container holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of inner lists currently allocated, including spare empty ones.
    #[must_use]
    pub fn inner_list_count(&self) -> usize {
        self.lists.len()
    }

    /// Number of elements that can be appended before another inner list is
    /// needed.
    #[must_use]
    pub fn available_size_without_another_allocation(&self) -> usize {
        let last = &self.lists[self.last_list_index];
        last.capacity - last.items.len()
    }

    /// Appends `value` and returns a reference to its slot.
    pub fn push(&mut self, value: T) -> &mut T {
        self.ensure_tail_space();
        self.size += 1;
        let list = &mut self.lists[self.last_list_index];
        let slot = list.items.len();
        list.items.push(value);
        &mut list.items[slot]
    }

    /// Appends a default-constructed element and returns a reference to it.
    pub fn push_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.push(T::default())
    }

    fn ensure_tail_space(&mut self) {
        while self.lists[self.last_list_index].is_full() {
            // Reuse a spare list left behind by `remove_last` before growing.
            if self.last_list_index + 1 >= self.lists.len() {
                let capacity = (self.lists[self.last_list_index].capacity * 2).max(1);
                self.lists.push(InnerList::with_capacity(capacity));
            }
            self.last_list_index += 1;
        }
    }

    /// Removes and returns the last element.
    ///
    /// When the tail inner list becomes empty, the container steps back to
    /// the previous inner list but keeps the emptied one as a spare. A spare
    /// is only released once two of them would exist.
    pub fn remove_last(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }
        while self.lists[self.last_list_index].items.is_empty() && self.last_list_index > 0 {
            self.last_list_index -= 1;
        }
        let value = self.lists[self.last_list_index].items.pop();
        if self.lists[self.last_list_index].items.is_empty() && self.last_list_index > 0 {
            self.last_list_index -= 1;
            if self.last_list_index + 2 < self.lists.len() {
                self.lists.pop();
            }
        }
        self.size -= 1;
        value
    }

    /// Removes the element at `index`, shifting the rest of its inner list
    /// down by one slot, and returns it.
    ///
    /// The inner list's capacity shrinks by one; the freed slot is not
    /// reused. References obtained before this call must be considered
    /// invalid.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn erase_and_invalidate_all_pointers(&mut self, index: usize) -> T {
        let Some((list, offset)) = self.position(index) else {
            panic!("erase index {index} out of bounds (len {})", self.size);
        };
        let inner = &mut self.lists[list];
        let value = inner.items.remove(offset);
        inner.capacity -= 1;
        self.size -= 1;
        value
    }

    /// Replaces the element at `index` with `value` in place and returns the
    /// previous element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn replace_existing_element(&mut self, index: usize, value: T) -> T {
        mem::replace(&mut self[index], value)
    }

    /// Removes every element, keeping only the first inner list's storage.
    pub fn clear(&mut self) {
        self.lists.truncate(1);
        self.lists[0].items.clear();
        self.last_list_index = 0;
        self.size = 0;
    }

    /// Exchanges the contents of two containers.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns the element at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let (list, offset) = self.position(index)?;
        Some(&self.lists[list].items[offset])
    }

    /// Returns the element at `index` mutably, or `None` if out of bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (list, offset) = self.position(index)?;
        Some(&mut self.lists[list].items[offset])
    }

    /// Returns the first element.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the first element mutably.
    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns the last element.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.size.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Returns the last element mutably.
    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.size.checked_sub(1)?;
        self.get_mut(last)
    }

    /// Iterates over elements in insertion order. Use `.rev()` for reverse
    /// order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            lists: self.lists.iter(),
            front: [].iter(),
            back: [].iter(),
            remaining: self.size,
        }
    }

    /// Iterates mutably over elements in insertion order.
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            lists: self.lists.iter_mut(),
            front: slice::IterMut::default(),
            back: slice::IterMut::default(),
            remaining: self.size,
        }
    }

    /// Maps a flat index to `(inner list, offset)`, skipping empty lists.
    fn position(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.size {
            return None;
        }
        let mut remaining = index;
        for (i, list) in self.lists.iter().enumerate() {
            let len = list.items.len();
            if remaining < len {
                return Some((i, remaining));
            }
            remaining -= len;
        }
        None
    }
}

impl<T> Index<usize> for ListContainer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {index} out of bounds (len {})", self.size),
        }
    }
}

impl<T> IndexMut<usize> for ListContainer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.size;
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("index {index} out of bounds (len {len})"),
        }
    }
}

impl<'a, T> IntoIterator for &'a ListContainer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut ListContainer<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

/// Iterator over a [`ListContainer`] in insertion order.
///
/// Created by [`ListContainer::iter`].
#[derive(Clone)]
pub struct Iter<'a, T> {
    lists: slice::Iter<'a, InnerList<T>>,
    front: slice::Iter<'a, T>,
    back: slice::Iter<'a, T>,
    remaining: usize,
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.front.next() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.lists.next() {
                Some(list) => self.front = list.items.iter(),
                None => {
                    let item = self.back.next()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.back.next_back() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.lists.next_back() {
                Some(list) => self.back = list.items.iter(),
                None => {
                    let item = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable iterator over a [`ListContainer`] in insertion order.
///
/// Created by [`ListContainer::iter_mut`].
pub struct IterMut<'a, T> {
    lists: slice::IterMut<'a, InnerList<T>>,
    front: slice::IterMut<'a, T>,
    back: slice::IterMut<'a, T>,
    remaining: usize,
}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(item) = self.front.next() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.lists.next() {
                Some(list) => self.front = list.items.iter_mut(),
                None => {
                    let item = self.back.next()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(item) = self.back.next_back() {
                self.remaining -= 1;
                return Some(item);
            }
            match self.lists.next_back() {
                Some(list) => self.back = list.items.iter_mut(),
                None => {
                    let item = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(item);
                }
            }
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
