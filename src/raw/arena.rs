use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage for tree nodes.
///
/// Freed slots are recycled through `free`. Slots that outstanding cursors may
/// still point at are parked in `deferred` instead, and only become reusable
/// once the owner calls [`Arena::release_deferred`].
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    deferred: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        let spare = self.free.len();
        self.slots.reserve(additional.saturating_sub(spare));
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing free slots can be dropped outright; interior holes stay.
        let extent = self.slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
        if extent < self.slots.len() {
            self.slots.truncate(extent);
            self.free.retain(|h| h.to_index() < extent);
        }
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Number of slots ever handed out and not yet shrunk away, holes included.
    pub(crate) fn extent(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots, deferred ones included.
    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() <= Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    /// Like [`Arena::get`], but tolerates handles past the end or pointing at a hole.
    #[inline]
    pub(crate) fn try_get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.to_index()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Swaps the element stored at `handle` for `element`, returning the old one.
    pub(crate) fn replace(&mut self, handle: Handle, element: T) -> T {
        let slot = self.slots[handle.to_index()].as_mut().expect("`Arena::replace()` - `handle` is invalid!");
        core::mem::replace(slot, element)
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    /// Keeps `handle` occupied but queues it for release.
    pub(crate) fn defer_free(&mut self, handle: Handle) {
        debug_assert!(self.slots[handle.to_index()].is_some(), "`Arena::defer_free()` - `handle` is invalid!");
        self.deferred.push(handle);
    }

    /// Frees the slots queued by [`Arena::defer_free`] that `keep` does not
    /// claim; the rest stay queued.
    pub(crate) fn release_deferred<F>(&mut self, mut keep: F)
    where
        F: FnMut(Handle) -> bool,
    {
        let mut index = 0;
        while index < self.deferred.len() {
            let handle = self.deferred[index];
            if keep(handle) {
                index += 1;
            } else {
                self.deferred.swap_remove(index);
                self.free(handle);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.deferred.clear();
    }
}
