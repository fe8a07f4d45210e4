use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::raw::Handle;

/// One cursor count per arena slot, shared between an index and its cursors.
type Board = Arc<[AtomicU32]>;

/// Tracks which arena slots have cursors parked on them.
///
/// The newest board always covers every slot the tree has handed out. When the
/// arena outgrows it a larger board is started; older boards live on while a
/// cursor still holds them and are dropped once the index is their only owner.
pub(crate) struct Pins {
    boards: Vec<Board>,
}

/// A count held on one slot for as long as a cursor is parked there.
pub(crate) struct Pin {
    board: Board,
    slot: Handle,
}

fn board(len: usize) -> Board {
    (0..len).map(|_| AtomicU32::new(0)).collect()
}

impl Pins {
    pub(crate) fn new(extent: usize) -> Self {
        Self {
            boards: alloc::vec![board(extent)],
        }
    }

    fn current(&self) -> &Board {
        self.boards.last().expect("`Pins::current()` - no board!")
    }

    /// Makes the newest board cover `extent` slots, sizing a new one to
    /// `capacity`, and drops boards no cursor holds any more.
    pub(crate) fn cover(&mut self, extent: usize, capacity: usize) {
        let newest = self.boards.len() - 1;
        let mut index = 0;
        self.boards.retain(|board| {
            let keep = index == newest || Arc::strong_count(board) > 1;
            index += 1;
            keep
        });
        if self.current().len() < extent {
            self.boards.push(board(capacity.max(extent)));
        }
    }

    /// Parks `pin` on `slot`, releasing whatever slot it held before.
    pub(crate) fn park(&self, pin: &mut Option<Pin>, slot: Handle) {
        let current = self.current();
        current[slot.to_index()].fetch_add(1, Ordering::AcqRel);
        if let Some(held) = pin.as_mut().filter(|held| Arc::ptr_eq(&held.board, current)) {
            held.board[held.slot.to_index()].fetch_sub(1, Ordering::AcqRel);
            held.slot = slot;
        } else {
            *pin = Some(Pin {
                board: Arc::clone(current),
                slot,
            });
        }
    }

    /// Returns `true` if `pin` was handed out by this set of boards.
    pub(crate) fn owns(&self, pin: &Pin) -> bool {
        self.boards.iter().any(|board| Arc::ptr_eq(board, &pin.board))
    }

    /// Returns `true` while any cursor is parked on `slot`.
    pub(crate) fn is_pinned(&self, slot: Handle) -> bool {
        self.boards
            .iter()
            .any(|board| board.get(slot.to_index()).is_some_and(|count| count.load(Ordering::Acquire) > 0))
    }

    /// Returns `true` while any cursor is parked anywhere.
    #[cfg(test)]
    pub(crate) fn any(&self) -> bool {
        self.boards.iter().any(|board| Arc::strong_count(board) > 1)
    }
}

impl Clone for Pin {
    fn clone(&self) -> Self {
        self.board[self.slot.to_index()].fetch_add(1, Ordering::AcqRel);
        Self {
            board: Arc::clone(&self.board),
            slot: self.slot,
        }
    }
}

impl Drop for Pin {
    fn drop(&mut self) {
        self.board[self.slot.to_index()].fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parking_moves_the_count() {
        let pins = Pins::new(4);
        let (a, b) = (Handle::from_index(1), Handle::from_index(3));

        let mut pin = None;
        pins.park(&mut pin, a);
        assert!(pins.is_pinned(a));
        pins.park(&mut pin, b);
        assert!(!pins.is_pinned(a));
        assert!(pins.is_pinned(b));

        let fork = pin.clone();
        drop(pin);
        assert!(pins.is_pinned(b));
        drop(fork);
        assert!(!pins.is_pinned(b));
        assert!(!pins.any());
    }

    #[test]
    fn old_boards_live_while_held() {
        let mut pins = Pins::new(2);
        let mut old = None;
        pins.park(&mut old, Handle::from_index(1));

        pins.cover(5, 8);
        assert_eq!(pins.boards.len(), 2);
        assert!(pins.is_pinned(Handle::from_index(1)));

        let mut new = None;
        pins.park(&mut new, Handle::from_index(4));
        assert!(pins.owns(old.as_ref().expect("parked")));

        // Re-parking moves the old pin onto the newest board.
        pins.park(&mut old, Handle::from_index(0));
        pins.cover(5, 8);
        assert_eq!(pins.boards.len(), 1);
        assert!(pins.is_pinned(Handle::from_index(0)));
        assert!(!pins.is_pinned(Handle::from_index(1)));
    }

    #[test]
    fn foreign_pins_are_not_owned() {
        let a = Pins::new(2);
        let b = Pins::new(2);
        let mut pin = None;
        a.park(&mut pin, Handle::from_index(0));
        let pin = pin.expect("parked");
        assert!(a.owns(&pin));
        assert!(!b.owns(&pin));
    }
}
