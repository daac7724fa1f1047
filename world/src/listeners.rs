//! Synchronous change notifications emitted by a board.

use std::{cell::RefCell, fmt, rc::Rc};

use laser_tank_core::Position;

/// Observer notified whenever a board square changes.
///
/// Callbacks run synchronously inside the mutating call and must not reach
/// back into the board that emitted them.
pub trait BoardListener {
    /// A piece was placed on `at`.
    fn on_piece_inserted(&mut self, at: Position);
    /// The piece standing on `at` was removed.
    fn on_piece_erased(&mut self, at: Position);
    /// The tile at `at` was overwritten.
    fn on_tile_changed(&mut self, at: Position);
}

/// Listener handle shared between a board and its owner.
pub type SharedListener = Rc<RefCell<dyn BoardListener>>;

/// Token returned by a subscription, used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, SharedListener)>,
    next_id: u32,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, listener: SharedListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn piece_inserted(&self, at: Position) {
        for (_, listener) in &self.entries {
            listener.borrow_mut().on_piece_inserted(at);
        }
    }

    pub(crate) fn piece_erased(&self, at: Position) {
        for (_, listener) in &self.entries {
            listener.borrow_mut().on_piece_erased(at);
        }
    }

    pub(crate) fn tile_changed(&self, at: Position) {
        for (_, listener) in &self.entries {
            listener.borrow_mut().on_tile_changed(at);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("subscribed", &self.entries.len())
            .finish()
    }
}
