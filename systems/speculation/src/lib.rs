#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Speculative future board mirrored against the master board.
//!
//! [`SpeculativeDelta`] owns a clone of the master board on which queued
//! moves and shots are played out ahead of time. It listens to square
//! changes on both boards and keeps a per-square overlay of where the future
//! differs from the present, so renderers can draw "ghost" pieces without
//! diffing the whole board after every change.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use log::debug;

use laser_tank_core::Position;
use laser_tank_world::{BoardListener, BoardState, ListenerId};

/// How the future board differs from the master board on one square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayMarker {
    /// The future shows something the master board does not.
    FutureInsert,
    /// The future loses something the master board shows.
    FutureErase,
}

#[derive(Debug, Default)]
struct DirtySquares {
    squares: BTreeSet<Position>,
}

impl BoardListener for DirtySquares {
    fn on_piece_inserted(&mut self, at: Position) {
        let _ = self.squares.insert(at);
    }

    fn on_piece_erased(&mut self, at: Position) {
        let _ = self.squares.insert(at);
    }

    fn on_tile_changed(&mut self, at: Position) {
        let _ = self.squares.insert(at);
    }
}

#[derive(Clone, Copy, Debug)]
struct Subscriptions {
    master: ListenerId,
    future: ListenerId,
}

/// Future board plus the overlay describing how it differs from the master.
#[derive(Debug)]
pub struct SpeculativeDelta {
    future: Option<BoardState>,
    subscriptions: Option<Subscriptions>,
    markers: BTreeMap<Position, OverlayMarker>,
    dirty: Rc<RefCell<DirtySquares>>,
}

impl SpeculativeDelta {
    /// Creates a disabled delta with no future board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            future: None,
            subscriptions: None,
            markers: BTreeMap::new(),
            dirty: Rc::new(RefCell::new(DirtySquares::default())),
        }
    }

    /// Reports whether the future board is live and tracked.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.subscriptions.is_some()
    }

    /// Starts or stops speculation.
    ///
    /// Enabling clones `master` into a fresh future board and begins tracking
    /// both. Disabling stops tracking and clears the overlay; the future
    /// board's contents are retained until the next enable replaces them.
    /// Repeating the current state is a no-op.
    pub fn enable(&mut self, on: bool, master: &mut BoardState) {
        match (on, self.subscriptions) {
            (true, None) => {
                let mut future = master.clone();
                let subscriptions = Subscriptions {
                    master: master.subscribe(self.dirty.clone()),
                    future: future.subscribe(self.dirty.clone()),
                };
                self.future = Some(future);
                self.subscriptions = Some(subscriptions);
                self.dirty.borrow_mut().squares.clear();
                self.markers.clear();
                debug!("speculation enabled for level {}", master.level_id());
            }
            (false, Some(subscriptions)) => {
                let _ = master.unsubscribe(subscriptions.master);
                if let Some(future) = self.future.as_mut() {
                    let _ = future.unsubscribe(subscriptions.future);
                }
                self.subscriptions = None;
                self.dirty.borrow_mut().squares.clear();
                self.markers.clear();
                debug!("speculation disabled for level {}", master.level_id());
            }
            _ => {}
        }
    }

    /// Future board, while speculation is enabled.
    #[must_use]
    pub fn future(&self) -> Option<&BoardState> {
        self.future.as_ref().filter(|_| self.is_enabled())
    }

    /// Mutable future board, while speculation is enabled.
    pub fn future_mut(&mut self) -> Option<&mut BoardState> {
        if self.is_enabled() {
            self.future.as_mut()
        } else {
            None
        }
    }

    /// Recomputes the overlay marker for a single square.
    pub fn on_change_at(&mut self, at: Position, master: &BoardState) {
        let Some(future) = self.future() else {
            return;
        };

        let tiles_equal = master.tile_at(at) == future.tile_at(at);
        let marker = match (master.piece_at(at), future.piece_at(at)) {
            (None, None) if tiles_equal => None,
            (None, _) => Some(OverlayMarker::FutureInsert),
            (Some(_), None) => Some(OverlayMarker::FutureErase),
            (Some(_), Some(_)) if !tiles_equal => Some(OverlayMarker::FutureErase),
            (Some(present), Some(projected))
                if present.kind() == projected.kind()
                    && present.direction() == projected.direction() =>
            {
                None
            }
            (Some(_), Some(_)) => Some(OverlayMarker::FutureInsert),
        };

        match marker {
            Some(marker) => {
                let _ = self.markers.insert(at, marker);
            }
            None => {
                let _ = self.markers.remove(&at);
            }
        }
    }

    /// Recomputes the markers of every square changed since the last refresh.
    ///
    /// Returns the squares that were recomputed.
    pub fn refresh(&mut self, master: &BoardState) -> Vec<Position> {
        let squares: Vec<Position> = std::mem::take(&mut self.dirty.borrow_mut().squares)
            .into_iter()
            .collect();
        for &at in &squares {
            self.on_change_at(at, master);
        }
        squares
    }

    /// Overlay marker currently recorded for `at`.
    #[must_use]
    pub fn marker_at(&self, at: Position) -> Option<OverlayMarker> {
        self.markers.get(&at).copied()
    }

    /// Every overlay marker in square order.
    pub fn markers(&self) -> impl Iterator<Item = (Position, OverlayMarker)> + '_ {
        self.markers.iter().map(|(at, marker)| (*at, *marker))
    }
}

impl Default for SpeculativeDelta {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_tank_core::{Direction, Piece, PieceKind, TileKind};
    use laser_tank_world::parse;

    #[test]
    fn enable_twice_keeps_a_single_clone() {
        let mut master = parse("T>.M.\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);
        let at = Position::new(4, 0);
        delta
            .future_mut()
            .expect("future board")
            .set_tile_at(TileKind::Wood, at);
        let snapshot = delta.future().expect("future board").clone();

        delta.enable(true, &mut master);
        assert_eq!(delta.future(), Some(&snapshot), "re-enabling must not re-clone");
    }

    #[test]
    fn reenable_clones_current_master() {
        let mut master = parse("T>.M.\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);
        delta
            .future_mut()
            .expect("future board")
            .set_tile_at(TileKind::Wood, Position::new(4, 0));

        delta.enable(false, &mut master);
        assert!(delta.future().is_none());
        assert_eq!(delta.markers().count(), 0);

        master.set_tile_at(TileKind::Stone, Position::new(2, 0));
        delta.enable(true, &mut master);
        assert_eq!(delta.future(), Some(&master));
    }

    #[test]
    fn disable_twice_is_a_no_op() {
        let mut master = parse("..\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(false, &mut master);
        assert!(!delta.is_enabled());
        delta.enable(true, &mut master);
        delta.enable(false, &mut master);
        delta.enable(false, &mut master);
        assert!(!delta.is_enabled());
    }

    #[test]
    fn markers_follow_piece_traffic() {
        let mut master = parse(".M..\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);

        let future = delta.future_mut().expect("future board");
        let block = future.erase_piece(Position::new(1, 0)).expect("block");
        let _ = future.insert_piece(block.moved_to(Position::new(2, 0)));
        let changed = delta.refresh(&master);

        assert_eq!(changed, vec![Position::new(1, 0), Position::new(2, 0)]);
        assert_eq!(
            delta.marker_at(Position::new(1, 0)),
            Some(OverlayMarker::FutureErase)
        );
        assert_eq!(
            delta.marker_at(Position::new(2, 0)),
            Some(OverlayMarker::FutureInsert)
        );

        let future = delta.future_mut().expect("future board");
        let block = future.erase_piece(Position::new(2, 0)).expect("block");
        let _ = future.insert_piece(block.moved_to(Position::new(1, 0)));
        let _ = delta.refresh(&master);
        assert_eq!(delta.markers().count(), 0, "undoing the move clears the overlay");
    }

    #[test]
    fn master_changes_are_tracked_too() {
        let mut master = parse("...\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);

        let _ = master.insert_piece(Piece::new(
            PieceKind::Cannon,
            Position::new(0, 0),
            Direction::Down,
        ));
        let _ = delta.refresh(&master);
        assert_eq!(
            delta.marker_at(Position::new(0, 0)),
            Some(OverlayMarker::FutureErase)
        );
    }

    #[test]
    fn differing_pieces_and_tiles_are_marked() {
        let mut master = parse(".M.\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);

        let future = delta.future_mut().expect("future board");
        let _ = future.insert_piece(Piece::new(
            PieceKind::Cannon,
            Position::new(1, 0),
            Direction::Left,
        ));
        future.set_tile_at(TileKind::Wood, Position::new(2, 0));
        let _ = delta.refresh(&master);

        assert_eq!(
            delta.marker_at(Position::new(1, 0)),
            Some(OverlayMarker::FutureInsert)
        );
        assert_eq!(
            delta.marker_at(Position::new(2, 0)),
            Some(OverlayMarker::FutureInsert)
        );
        assert_eq!(delta.marker_at(Position::new(0, 0)), None);
    }
}
