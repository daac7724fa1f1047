#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for the Laser Tank rules engine.
//!
//! A [`BoardState`] pairs a dense tile grid with a [`PieceSet`]. Two boards
//! live side by side at most: the committed master board and a speculative
//! future board cloned from it. Registered [`BoardListener`]s observe every
//! square that changes so the speculative overlay can be kept current.

mod layout;
mod listeners;
mod pieces;

use log::warn;

use laser_tank_core::{
    Direction, Piece, PieceKind, Position, PushId, PushRecord, PushedPiece, TileKind, Vector,
    MAX_BOARD_DIMENSION,
};

pub use layout::{parse, render, LayoutError};
pub use listeners::{BoardListener, ListenerId, SharedListener};
pub use pieces::PieceSet;

/// Tile grid, pieces and level metadata of a single board.
#[derive(Debug)]
pub struct BoardState {
    level_id: u32,
    columns: i32,
    rows: i32,
    tiles: Vec<TileKind>,
    pieces: PieceSet,
    flag: Position,
    tank_start: Vector,
    last_push_id: PushId,
    listeners: listeners::Listeners,
}

impl BoardState {
    /// Creates a board of plain dirt with the provided dimensions.
    ///
    /// Dimensions are clamped to `0..=MAX_BOARD_DIMENSION`.
    #[must_use]
    pub fn new(columns: i32, rows: i32) -> Self {
        let columns = columns.clamp(0, MAX_BOARD_DIMENSION);
        let rows = rows.clamp(0, MAX_BOARD_DIMENSION);
        let capacity = usize::try_from(columns * rows).unwrap_or(0);
        Self {
            level_id: 0,
            columns,
            rows,
            tiles: vec![TileKind::Dirt; capacity],
            pieces: PieceSet::new(),
            flag: Position::NULL,
            tank_start: Vector::NULL,
            last_push_id: PushId::ZERO,
            listeners: listeners::Listeners::default(),
        }
    }

    /// Returns the board tagged with another level identifier.
    #[must_use]
    pub fn with_level_id(mut self, level_id: u32) -> Self {
        self.level_id = level_id;
        self
    }

    /// Identifier of the level the board was loaded from.
    #[must_use]
    pub const fn level_id(&self) -> u32 {
        self.level_id
    }

    /// Number of columns on the board.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of rows on the board.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Reports whether `at` lies on the board.
    #[must_use]
    pub const fn contains(&self, at: Position) -> bool {
        at.column() >= 0 && at.row() >= 0 && at.column() < self.columns && at.row() < self.rows
    }

    /// Tile at `at`; squares off the board read as [`TileKind::Empty`].
    #[must_use]
    pub fn tile_at(&self, at: Position) -> TileKind {
        self.index(at)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(TileKind::Empty)
    }

    /// Overwrites the tile at `at`. Squares off the board are ignored.
    pub fn set_tile_at(&mut self, kind: TileKind, at: Position) {
        let Some(slot) = self.index(at).and_then(|index| self.tiles.get_mut(index)) else {
            return;
        };
        *slot = kind;
        self.listeners.tile_changed(at);
    }

    /// Iterator over every on-board square and its tile in row-major order.
    pub fn squares(&self) -> impl Iterator<Item = (Position, TileKind)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = i32::try_from(index).unwrap_or(i32::MAX);
            (Position::new(index % columns, index / columns), *tile)
        })
    }

    /// Read-only access to the pieces on the board.
    #[must_use]
    pub const fn pieces(&self) -> &PieceSet {
        &self.pieces
    }

    /// Piece standing on `at`, if any.
    #[must_use]
    pub fn piece_at(&self, at: Position) -> Option<&Piece> {
        self.pieces.get(at)
    }

    /// Places a piece on its square, returning any occupant it replaced.
    pub fn insert_piece(&mut self, piece: Piece) -> Option<Piece> {
        let at = piece.position();
        let replaced = self.pieces.insert(piece);
        self.listeners.piece_inserted(at);
        replaced
    }

    /// Removes and returns the piece standing on `at`.
    pub fn erase_piece(&mut self, at: Position) -> Option<Piece> {
        let erased = self.pieces.erase(at)?;
        self.listeners.piece_erased(at);
        Some(erased)
    }

    /// Square holding the level's flag.
    #[must_use]
    pub const fn flag(&self) -> Position {
        self.flag
    }

    /// Records the square holding the level's flag.
    pub fn set_flag(&mut self, at: Position) {
        self.flag = at;
    }

    /// Square and heading the tank starts the level with.
    #[must_use]
    pub const fn tank_start(&self) -> Vector {
        self.tank_start
    }

    /// Records the tank's starting square and heading.
    pub fn set_tank_start(&mut self, start: Vector) {
        self.tank_start = start;
    }

    /// Stamp of the most recent push event applied to the board.
    #[must_use]
    pub const fn last_push_id(&self) -> PushId {
        self.last_push_id
    }

    /// Rolls the push counter back by `count` events.
    pub fn rewind_push_ids(&mut self, count: u32) {
        self.last_push_id = self.last_push_id.rewind(count);
    }

    /// Lands a pushed piece on `at` as a new push event.
    ///
    /// A tile-block landing on water sinks: the tile becomes
    /// [`TileKind::SunkTile`] and no piece is placed. Returns the stamp of the
    /// push event.
    pub fn apply_push_result(&mut self, kind: PieceKind, at: Position, angle: Direction) -> PushId {
        self.last_push_id = self.last_push_id.next();
        self.land(kind, at, angle);
        self.last_push_id
    }

    /// Shoves every piece standing on `origins` one square in `direction`.
    ///
    /// The whole row counts as one push event. Returns `None` without touching
    /// the board when any origin is vacant.
    pub fn apply_chain_push(
        &mut self,
        origins: &[Position],
        direction: Direction,
    ) -> Option<PushRecord> {
        if origins.is_empty() || origins.iter().any(|at| !self.pieces.contains(*at)) {
            return None;
        }

        let mut moved = Vec::with_capacity(origins.len());
        for &origin in origins {
            let piece = self.erase_piece(origin)?;
            moved.push(PushedPiece::capture(&piece));
        }

        self.last_push_id = self.last_push_id.next();
        for pushed in &moved {
            self.land(pushed.kind, pushed.to(direction), pushed.angle);
        }

        Some(PushRecord {
            direction,
            pieces: moved,
        })
    }

    /// Reverts the most recent push event described by `record`.
    ///
    /// Every moved piece is lifted from the square ahead of its origin (or
    /// the sunk block is turned back into water) and restored with its prior
    /// angle and stamp. A piece whose stamp does not match the current push
    /// counter indicates out-of-order undo and is logged, not rejected.
    pub fn revert_push(&mut self, record: &PushRecord) {
        let expected = self.last_push_id;
        for pushed in record.pieces.iter().rev() {
            let target = pushed.to(record.direction);
            let _ = self.lift(pushed.kind, target, expected);
        }

        self.last_push_id = self.last_push_id.rewind(1);
        for pushed in &record.pieces {
            let _ = self.insert_piece(pushed.original());
        }
    }

    /// Subscribes a listener to square change notifications.
    pub fn subscribe(&mut self, listener: SharedListener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Removes a previously registered listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Removes whatever a push left on `at`: the pushed piece itself or the
    /// sunk block it turned into.
    ///
    /// Returns `false` when nothing matching was found.
    pub fn lift(&mut self, kind: PieceKind, at: Position, expected: PushId) -> bool {
        if let Some(found) = self.erase_piece(at) {
            if found.pushed_id() != expected {
                warn!(
                    "push revert at ({}, {}) found stamp {} but expected {}",
                    at.column(),
                    at.row(),
                    found.pushed_id().get(),
                    expected.get()
                );
            }
            return true;
        }

        if kind == PieceKind::TileBlock && self.tile_at(at) == TileKind::SunkTile {
            self.set_tile_at(TileKind::Water, at);
            return true;
        }

        warn!(
            "push revert at ({}, {}) found no {:?} to lift",
            at.column(),
            at.row(),
            kind
        );
        false
    }

    fn land(&mut self, kind: PieceKind, at: Position, angle: Direction) {
        if kind == PieceKind::TileBlock && self.tile_at(at) == TileKind::Water {
            self.set_tile_at(TileKind::SunkTile, at);
        } else {
            let piece = Piece::new(kind, at, angle).with_pushed_id(self.last_push_id);
            let _ = self.insert_piece(piece);
        }
    }

    fn index(&self, at: Position) -> Option<usize> {
        if !self.contains(at) {
            return None;
        }
        usize::try_from(at.row() * self.columns + at.column()).ok()
    }
}

impl Clone for BoardState {
    /// Copies tiles, pieces and metadata. Listeners are not carried over.
    fn clone(&self) -> Self {
        Self {
            level_id: self.level_id,
            columns: self.columns,
            rows: self.rows,
            tiles: self.tiles.clone(),
            pieces: self.pieces.clone(),
            flag: self.flag,
            tank_start: self.tank_start,
            last_push_id: self.last_push_id,
            listeners: listeners::Listeners::default(),
        }
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        self.level_id == other.level_id
            && self.columns == other.columns
            && self.rows == other.rows
            && self.tiles == other.tiles
            && self.pieces == other.pieces
            && self.flag == other.flag
            && self.tank_start == other.tank_start
            && self.last_push_id == other.last_push_id
    }
}

impl Eq for BoardState {}

/// Query functions that provide read-only access to board state.
pub mod query {
    use laser_tank_core::{Position, TileKind};

    use super::BoardState;

    /// Lists every square whose tile or occupant differs between two boards.
    ///
    /// Pieces are compared by kind and angle; push stamps are ignored.
    #[must_use]
    pub fn differing_squares(left: &BoardState, right: &BoardState) -> Vec<Position> {
        let columns = left.columns().max(right.columns());
        let rows = left.rows().max(right.rows());
        let mut differing = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let at = Position::new(column, row);
                if !same_square(left, right, at) {
                    differing.push(at);
                }
            }
        }
        differing
    }

    /// Reports whether both boards show the same tile and occupant at `at`.
    #[must_use]
    pub fn same_square(left: &BoardState, right: &BoardState, at: Position) -> bool {
        let same_piece = match (left.piece_at(at), right.piece_at(at)) {
            (None, None) => true,
            (Some(a), Some(b)) => a.kind() == b.kind() && a.direction() == b.direction(),
            _ => false,
        };
        same_piece && left.tile_at(at) == right.tile_at(at)
    }

    /// Reports whether the tank standing on `at` has reached the flag.
    #[must_use]
    pub fn flag_reached(board: &BoardState, at: Position) -> bool {
        board.tile_at(at) == TileKind::Flag
    }
}
