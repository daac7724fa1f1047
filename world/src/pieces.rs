//! Position-keyed storage for the pieces standing on a board.

use std::collections::BTreeMap;

use laser_tank_core::{Piece, PieceKind, Position};

/// Collection of pieces keyed by the square they occupy.
///
/// At most one piece exists per square; inserting onto an occupied square
/// replaces the previous occupant and hands it back to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PieceSet {
    entries: BTreeMap<Position, Piece>,
}

impl PieceSet {
    /// Creates an empty piece set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the piece occupying `at`, if any.
    #[must_use]
    pub fn get(&self, at: Position) -> Option<&Piece> {
        self.entries.get(&at)
    }

    /// Reports whether a piece occupies `at`.
    #[must_use]
    pub fn contains(&self, at: Position) -> bool {
        self.entries.contains_key(&at)
    }

    /// Iterator over the pieces in row-major order of their squares.
    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        let mut ordered: Vec<&Piece> = self.entries.values().collect();
        ordered.sort_by_key(|piece| (piece.position().row(), piece.position().column()));
        ordered.into_iter()
    }

    /// Iterator over the pieces of a single kind.
    pub fn of_kind(&self, kind: PieceKind) -> impl Iterator<Item = &Piece> {
        self.iter().filter(move |piece| piece.kind() == kind)
    }

    /// Number of pieces in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the set holds no pieces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, piece: Piece) -> Option<Piece> {
        self.entries.insert(piece.position(), piece)
    }

    pub(crate) fn erase(&mut self, at: Position) -> Option<Piece> {
        self.entries.remove(&at)
    }
}
