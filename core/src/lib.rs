#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core vocabulary shared across the Laser Tank rules engine.
//!
//! This crate defines the value types that connect the authoritative board,
//! the pure rule systems and the speculative planning layer. Boards are
//! addressed with [`Position`] values, beams and tanks travel along a
//! [`Direction`], and every reversible mutation applied to a speculative board
//! is captured as a [`FutureChange`] so it can be replayed back-to-front.

use serde::{Deserialize, Serialize};

/// Largest number of columns or rows a board may span.
pub const MAX_BOARD_DIMENSION: i32 = 100;

/// Location of a single board square expressed as column and row coordinates.
///
/// Coordinates are signed so that squares stepped off the board edge remain
/// representable; such squares read as [`TileKind::Empty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    column: i32,
    row: i32,
}

impl Position {
    /// Sentinel used where no square applies.
    pub const NULL: Self = Self::new(-1, -1);

    /// Creates a new board position.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the square.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the square.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Reports whether the position is the null sentinel.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.column == Self::NULL.column && self.row == Self::NULL.row
    }

    /// Returns the adjacent square in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        self.step_by(direction, 1)
    }

    /// Returns the square `count` steps away in the provided direction.
    ///
    /// Negative counts walk against the direction.
    #[must_use]
    pub const fn step_by(self, direction: Direction, count: i32) -> Self {
        let (column_delta, row_delta) = direction.delta();
        Self::new(
            self.column + column_delta * count,
            self.row + row_delta * count,
        )
    }
}

/// Cardinal directions expressed in the board's angle convention.
///
/// Angles grow clockwise starting from "up": 0, 90, 180 and 270 degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Travel toward decreasing row indices (0 degrees).
    Up,
    /// Travel toward increasing column indices (90 degrees).
    Right,
    /// Travel toward increasing row indices (180 degrees).
    Down,
    /// Travel toward decreasing column indices (270 degrees).
    Left,
}

impl Direction {
    /// All directions in clockwise order starting from [`Direction::Up`].
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Converts an angle in degrees into a direction.
    ///
    /// Only the four cardinal angles are legal; anything else yields `None`.
    #[must_use]
    pub const fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Up),
            90 => Some(Self::Right),
            180 => Some(Self::Down),
            270 => Some(Self::Left),
            _ => None,
        }
    }

    /// Angle of the direction in degrees.
    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::Up => 0,
            Self::Right => 90,
            Self::Down => 180,
            Self::Left => 270,
        }
    }

    /// Column and row offsets of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// Direction rotated a quarter turn clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Reports whether the two directions differ by exactly 180 degrees.
    #[must_use]
    pub const fn is_opposite(self, other: Self) -> bool {
        (self.degrees() - other.degrees()).abs() == 180
    }

    /// Reports whether the direction runs along the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }
}

/// Position paired with a heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    position: Position,
    direction: Direction,
}

impl Vector {
    /// Sentinel vector anchored at [`Position::NULL`].
    pub const NULL: Self = Self::new(Position::NULL, Direction::Up);

    /// Creates a new vector.
    #[must_use]
    pub const fn new(position: Position, direction: Direction) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// Square the vector is anchored on.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Heading of the vector.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Square directly ahead of the vector.
    #[must_use]
    pub const fn ahead(&self) -> Position {
        self.position.step(self.direction)
    }

    /// Returns the same heading anchored on another square.
    #[must_use]
    pub const fn moved_to(self, position: Position) -> Self {
        Self::new(position, self.direction)
    }

    /// Returns the same square with another heading.
    #[must_use]
    pub const fn turned_to(self, direction: Direction) -> Self {
        Self::new(self.position, direction)
    }
}

/// Orientation of a stone slit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slit {
    /// Horizontal opening; beams travelling at 90 or 270 degrees pass.
    Horizontal,
    /// Vertical opening; beams travelling at 0 or 180 degrees pass.
    Vertical,
}

impl Slit {
    /// Reports whether a beam travelling in `direction` passes the slit.
    #[must_use]
    pub const fn passes(self, direction: Direction) -> bool {
        match self {
            Self::Horizontal => direction.is_horizontal(),
            Self::Vertical => !direction.is_horizontal(),
        }
    }
}

/// Terrain occupying a single board square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Plain ground.
    Dirt,
    /// Tile-block that sank into water; behaves like ground.
    SunkTile,
    /// Solid stone.
    Stone,
    /// Water; sinks tile-blocks pushed onto it.
    Water,
    /// Goal square for the tank.
    Flag,
    /// Void outside the level; also returned for out-of-bounds squares.
    Empty,
    /// Fixed diagonal mirror with the provided orientation.
    StoneMirror(Direction),
    /// Stone with a beam slit.
    StoneSlit(Slit),
    /// Intact wood.
    Wood,
    /// Wood that has absorbed one beam.
    WoodDamaged,
}

impl TileKind {
    /// Reports whether the tile is walkable ground that may carry a piece.
    #[must_use]
    pub const fn is_ground(self) -> bool {
        matches!(self, Self::Dirt | Self::SunkTile)
    }
}

/// Kinds of entities that occupy a board square or move across it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// The player's tank.
    Tank,
    /// Stationary cannon that may be destroyed or shoved.
    Cannon,
    /// Plain pushable block.
    TileBlock,
    /// Pushable block carrying a diagonal mirror.
    TileMirror,
}

/// Stamp recording which push event last moved a piece.
///
/// Each board counts its pushes; the stamp lets undo verify that reverts are
/// replayed in strict reverse order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PushId(u32);

impl PushId {
    /// Stamp carried by pieces that were never pushed.
    pub const ZERO: Self = Self(0);

    /// Creates a push identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier of the push event following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Identifier `count` push events before this one.
    #[must_use]
    pub const fn rewind(self, count: u32) -> Self {
        Self(self.0.saturating_sub(count))
    }
}

/// A piece placed on a board square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    kind: PieceKind,
    position: Position,
    direction: Direction,
    pushed_id: PushId,
}

impl Piece {
    /// Creates a piece that has never been pushed.
    #[must_use]
    pub const fn new(kind: PieceKind, position: Position, direction: Direction) -> Self {
        Self {
            kind,
            position,
            direction,
            pushed_id: PushId::ZERO,
        }
    }

    /// Kind of the piece.
    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Square the piece occupies.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Facing of a cannon or orientation of a tile-mirror.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Stamp of the push event that last moved the piece.
    #[must_use]
    pub const fn pushed_id(&self) -> PushId {
        self.pushed_id
    }

    /// Returns the same piece placed on another square.
    #[must_use]
    pub const fn moved_to(self, position: Position) -> Self {
        Self { position, ..self }
    }

    /// Returns the same piece carrying another push stamp.
    #[must_use]
    pub const fn with_pushed_id(self, pushed_id: PushId) -> Self {
        Self { pushed_id, ..self }
    }
}

/// Identifier of a projected shot sequence owned by a queued move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathId(u32);

impl PathId {
    /// Creates a new path identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One reversible mutation applied to a speculative board.
///
/// A log of changes is undone by replaying it back-to-front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FutureChange {
    /// A tile was replaced.
    TileChange {
        /// Square whose tile changed.
        point: Position,
        /// Tile present before the change.
        prior: TileKind,
    },
    /// A piece was removed from the board.
    PieceErase {
        /// Square the piece occupied.
        point: Position,
        /// Kind of the removed piece.
        kind: PieceKind,
        /// Facing or orientation of the removed piece.
        angle: Direction,
        /// Push stamp the piece carried when removed.
        prior_pushed_id: PushId,
    },
    /// A piece was pushed one or more squares in a single direction.
    PiecePushed {
        /// Square the piece landed on after the final push.
        point: Position,
        /// Kind of the pushed piece.
        kind: PieceKind,
        /// Facing or orientation of the pushed piece.
        angle: Direction,
        /// Direction of travel of every push in the run.
        direction: Direction,
        /// Number of consecutive pushes folded into this entry.
        chain_count: u32,
        /// Push stamp the piece carried before the first push.
        prior_pushed_id: PushId,
    },
}

impl FutureChange {
    /// Square the change was recorded against.
    #[must_use]
    pub const fn point(&self) -> Position {
        match self {
            Self::TileChange { point, .. }
            | Self::PieceErase { point, .. }
            | Self::PiecePushed { point, .. } => *point,
        }
    }
}

/// Piece captured by a [`PushRecord`] before it moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedPiece {
    /// Square the piece occupied before the push.
    pub from: Position,
    /// Kind of the pushed piece.
    pub kind: PieceKind,
    /// Facing or orientation the piece had before the push.
    pub angle: Direction,
    /// Push stamp the piece carried before the push.
    pub prior_pushed_id: PushId,
}

impl PushedPiece {
    /// Captures the state of a piece about to be pushed.
    #[must_use]
    pub const fn capture(piece: &Piece) -> Self {
        Self {
            from: piece.position(),
            kind: piece.kind(),
            angle: piece.direction(),
            prior_pushed_id: piece.pushed_id(),
        }
    }

    /// Square the piece was pushed onto.
    #[must_use]
    pub const fn to(&self, direction: Direction) -> Position {
        self.from.step(direction)
    }

    /// Reconstructs the piece as it stood before the push.
    #[must_use]
    pub const fn original(&self) -> Piece {
        Piece::new(self.kind, self.from, self.angle).with_pushed_id(self.prior_pushed_id)
    }
}

/// Describes one composite push event so it can be reverted.
///
/// Pieces are listed from the pusher outward; a single push carries one entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRecord {
    /// Direction every piece travelled.
    pub direction: Direction,
    /// Pieces moved by the event.
    pub pieces: Vec<PushedPiece>,
}

impl PushRecord {
    /// Creates a record describing a single pushed piece.
    #[must_use]
    pub fn single(piece: PushedPiece, direction: Direction) -> Self {
        Self {
            direction,
            pieces: vec![piece],
        }
    }
}

/// Inclusive axis-aligned rectangle of board squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingRect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl BoundingRect {
    /// Creates a rectangle covering exactly one square.
    #[must_use]
    pub const fn from_point(point: Position) -> Self {
        Self {
            left: point.column(),
            top: point.row(),
            right: point.column(),
            bottom: point.row(),
        }
    }

    /// Smallest rectangle covering every provided point.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), Self::include))
    }

    /// Grows the rectangle so it covers `point`.
    #[must_use]
    pub fn include(self, point: Position) -> Self {
        Self {
            left: self.left.min(point.column()),
            top: self.top.min(point.row()),
            right: self.right.max(point.column()),
            bottom: self.bottom.max(point.row()),
        }
    }

    /// Smallest rectangle covering both rectangles.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Reports whether the rectangle covers `point`.
    #[must_use]
    pub const fn contains(&self, point: Position) -> bool {
        point.column() >= self.left
            && point.column() <= self.right
            && point.row() >= self.top
            && point.row() <= self.bottom
    }

    /// Upper-left corner of the rectangle.
    #[must_use]
    pub const fn top_left(&self) -> Position {
        Position::new(self.left, self.top)
    }

    /// Lower-right corner of the rectangle.
    #[must_use]
    pub const fn bottom_right(&self) -> Position {
        Position::new(self.right, self.bottom)
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_map_onto_cardinal_directions() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_degrees(direction.degrees()), Some(direction));
        }
        assert_eq!(Direction::from_degrees(45), None);
        assert_eq!(Direction::from_degrees(360), None);
        assert_eq!(Direction::from_degrees(-90), None);
    }

    #[test]
    fn steps_follow_angle_convention() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step(Direction::Up), Position::new(5, 4));
        assert_eq!(origin.step(Direction::Right), Position::new(6, 5));
        assert_eq!(origin.step(Direction::Down), Position::new(5, 6));
        assert_eq!(origin.step(Direction::Left), Position::new(4, 5));
        assert_eq!(origin.step_by(Direction::Right, -3), Position::new(2, 5));
    }

    #[test]
    fn opposite_detection_requires_half_turn() {
        assert!(Direction::Up.is_opposite(Direction::Down));
        assert!(Direction::Left.is_opposite(Direction::Right));
        assert!(!Direction::Up.is_opposite(Direction::Right));
        assert!(!Direction::Left.is_opposite(Direction::Left));
        for direction in Direction::ALL {
            assert!(direction.is_opposite(direction.opposite()));
            assert_eq!(direction.clockwise().clockwise(), direction.opposite());
        }
    }

    #[test]
    fn slits_pass_only_along_their_opening() {
        assert!(Slit::Horizontal.passes(Direction::Right));
        assert!(Slit::Horizontal.passes(Direction::Left));
        assert!(!Slit::Horizontal.passes(Direction::Up));
        assert!(Slit::Vertical.passes(Direction::Down));
        assert!(!Slit::Vertical.passes(Direction::Left));
    }

    #[test]
    fn null_position_is_recognised() {
        assert!(Position::NULL.is_null());
        assert!(!Position::new(0, 0).is_null());
        assert!(Vector::NULL.position().is_null());
    }

    #[test]
    fn bounding_rect_grows_to_cover_points() {
        let rect = BoundingRect::from_points([
            Position::new(3, 4),
            Position::new(1, 6),
            Position::new(5, 2),
        ])
        .expect("rect");
        assert_eq!(rect.top_left(), Position::new(1, 2));
        assert_eq!(rect.bottom_right(), Position::new(5, 6));
        assert_eq!(rect.width(), 5);
        assert_eq!(rect.height(), 5);
        assert!(rect.contains(Position::new(3, 3)));
        assert!(!rect.contains(Position::new(0, 3)));
        assert!(BoundingRect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn push_ids_rewind_without_underflow() {
        let id = PushId::new(3);
        assert_eq!(id.next(), PushId::new(4));
        assert_eq!(id.rewind(2), PushId::new(1));
        assert_eq!(id.rewind(10), PushId::ZERO);
    }

    #[test]
    fn change_log_round_trips_through_bincode() {
        let log = vec![
            FutureChange::TileChange {
                point: Position::new(2, 1),
                prior: TileKind::Wood,
            },
            FutureChange::PiecePushed {
                point: Position::new(6, 1),
                kind: PieceKind::TileBlock,
                angle: Direction::Up,
                direction: Direction::Right,
                chain_count: 2,
                prior_pushed_id: PushId::ZERO,
            },
        ];
        let bytes = bincode::serialize(&log).expect("serialize");
        let restored: Vec<FutureChange> = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, log);
        assert_eq!(restored[1].point(), Position::new(6, 1));
    }
}
