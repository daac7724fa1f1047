#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure movement rules deciding which squares a tank or piece may enter.
//!
//! Every function here is a side-effect free predicate over a board, so it
//! may be asked hypothetical questions repeatedly: by the speculative planner,
//! by the laser when it shoves a piece, and by the external path search.

use laser_tank_core::{Direction, Piece, PieceKind, Position, TileKind};
use laser_tank_world::BoardState;

/// Outcome of asking whether an entity may enter a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The square cannot be entered.
    Blocked,
    /// The square can be entered without disturbing anything.
    Free,
    /// The square can be entered by shoving its occupant one square further.
    Push(Piece),
}

impl Placement {
    /// Reports whether the square may be entered.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Occupant that entering the square would shove, if any.
    #[must_use]
    pub const fn pushed(&self) -> Option<Piece> {
        match self {
            Self::Push(piece) => Some(*piece),
            Self::Blocked | Self::Free => None,
        }
    }
}

/// Resolves whether `kind` may enter `at` while travelling in `from`.
///
/// Only a tank may shove an occupant, and only when that occupant may itself
/// move one square further the same way.
#[must_use]
pub fn placement(kind: PieceKind, at: Position, from: Direction, board: &BoardState) -> Placement {
    match board.tile_at(at) {
        TileKind::Dirt | TileKind::SunkTile => match board.piece_at(at) {
            None => Placement::Free,
            Some(occupant) if kind == PieceKind::Tank => {
                if can_move_from(occupant.kind(), from, at, board) {
                    Placement::Push(*occupant)
                } else {
                    Placement::Blocked
                }
            }
            Some(_) => Placement::Blocked,
        },
        TileKind::Flag if kind == PieceKind::Tank => Placement::Free,
        TileKind::Water if kind != PieceKind::Tank => Placement::Free,
        _ => Placement::Blocked,
    }
}

/// Reports whether `kind` may enter `at` while travelling in `from`.
#[must_use]
pub fn can_place_at(kind: PieceKind, at: Position, from: Direction, board: &BoardState) -> bool {
    placement(kind, at, from, board).is_allowed()
}

/// Reports whether `kind` standing on `at` may step one square toward `direction`.
#[must_use]
pub fn can_move_from(kind: PieceKind, direction: Direction, at: Position, board: &BoardState) -> bool {
    can_place_at(kind, at.step(direction), direction, board)
}

/// Variant of [`can_move_from`] taking a raw angle in degrees.
///
/// Angles other than 0, 90, 180 and 270 are illegal and never move.
#[must_use]
pub fn can_move_from_degrees(kind: PieceKind, degrees: i32, at: Position, board: &BoardState) -> bool {
    Direction::from_degrees(degrees).is_some_and(|direction| can_move_from(kind, direction, at, board))
}

/// Boards visible to a planner: the committed master, the speculative future
/// board when one is active, and the live tank's square.
#[derive(Clone, Copy, Debug)]
pub struct PlanView<'a> {
    /// Committed board.
    pub master: &'a BoardState,
    /// Speculative board, present while a plan is active.
    pub future: Option<&'a BoardState>,
    /// Square the live tank occupies on the master board.
    pub tank: Position,
}

impl<'a> PlanView<'a> {
    /// Selects the future board when `futuristic` is set and one exists.
    #[must_use]
    pub fn board(&self, futuristic: bool) -> &'a BoardState {
        match self.future {
            Some(future) if futuristic => future,
            _ => self.master,
        }
    }
}

/// Resolves a move against either the master or the future board.
///
/// Nothing but the tank itself may end up on the live tank's square, whether
/// moving there directly or being shoved there.
#[must_use]
pub fn futuristic_placement(
    kind: PieceKind,
    direction: Direction,
    at: Position,
    view: &PlanView<'_>,
    futuristic: bool,
) -> Placement {
    let target = at.step(direction);
    if kind != PieceKind::Tank && target == view.tank {
        return Placement::Blocked;
    }

    let resolved = placement(kind, target, direction, view.board(futuristic));
    match resolved {
        Placement::Push(pushed) if pushed.position().step(direction) == view.tank => {
            Placement::Blocked
        }
        other => other,
    }
}

/// Reports whether a move is allowed against the master or future board.
#[must_use]
pub fn can_move_from_futuristic(
    kind: PieceKind,
    direction: Direction,
    at: Position,
    view: &PlanView<'_>,
    futuristic: bool,
) -> bool {
    futuristic_placement(kind, direction, at, view, futuristic).is_allowed()
}

/// Traversability predicate handed to the external path search.
///
/// Agrees with [`can_place_at`] for the tank entering `at` travelling
/// `from`, including shoving a pushable occupant, on the board selected by
/// `futuristic`. A shove that would land on the live tank's square is
/// refused, as in [`futuristic_placement`].
#[must_use]
pub fn passable_for_tank(
    at: Position,
    from: Direction,
    view: &PlanView<'_>,
    futuristic: bool,
) -> bool {
    futuristic_placement(PieceKind::Tank, from, at.step(from.opposite()), view, futuristic)
        .is_allowed()
}

/// Straight row of pieces that a tank shoves together as one push event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushChain {
    direction: Direction,
    origins: Vec<Position>,
}

impl PushChain {
    /// Direction every piece in the row travels.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Squares of the shoved pieces, nearest the tank first.
    #[must_use]
    pub fn origins(&self) -> &[Position] {
        &self.origins
    }

    /// Number of pieces in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// Reports whether the row is empty. Resolved chains never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Collects the row of adjacent pieces starting at `first` and reports
/// whether the tank can shove it one square toward `direction`.
///
/// The row ends at the first vacant square; the last piece must be able to
/// enter that square on its own.
#[must_use]
pub fn resolve_push_chain(
    board: &BoardState,
    first: Position,
    direction: Direction,
) -> Option<PushChain> {
    if !board.tile_at(first).is_ground() {
        return None;
    }

    let mut origins = Vec::new();
    let mut cursor = first;
    let mut last = *board.piece_at(cursor)?;
    loop {
        if last.kind() == PieceKind::Tank {
            return None;
        }
        origins.push(cursor);
        let beyond = cursor.step(direction);
        match board.piece_at(beyond) {
            Some(next) if board.tile_at(beyond).is_ground() => {
                last = *next;
                cursor = beyond;
            }
            Some(_) => return None,
            None => break,
        }
    }

    if placement(last.kind(), last.position().step(direction), direction, board) != Placement::Free {
        return None;
    }

    Some(PushChain { direction, origins })
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_tank_world::parse;

    fn board(text: &str) -> BoardState {
        parse(text).expect("layout parses")
    }

    #[test]
    fn tank_pushes_block_with_room_beyond() {
        let board = board("..M.\n");
        let placement = placement(PieceKind::Tank, Position::new(2, 0), Direction::Right, &board);
        assert_eq!(
            placement.pushed().map(|piece| piece.position()),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn tank_cannot_push_block_into_wall() {
        let board = board("..MS\n");
        assert!(!can_place_at(PieceKind::Tank, Position::new(2, 0), Direction::Right, &board));
    }

    #[test]
    fn blocks_may_enter_water_but_tanks_may_not() {
        let board = board(".Mw\n");
        assert!(can_move_from(PieceKind::TileBlock, Direction::Right, Position::new(1, 0), &board));
        assert!(!can_place_at(PieceKind::Tank, Position::new(2, 0), Direction::Right, &board));
    }

    #[test]
    fn tank_pushes_block_into_water() {
        let board = board(".Mw\n");
        assert!(can_place_at(PieceKind::Tank, Position::new(1, 0), Direction::Right, &board));
    }

    #[test]
    fn only_tank_enters_flag() {
        let board = board(".F\n");
        assert!(can_place_at(PieceKind::Tank, Position::new(1, 0), Direction::Right, &board));
        assert!(!can_place_at(PieceKind::TileBlock, Position::new(1, 0), Direction::Right, &board));
        assert!(!can_place_at(PieceKind::Cannon, Position::new(1, 0), Direction::Right, &board));
    }

    #[test]
    fn non_tank_movers_cannot_shove() {
        let board = board(".MM.\n");
        assert!(!can_move_from(PieceKind::TileBlock, Direction::Right, Position::new(1, 0), &board));
        assert!(!can_place_at(PieceKind::Tank, Position::new(1, 0), Direction::Right, &board));
    }

    #[test]
    fn illegal_angles_never_move() {
        let board = board("...\n");
        assert!(can_move_from_degrees(PieceKind::Tank, 90, Position::new(0, 0), &board));
        assert!(!can_move_from_degrees(PieceKind::Tank, 45, Position::new(0, 0), &board));
        assert!(!can_move_from_degrees(PieceKind::Tank, 360, Position::new(0, 0), &board));
    }

    #[test]
    fn out_of_bounds_is_a_wall() {
        let board = board("..\n");
        assert!(!can_move_from(PieceKind::Tank, Direction::Up, Position::new(0, 0), &board));
        assert!(!can_move_from(PieceKind::TileBlock, Direction::Left, Position::new(0, 0), &board));
    }

    #[test]
    fn futuristic_moves_avoid_live_tank() {
        let master = board("....\n");
        let mut future = master.clone();
        let _ = future.insert_piece(Piece::new(
            PieceKind::TileBlock,
            Position::new(1, 0),
            Direction::Up,
        ));
        let view = PlanView {
            master: &master,
            future: Some(&future),
            tank: Position::new(2, 0),
        };

        assert!(!can_move_from_futuristic(
            PieceKind::TileBlock,
            Direction::Right,
            Position::new(1, 0),
            &view,
            true,
        ));
        assert!(can_move_from_futuristic(
            PieceKind::Tank,
            Direction::Right,
            Position::new(1, 0),
            &view,
            false,
        ));
        assert!(!can_move_from_futuristic(
            PieceKind::Tank,
            Direction::Right,
            Position::new(0, 0),
            &view,
            true,
        ), "the block would be shoved onto the live tank");
        assert!(can_move_from_futuristic(
            PieceKind::Tank,
            Direction::Right,
            Position::new(0, 0),
            &view,
            false,
        ));
    }

    #[test]
    fn passable_squares_agree_with_tank_placement() {
        let master = board(".M.F
");
        let view = PlanView {
            master: &master,
            future: None,
            tank: Position::new(0, 0),
        };
        for column in 0..4 {
            let at = Position::new(column, 0);
            assert_eq!(
                passable_for_tank(at, Direction::Right, &view, false),
                can_place_at(PieceKind::Tank, at, Direction::Right, &master),
                "column {column}"
            );
        }
        assert!(passable_for_tank(Position::new(1, 0), Direction::Right, &view, false));
        assert!(!passable_for_tank(Position::new(1, 0), Direction::Down, &view, false));
    }

    #[test]
    fn passable_squares_respect_live_tank_square() {
        let master = board("M.
");
        let view = PlanView {
            master: &master,
            future: None,
            tank: Position::new(1, 0),
        };
        assert!(can_place_at(PieceKind::Tank, Position::new(0, 0), Direction::Right, &master));
        assert!(
            !passable_for_tank(Position::new(0, 0), Direction::Right, &view, false),
            "the block would be shoved onto the live tank"
        );
    }

    #[test]
    fn chain_resolution_requires_room_for_last_piece() {
        let open = board(".MMM.\n");
        let chain = resolve_push_chain(&open, Position::new(1, 0), Direction::Right)
            .expect("row of three shoves into free square");
        assert_eq!(
            chain.origins(),
            &[Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)]
        );
        assert_eq!(chain.direction(), Direction::Right);
        assert_eq!(chain.len(), 3);

        let walled = board(".MMMS\n");
        assert!(resolve_push_chain(&walled, Position::new(1, 0), Direction::Right).is_none());
        assert!(resolve_push_chain(&walled, Position::new(0, 0), Direction::Right).is_none());
    }
}
