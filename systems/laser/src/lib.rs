#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Laser propagation and its side effects on the board.
//!
//! A beam advances one square at a time through [`shoot_thru`]. Each call
//! either lets the beam continue (possibly reflected) or stops it on the
//! square, applying whatever the hit does: wood decays, cannons hit head-on
//! are destroyed, and pushable pieces are shoved one square further.
//!
//! Live shots mutate the master board and hand shoved pieces to the host's
//! push animation. Speculative shots land every push immediately on the
//! future board and describe the mutation as a [`FutureChange`].

use log::warn;

use laser_tank_core::{
    Direction, FutureChange, Piece, PieceKind, Position, PushedPiece, TileKind, Vector,
};
use laser_tank_system_movement::can_move_from;
use laser_tank_world::BoardState;

const REFLECTIONS: [(Direction, Direction, Direction); 8] = [
    (Direction::Up, Direction::Up, Direction::Right),
    (Direction::Up, Direction::Left, Direction::Down),
    (Direction::Right, Direction::Right, Direction::Down),
    (Direction::Right, Direction::Up, Direction::Left),
    (Direction::Down, Direction::Down, Direction::Left),
    (Direction::Down, Direction::Right, Direction::Up),
    (Direction::Left, Direction::Left, Direction::Up),
    (Direction::Left, Direction::Down, Direction::Right),
];

/// Exit direction of a beam travelling `beam` into a mirror oriented `mirror`.
///
/// Returns `None` when the beam strikes the mirror's back and is absorbed.
#[must_use]
pub fn reflect(mirror: Direction, beam: Direction) -> Option<Direction> {
    REFLECTIONS
        .iter()
        .find(|(orientation, entry, _)| *orientation == mirror && *entry == beam)
        .map(|(_, _, exit)| *exit)
}

/// Largest number of bends a single beam may take on `board`.
#[must_use]
pub fn bend_limit(board: &BoardState) -> usize {
    usize::try_from(board.columns() + board.rows()).unwrap_or(0)
}

/// Whether a shot mutates the master board or a speculative clone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShotMode {
    /// Mutations land on the master board; pushes are animated by the host.
    Live,
    /// Mutations land on the future board and are recorded as changes.
    Speculative,
}

/// Collaborator state consulted while a beam travels.
#[derive(Clone, Copy, Debug)]
pub struct ShotContext<'a> {
    /// Whether the shot is live or speculative.
    pub mode: ShotMode,
    /// Square the firing tank occupies on the board being shot at.
    pub tank: Position,
    /// Square the tank occupies on the master board. Nothing may be shoved
    /// onto it, even on a speculative board.
    pub live_tank: Position,
    /// Squares claimed by live pushes whose animation has not completed:
    /// both the square each piece left and the square it will land on.
    pub pushes_in_flight: &'a [Position],
}

impl<'a> ShotContext<'a> {
    /// Context for a live shot on the master board.
    #[must_use]
    pub const fn live(tank: Position, pushes_in_flight: &'a [Position]) -> Self {
        Self {
            mode: ShotMode::Live,
            tank,
            live_tank: tank,
            pushes_in_flight,
        }
    }

    /// Context for a speculative shot fired by a tank standing on `tank`
    /// while the live tank remains on `live_tank`.
    #[must_use]
    pub const fn speculative(tank: Position, live_tank: Position) -> Self {
        Self {
            mode: ShotMode::Speculative,
            tank,
            live_tank,
            pushes_in_flight: &[],
        }
    }
}

/// A piece lifted off the master board by a live shot.
///
/// The host animates the piece and calls
/// [`BoardState::apply_push_result`] with [`LaunchedPush::destination`] once
/// the animation completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchedPush {
    /// Piece as it stood before the shot.
    pub piece: PushedPiece,
    /// Direction the piece travels.
    pub direction: Direction,
}

impl LaunchedPush {
    /// Square the piece lands on.
    #[must_use]
    pub const fn destination(&self) -> Position {
        self.piece.to(self.direction)
    }
}

/// What a stopped beam did to the square it stopped on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Impact {
    /// The board was mutated as described.
    Changed(FutureChange),
    /// A live shot lifted a piece for the host to animate.
    PushLaunched(LaunchedPush),
    /// The beam struck the tank.
    TankKilled,
    /// The beam struck a piece still travelling from an earlier push.
    PushInFlight,
}

/// Result of advancing a beam into one square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeamStep {
    /// The beam continues past the square heading in the given direction.
    Pass(Direction),
    /// The beam terminates on the square.
    Stop {
        /// Square the beam stopped on.
        at: Position,
        /// Side effect of the hit; `None` when the beam was simply absorbed.
        impact: Option<Impact>,
    },
}

impl BeamStep {
    const fn absorbed(at: Position) -> Self {
        Self::Stop { at, impact: None }
    }

    const fn changed(at: Position, change: FutureChange) -> Self {
        Self::Stop {
            at,
            impact: Some(Impact::Changed(change)),
        }
    }

    /// Reports whether the beam continues past the square.
    #[must_use]
    pub const fn passes(&self) -> bool {
        matches!(self, Self::Pass(_))
    }
}

/// Advances a beam travelling `direction` into the square `at`.
pub fn shoot_thru(
    board: &mut BoardState,
    at: Position,
    direction: Direction,
    context: &ShotContext<'_>,
) -> BeamStep {
    match board.tile_at(at) {
        TileKind::Dirt | TileKind::SunkTile => match board.piece_at(at).copied() {
            Some(piece) => shoot_piece(board, piece, direction, context),
            None => shoot_open_ground(at, direction, context),
        },
        TileKind::Water | TileKind::Flag => BeamStep::Pass(direction),
        TileKind::StoneSlit(slit) if slit.passes(direction) => BeamStep::Pass(direction),
        TileKind::StoneMirror(mirror) => {
            reflect(mirror, direction).map_or(BeamStep::absorbed(at), BeamStep::Pass)
        }
        TileKind::Wood => decay(board, at, TileKind::Wood, TileKind::WoodDamaged),
        TileKind::WoodDamaged => decay(board, at, TileKind::WoodDamaged, TileKind::Dirt),
        TileKind::StoneSlit(_) | TileKind::Stone | TileKind::Empty => BeamStep::absorbed(at),
    }
}

fn shoot_open_ground(at: Position, direction: Direction, context: &ShotContext<'_>) -> BeamStep {
    if context.mode == ShotMode::Live && context.pushes_in_flight.contains(&at) {
        return BeamStep::Stop {
            at,
            impact: Some(Impact::PushInFlight),
        };
    }
    if context.tank == at {
        return BeamStep::Stop {
            at,
            impact: Some(Impact::TankKilled),
        };
    }
    BeamStep::Pass(direction)
}

fn shoot_piece(
    board: &mut BoardState,
    piece: Piece,
    direction: Direction,
    context: &ShotContext<'_>,
) -> BeamStep {
    let at = piece.position();
    match piece.kind() {
        PieceKind::TileMirror => {
            reflect(piece.direction(), direction).map_or(BeamStep::absorbed(at), BeamStep::Pass)
        }
        PieceKind::Cannon if direction.is_opposite(piece.direction()) => {
            let _ = board.erase_piece(at);
            BeamStep::changed(
                at,
                FutureChange::PieceErase {
                    point: at,
                    kind: piece.kind(),
                    angle: piece.direction(),
                    prior_pushed_id: piece.pushed_id(),
                },
            )
        }
        _ => shove(board, piece, direction, context),
    }
}

fn shove(
    board: &mut BoardState,
    piece: Piece,
    direction: Direction,
    context: &ShotContext<'_>,
) -> BeamStep {
    let at = piece.position();
    let destination = at.step(direction);
    if destination == context.tank
        || destination == context.live_tank
        || (context.mode == ShotMode::Live && context.pushes_in_flight.contains(&destination))
        || !can_move_from(piece.kind(), direction, at, board)
    {
        return BeamStep::absorbed(at);
    }

    let _ = board.erase_piece(at);
    let pushed = PushedPiece::capture(&piece);
    match context.mode {
        ShotMode::Live => BeamStep::Stop {
            at,
            impact: Some(Impact::PushLaunched(LaunchedPush {
                piece: pushed,
                direction,
            })),
        },
        ShotMode::Speculative => {
            let _ = board.apply_push_result(piece.kind(), destination, piece.direction());
            BeamStep::changed(
                at,
                FutureChange::PiecePushed {
                    point: destination,
                    kind: piece.kind(),
                    angle: piece.direction(),
                    direction,
                    chain_count: 1,
                    prior_pushed_id: piece.pushed_id(),
                },
            )
        }
    }
}

fn decay(board: &mut BoardState, at: Position, prior: TileKind, next: TileKind) -> BeamStep {
    board.set_tile_at(next, at);
    BeamStep::changed(at, FutureChange::TileChange { point: at, prior })
}

/// Complete path of a beam fired from a tank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShotTrace {
    /// Vector the beam was fired from.
    pub origin: Vector,
    /// Squares where the beam changed direction, in travel order.
    pub bends: Vec<Position>,
    /// Square the beam stopped on.
    pub end: Position,
    /// Side effect of the final hit.
    pub impact: Option<Impact>,
    /// Set when the beam was cut short by the bend limit.
    pub runaway: bool,
}

/// Fires a beam from `origin` and follows it until it stops.
///
/// Beams caught between reflectors are cut off after [`bend_limit`] bends.
pub fn trace(board: &mut BoardState, origin: Vector, context: &ShotContext<'_>) -> ShotTrace {
    let limit = bend_limit(board);
    let mut bends = Vec::new();
    let mut lead = origin;
    loop {
        let at = lead.ahead();
        match shoot_thru(board, at, lead.direction(), context) {
            BeamStep::Pass(exit) => {
                if exit != lead.direction() {
                    bends.push(at);
                    if bends.len() > limit {
                        warn!(
                            "beam from ({}, {}) exceeded {} bends; cutting it off",
                            origin.position().column(),
                            origin.position().row(),
                            limit
                        );
                        return ShotTrace {
                            origin,
                            bends,
                            end: at,
                            impact: None,
                            runaway: true,
                        };
                    }
                }
                lead = Vector::new(at, exit);
            }
            BeamStep::Stop { at, impact } => {
                return ShotTrace {
                    origin,
                    bends,
                    end: at,
                    impact,
                    runaway: false,
                };
            }
        }
    }
}
