#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projects queued shot sequences onto the speculative future board.
//!
//! Every queued move that asks for shots owns one [`ShotPath`]. The path
//! records each mutation its shots applied to the future board as a
//! [`FutureChange`] log so the shots can later be withdrawn by replaying the
//! log back-to-front. Successive shots of one path resume from the square
//! where the previous shot stopped, so a path describes a single beam that
//! eats its way through wood, cannons and pushable pieces.

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use laser_tank_core::{BoundingRect, FutureChange, PathId, Piece, Position, Vector};
use laser_tank_system_laser::{bend_limit, shoot_thru, BeamStep, Impact, ShotContext};
use laser_tank_world::BoardState;

/// Move queued for later execution together with the shots fired after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedMove {
    vector: Vector,
    shot_count: u32,
    path_id: Option<PathId>,
}

impl QueuedMove {
    /// Creates a queued move that ends with the tank on `vector` and fires
    /// no shots.
    #[must_use]
    pub const fn new(vector: Vector) -> Self {
        Self {
            vector,
            shot_count: 0,
            path_id: None,
        }
    }

    /// Tank square and facing once the move has executed.
    #[must_use]
    pub const fn vector(&self) -> Vector {
        self.vector
    }

    /// Number of shots requested after the move.
    #[must_use]
    pub const fn shot_count(&self) -> u32 {
        self.shot_count
    }

    /// Changes the number of requested shots and returns the previous count.
    ///
    /// The projection is not updated; pass the returned count to
    /// [`ShotProjector::update_shots`].
    pub fn set_shot_count(&mut self, count: u32) -> u32 {
        std::mem::replace(&mut self.shot_count, count)
    }

    /// Identifier of the projected path, once shots have been requested.
    #[must_use]
    pub const fn path_id(&self) -> Option<PathId> {
        self.path_id
    }

    /// Reuses `id` for the next projection of this move.
    ///
    /// Lets a move that was withdrawn and queued again keep its identifier.
    /// The id must not belong to a path the projector still holds.
    pub fn adopt_path_id(&mut self, id: PathId) {
        self.path_id = Some(id);
    }
}

/// Projected trajectory and accumulated consequences of one shot sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShotPath {
    id: PathId,
    tail: Position,
    bends: Vec<Position>,
    lead: Vector,
    requested: u32,
    fired: u32,
    changes: Vec<FutureChange>,
    bounds: BoundingRect,
    hit: Option<Position>,
    halted: bool,
    killed: bool,
}

impl ShotPath {
    fn start(id: PathId, origin: Vector, requested: u32) -> Self {
        Self {
            id,
            tail: origin.position(),
            bends: Vec::new(),
            lead: origin,
            requested,
            fired: 0,
            changes: Vec::new(),
            bounds: BoundingRect::from_point(origin.position()),
            hit: None,
            halted: false,
            killed: false,
        }
    }

    /// Identifier shared with the owning [`QueuedMove`].
    #[must_use]
    pub const fn id(&self) -> PathId {
        self.id
    }

    /// Square the shots are fired from.
    #[must_use]
    pub const fn tail(&self) -> Position {
        self.tail
    }

    /// Squares where the beam changed direction, in travel order.
    #[must_use]
    pub fn bends(&self) -> &[Position] {
        &self.bends
    }

    /// Last square the beam passed through and its heading there.
    #[must_use]
    pub const fn lead(&self) -> Vector {
        self.lead
    }

    /// Number of shots the path was projected for.
    #[must_use]
    pub const fn shot_count(&self) -> u32 {
        self.requested
    }

    /// Number of shots that changed the future board.
    #[must_use]
    pub const fn fired(&self) -> u32 {
        self.fired
    }

    /// Mutations applied to the future board, oldest first.
    #[must_use]
    pub fn changes(&self) -> &[FutureChange] {
        &self.changes
    }

    /// Rectangle covering the whole projected beam.
    #[must_use]
    pub const fn bounds(&self) -> BoundingRect {
        self.bounds
    }

    /// Square the most recent shot stopped on.
    #[must_use]
    pub const fn hit(&self) -> Option<Position> {
        self.hit
    }

    /// Reports whether the beam can make no further progress.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Reports whether the beam came back around and struck the tank.
    #[must_use]
    pub const fn killed_tank(&self) -> bool {
        self.killed
    }

    /// Beam drawn as a polyline: tail, bends, then the square the last shot
    /// stopped on. For a shove that is the piece's square before it moved,
    /// not where it landed.
    #[must_use]
    pub fn polyline(&self) -> Vec<Position> {
        let mut points = Vec::with_capacity(self.bends.len() + 2);
        points.push(self.tail);
        points.extend_from_slice(&self.bends);
        points.push(self.hit.unwrap_or_else(|| self.lead.position()));
        points
    }

    fn record(&mut self, change: FutureChange) {
        if let FutureChange::PiecePushed {
            point,
            kind,
            direction,
            chain_count,
            ..
        } = change
        {
            if let Some(FutureChange::PiecePushed {
                point: landed,
                kind: last_kind,
                direction: last_direction,
                chain_count: last_count,
                ..
            }) = self.changes.last_mut()
            {
                if *last_kind == kind
                    && *last_direction == direction
                    && landed.step(direction) == point
                {
                    *landed = point;
                    *last_count += chain_count;
                    return;
                }
            }
        }
        self.changes.push(change);
    }

    fn extend(&mut self, future: &mut BoardState, live_tank: Position) {
        let limit = bend_limit(future);
        let context = ShotContext::speculative(self.tail, live_tank);
        while self.fired < self.requested && !self.halted {
            let next = self.lead.ahead();
            match shoot_thru(future, next, self.lead.direction(), &context) {
                BeamStep::Pass(exit) => {
                    if exit != self.lead.direction() {
                        if self.bends.len() >= limit {
                            warn!(
                                "shot path {} reached {} bends; no longer extending it",
                                self.id.get(),
                                limit
                            );
                            self.halted = true;
                            break;
                        }
                        self.bends.push(next);
                    }
                    self.lead = Vector::new(next, exit);
                }
                BeamStep::Stop {
                    at,
                    impact: Some(Impact::Changed(change)),
                } => {
                    self.record(change);
                    self.fired += 1;
                    self.hit = Some(at);
                }
                BeamStep::Stop { at, impact } => {
                    self.killed = impact == Some(Impact::TankKilled);
                    self.hit = Some(at);
                    self.halted = true;
                }
            }
        }

        let mut bounds = BoundingRect::from_point(self.tail).include(self.lead.position());
        for &bend in &self.bends {
            bounds = bounds.include(bend);
        }
        if let Some(hit) = self.hit {
            bounds = bounds.include(hit);
        }
        self.bounds = bounds;
    }
}

/// Replays a change log back-to-front, restoring the board it was recorded on.
pub fn undo_changes(changes: &[FutureChange], future: &mut BoardState) {
    for change in changes.iter().rev() {
        match *change {
            FutureChange::TileChange { point, prior } => future.set_tile_at(prior, point),
            FutureChange::PieceErase {
                point,
                kind,
                angle,
                prior_pushed_id,
            } => {
                let piece = Piece::new(kind, point, angle).with_pushed_id(prior_pushed_id);
                let _ = future.insert_piece(piece);
            }
            FutureChange::PiecePushed {
                point,
                kind,
                angle,
                direction,
                chain_count,
                prior_pushed_id,
            } => {
                let expected = future.last_push_id();
                let _ = future.lift(kind, point, expected);
                future.rewind_push_ids(chain_count);
                let origin = point.step_by(direction, -i32::try_from(chain_count).unwrap_or(0));
                let piece = Piece::new(kind, origin, angle).with_pushed_id(prior_pushed_id);
                let _ = future.insert_piece(piece);
            }
        }
    }
}

/// Owner of every projected [`ShotPath`].
#[derive(Debug)]
pub struct ShotProjector {
    paths: BTreeMap<PathId, ShotPath>,
    next_id: u32,
    last_touched: Option<PathId>,
    live_tank: Position,
}

impl ShotProjector {
    /// Creates a projector without any paths.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
            next_id: 0,
            last_touched: None,
            live_tank: Position::NULL,
        }
    }

    /// Records the square the live tank occupies while the plan is projected.
    ///
    /// Projected shots never shove a piece onto it. Paths projected earlier
    /// keep the square they were projected with.
    pub fn set_live_tank(&mut self, at: Position) {
        self.live_tank = at;
    }

    /// Brings the projection of `queued` in line with its requested shot count.
    ///
    /// `previous_count` is the count the path was last projected for. When
    /// the path was the most recently projected one and the count grows from
    /// exactly that value, the beam is extended from where it stopped.
    /// Otherwise the old consequences are undone and the path is rebuilt.
    /// Returns the area of the board whose projection changed.
    pub fn update_shots(
        &mut self,
        previous_count: u32,
        queued: &mut QueuedMove,
        future: &mut BoardState,
    ) -> Option<BoundingRect> {
        let requested = queued.shot_count;
        let cached = queued.path_id.and_then(|id| self.paths.remove(&id));

        let mut damage = None;
        match cached {
            Some(mut path)
                if self.last_touched == Some(path.id)
                    && path.requested == previous_count
                    && requested > previous_count =>
            {
                trace!(
                    "extending shot path {} from {} to {} shots",
                    path.id.get(),
                    previous_count,
                    requested
                );
                let before = path.bounds;
                path.requested = requested;
                path.extend(future, self.live_tank);
                let damage = before.union(path.bounds);
                let _ = self.paths.insert(path.id, path);
                return Some(damage);
            }
            Some(path) => {
                undo_changes(&path.changes, future);
                damage = Some(path.bounds);
            }
            None => {}
        }

        if requested == 0 {
            if let Some(id) = queued.path_id.take() {
                self.forget(id);
            }
            return damage;
        }

        let id = match queued.path_id {
            Some(id) => id,
            None => self.allocate(),
        };
        debug!("projecting shot path {} for {} shots", id.get(), requested);
        let mut path = ShotPath::start(id, queued.vector, requested);
        path.extend(future, self.live_tank);
        let bounds = path.bounds;
        let _ = self.paths.insert(id, path);
        queued.path_id = Some(id);
        self.last_touched = Some(id);
        Some(damage.map_or(bounds, |damage| damage.union(bounds)))
    }

    /// Drops the projected path of `queued`, undoing its changes first when
    /// `undo` is set.
    ///
    /// Returns the area the path covered.
    pub fn remove_path(
        &mut self,
        queued: &mut QueuedMove,
        undo: bool,
        future: &mut BoardState,
    ) -> Option<BoundingRect> {
        let id = queued.path_id.take()?;
        let path = self.paths.remove(&id)?;
        self.forget(id);
        if undo {
            undo_changes(&path.changes, future);
        }
        Some(path.bounds)
    }

    /// Projected path with the provided identifier.
    #[must_use]
    pub fn path(&self, id: PathId) -> Option<&ShotPath> {
        self.paths.get(&id)
    }

    /// Every projected path ordered by identifier.
    pub fn paths(&self) -> impl Iterator<Item = &ShotPath> + '_ {
        self.paths.values()
    }

    /// Number of projected paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Reports whether no path is projected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn allocate(&mut self) -> PathId {
        self.next_id += 1;
        PathId::new(self.next_id)
    }

    fn forget(&mut self, id: PathId) {
        let _ = self.paths.remove(&id);
        if self.last_touched == Some(id) {
            self.last_touched = None;
        }
    }
}

impl Default for ShotProjector {
    fn default() -> Self {
        Self::new()
    }
}
