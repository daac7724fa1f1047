#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Play session threading the master board, the tank and the queued plan.
//!
//! A [`Session`] is the single context object handed to hosts. Immediate
//! actions mutate the master board; queued actions are played out on the
//! speculative future board until the plan is committed or abandoned.
//! Hosts may call the methods directly or drive the session with
//! [`Command`]s through [`apply`], collecting the resulting [`Event`]s.

use std::collections::VecDeque;

use log::debug;

use laser_tank_core::{
    BoundingRect, Direction, PathId, PieceKind, Position, PushId, PushRecord, Vector,
};
use laser_tank_system_laser::{trace, Impact, LaunchedPush, ShotContext, ShotTrace};
use laser_tank_system_movement::{
    futuristic_placement, passable_for_tank, resolve_push_chain, Placement, PlanView, PushChain,
};
use laser_tank_system_projection::{QueuedMove, ShotPath, ShotProjector};
use laser_tank_system_speculation::SpeculativeDelta;
use laser_tank_world::{query, BoardState};

/// Result of asking the tank to move one step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The tank was not facing the requested direction and turned in place.
    Turned(Vector),
    /// The tank advanced onto a vacant square.
    Moved(Vector),
    /// The tank advanced and shoved a row of pieces ahead of it.
    Pushed {
        /// Tank square and facing after the move.
        vector: Vector,
        /// Pieces shoved by the move.
        record: PushRecord,
    },
    /// The move is not allowed.
    Blocked,
}

impl MoveOutcome {
    /// Tank vector after the move, unless it was blocked.
    #[must_use]
    pub const fn vector(&self) -> Option<Vector> {
        match self {
            Self::Turned(vector) | Self::Moved(vector) | Self::Pushed { vector, .. } => {
                Some(*vector)
            }
            Self::Blocked => None,
        }
    }
}

/// Requests accepted by [`apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Turns or moves the tank on the master board.
    MoveTank {
        /// Requested direction.
        direction: Direction,
    },
    /// Fires the tank's laser on the master board.
    Fire,
    /// Lands the oldest live push whose animation finished.
    CompletePush,
    /// Appends a move to the queued plan.
    QueueMove {
        /// Requested direction.
        direction: Direction,
    },
    /// Changes how many shots a queued move fires.
    SetQueuedShots {
        /// Position of the move within the plan.
        index: usize,
        /// Requested number of shots.
        count: u32,
    },
    /// Withdraws the most recently queued move.
    CancelLastMove,
    /// Discards the whole plan.
    AbandonPlan,
    /// Executes the plan on the master board.
    CommitPlan,
}

/// Notifications emitted by [`apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The live tank turned or moved.
    TankMoved {
        /// Tank square and facing after the move.
        vector: Vector,
    },
    /// The live tank shoved pieces on the master board.
    PiecesPushed {
        /// Pieces shoved by the move.
        record: PushRecord,
    },
    /// A requested move was rejected.
    MoveBlocked {
        /// Direction of the rejected move.
        direction: Direction,
    },
    /// A live beam was fired.
    ShotFired {
        /// Squares where the beam bent.
        bends: Vec<Position>,
        /// Square the beam stopped on.
        end: Position,
    },
    /// A live shot lifted a piece that is now travelling.
    PushLaunched {
        /// Square the piece will land on.
        destination: Position,
    },
    /// A travelling piece landed.
    PushLanded {
        /// Square the piece landed on.
        at: Position,
        /// Push stamp assigned to the landing.
        pushed_id: PushId,
    },
    /// The tank was destroyed by its own beam.
    TankKilled,
    /// The tank stands on the flag.
    FlagReached,
    /// The queued plan gained a step.
    MoveQueued {
        /// Planned tank square and facing after the step.
        vector: Vector,
    },
    /// Projected shots changed the future board.
    ProjectionChanged {
        /// Area whose projection changed.
        damage: Option<BoundingRect>,
    },
    /// The plan was emptied without execution.
    PlanCleared,
    /// The plan was executed on the master board.
    PlanCommitted {
        /// Number of queued moves that executed.
        executed: usize,
    },
}

#[derive(Clone, Debug)]
struct PlannedStep {
    direction: Direction,
    queued: QueuedMove,
    push: Option<PushRecord>,
}

enum Step {
    Turn(Vector),
    Move(Vector),
    Push(Vector, PushChain),
    Blocked,
}

fn resolve_step(view: &PlanView<'_>, futuristic: bool, from: Vector, direction: Direction) -> Step {
    if from.direction() != direction {
        return Step::Turn(from.turned_to(direction));
    }

    let target = from.ahead();
    let moved = from.moved_to(target);
    match futuristic_placement(PieceKind::Tank, direction, from.position(), view, futuristic) {
        Placement::Free => Step::Move(moved),
        Placement::Push(_) | Placement::Blocked => {
            match resolve_push_chain(view.board(futuristic), target, direction) {
                Some(chain)
                    if chain.origins().last().map(|at| at.step(direction)) != Some(view.tank) =>
                {
                    Step::Push(moved, chain)
                }
                _ => Step::Blocked,
            }
        }
    }
}

fn merge(damage: Option<BoundingRect>, more: Option<BoundingRect>) -> Option<BoundingRect> {
    match (damage, more) {
        (Some(damage), Some(more)) => Some(damage.union(more)),
        (damage, more) => damage.or(more),
    }
}

/// Master board, live tank and queued plan of one play-through.
#[derive(Debug)]
pub struct Session {
    master: BoardState,
    tank: Vector,
    alive: bool,
    in_flight: VecDeque<LaunchedPush>,
    delta: SpeculativeDelta,
    projector: ShotProjector,
    plan: Vec<PlannedStep>,
}

impl Session {
    /// Starts a session with the tank on the board's start vector.
    #[must_use]
    pub fn new(master: BoardState) -> Self {
        let tank = master.tank_start();
        Self {
            master,
            tank,
            alive: true,
            in_flight: VecDeque::new(),
            delta: SpeculativeDelta::new(),
            projector: ShotProjector::new(),
            plan: Vec::new(),
        }
    }

    /// Committed board.
    #[must_use]
    pub const fn master(&self) -> &BoardState {
        &self.master
    }

    /// Live tank square and facing.
    #[must_use]
    pub const fn tank(&self) -> Vector {
        self.tank
    }

    /// Reports whether the tank survives.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Reports whether the live tank stands on the flag.
    #[must_use]
    pub fn level_complete(&self) -> bool {
        self.alive && query::flag_reached(&self.master, self.tank.position())
    }

    /// Live pushes still waiting for [`Session::complete_push`], oldest first.
    pub fn pushes_in_flight(&self) -> impl Iterator<Item = &LaunchedPush> + '_ {
        self.in_flight.iter()
    }

    /// Speculative board and overlay.
    #[must_use]
    pub const fn delta(&self) -> &SpeculativeDelta {
        &self.delta
    }

    /// Future board, while a plan is queued.
    #[must_use]
    pub fn future(&self) -> Option<&BoardState> {
        self.delta.future()
    }

    /// Queued moves in execution order.
    pub fn plan(&self) -> impl Iterator<Item = &QueuedMove> + '_ {
        self.plan.iter().map(|step| &step.queued)
    }

    /// Number of queued moves.
    #[must_use]
    pub fn plan_len(&self) -> usize {
        self.plan.len()
    }

    /// Projected path of the queued move at `index`.
    #[must_use]
    pub fn shot_path(&self, index: usize) -> Option<&ShotPath> {
        let id = self.plan.get(index)?.queued.path_id()?;
        self.projector.path(id)
    }

    /// Tank vector at the end of the queued plan.
    #[must_use]
    pub fn planned_tank(&self) -> Vector {
        self.plan
            .last()
            .map_or(self.tank, |step| step.queued.vector())
    }

    /// Traversability predicate handed to the external path search.
    ///
    /// Queries the future board while a plan is queued so found paths
    /// continue from the planned tank.
    #[must_use]
    pub fn path_search_passable(&self, at: Position, from: Direction) -> bool {
        let view = PlanView {
            master: &self.master,
            future: self.delta.future(),
            tank: self.tank.position(),
        };
        passable_for_tank(at, from, &view, true)
    }

    /// Turns the live tank toward `direction`, or moves it one square when it
    /// already faces that way.
    pub fn move_tank(&mut self, direction: Direction) -> MoveOutcome {
        if !self.alive {
            return MoveOutcome::Blocked;
        }

        let view = PlanView {
            master: &self.master,
            future: None,
            tank: self.tank.position(),
        };
        let outcome = match resolve_step(&view, false, self.tank, direction) {
            Step::Turn(vector) => MoveOutcome::Turned(vector),
            Step::Move(vector) => MoveOutcome::Moved(vector),
            Step::Push(vector, chain) => {
                match self.master.apply_chain_push(chain.origins(), chain.direction()) {
                    Some(record) => MoveOutcome::Pushed { vector, record },
                    None => MoveOutcome::Blocked,
                }
            }
            Step::Blocked => MoveOutcome::Blocked,
        };

        if let Some(vector) = outcome.vector() {
            self.tank = vector;
        }
        let _ = self.delta.refresh(&self.master);
        outcome
    }

    /// Fires the live tank's laser on the master board.
    ///
    /// A shoved piece leaves the board and travels until
    /// [`Session::complete_push`] lands it. Returns `None` once the tank is
    /// destroyed.
    pub fn fire(&mut self) -> Option<ShotTrace> {
        if !self.alive {
            return None;
        }

        let in_flight: Vec<Position> = self
            .in_flight
            .iter()
            .flat_map(|push| [push.piece.from, push.destination()])
            .collect();
        let context = ShotContext::live(self.tank.position(), &in_flight);
        let shot = trace(&mut self.master, self.tank, &context);
        match shot.impact {
            Some(Impact::PushLaunched(launched)) => self.in_flight.push_back(launched),
            Some(Impact::TankKilled) => {
                debug!(
                    "tank at ({}, {}) destroyed by its own beam",
                    self.tank.position().column(),
                    self.tank.position().row()
                );
                self.alive = false;
            }
            _ => {}
        }
        let _ = self.delta.refresh(&self.master);
        Some(shot)
    }

    /// Lands the oldest travelling piece; called when its animation finishes.
    ///
    /// Returns the landing square and its push stamp.
    pub fn complete_push(&mut self) -> Option<(Position, PushId)> {
        let launched = self.in_flight.pop_front()?;
        let destination = launched.destination();
        let pushed_id =
            self.master
                .apply_push_result(launched.piece.kind, destination, launched.piece.angle);
        let _ = self.delta.refresh(&self.master);
        Some((destination, pushed_id))
    }

    /// Appends a move to the plan, played out on the future board.
    ///
    /// The future board is cloned from the master board when the first move
    /// is queued. Pieces may not be shoved onto the live tank's square.
    pub fn queue_move(&mut self, direction: Direction) -> MoveOutcome {
        if !self.alive {
            return MoveOutcome::Blocked;
        }

        if self.plan.is_empty() {
            self.projector.set_live_tank(self.tank.position());
        }
        self.delta.enable(true, &mut self.master);
        let from = self.planned_tank();
        let step = match self.delta.future() {
            Some(future) => {
                let view = PlanView {
                    master: &self.master,
                    future: Some(future),
                    tank: self.tank.position(),
                };
                resolve_step(&view, true, from, direction)
            }
            None => Step::Blocked,
        };

        let (outcome, push) = match step {
            Step::Turn(vector) => (MoveOutcome::Turned(vector), None),
            Step::Move(vector) => (MoveOutcome::Moved(vector), None),
            Step::Push(vector, chain) => match self
                .delta
                .future_mut()
                .and_then(|future| future.apply_chain_push(chain.origins(), chain.direction()))
            {
                Some(record) => (
                    MoveOutcome::Pushed {
                        vector,
                        record: record.clone(),
                    },
                    Some(record),
                ),
                None => (MoveOutcome::Blocked, None),
            },
            Step::Blocked => (MoveOutcome::Blocked, None),
        };

        match outcome.vector() {
            Some(vector) => {
                self.plan.push(PlannedStep {
                    direction,
                    queued: QueuedMove::new(vector),
                    push,
                });
                let _ = self.delta.refresh(&self.master);
            }
            None if self.plan.is_empty() => self.delta.enable(false, &mut self.master),
            None => {}
        }
        outcome
    }

    /// Changes the number of shots fired after the queued move at `index`.
    ///
    /// Later steps are withdrawn first and replayed afterwards so every push
    /// stamp on the future board is undone in reverse order. Replayed steps
    /// keep their path ids. A later move
    /// that is no longer possible is dropped from the plan. Returns the area
    /// whose projection changed, or `None` when `index` is out of range.
    pub fn set_queued_shots(&mut self, index: usize, count: u32) -> Option<BoundingRect> {
        if index >= self.plan.len() {
            return None;
        }

        let mut later = self.plan.split_off(index + 1);
        let kept_ids: Vec<Option<PathId>> =
            later.iter().map(|step| step.queued.path_id()).collect();
        let mut damage = None;
        for step in later.iter_mut().rev() {
            damage = merge(damage, self.withdraw(step));
        }

        if let (Some(future), Some(step)) = (self.delta.future_mut(), self.plan.get_mut(index)) {
            let previous = step.queued.set_shot_count(count);
            damage = merge(
                damage,
                self.projector.update_shots(previous, &mut step.queued, future),
            );
        }

        for (step, kept_id) in later.into_iter().zip(kept_ids) {
            if self.queue_move(step.direction) == MoveOutcome::Blocked {
                debug!(
                    "dropping queued {:?} move that is no longer possible",
                    step.direction
                );
                continue;
            }
            let shots = step.queued.shot_count();
            if shots > 0 {
                let last = self.plan.len() - 1;
                if let (Some(id), Some(replayed)) = (kept_id, self.plan.last_mut()) {
                    replayed.queued.adopt_path_id(id);
                }
                damage = merge(damage, self.set_queued_shots(last, shots));
            }
        }

        let _ = self.delta.refresh(&self.master);
        damage
    }

    /// Withdraws the most recently queued move and its shots.
    pub fn cancel_last_move(&mut self) -> bool {
        let Some(mut step) = self.plan.pop() else {
            return false;
        };
        let _ = self.withdraw(&mut step);
        if self.plan.is_empty() {
            self.delta.enable(false, &mut self.master);
        } else {
            let _ = self.delta.refresh(&self.master);
        }
        true
    }

    /// Withdraws every queued move and stops speculating.
    ///
    /// Returns the number of moves discarded.
    pub fn abandon_plan(&mut self) -> usize {
        let discarded = self.plan.len();
        while let Some(mut step) = self.plan.pop() {
            let _ = self.withdraw(&mut step);
        }
        self.delta.enable(false, &mut self.master);
        discarded
    }

    /// Executes the queued plan on the master board.
    ///
    /// Speculation is abandoned first; each move is then replayed live and
    /// followed by its shots, with every launched push landed immediately.
    /// Moves that are no longer possible are skipped. Returns the number of
    /// moves that executed.
    pub fn commit_plan(&mut self) -> usize {
        let steps: Vec<(Direction, u32)> = self
            .plan
            .iter()
            .map(|step| (step.direction, step.queued.shot_count()))
            .collect();
        let _ = self.abandon_plan();

        let mut executed = 0;
        for (direction, shots) in steps {
            if !self.alive {
                break;
            }
            if self.move_tank(direction) == MoveOutcome::Blocked {
                debug!("skipping committed {direction:?} move that is blocked");
                continue;
            }
            executed += 1;
            for _ in 0..shots {
                if self.fire().is_none() {
                    break;
                }
                while self.complete_push().is_some() {}
            }
        }
        debug!("committed {executed} queued moves");
        executed
    }

    fn withdraw(&mut self, step: &mut PlannedStep) -> Option<BoundingRect> {
        let future = self.delta.future_mut()?;
        let damage = self.projector.remove_path(&mut step.queued, true, future);
        if let Some(record) = &step.push {
            future.revert_push(record);
        }
        damage
    }
}

/// Applies the provided command to the session, reporting what happened.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MoveTank { direction } => {
            let outcome = session.move_tank(direction);
            push_move_events(outcome, direction, out_events);
            if session.level_complete() {
                out_events.push(Event::FlagReached);
            }
        }
        Command::Fire => {
            if let Some(shot) = session.fire() {
                out_events.push(Event::ShotFired {
                    bends: shot.bends,
                    end: shot.end,
                });
                match shot.impact {
                    Some(Impact::PushLaunched(launched)) => out_events.push(Event::PushLaunched {
                        destination: launched.destination(),
                    }),
                    Some(Impact::TankKilled) => out_events.push(Event::TankKilled),
                    _ => {}
                }
            }
        }
        Command::CompletePush => {
            if let Some((at, pushed_id)) = session.complete_push() {
                out_events.push(Event::PushLanded { at, pushed_id });
            }
        }
        Command::QueueMove { direction } => match session.queue_move(direction).vector() {
            Some(vector) => out_events.push(Event::MoveQueued { vector }),
            None => out_events.push(Event::MoveBlocked { direction }),
        },
        Command::SetQueuedShots { index, count } => {
            if index < session.plan_len() {
                let damage = session.set_queued_shots(index, count);
                out_events.push(Event::ProjectionChanged { damage });
            }
        }
        Command::CancelLastMove => {
            if session.cancel_last_move() && session.plan_len() == 0 {
                out_events.push(Event::PlanCleared);
            }
        }
        Command::AbandonPlan => {
            if session.abandon_plan() > 0 {
                out_events.push(Event::PlanCleared);
            }
        }
        Command::CommitPlan => {
            let executed = session.commit_plan();
            out_events.push(Event::PlanCommitted { executed });
            if !session.is_alive() {
                out_events.push(Event::TankKilled);
            } else if session.level_complete() {
                out_events.push(Event::FlagReached);
            }
        }
    }
}

fn push_move_events(outcome: MoveOutcome, direction: Direction, out_events: &mut Vec<Event>) {
    match outcome {
        MoveOutcome::Turned(vector) | MoveOutcome::Moved(vector) => {
            out_events.push(Event::TankMoved { vector });
        }
        MoveOutcome::Pushed { vector, record } => {
            out_events.push(Event::PiecesPushed { record });
            out_events.push(Event::TankMoved { vector });
        }
        MoveOutcome::Blocked => out_events.push(Event::MoveBlocked { direction }),
    }
}
