use std::fmt::Write as _;

use laser_tank_core::{Direction, Position};
use laser_tank_session::Session;
use laser_tank_system_speculation::OverlayMarker;
use laser_tank_world::render;

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Right => "right",
        Direction::Down => "down",
        Direction::Left => "left",
    }
}

fn point(at: Position) -> String {
    format!("({}, {})", at.column(), at.row())
}

/// Master board with the live tank drawn on it.
pub(crate) fn master(session: &Session) -> String {
    let tank = session.is_alive().then(|| session.tank());
    render(session.master(), tank)
}

/// Future board with the planned tank, when a plan is queued.
pub(crate) fn future(session: &Session) -> Option<String> {
    let future = session.future()?;
    Some(render(future, Some(session.planned_tank())))
}

/// Overlay grid: `+` where the future gains something, `-` where it loses
/// something and `.` elsewhere.
pub(crate) fn overlay(session: &Session) -> String {
    let board = session.master();
    let mut out = String::new();
    for row in 0..board.rows() {
        for column in 0..board.columns() {
            let glyph = match session.delta().marker_at(Position::new(column, row)) {
                Some(OverlayMarker::FutureInsert) => '+',
                Some(OverlayMarker::FutureErase) => '-',
                None => '.',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// One line per queued move describing its projected shots.
pub(crate) fn plan(session: &Session) -> String {
    let mut out = String::new();
    for (index, queued) in session.plan().enumerate() {
        let vector = queued.vector();
        let _ = write!(
            out,
            "{}. {} at {}",
            index + 1,
            direction_name(vector.direction()),
            point(vector.position())
        );
        if let Some(path) = session.shot_path(index) {
            let polyline: Vec<String> = path.polyline().into_iter().map(point).collect();
            let _ = write!(
                out,
                ", {} shots ({} landed): {}",
                path.shot_count(),
                path.fired(),
                polyline.join(" -> ")
            );
            if path.killed_tank() {
                out.push_str(", kills the tank");
            }
        }
        out.push('\n');
    }
    out
}

/// Closing status line.
pub(crate) fn status(session: &Session) -> &'static str {
    if !session.is_alive() {
        "tank destroyed"
    } else if session.level_complete() {
        "flag reached"
    } else {
        "in progress"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_tank_world::parse;

    #[test]
    fn overlay_marks_projected_changes() {
        let mut session = Session::new(parse("T>.W<\n").expect("layout parses"));
        let _ = session.queue_move(Direction::Right);
        let _ = session.set_queued_shots(0, 3);
        assert_eq!(overlay(&session), "..+-\n");
    }

    #[test]
    fn plan_lists_polylines() {
        let mut session = Session::new(parse("T>..<\n").expect("layout parses"));
        let _ = session.queue_move(Direction::Down);
        let _ = session.queue_move(Direction::Right);
        let _ = session.set_queued_shots(1, 1);
        assert_eq!(
            plan(&session),
            "1. down at (0, 0)\n2. right at (0, 0), 1 shots (1 landed): (0, 0) -> (3, 0)\n"
        );
    }

    #[test]
    fn future_is_rendered_only_while_planning() {
        let mut session = Session::new(parse("T>M.\n").expect("layout parses"));
        assert!(future(&session).is_none());
        let _ = session.queue_move(Direction::Right);
        assert_eq!(future(&session).as_deref(), Some(".T>M\n"));
        assert_eq!(master(&session), "T>M.\n");
        assert_eq!(status(&session), "in progress");
    }
}
