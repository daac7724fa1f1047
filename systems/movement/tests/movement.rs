use laser_tank_core::{Direction, PieceKind, Position, PushId, TileKind};
use laser_tank_system_movement::{can_place_at, placement, resolve_push_chain, Placement};
use laser_tank_world::{parse, BoardState};
use proptest::prelude::*;

const GLYPHS: &[&str] = &[
    ".", ".", ".", "_", "S", "w", "F", "#", "W", "D", "M", "^", ">", "v", "<", "[u", "[r",
    "[d", "[l", "{u", "{r", "[-", "[|",
];

fn layout_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(prop::sample::select(GLYPHS), 6), 6).prop_map(
        |rows| {
            rows.into_iter()
                .map(|row| row.concat())
                .collect::<Vec<_>>()
                .join("\n")
        },
    )
}

fn occupant_can_advance(board: &BoardState, at: Position, direction: Direction) -> bool {
    let Some(piece) = board.piece_at(at) else {
        return false;
    };
    let beyond = at.step(direction);
    match board.tile_at(beyond) {
        TileKind::Dirt | TileKind::SunkTile => board.piece_at(beyond).is_none(),
        TileKind::Water => piece.kind() != PieceKind::Tank,
        _ => false,
    }
}

proptest! {
    #[test]
    fn tank_legality_matches_tile_rules(layout in layout_strategy()) {
        let board = parse(&layout).expect("generated layout parses");
        for row in -1..=board.rows() {
            for column in -1..=board.columns() {
                let at = Position::new(column, row);
                for direction in Direction::ALL {
                    let expected = match board.tile_at(at) {
                        TileKind::Dirt | TileKind::SunkTile => match board.piece_at(at) {
                            None => true,
                            Some(_) => occupant_can_advance(&board, at, direction),
                        },
                        TileKind::Flag => true,
                        _ => false,
                    };
                    prop_assert_eq!(
                        can_place_at(PieceKind::Tank, at, direction, &board),
                        expected,
                        "square ({}, {}) entered heading {:?}",
                        column,
                        row,
                        direction
                    );
                }
            }
        }
    }

    #[test]
    fn placement_never_mutates_board(layout in layout_strategy()) {
        let board = parse(&layout).expect("generated layout parses");
        let before = board.clone();
        for (at, _) in board.squares() {
            for direction in Direction::ALL {
                let _ = placement(PieceKind::Tank, at, direction, &board);
                let _ = placement(PieceKind::TileBlock, at, direction, &board);
            }
        }
        prop_assert_eq!(board, before);
    }
}

#[test]
fn tank_is_blocked_by_solid_tiles() {
    let board = parse("SwWD[u[-#\n").expect("layout parses");
    for column in 0..board.columns() {
        let at = Position::new(column, 0);
        for direction in Direction::ALL {
            assert!(
                !can_place_at(PieceKind::Tank, at, direction, &board),
                "tank must not enter {:?}",
                board.tile_at(at)
            );
        }
    }
}

#[test]
fn pushing_a_row_of_three_blocks_is_one_push_event() {
    let mut board = parse("T>MMM.\n").expect("layout parses");
    let before = board.clone();
    let tank = board.tank_start();

    assert_eq!(
        placement(PieceKind::Tank, tank.ahead(), tank.direction(), &board),
        Placement::Blocked,
        "single-step placement treats a row as immovable"
    );

    let chain = resolve_push_chain(&board, tank.ahead(), tank.direction()).expect("row shoves");
    let record = board
        .apply_chain_push(chain.origins(), chain.direction())
        .expect("push applies");

    assert_eq!(board.last_push_id(), PushId::new(1));
    for column in 2..=4 {
        let piece = board
            .piece_at(Position::new(column, 0))
            .expect("block shifted one square");
        assert_eq!(piece.kind(), PieceKind::TileBlock);
        assert_eq!(piece.pushed_id(), PushId::new(1));
    }
    assert!(board.piece_at(Position::new(1, 0)).is_none());

    board.revert_push(&record);
    assert_eq!(board.last_push_id(), PushId::ZERO);
    assert_eq!(board, before, "revert restores every block and its stamp");
}

#[test]
fn chained_row_sinks_its_last_block_into_water() {
    let mut board = parse("T>MMw\n").expect("layout parses");
    let before = board.clone();
    let chain = resolve_push_chain(&board, Position::new(1, 0), Direction::Right)
        .expect("last block may enter water");
    let record = board
        .apply_chain_push(chain.origins(), chain.direction())
        .expect("push applies");

    assert_eq!(board.tile_at(Position::new(3, 0)), TileKind::SunkTile);
    assert!(board.piece_at(Position::new(3, 0)).is_none());
    assert!(board.piece_at(Position::new(2, 0)).is_some());

    board.revert_push(&record);
    assert_eq!(board, before);
}
