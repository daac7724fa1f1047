use laser_tank_core::{Direction, Piece, PieceKind, Position, TileKind};
use laser_tank_system_speculation::SpeculativeDelta;
use laser_tank_world::{parse, query, BoardState};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Edit {
    Tile(i32, i32, TileKind),
    Insert(i32, i32, PieceKind),
    Erase(i32, i32),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    let tile = prop::sample::select(vec![
        TileKind::Dirt,
        TileKind::Wood,
        TileKind::WoodDamaged,
        TileKind::Water,
        TileKind::SunkTile,
    ]);
    let kind = prop::sample::select(vec![
        PieceKind::Cannon,
        PieceKind::TileBlock,
        PieceKind::TileMirror,
    ]);
    prop_oneof![
        (0..5i32, 0..4i32, tile).prop_map(|(column, row, tile)| Edit::Tile(column, row, tile)),
        (0..5i32, 0..4i32, kind).prop_map(|(column, row, kind)| Edit::Insert(column, row, kind)),
        (0..5i32, 0..4i32).prop_map(|(column, row)| Edit::Erase(column, row)),
    ]
}

fn apply(board: &mut BoardState, edit: &Edit) {
    match *edit {
        Edit::Tile(column, row, tile) => board.set_tile_at(tile, Position::new(column, row)),
        Edit::Insert(column, row, kind) => {
            let _ = board.insert_piece(Piece::new(kind, Position::new(column, row), Direction::Up));
        }
        Edit::Erase(column, row) => {
            let _ = board.erase_piece(Position::new(column, row));
        }
    }
}

proptest! {
    #[test]
    fn overlay_matches_full_board_diff(
        future_edits in prop::collection::vec(edit_strategy(), 0..24),
        master_edits in prop::collection::vec(edit_strategy(), 0..6),
    ) {
        let mut master = parse(".M...\n..W..\n.<.w.\n.....\n").expect("layout parses");
        let mut delta = SpeculativeDelta::new();
        delta.enable(true, &mut master);

        for edit in &future_edits {
            apply(delta.future_mut().expect("future board"), edit);
        }
        for edit in &master_edits {
            apply(&mut master, edit);
        }
        let _ = delta.refresh(&master);

        let marked: Vec<Position> = delta.markers().map(|(at, _)| at).collect();
        let future = delta.future().expect("future board");
        let mut expected = query::differing_squares(&master, future);
        expected.sort();
        prop_assert_eq!(marked, expected);
    }
}

#[test]
fn disabling_discards_overlay_but_keeps_tracking_off() {
    let mut master = parse("..M\n").expect("layout parses");
    let mut delta = SpeculativeDelta::new();
    delta.enable(true, &mut master);
    let _ = delta
        .future_mut()
        .expect("future board")
        .erase_piece(Position::new(2, 0));
    let _ = delta.refresh(&master);
    assert_eq!(delta.markers().count(), 1);

    delta.enable(false, &mut master);
    assert_eq!(delta.markers().count(), 0);

    master.set_tile_at(TileKind::Wood, Position::new(0, 0));
    assert!(
        delta.refresh(&master).is_empty(),
        "a disabled delta no longer hears master changes"
    );
}
