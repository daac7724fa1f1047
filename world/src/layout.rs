//! Plain-text board layouts.
//!
//! Each cell is one glyph, except for digraphs opened by `[` (stone mirrors
//! and slits), `{` (tile-mirror pieces) and `T` (the tank's start vector).
//! Rows are separated by newlines; the widest row sets the board width and
//! shorter rows are padded with [`TileKind::Empty`].

use laser_tank_core::{
    Direction, Piece, PieceKind, Position, Slit, TileKind, Vector, MAX_BOARD_DIMENSION,
};
use thiserror::Error;

use crate::BoardState;

/// Errors raised while reading a board layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout contained a glyph with no meaning.
    #[error("unknown glyph `{glyph}` at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending glyph, including its digraph prefix when present.
        glyph: String,
        /// Cell column of the glyph.
        column: i32,
        /// Row of the glyph.
        row: i32,
    },
    /// A digraph prefix ended the row.
    #[error("digraph `{prefix}` at column {column}, row {row} is missing its second glyph")]
    DanglingDigraph {
        /// Prefix that opened the digraph.
        prefix: char,
        /// Cell column of the digraph.
        column: i32,
        /// Row of the digraph.
        row: i32,
    },
    /// The layout exceeds the largest supported board.
    #[error("layout spans {columns}x{rows} cells; boards are limited to {max}x{max}", max = MAX_BOARD_DIMENSION)]
    TooLarge {
        /// Widest row measured in cells.
        columns: usize,
        /// Number of rows.
        rows: usize,
    },
    /// More than one tank start vector was placed.
    #[error("second tank start at column {column}, row {row}")]
    DuplicateTank {
        /// Cell column of the second tank.
        column: i32,
        /// Row of the second tank.
        row: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    tile: TileKind,
    piece: Option<(PieceKind, Direction)>,
    tank: Option<Direction>,
}

impl Cell {
    const fn tile(tile: TileKind) -> Self {
        Self {
            tile,
            piece: None,
            tank: None,
        }
    }

    const fn piece(kind: PieceKind, direction: Direction) -> Self {
        Self {
            tile: TileKind::Dirt,
            piece: Some((kind, direction)),
            tank: None,
        }
    }
}

/// Reads a board from its text layout.
pub fn parse(text: &str) -> Result<BoardState, LayoutError> {
    let mut grid: Vec<Vec<Cell>> = Vec::new();
    for (row, line) in text.lines().enumerate() {
        let row = to_coord(row);
        grid.push(parse_row(line.trim_end_matches('\r'), row)?);
    }

    let rows = grid.len();
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    let max = usize::try_from(MAX_BOARD_DIMENSION).unwrap_or(usize::MAX);
    if rows > max || columns > max {
        return Err(LayoutError::TooLarge { columns, rows });
    }

    let mut board = BoardState::new(to_coord(columns), to_coord(rows));
    let mut tank: Option<Vector> = None;
    for (row, cells) in grid.iter().enumerate() {
        for column in 0..columns {
            let at = Position::new(to_coord(column), to_coord(row));
            let cell = cells
                .get(column)
                .copied()
                .unwrap_or(Cell::tile(TileKind::Empty));
            board.set_tile_at(cell.tile, at);
            if cell.tile == TileKind::Flag {
                board.set_flag(at);
            }
            if let Some((kind, direction)) = cell.piece {
                let _ = board.insert_piece(Piece::new(kind, at, direction));
            }
            if let Some(direction) = cell.tank {
                if tank.is_some() {
                    return Err(LayoutError::DuplicateTank {
                        column: at.column(),
                        row: at.row(),
                    });
                }
                tank = Some(Vector::new(at, direction));
            }
        }
    }

    if let Some(start) = tank {
        board.set_tank_start(start);
    }
    Ok(board)
}

/// Writes a board back into its text layout.
///
/// Pieces are drawn over the ground they stand on. The tank is drawn at
/// `tank` when provided.
#[must_use]
pub fn render(board: &BoardState, tank: Option<Vector>) -> String {
    let mut out = String::new();
    for row in 0..board.rows() {
        for column in 0..board.columns() {
            let at = Position::new(column, row);
            match (tank, board.piece_at(at)) {
                (Some(tank), _) if tank.position() == at => {
                    out.push('T');
                    out.push(direction_glyph(tank.direction()));
                }
                (_, Some(piece)) => push_piece(&mut out, piece.kind(), piece.direction()),
                _ => push_tile(&mut out, board.tile_at(at)),
            }
        }
        out.push('\n');
    }
    out
}

fn parse_row(line: &str, row: i32) -> Result<Vec<Cell>, LayoutError> {
    let mut cells = Vec::new();
    let mut glyphs = line.chars();
    while let Some(glyph) = glyphs.next() {
        let column = to_coord(cells.len());
        let unknown = |text: String| LayoutError::UnknownGlyph {
            glyph: text,
            column,
            row,
        };
        let cell = match glyph {
            '[' | '{' | 'T' => {
                let code = glyphs.next().ok_or(LayoutError::DanglingDigraph {
                    prefix: glyph,
                    column,
                    row,
                })?;
                decode_digraph(glyph, code).ok_or_else(|| unknown(format!("{glyph}{code}")))?
            }
            other => decode_glyph(other).ok_or_else(|| unknown(other.to_string()))?,
        };
        cells.push(cell);
    }
    Ok(cells)
}

fn decode_glyph(glyph: char) -> Option<Cell> {
    let cell = match glyph {
        '.' => Cell::tile(TileKind::Dirt),
        '_' => Cell::tile(TileKind::SunkTile),
        'S' => Cell::tile(TileKind::Stone),
        'w' => Cell::tile(TileKind::Water),
        'F' => Cell::tile(TileKind::Flag),
        '#' => Cell::tile(TileKind::Empty),
        'W' => Cell::tile(TileKind::Wood),
        'D' => Cell::tile(TileKind::WoodDamaged),
        'M' => Cell::piece(PieceKind::TileBlock, Direction::Up),
        other => Cell::piece(PieceKind::Cannon, glyph_direction(other)?),
    };
    Some(cell)
}

fn decode_digraph(prefix: char, code: char) -> Option<Cell> {
    match (prefix, code) {
        ('[', '-') => Some(Cell::tile(TileKind::StoneSlit(Slit::Horizontal))),
        ('[', '|') => Some(Cell::tile(TileKind::StoneSlit(Slit::Vertical))),
        ('[', code) => Some(Cell::tile(TileKind::StoneMirror(letter_direction(code)?))),
        ('{', code) => Some(Cell::piece(PieceKind::TileMirror, letter_direction(code)?)),
        ('T', code) => Some(Cell {
            tile: TileKind::Dirt,
            piece: None,
            tank: Some(glyph_direction(code)?),
        }),
        _ => None,
    }
}

fn glyph_direction(glyph: char) -> Option<Direction> {
    match glyph {
        '^' => Some(Direction::Up),
        '>' => Some(Direction::Right),
        'v' => Some(Direction::Down),
        '<' => Some(Direction::Left),
        _ => None,
    }
}

fn letter_direction(letter: char) -> Option<Direction> {
    match letter {
        'u' => Some(Direction::Up),
        'r' => Some(Direction::Right),
        'd' => Some(Direction::Down),
        'l' => Some(Direction::Left),
        _ => None,
    }
}

fn direction_glyph(direction: Direction) -> char {
    match direction {
        Direction::Up => '^',
        Direction::Right => '>',
        Direction::Down => 'v',
        Direction::Left => '<',
    }
}

fn direction_letter(direction: Direction) -> char {
    match direction {
        Direction::Up => 'u',
        Direction::Right => 'r',
        Direction::Down => 'd',
        Direction::Left => 'l',
    }
}

fn push_piece(out: &mut String, kind: PieceKind, direction: Direction) {
    match kind {
        PieceKind::TileBlock => out.push('M'),
        PieceKind::Cannon => out.push(direction_glyph(direction)),
        PieceKind::TileMirror => {
            out.push('{');
            out.push(direction_letter(direction));
        }
        PieceKind::Tank => {
            out.push('T');
            out.push(direction_glyph(direction));
        }
    }
}

fn push_tile(out: &mut String, tile: TileKind) {
    match tile {
        TileKind::Dirt => out.push('.'),
        TileKind::SunkTile => out.push('_'),
        TileKind::Stone => out.push('S'),
        TileKind::Water => out.push('w'),
        TileKind::Flag => out.push('F'),
        TileKind::Empty => out.push('#'),
        TileKind::Wood => out.push('W'),
        TileKind::WoodDamaged => out.push('D'),
        TileKind::StoneMirror(direction) => {
            out.push('[');
            out.push(direction_letter(direction));
        }
        TileKind::StoneSlit(Slit::Horizontal) => out.push_str("[-"),
        TileKind::StoneSlit(Slit::Vertical) => out.push_str("[|"),
    }
}

fn to_coord(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tiles_pieces_and_metadata() {
        let board = parse("S.T>M[r\nw{dF<W\n").expect("layout parses");

        assert_eq!(board.columns(), 5);
        assert_eq!(board.rows(), 2);
        assert_eq!(board.tile_at(Position::new(0, 0)), TileKind::Stone);
        assert_eq!(
            board.tank_start(),
            Vector::new(Position::new(2, 0), Direction::Right)
        );
        assert_eq!(
            board.piece_at(Position::new(3, 0)).map(Piece::kind),
            Some(PieceKind::TileBlock)
        );
        assert_eq!(
            board.tile_at(Position::new(4, 0)),
            TileKind::StoneMirror(Direction::Right)
        );
        assert_eq!(board.tile_at(Position::new(5, 0)), TileKind::Empty);
        assert_eq!(board.tile_at(Position::new(0, 1)), TileKind::Water);
        let mirror = board.piece_at(Position::new(1, 1)).expect("tile mirror");
        assert_eq!(mirror.kind(), PieceKind::TileMirror);
        assert_eq!(mirror.direction(), Direction::Down);
        assert_eq!(board.flag(), Position::new(2, 1));
        let cannon = board.piece_at(Position::new(3, 1)).expect("cannon");
        assert_eq!(cannon.direction(), Direction::Left);
        assert_eq!(board.tile_at(Position::new(4, 1)), TileKind::Wood);
    }

    #[test]
    fn render_reproduces_layout() {
        let text = "S.T>M[r[-\nw{dF<WD_\n";
        let board = parse(text).expect("layout parses");
        let rendered = render(&board, Some(board.tank_start()));
        assert_eq!(rendered, "S.T>M[r[-#\nw{dF<WD_\n");
    }

    #[test]
    fn rejects_unknown_and_dangling_glyphs() {
        assert_eq!(
            parse("..?").err(),
            Some(LayoutError::UnknownGlyph {
                glyph: "?".to_owned(),
                column: 2,
                row: 0,
            })
        );
        assert_eq!(
            parse("..\n.[").err(),
            Some(LayoutError::DanglingDigraph {
                prefix: '[',
                column: 1,
                row: 1,
            })
        );
        assert!(matches!(
            parse("[x").err(),
            Some(LayoutError::UnknownGlyph { .. })
        ));
    }

    #[test]
    fn rejects_second_tank() {
        assert_eq!(
            parse("T>..T<").err(),
            Some(LayoutError::DuplicateTank { column: 3, row: 0 })
        );
    }

    #[test]
    fn rejects_oversized_layouts() {
        let wide = ".".repeat(101);
        assert_eq!(
            parse(&wide).err(),
            Some(LayoutError::TooLarge {
                columns: 101,
                rows: 1,
            })
        );
    }

    #[test]
    fn boards_without_tank_keep_null_start() {
        let board = parse("...").expect("layout parses");
        assert!(board.tank_start().position().is_null());
        assert!(board.flag().is_null());
    }
}
