use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Cell, Piece, PieceKind};

use super::session::{EndReason, Phase};

/// Read-only view of a session handed to renderers.
///
/// A snapshot is a copy; mutating the session afterwards does not change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub active: Option<Piece>,
    /// Where the active piece would land after a hard drop.
    pub ghost: Option<Piece>,
    /// Upcoming pieces, nearest first.
    pub next: Vec<PieceKind>,
    pub score: u64,
    pub level: u32,
    pub lines_cleared: u32,
    pub elapsed_ticks: u64,
    pub phase: Phase,
    pub end_reason: Option<EndReason>,
}

impl Snapshot {
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase.is_game_over()
    }

    /// Renders the playfield as text, one line per row.
    ///
    /// Locked cells use their piece letter, the active piece uses `@` and
    /// the ghost uses `:`.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut grid = [['.'; BOARD_WIDTH]; BOARD_HEIGHT];
        for (y, row) in self.board.rows().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Cell::Filled(kind) = cell {
                    grid[y][x] = kind.as_char();
                }
            }
        }
        for (piece, mark) in [(self.ghost, ':'), (self.active, '@')] {
            let Some(piece) = piece else { continue };
            for (col, row) in piece.cells() {
                let (Ok(x), Ok(y)) = (usize::try_from(col), usize::try_from(row)) else {
                    continue;
                };
                if x < BOARD_WIDTH && y < BOARD_HEIGHT {
                    grid[y][x] = mark;
                }
            }
        }

        let mut out = String::with_capacity((BOARD_WIDTH + 1) * BOARD_HEIGHT);
        for row in grid {
            let line: String = row.iter().collect();
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
