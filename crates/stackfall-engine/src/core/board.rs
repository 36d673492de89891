use arrayvec::ArrayVec;

use super::{BOARD_HEIGHT, BOARD_WIDTH, piece::PieceKind};

/// A single cell of the board.
///
/// The piece-kind tag is carried for rendering only; game rules look at
/// occupancy alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Empty cell.
    #[default]
    Empty,
    /// Cell filled by a locked piece of a specific kind.
    Filled(PieceKind),
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub const fn kind(self) -> Option<PieceKind> {
        match self {
            Cell::Empty => None,
            Cell::Filled(kind) => Some(kind),
        }
    }
}

impl From<Option<PieceKind>> for Cell {
    fn from(kind: Option<PieceKind>) -> Self {
        kind.map_or(Cell::Empty, Cell::Filled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cell ({col}, {row}) is outside the board")]
pub struct OutOfBoundsError {
    pub col: i8,
    pub row: i8,
}

type Row = [Cell; BOARD_WIDTH];

const EMPTY_ROW: Row = [Cell::Empty; BOARD_WIDTH];

/// Result of [`Board::clear_full_rows`].
///
/// Holds the original indices (top to bottom) of the rows that were removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearedRows {
    rows: ArrayVec<u8, BOARD_HEIGHT>,
}

impl ClearedRows {
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Original row indices of the cleared rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[u8] {
        &self.rows
    }
}

/// The 10×20 playfield.
///
/// Row 0 is the top of the board and row 19 the bottom. The size is fixed for
/// the lifetime of a session.
///
/// # Example
///
/// ```
/// use stackfall_engine::{Board, PieceKind};
///
/// let mut board = Board::EMPTY;
/// board.commit([(0, 19), (1, 19)], PieceKind::O);
/// assert_eq!(board.is_occupied(0, 19), Ok(true));
/// assert!(board.is_occupied(10, 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: [Row; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Board {
    pub const WIDTH: usize = BOARD_WIDTH;
    pub const HEIGHT: usize = BOARD_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [EMPTY_ROW; BOARD_HEIGHT],
    };

    fn index(col: i8, row: i8) -> Option<(usize, usize)> {
        let x = usize::try_from(col).ok().filter(|&x| x < BOARD_WIDTH)?;
        let y = usize::try_from(row).ok().filter(|&y| y < BOARD_HEIGHT)?;
        Some((x, y))
    }

    #[must_use]
    pub fn contains(col: i8, row: i8) -> bool {
        Self::index(col, row).is_some()
    }

    /// Returns the cell at `(col, row)`.
    pub fn cell(&self, col: i8, row: i8) -> Result<Cell, OutOfBoundsError> {
        let (x, y) = Self::index(col, row).ok_or(OutOfBoundsError { col, row })?;
        Ok(self.rows[y][x])
    }

    /// Returns whether the cell at `(col, row)` is occupied.
    pub fn is_occupied(&self, col: i8, row: i8) -> Result<bool, OutOfBoundsError> {
        self.cell(col, row).map(|cell| !cell.is_empty())
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_WIDTH]> {
        self.rows.iter()
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rows.iter().flatten().copied()
    }

    #[must_use]
    pub fn is_row_full(&self, row: usize) -> bool {
        self.rows[row].iter().all(|cell| !cell.is_empty())
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells().filter(|cell| !cell.is_empty()).count()
    }

    /// Marks the given cells as filled with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if any cell is out of bounds or already occupied. Callers must
    /// validate the placement with [`is_valid`](crate::is_valid) first.
    pub fn commit(&mut self, cells: impl IntoIterator<Item = (i8, i8)>, kind: PieceKind) {
        for (col, row) in cells {
            let Some((x, y)) = Self::index(col, row) else {
                panic!("commit of out-of-bounds cell ({col}, {row})");
            };
            assert!(
                self.rows[y][x].is_empty(),
                "commit onto occupied cell ({col}, {row})"
            );
            self.rows[y][x] = Cell::Filled(kind);
        }
    }

    /// Removes every full row and shifts the rows above it down.
    ///
    /// Rows that survive keep their relative order, and the rows exposed at
    /// the top are empty.
    #[expect(clippy::cast_possible_truncation)]
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::default();
        for y in 0..BOARD_HEIGHT {
            if self.is_row_full(y) {
                cleared.rows.push(y as u8);
            }
        }
        if cleared.is_empty() {
            return cleared;
        }

        let mut count = 0;
        for y in (0..BOARD_HEIGHT).rev() {
            if self.is_row_full(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill(EMPTY_ROW);
        cleared
    }

    /// Builds a board from a flat row-major list of cells.
    ///
    /// Returns `None` unless exactly `WIDTH * HEIGHT` cells are given.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Option<Self> {
        let mut board = Self::EMPTY;
        let mut len = 0;
        for cell in cells {
            if len >= BOARD_WIDTH * BOARD_HEIGHT {
                return None;
            }
            board.rows[len / BOARD_WIDTH][len % BOARD_WIDTH] = cell;
            len += 1;
        }
        (len == BOARD_WIDTH * BOARD_HEIGHT).then_some(board)
    }

    /// Creates a `Board` from ASCII art for testing.
    ///
    /// `.` is an empty cell and any piece letter (`IOSZJLT`) or `#` is a filled
    /// cell (`#` is tagged as `I`). Rows are given top to bottom and aligned to
    /// the bottom of the board, so shorter pictures describe the lowest rows.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::EMPTY;
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(lines.len() <= BOARD_HEIGHT, "too many rows: {}", lines.len());

        let top = BOARD_HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<Cell> = line
                .chars()
                .map(|c| match c {
                    '.' => Cell::Empty,
                    '#' => Cell::Filled(PieceKind::I),
                    c => Cell::Filled(
                        PieceKind::from_char(c)
                            .unwrap_or_else(|| panic!("invalid board character {c:?}")),
                    ),
                })
                .collect();
            assert_eq!(
                cells.len(),
                BOARD_WIDTH,
                "Each row must have exactly {BOARD_WIDTH} cells, got {} at row {i}",
                cells.len(),
            );
            board.rows[top + i].copy_from_slice(&cells);
        }
        board
    }

    /// Renders the board as ASCII art in the format read by [`Self::from_ascii`].
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((BOARD_WIDTH + 1) * BOARD_HEIGHT);
        for row in &self.rows {
            out.extend(row.iter().map(|cell| cell.kind().map_or('.', PieceKind::as_char)));
            out.push('\n');
        }
        out
    }
}
