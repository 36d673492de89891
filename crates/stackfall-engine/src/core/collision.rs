use super::{
    BOARD_HEIGHT, BOARD_WIDTH,
    board::Board,
    piece::{Piece, PieceKind, PiecePosition, PieceRotation},
};

/// Checks whether a piece of `kind` in `rotation` anchored at `anchor` may sit
/// on `board`.
///
/// A placement is valid when every occupied cell lies within the columns
/// `0..10`, no lower than row 19, and on an empty board cell. Cells above the
/// top row (negative rows) only have their column checked, so freshly spawned
/// or kicked pieces may poke out of the board.
///
/// The check has no side effects and can be called speculatively.
///
/// # Example
///
/// ```
/// use stackfall_engine::{Board, PieceKind, PiecePosition, PieceRotation, is_valid};
///
/// let board = Board::EMPTY;
/// assert!(is_valid(&board, PieceKind::O, PieceRotation::SPAWN, PiecePosition::new(-1, 0)));
/// assert!(!is_valid(&board, PieceKind::O, PieceRotation::SPAWN, PiecePosition::new(-2, 0)));
/// ```
#[must_use]
pub fn is_valid(
    board: &Board,
    kind: PieceKind,
    rotation: PieceRotation,
    anchor: PiecePosition,
) -> bool {
    kind.offsets(rotation).into_iter().all(|(dx, dy)| {
        let col = anchor.col() + dx;
        let row = anchor.row() + dy;
        let Ok(x) = usize::try_from(col) else {
            return false;
        };
        if x >= BOARD_WIDTH {
            return false;
        }
        match usize::try_from(row) {
            Err(_) => true,
            Ok(y) if y >= BOARD_HEIGHT => false,
            Ok(_) => board.is_occupied(col, row) == Ok(false),
        }
    })
}

impl Piece {
    /// Shorthand for [`is_valid`] on this piece's own placement.
    #[must_use]
    pub fn fits(&self, board: &Board) -> bool {
        is_valid(board, self.kind(), self.rotation(), self.position())
    }

    /// Whether every cell of the piece lies inside the visible board.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.cells().all(|(col, row)| Board::contains(col, row))
    }
}
