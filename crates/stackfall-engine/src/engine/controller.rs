use crate::core::{Board, Offset, Piece};

/// Applies player commands to a falling piece.
///
/// Every command builds a candidate placement and accepts it only if it
/// [`fits`](Piece::fits) the board; blocked commands return `None` and leave
/// the caller's piece untouched. The controller never mutates the board.
///
/// # Example
///
/// ```
/// use stackfall_engine::{Board, Piece, PieceController, PieceKind};
///
/// let board = Board::EMPTY;
/// let controller = PieceController::new(&board, &[]);
///
/// let piece = Piece::new(PieceKind::T);
/// let moved = controller.move_left(piece).unwrap();
/// let landed = controller.hard_drop(moved);
/// assert_eq!(landed, controller.ghost(moved));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PieceController<'a> {
    board: &'a Board,
    kicks: &'a [Offset],
}

impl<'a> PieceController<'a> {
    /// Creates a controller that tries `kicks` in order after a blocked rotation.
    #[must_use]
    pub const fn new(board: &'a Board, kicks: &'a [Offset]) -> Self {
        Self { board, kicks }
    }

    fn accept(&self, candidate: Piece) -> Option<Piece> {
        candidate.fits(self.board).then_some(candidate)
    }

    #[must_use]
    pub fn move_left(&self, piece: Piece) -> Option<Piece> {
        self.accept(piece.shifted(-1, 0))
    }

    #[must_use]
    pub fn move_right(&self, piece: Piece) -> Option<Piece> {
        self.accept(piece.shifted(1, 0))
    }

    /// Moves the piece down one row.
    #[must_use]
    pub fn soft_drop(&self, piece: Piece) -> Option<Piece> {
        self.accept(piece.shifted(0, 1))
    }

    #[must_use]
    pub fn rotate_cw(&self, piece: Piece) -> Option<Piece> {
        self.rotate_with_kicks(piece.rotated_cw())
    }

    #[must_use]
    pub fn rotate_ccw(&self, piece: Piece) -> Option<Piece> {
        self.rotate_with_kicks(piece.rotated_ccw())
    }

    /// Tries the rotated piece in place, then each kick offset in order.
    fn rotate_with_kicks(&self, rotated: Piece) -> Option<Piece> {
        std::iter::once((0, 0))
            .chain(self.kicks.iter().copied())
            .map(|(dcol, drow)| rotated.shifted(dcol, drow))
            .find(|candidate| candidate.fits(self.board))
    }

    /// Lowest position the piece reaches by falling straight down.
    ///
    /// Returns the piece itself when it cannot fall.
    #[must_use]
    pub fn ghost(&self, piece: Piece) -> Piece {
        let mut dropped = piece;
        while let Some(next) = self.soft_drop(dropped) {
            dropped = next;
        }
        dropped
    }

    /// Drops the piece to its [`ghost`](Self::ghost) position.
    ///
    /// The caller locks the returned piece immediately.
    #[must_use]
    pub fn hard_drop(&self, piece: Piece) -> Piece {
        self.ghost(piece)
    }

    /// Whether the piece rests on the floor or on the stack.
    #[must_use]
    pub fn is_grounded(&self, piece: Piece) -> bool {
        self.soft_drop(piece).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PieceKind, PiecePosition, PieceRotation};

    fn at(kind: PieceKind, rotation: u8, col: i8, row: i8) -> Piece {
        Piece::with_placement(
            kind,
            PieceRotation::new(rotation).unwrap(),
            PiecePosition::new(col, row),
        )
    }

    #[test]
    fn test_moves_stop_at_walls() {
        let board = Board::EMPTY;
        let controller = PieceController::new(&board, &[]);

        let mut piece = Piece::new(PieceKind::O);
        let mut steps = 0;
        while let Some(next) = controller.move_left(piece) {
            piece = next;
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(piece.position().col(), -1);

        let mut piece = Piece::new(PieceKind::O);
        steps = 0;
        while let Some(next) = controller.move_right(piece) {
            piece = next;
            steps += 1;
        }
        assert_eq!(steps, 4);
    }

    #[test]
    fn test_moves_blocked_by_stack() {
        let board = Board::from_ascii(
            r"
            ..Z.......
            ..Z.......
            ",
        );
        let controller = PieceController::new(&board, &[]);
        // O at anchor col 2 covers columns 3-4 on rows 18-19.
        let piece = at(PieceKind::O, 0, 2, 18);
        assert!(piece.fits(&board));
        assert_eq!(controller.move_left(piece), None);
        assert!(controller.move_right(piece).is_some());
    }

    #[test]
    fn test_soft_drop_and_grounding() {
        let board = Board::EMPTY;
        let controller = PieceController::new(&board, &[]);
        let piece = at(PieceKind::T, 0, 3, 17);
        let dropped = controller.soft_drop(piece).unwrap();
        assert_eq!(dropped.position().row(), 18);
        assert!(controller.is_grounded(dropped));
        assert_eq!(controller.soft_drop(dropped), None);
    }

    #[test]
    fn test_rotation_without_kicks_fails_against_wall() {
        let board = Board::EMPTY;
        // Vertical I hugging the left wall: state 3 occupies column col+1.
        let piece = at(PieceKind::I, 3, -1, 5);
        assert!(piece.fits(&board));

        let controller = PieceController::new(&board, &[]);
        assert_eq!(controller.rotate_cw(piece), None);
    }

    #[test]
    fn test_rotation_uses_first_valid_kick() {
        let board = Board::EMPTY;
        let piece = at(PieceKind::I, 3, -1, 5);
        let kicks = [(-1, 0), (1, 0), (2, 0)];
        let controller = PieceController::new(&board, &kicks);

        let rotated = controller.rotate_cw(piece).unwrap();
        assert_eq!(rotated.rotation().index(), 0);
        assert_eq!(rotated.position(), PiecePosition::new(0, 5));
    }

    #[test]
    fn test_rotation_in_place_preferred() {
        let board = Board::EMPTY;
        let kicks = [(1, 0)];
        let controller = PieceController::new(&board, &kicks);
        let piece = Piece::new(PieceKind::T);
        let rotated = controller.rotate_ccw(piece).unwrap();
        assert_eq!(rotated.position(), piece.position());
        assert_eq!(rotated.rotation().index(), 3);
    }

    #[test]
    fn test_hard_drop_matches_ghost() {
        let board = Board::from_ascii(
            r"
            ......L...
            ....LLL...
            JJJ.....SS
            J......SS.
            ",
        );
        let controller = PieceController::new(&board, &[]);
        for kind in PieceKind::ALL {
            for rotation in 0..4 {
                for col in -2..10 {
                    let piece = at(kind, rotation, col, 0);
                    if !piece.fits(&board) {
                        continue;
                    }
                    let ghost = controller.ghost(piece);
                    let landed = controller.hard_drop(piece);
                    assert_eq!(landed, ghost);
                    assert!(landed.fits(&board));
                    assert!(controller.is_grounded(landed));
                    assert_eq!(landed.position().col(), col);
                }
            }
        }
    }

    #[test]
    fn test_ghost_lands_on_stack() {
        let board = Board::from_ascii(
            r"
            ....T.....
            ...TTT....
            ",
        );
        let controller = PieceController::new(&board, &[]);
        let ghost = controller.ghost(Piece::new(PieceKind::O));
        // O cells in columns 4-5 rest on the T's top cell in row 18.
        assert_eq!(ghost.position().row(), 16);
    }
}
