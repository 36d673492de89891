use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{BOARD_HEIGHT, BOARD_WIDTH};

/// Relative cell offset `(dx, dy)` inside a piece's 4×4 bounding box.
///
/// `dx` grows rightward and `dy` grows downward, matching board coordinates.
pub type Offset = (i8, i8);

/// A falling piece (tetromino) with position, rotation, and type.
///
/// Pieces are plain values: movement and rotation return new `Piece` instances
/// and never look at the board. Whether the result is a legal placement is
/// decided by [`is_valid`](crate::is_valid).
///
/// # Example
///
/// ```
/// use stackfall_engine::{Piece, PieceKind};
///
/// let piece = Piece::new(PieceKind::T);
/// let moved = piece.shifted(1, 0);
/// let rotated = moved.rotated_cw();
/// assert_eq!(rotated.rotation().index(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    position: PiecePosition,
    rotation: PieceRotation,
    kind: PieceKind,
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "kind#rotation@col,row" (e.g., "S#1@4,18")
        let s = format!(
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.0,
            self.position.col,
            self.position.row
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Piece {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind_str, rest) = s
            .split_once('#')
            .ok_or_else(|| format!("missing '#' in format 'kind#rotation@col,row', got '{s}'"))?;

        let mut kind_chars = kind_str.chars();
        let (Some(kind_char), None) = (kind_chars.next(), kind_chars.next()) else {
            return Err(format!(
                "piece kind must be single character, got '{kind_str}'"
            ));
        };
        let kind =
            PieceKind::from_char(kind_char).ok_or_else(|| format!("invalid piece kind: {kind_char}"))?;

        let (rotation_str, position_str) = rest
            .split_once('@')
            .ok_or_else(|| format!("missing '@' in format 'kind#rotation@col,row', got '{s}'"))?;
        let rotation_num = rotation_str
            .parse::<u8>()
            .map_err(|e| format!("invalid rotation: {rotation_str} ({e})"))?;
        let rotation = PieceRotation::new(rotation_num)
            .ok_or_else(|| format!("rotation must be 0-3, got {rotation_num}"))?;

        let (col_str, row_str) = position_str
            .split_once(',')
            .ok_or_else(|| format!("missing ',' in format 'kind#rotation@col,row', got '{s}'"))?;
        let col = col_str
            .parse::<i8>()
            .map_err(|e| format!("invalid column: {col_str} ({e})"))?;
        let row = row_str
            .parse::<i8>()
            .map_err(|e| format!("invalid row: {row_str} ({e})"))?;
        let position = PiecePosition::new(col, row);
        if !position.is_near_board() {
            return Err(format!("anchor ({col}, {row}) is too far from the board"));
        }

        Ok(Piece {
            position,
            rotation,
            kind,
        })
    }
}

impl Piece {
    /// Creates a piece of the given kind at the spawn anchor with rotation 0.
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self::with_placement(kind, PieceRotation::SPAWN, PiecePosition::SPAWN_POSITION)
    }

    #[must_use]
    pub const fn with_placement(
        kind: PieceKind,
        rotation: PieceRotation,
        position: PiecePosition,
    ) -> Self {
        Self {
            position,
            rotation,
            kind,
        }
    }

    #[must_use]
    pub const fn position(&self) -> PiecePosition {
        self.position
    }

    #[must_use]
    pub const fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Absolute board coordinates `(col, row)` of the four occupied cells.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + use<> {
        let PiecePosition { col, row } = self.position;
        self.kind
            .offsets(self.rotation)
            .into_iter()
            .map(move |(dx, dy)| (col + dx, row + dy))
    }

    #[must_use]
    pub const fn shifted(&self, dcol: i8, drow: i8) -> Self {
        Self {
            position: PiecePosition::new(self.position.col + dcol, self.position.row + drow),
            rotation: self.rotation,
            kind: self.kind,
        }
    }

    #[must_use]
    pub const fn rotated_cw(&self) -> Self {
        Self {
            position: self.position,
            rotation: self.rotation.rotated_cw(),
            kind: self.kind,
        }
    }

    #[must_use]
    pub const fn rotated_ccw(&self) -> Self {
        Self {
            position: self.position,
            rotation: self.rotation.rotated_ccw(),
            kind: self.kind,
        }
    }
}

/// Anchor of a piece on the board: the top-left corner of its 4×4 box.
///
/// # Coordinate System
///
/// - `(0, 0)` is the top-left cell of the board
/// - `col` increases rightward, `row` increases downward
/// - Either coordinate may be negative, since the occupied cells of a box
///   need not touch its top-left corner (an O piece against the left wall sits
///   at `col == -1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PiecePosition {
    col: i8,
    row: i8,
}

impl PiecePosition {
    /// Top-centre anchor every piece spawns at.
    pub const SPAWN_POSITION: Self = Self::new(3, 0);

    #[must_use]
    pub const fn new(col: i8, row: i8) -> Self {
        Self { col, row }
    }

    #[must_use]
    pub const fn col(self) -> i8 {
        self.col
    }

    #[must_use]
    pub const fn row(self) -> i8 {
        self.row
    }

    /// Whether the 4×4 box can touch the board or the rows just above it.
    ///
    /// Every anchor reachable in play satisfies this; offsets added to such an
    /// anchor stay well inside `i8`.
    #[must_use]
    pub const fn is_near_board(self) -> bool {
        let (max_col, max_row) = MAX_ANCHOR;
        self.col >= -ANCHOR_MARGIN
            && self.col <= max_col
            && self.row >= -ANCHOR_MARGIN
            && self.row <= max_row
    }
}

const ANCHOR_MARGIN: i8 = 4;

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const MAX_ANCHOR: (i8, i8) = (BOARD_WIDTH as i8, BOARD_HEIGHT as i8);

/// Rotation state of a piece.
///
/// Represents one of four rotation states:
///
/// - `0`: 0° (spawn orientation)
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise (90° counterclockwise)
///
/// Rotation operations wrap around modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceRotation(u8);

impl PieceRotation {
    pub const SPAWN: Self = Self(0);

    /// Returns `None` for indices outside `0..4`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < 4 { Some(Self(index)) } else { None }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn rotated_cw(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn rotated_ccw(self) -> Self {
        PieceRotation((self.0 + 3) % 4)
    }

    const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// Every kind, in table order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    /// Returns the four occupied offsets of this kind in the given rotation.
    #[must_use]
    pub const fn offsets(self, rotation: PieceRotation) -> [Offset; 4] {
        PIECE_OFFSETS[self as usize][rotation.as_usize()]
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// Occupied offsets per kind and rotation state.
///
/// Written out state by state rather than generated by rotating a matrix: the
/// O piece keeps the same cells in all four states, and the I piece turns
/// around the centre of its 4×4 box rather than around one of its cells.
const PIECE_OFFSETS: [[[Offset; 4]; 4]; PieceKind::LEN] = [
    // I-piece
    [
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ],
    // O-piece
    [
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
    ],
    // S-piece
    [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(1, 1), (2, 1), (0, 2), (1, 2)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // Z-piece
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(2, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ],
    // J-piece
    [
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ],
    // L-piece
    [
        [(2, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
    ],
    // T-piece
    [
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (1, 2)],
        [(1, 0), (0, 1), (1, 1), (1, 2)],
    ],
];
