use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Cell, Piece, PieceKind};

use super::{
    config::{ConfigError, GameConfig},
    next_queue::{NextQueue, PieceSeed},
    score::ScoreEngine,
    session::{EndReason, GameSession},
};

/// Serializable record of a session.
///
/// The board is stored row-major as 200 entries, `null` for empty cells.
/// Lock timers are not stored; a restored piece resumes falling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub saved_at: DateTime<Utc>,
    pub config: GameConfig,
    pub seed: PieceSeed,
    pub bags_drawn: u64,
    pub grid: Vec<Option<PieceKind>>,
    pub active: Option<Piece>,
    pub next_queue: Vec<PieceKind>,
    pub score: u64,
    pub level: u32,
    pub lines_cleared: u32,
    pub elapsed_ticks: u64,
    pub end_reason: Option<EndReason>,
}

/// Reasons a save cannot be restored.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("malformed save data: {_0}")]
    #[from]
    Json(serde_json::Error),
    #[display("invalid config: {_0}")]
    #[from]
    Config(ConfigError),
    #[display("grid has {actual} cells, expected {expected}")]
    GridSize { expected: usize, actual: usize },
    #[display("stored level {stored} does not match level {derived} derived from lines cleared")]
    LevelMismatch { stored: u32, derived: u32 },
    #[display("row {row} is full")]
    FullRow { row: usize },
    #[display("{bags_drawn} bags drawn exceeds the limit of {max}")]
    BagCount { bags_drawn: u64, max: u64 },
    #[display("active piece overlaps the board")]
    ActivePieceCollides,
    #[display("running session has no active piece")]
    MissingActivePiece,
    #[display("finished session still has an active piece")]
    ActiveAfterGameOver,
}

impl SaveData {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GameSession {
    /// Captures everything needed to resume this session.
    #[must_use]
    pub fn save(&self) -> SaveData {
        let next = self.next_queue();
        SaveData {
            saved_at: Utc::now(),
            config: self.config().clone(),
            seed: next.seed(),
            bags_drawn: next.bags_drawn(),
            grid: self.board().cells().map(Cell::kind).collect(),
            active: self.active(),
            next_queue: next.peek().collect(),
            score: self.score(),
            level: self.level(),
            lines_cleared: self.lines_cleared(),
            elapsed_ticks: self.elapsed_ticks(),
            end_reason: self.end_reason(),
        }
    }

    /// Rebuilds a session from a save, rejecting inconsistent state.
    pub fn restore(data: SaveData) -> Result<Self, LoadError> {
        data.config.validate()?;

        let expected = BOARD_WIDTH * BOARD_HEIGHT;
        if data.grid.len() != expected {
            return Err(LoadError::GridSize {
                expected,
                actual: data.grid.len(),
            });
        }
        let board = Board::from_cells(data.grid.iter().copied().map(Cell::from)).ok_or(
            LoadError::GridSize {
                expected,
                actual: data.grid.len(),
            },
        )?;
        if let Some(row) = (0..BOARD_HEIGHT).find(|&row| board.is_row_full(row)) {
            return Err(LoadError::FullRow { row });
        }

        let derived = ScoreEngine::level_for(data.config.initial_level, data.lines_cleared);
        if data.level != derived {
            return Err(LoadError::LevelMismatch {
                stored: data.level,
                derived,
            });
        }

        match (data.end_reason, data.active) {
            (None, None) => return Err(LoadError::MissingActivePiece),
            (Some(_), Some(_)) => return Err(LoadError::ActiveAfterGameOver),
            (None, Some(piece)) if !piece.fits(&board) => {
                return Err(LoadError::ActivePieceCollides);
            }
            _ => {}
        }

        if data.bags_drawn > NextQueue::MAX_BAGS_DRAWN {
            return Err(LoadError::BagCount {
                bags_drawn: data.bags_drawn,
                max: NextQueue::MAX_BAGS_DRAWN,
            });
        }
        let next = NextQueue::restore(data.seed, data.bags_drawn, data.next_queue);
        log::info!(
            "restored session saved at {} (score {}, lines {})",
            data.saved_at,
            data.score,
            data.lines_cleared
        );
        Ok(Self::from_parts(
            data.config,
            board,
            data.active,
            next,
            data.score,
            data.lines_cleared,
            data.elapsed_ticks,
            data.end_reason,
        ))
    }

    /// Parses and restores a JSON save.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Self::restore(SaveData::from_json(json)?)
    }

    /// Restores a JSON save, or starts a fresh session with `config` if the
    /// save is unusable.
    pub fn load_or_reset(json: &str, config: GameConfig) -> Result<Self, ConfigError> {
        match Self::from_json(json) {
            Ok(session) => Ok(session),
            Err(err) => {
                log::warn!("discarding unusable save: {err}");
                Self::new(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, PiecePosition, PieceRotation};

    fn played_session() -> GameSession {
        let mut session =
            GameSession::with_seed(GameConfig::default(), PieceSeed::from_bytes([0x33; 16]))
                .unwrap();
        for dcol in [-4_i8, 3, -1, 1, 4, -2] {
            let command = if dcol < 0 {
                Command::MoveLeft
            } else {
                Command::MoveRight
            };
            session.apply(Command::RotateCw);
            for _ in 0..dcol.unsigned_abs() {
                session.apply(command.clone());
            }
            session.apply(Command::HardDrop);
        }
        session.apply(Command::Tick);
        session
    }

    fn round_trip(session: &GameSession) -> GameSession {
        let json = session.save().to_json().unwrap();
        GameSession::from_json(&json).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_snapshot() {
        let session = played_session();
        assert!(!session.is_game_over());
        let restored = round_trip(&session);
        assert_eq!(restored.snapshot(), session.snapshot());
    }

    #[test]
    fn test_restored_session_continues_identically() {
        let mut session = played_session();
        let mut restored = round_trip(&session);
        for _ in 0..30 {
            session.apply(Command::HardDrop);
            restored.apply(Command::HardDrop);
            assert_eq!(restored.snapshot(), session.snapshot());
        }
    }

    #[test]
    fn test_game_over_round_trip() {
        let mut session = played_session();
        while !session.is_game_over() {
            session.apply(Command::HardDrop);
        }
        let restored = round_trip(&session);
        assert!(restored.is_game_over());
        assert_eq!(restored.end_reason(), session.end_reason());
        assert_eq!(restored.snapshot(), session.snapshot());
    }

    #[test]
    fn test_grid_is_row_major() {
        let mut session =
            GameSession::with_seed(GameConfig::default(), PieceSeed::from_bytes([1; 16])).unwrap();
        session.apply(Command::HardDrop);
        let data = session.save();
        assert_eq!(data.grid.len(), 200);
        assert_eq!(data.grid.iter().filter(|cell| cell.is_some()).count(), 4);
        assert!(data.grid[..180].iter().any(Option::is_none));
        assert!(data.grid[190..].iter().any(Option::is_some));
    }

    #[test]
    fn test_rejects_short_grid() {
        let mut data = played_session().save();
        data.grid.pop();
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::GridSize {
                expected: 200,
                actual: 199
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_kind_and_rotation() {
        let data = played_session().save();
        let json = data.to_json().unwrap();

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["next_queue"][0] = "X".into();
        let err = GameSession::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)), "{err}");

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["active"] = "T#7@3,0".into();
        let err = GameSession::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)), "{err}");
    }

    #[test]
    fn test_rejects_anchor_far_outside_board() {
        let json = played_session().save().to_json().unwrap();
        for anchor in ["T#0@127,0", "T#0@0,127", "I#1@-128,-128"] {
            let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
            value["active"] = anchor.into();
            let err = GameSession::from_json(&value.to_string()).unwrap_err();
            assert!(matches!(err, LoadError::Json(_)), "{anchor}: {err}");

            let session = GameSession::load_or_reset(&value.to_string(), GameConfig::default())
                .unwrap();
            assert_eq!(session.score(), 0);
        }
    }

    #[test]
    fn test_rejects_excessive_bag_count() {
        let mut data = played_session().save();
        data.bags_drawn = u64::MAX;
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::BagCount {
                bags_drawn: u64::MAX,
                ..
            })
        ));

        let mut data = played_session().save();
        data.bags_drawn = NextQueue::MAX_BAGS_DRAWN + 1;
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::BagCount { .. })
        ));
    }

    #[test]
    fn test_saturated_counters_keep_playing() {
        let mut data = played_session().save();
        data.score = u64::MAX;
        data.elapsed_ticks = u64::MAX;
        data.lines_cleared = u32::MAX;
        data.level = ScoreEngine::level_for(data.config.initial_level, u32::MAX);
        let mut session = GameSession::restore(data).unwrap();

        session.apply(Command::Tick);
        assert_eq!(session.elapsed_ticks(), u64::MAX);
        while !session.is_game_over() {
            session.apply(Command::HardDrop);
        }
        assert_eq!(session.score(), u64::MAX);
        assert_eq!(session.lines_cleared(), u32::MAX);
    }

    #[test]
    fn test_rejects_level_mismatch() {
        let mut data = played_session().save();
        data.level += 1;
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::LevelMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_full_row() {
        let mut data = played_session().save();
        for cell in &mut data.grid[190..] {
            *cell = Some(PieceKind::I);
        }
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::FullRow { row: 19 })
        ));
    }

    #[test]
    fn test_rejects_colliding_active_piece() {
        let mut data = played_session().save();
        for cell in &mut data.grid[..10] {
            *cell = Some(PieceKind::Z);
        }
        data.grid[0] = None;
        data.active = Some(Piece::with_placement(
            PieceKind::O,
            PieceRotation::SPAWN,
            PiecePosition::new(3, 0),
        ));
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::ActivePieceCollides)
        ));
    }

    #[test]
    fn test_rejects_inconsistent_end_state() {
        let mut data = played_session().save();
        data.active = None;
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::MissingActivePiece)
        ));

        let mut data = played_session().save();
        data.end_reason = Some(EndReason::TopOut);
        assert!(matches!(
            GameSession::restore(data),
            Err(LoadError::ActiveAfterGameOver)
        ));
    }

    #[test]
    fn test_load_or_reset_falls_back() {
        let session = GameSession::load_or_reset("{ not json", GameConfig::default()).unwrap();
        assert!(!session.is_game_over());
        assert_eq!(session.score(), 0);
        assert_eq!(session.board().occupied_count(), 0);

        let saved = played_session();
        let json = saved.save().to_json().unwrap();
        let loaded = GameSession::load_or_reset(&json, GameConfig::default()).unwrap();
        assert_eq!(loaded.snapshot(), saved.snapshot());
    }
}
