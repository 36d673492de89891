use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::Offset;

/// Difficulty and game-mode tunables supplied when a session is reset.
///
/// Every field has a default, so a partial JSON document is enough to
/// describe a game mode:
///
/// ```
/// use stackfall_engine::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "initial_level": 5 }"#).unwrap();
/// assert_eq!(config.initial_level, 5);
/// assert_eq!(config.preview_len, GameConfig::default().preview_len);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Level the session starts at.
    pub initial_level: u32,
    /// Gravity interval at level 0, in milliseconds.
    pub initial_fall_interval_ms: u32,
    /// Amount the gravity interval shrinks per level, in milliseconds.
    pub speed_increment_ms: u32,
    /// Lower bound on the gravity interval, in milliseconds.
    pub min_fall_interval_ms: u32,
    /// Multiplier applied on top of `base(lines) × level`.
    pub score_multiplier: u32,
    /// Gravity ticks a grounded piece may rest before it locks.
    pub lock_delay_ticks: u32,
    /// How many successful moves may restart the lock delay of one piece.
    pub lock_reset_cap: u32,
    /// Offsets tried in order when a rotation is blocked in place.
    pub kicks: Vec<Offset>,
    /// Number of upcoming pieces exposed in snapshots.
    pub preview_len: usize,
    /// Ends the session after this many ticks.
    pub time_limit_ticks: Option<u64>,
    /// Ends the session once this many lines have been cleared.
    pub line_target: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_level: 1,
            initial_fall_interval_ms: 1000,
            speed_increment_ms: 100,
            min_fall_interval_ms: 100,
            score_multiplier: 1,
            lock_delay_ticks: 1,
            lock_reset_cap: 15,
            kicks: vec![(1, 0), (-1, 0), (0, -1), (2, 0), (-2, 0)],
            preview_len: 5,
            time_limit_ticks: None,
            line_target: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("initial level must be at least 1")]
    ZeroInitialLevel,
    #[display("minimum fall interval must be positive")]
    ZeroMinInterval,
    #[display("preview length must be between 1 and {max}, got {len}")]
    PreviewLength { len: usize, max: usize },
    #[display("score multiplier must be positive")]
    ZeroScoreMultiplier,
    #[display("kick offset ({dcol}, {drow}) is outside -{max}..={max}")]
    KickOffset { dcol: i8, drow: i8, max: i8 },
}

impl GameConfig {
    /// Longest preview the next queue can guarantee.
    pub const MAX_PREVIEW_LEN: usize = crate::PieceKind::LEN;

    /// Largest distance a kick may move a piece along either axis.
    pub const MAX_KICK: i8 = 3;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_level == 0 {
            return Err(ConfigError::ZeroInitialLevel);
        }
        if self.min_fall_interval_ms == 0 {
            return Err(ConfigError::ZeroMinInterval);
        }
        if !(1..=Self::MAX_PREVIEW_LEN).contains(&self.preview_len) {
            return Err(ConfigError::PreviewLength {
                len: self.preview_len,
                max: Self::MAX_PREVIEW_LEN,
            });
        }
        if self.score_multiplier == 0 {
            return Err(ConfigError::ZeroScoreMultiplier);
        }
        let range = -Self::MAX_KICK..=Self::MAX_KICK;
        if let Some(&(dcol, drow)) = self
            .kicks
            .iter()
            .find(|(dcol, drow)| !range.contains(dcol) || !range.contains(drow))
        {
            return Err(ConfigError::KickOffset {
                dcol,
                drow,
                max: Self::MAX_KICK,
            });
        }
        Ok(())
    }

    /// Gravity interval for `level`.
    ///
    /// Non-increasing in `level` and never below `min_fall_interval_ms`.
    #[must_use]
    pub fn fall_interval(&self, level: u32) -> Duration {
        let millis = self
            .initial_fall_interval_ms
            .saturating_sub(level.saturating_mul(self.speed_increment_ms))
            .max(self.min_fall_interval_ms);
        Duration::from_millis(u64::from(millis))
    }
}
