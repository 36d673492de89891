use std::time::Duration;

use super::config::GameConfig;

/// Base points for line clears.
///
/// Index corresponds to number of lines cleared simultaneously:
/// - 0 lines: 0 points
/// - 1 line: 100 points
/// - 2 lines: 300 points
/// - 3 lines: 500 points
/// - 4 lines: 800 points
const SCORE_TABLE: [u64; 5] = [0, 100, 300, 500, 800];

/// Lines needed to advance one level.
pub const LINES_PER_LEVEL: u32 = 10;

/// Points and level change produced by one locked piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta {
    pub lines: u32,
    pub points: u64,
    pub level_up: bool,
}

/// Score, level and line bookkeeping for a session.
///
/// - **Score**: `base(lines) × level × score_multiplier`, using the level
///   in effect before the clear
/// - **Level**: the configured initial level plus one per 10 lines cleared
/// - **Line clear distribution**: count of single, double, triple and
///   four-line clears
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, ScoreEngine};
///
/// let config = GameConfig::default();
/// let mut score = ScoreEngine::new(&config);
/// score.record_lock(4, &config); // four lines at level 1
///
/// assert_eq!(score.score(), 800);
/// assert_eq!(score.total_cleared_lines(), 4);
/// assert_eq!(score.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEngine {
    score: u64,
    initial_level: u32,
    completed_pieces: u64,
    total_cleared_lines: u32,
    line_cleared_counter: [u64; 5],
}

impl ScoreEngine {
    #[must_use]
    pub const fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            initial_level: config.initial_level,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    /// Rebuilds the tracker from persisted totals.
    ///
    /// Only the score and line count are stored; the level is derived.
    #[must_use]
    pub const fn restore(config: &GameConfig, score: u64, total_cleared_lines: u32) -> Self {
        Self {
            score,
            initial_level: config.initial_level,
            completed_pieces: 0,
            total_cleared_lines,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Level derived from the configured initial level and lines cleared.
    #[must_use]
    pub const fn level(&self) -> u32 {
        Self::level_for(self.initial_level, self.total_cleared_lines)
    }

    /// Level reached after `total_cleared_lines`, capped at `u32::MAX`.
    #[must_use]
    pub const fn level_for(initial_level: u32, total_cleared_lines: u32) -> u32 {
        initial_level.saturating_add(total_cleared_lines / LINES_PER_LEVEL)
    }

    /// Returns the total number of pieces that have been locked into place.
    #[must_use]
    pub const fn completed_pieces(&self) -> u64 {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> u32 {
        self.total_cleared_lines
    }

    /// Returns a histogram of locks by number of lines cleared.
    ///
    /// Index `0` counts locks that cleared nothing, `4` counts four-line clears.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[u64; 5] {
        &self.line_cleared_counter
    }

    /// Gravity interval for the current level.
    #[must_use]
    pub fn fall_interval(&self, config: &GameConfig) -> Duration {
        config.fall_interval(self.level())
    }

    /// Updates the totals after a piece locks and clears `cleared_lines` rows.
    ///
    /// All totals saturate instead of wrapping.
    pub fn record_lock(&mut self, cleared_lines: usize, config: &GameConfig) -> ScoreDelta {
        let level = self.level();
        let lines = u32::try_from(cleared_lines).unwrap_or(u32::MAX);
        let base = SCORE_TABLE.get(cleared_lines).copied().unwrap_or(SCORE_TABLE[4]);
        let points = base
            .saturating_mul(u64::from(level))
            .saturating_mul(u64::from(config.score_multiplier));

        let counter = &mut self.line_cleared_counter[cleared_lines.min(4)];
        *counter = counter.saturating_add(1);
        self.completed_pieces = self.completed_pieces.saturating_add(1);
        self.total_cleared_lines = self.total_cleared_lines.saturating_add(lines);
        self.score = self.score.saturating_add(points);

        ScoreDelta {
            lines,
            points,
            level_up: self.level() > level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_points_at_level_one() {
        let config = GameConfig::default();
        for (lines, expected) in [(1, 100), (2, 300), (3, 500), (4, 800)] {
            let mut score = ScoreEngine::new(&config);
            let delta = score.record_lock(lines, &config);
            assert_eq!(delta.points, expected);
            assert_eq!(score.score(), expected);
        }
    }

    #[test]
    fn test_no_clear_scores_nothing() {
        let config = GameConfig::default();
        let mut score = ScoreEngine::new(&config);
        let delta = score.record_lock(0, &config);
        assert_eq!(delta, ScoreDelta::default());
        assert_eq!(score.completed_pieces(), 1);
        assert_eq!(score.line_cleared_counter()[0], 1);
    }

    #[test]
    fn test_points_scale_with_level_and_multiplier() {
        let config = GameConfig {
            initial_level: 3,
            score_multiplier: 2,
            ..GameConfig::default()
        };
        let mut score = ScoreEngine::new(&config);
        assert_eq!(score.record_lock(2, &config).points, 300 * 3 * 2);
    }

    #[test]
    fn test_level_up_every_ten_lines() {
        let config = GameConfig::default();
        let mut score = ScoreEngine::new(&config);
        assert_eq!(score.level(), 1);

        for _ in 0..2 {
            assert!(!score.record_lock(4, &config).level_up);
        }
        assert_eq!(score.level(), 1);
        assert_eq!(score.total_cleared_lines(), 8);

        // The clear that crosses the threshold still scores at the old level.
        let delta = score.record_lock(2, &config);
        assert!(delta.level_up);
        assert_eq!(delta.points, 300);
        assert_eq!(score.level(), 2);

        assert_eq!(score.record_lock(1, &config).points, 200);
    }

    #[test]
    fn test_restore_derives_level() {
        let config = GameConfig::default();
        let score = ScoreEngine::restore(&config, 12_345, 37);
        assert_eq!(score.level(), 4);
        assert_eq!(score.score(), 12_345);
    }

    #[test]
    fn test_fall_interval_follows_level() {
        let config = GameConfig::default();
        let mut score = ScoreEngine::new(&config);
        let before = score.fall_interval(&config);
        for _ in 0..3 {
            score.record_lock(4, &config);
        }
        assert!(score.fall_interval(&config) < before);
    }

    #[test]
    fn test_extreme_config_saturates_score() {
        let config = GameConfig {
            initial_level: u32::MAX,
            score_multiplier: u32::MAX,
            ..GameConfig::default()
        };
        config.validate().unwrap();

        let mut score = ScoreEngine::new(&config);
        assert_eq!(score.level(), u32::MAX);
        assert_eq!(score.record_lock(4, &config).points, u64::MAX);
        let delta = score.record_lock(2, &config);
        assert_eq!(delta.points, u64::MAX);
        assert!(!delta.level_up);
        assert_eq!(score.score(), u64::MAX);
        assert_eq!(score.level(), u32::MAX);
        assert_eq!(score.total_cleared_lines(), 6);
    }

    #[test]
    fn test_level_saturates_with_restored_lines() {
        let config = GameConfig {
            initial_level: u32::MAX - 1,
            ..GameConfig::default()
        };
        let score = ScoreEngine::restore(&config, 0, 25);
        assert_eq!(score.level(), u32::MAX);
    }
}
