use std::time::Duration;

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::core::{Board, ClearedRows, Piece, PieceKind};

use super::{
    config::{ConfigError, GameConfig},
    controller::PieceController,
    next_queue::{NextQueue, PieceSeed},
    score::{ScoreDelta, ScoreEngine},
    snapshot::Snapshot,
};

/// A discrete input delivered by the driving loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    /// One gravity step.
    Tick,
    /// Starts a new session with the given settings.
    Reset(GameConfig),
}

/// Outcome of [`GameSession::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum CommandResult {
    /// The command changed the session.
    Applied,
    /// The command was blocked (a move into a wall, a rotation with no room).
    NoOp,
    /// The session is over; only [`Command::Reset`] is accepted.
    SessionEnded,
}

/// Phase of the spawn → fall → lock → clear cycle.
///
/// `Spawning` and `Clearing` are passed through within a single command, so
/// callers normally observe `Falling`, `Locking` or `GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Phase {
    Spawning,
    Falling,
    Locking,
    Clearing,
    GameOver,
}

/// Why a session ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
pub enum EndReason {
    /// The spawn position of the next piece was blocked.
    #[display("top out")]
    TopOut,
    /// A piece locked with cells above the visible board.
    #[display("lock out")]
    LockOut,
    /// The configured tick limit was reached.
    #[display("time limit reached")]
    TimeLimit,
    /// The configured line target was reached.
    #[display("line target reached")]
    LineTarget,
}

/// Rows removed by the most recent lock and the points they earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClear {
    pub kind: PieceKind,
    pub rows: ClearedRows,
    pub delta: ScoreDelta,
}

#[derive(Debug, Clone, Copy, Default)]
struct LockDelay {
    ticks: u32,
    resets: u32,
}

/// A single-player game: board, falling piece, next queue and score.
///
/// The session is a tick-driven state machine. Commands and gravity ticks are
/// applied one at a time through [`apply`](Self::apply); nothing happens
/// between calls, so the driving loop owns all real-time concerns.
///
/// # Game Flow
///
/// 1. A piece spawns from the next queue at the top of the board
/// 2. Each [`Command::Tick`] moves it down one row
/// 3. When it cannot fall, the lock delay starts; moves and rotations may
///    restart it a limited number of times
/// 4. The piece locks, full rows are cleared and scored
/// 5. The next piece spawns, or the game ends if its spawn cell is blocked
///
/// # Example
///
/// ```
/// use stackfall_engine::{Command, GameConfig, GameSession, PieceSeed};
///
/// let mut session =
///     GameSession::with_seed(GameConfig::default(), PieceSeed::from_bytes([1; 16])).unwrap();
///
/// session.apply(Command::MoveLeft);
/// session.apply(Command::RotateCw);
/// session.apply(Command::HardDrop);
///
/// let snapshot = session.snapshot();
/// assert_eq!(snapshot.board.occupied_count(), 4);
/// assert!(!snapshot.is_game_over());
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    board: Board,
    active: Option<Piece>,
    next: NextQueue,
    score: ScoreEngine,
    phase: Phase,
    end_reason: Option<EndReason>,
    elapsed_ticks: u64,
    lock: LockDelay,
    last_clear: Option<LineClear>,
}

impl GameSession {
    /// Starts a session with a random piece seed.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Starts a session whose piece sequence is determined by `seed`.
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Result<Self, ConfigError> {
        Self::with_queue(config, NextQueue::with_seed(seed))
    }

    /// Starts a session drawing pieces from `next`.
    pub fn with_queue(config: GameConfig, next: NextQueue) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!("starting session (seed {:?})", next.seed());
        let mut session = Self::from_parts(
            config,
            Board::EMPTY,
            None,
            next,
            0,
            0,
            0,
            None,
        );
        session.spawn();
        Ok(session)
    }

    /// Assembles a session from restored state without spawning.
    #[expect(clippy::too_many_arguments)]
    pub(super) fn from_parts(
        config: GameConfig,
        board: Board,
        active: Option<Piece>,
        next: NextQueue,
        score: u64,
        lines_cleared: u32,
        elapsed_ticks: u64,
        end_reason: Option<EndReason>,
    ) -> Self {
        let phase = match (end_reason, active) {
            (Some(_), _) => Phase::GameOver,
            (None, Some(_)) => Phase::Falling,
            (None, None) => Phase::Spawning,
        };
        Self {
            score: ScoreEngine::restore(&config, score, lines_cleared),
            config,
            board,
            active,
            next,
            phase,
            end_reason,
            elapsed_ticks,
            lock: LockDelay::default(),
            last_clear: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    /// Landing position of the active piece.
    #[must_use]
    pub fn ghost(&self) -> Option<Piece> {
        self.active.map(|piece| self.controller().ghost(piece))
    }

    #[must_use]
    pub fn next_queue(&self) -> &NextQueue {
        &self.next
    }

    /// The configured number of upcoming pieces, nearest first.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.next.peek().take(self.config.preview_len)
    }

    #[must_use]
    pub fn stats(&self) -> &ScoreEngine {
        &self.score
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score.score()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.score.level()
    }

    #[must_use]
    pub fn lines_cleared(&self) -> u32 {
        self.score.total_cleared_lines()
    }

    /// Interval the driving loop should wait between gravity ticks.
    #[must_use]
    pub fn fall_interval(&self) -> Duration {
        self.score.fall_interval(&self.config)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase.is_game_over()
    }

    #[must_use]
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// The line clear produced by the most recent lock, if it cleared anything.
    #[must_use]
    pub fn last_clear(&self) -> Option<&LineClear> {
        self.last_clear.as_ref()
    }

    /// Copies the current state into an immutable [`Snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            active: self.active,
            ghost: self.ghost(),
            next: self.next_pieces().collect(),
            score: self.score(),
            level: self.level(),
            lines_cleared: self.lines_cleared(),
            elapsed_ticks: self.elapsed_ticks,
            phase: self.phase,
            end_reason: self.end_reason,
        }
    }

    /// Applies `command` and returns the resulting snapshot.
    pub fn step(&mut self, command: Command) -> (CommandResult, Snapshot) {
        let result = self.apply(command);
        (result, self.snapshot())
    }

    /// Applies one command or gravity tick.
    pub fn apply(&mut self, command: Command) -> CommandResult {
        match command {
            Command::Reset(config) => match self.reset(config) {
                Ok(()) => CommandResult::Applied,
                Err(err) => {
                    log::warn!("ignoring reset with invalid config: {err}");
                    CommandResult::NoOp
                }
            },
            _ if self.is_game_over() => CommandResult::SessionEnded,
            Command::Tick => self.tick(),
            Command::HardDrop => self.hard_drop(),
            Command::SoftDrop => self.try_move(|c, piece| c.soft_drop(piece)),
            Command::MoveLeft => self.try_move(|c, piece| c.move_left(piece)),
            Command::MoveRight => self.try_move(|c, piece| c.move_right(piece)),
            Command::RotateCw => self.try_move(|c, piece| c.rotate_cw(piece)),
            Command::RotateCcw => self.try_move(|c, piece| c.rotate_ccw(piece)),
        }
    }

    /// Discards the current game and starts a new one with a fresh seed.
    pub fn reset(&mut self, config: GameConfig) -> Result<(), ConfigError> {
        self.reset_with_seed(config, rand::rng().random())
    }

    pub fn reset_with_seed(&mut self, config: GameConfig, seed: PieceSeed) -> Result<(), ConfigError> {
        *self = Self::with_seed(config, seed)?;
        Ok(())
    }

    fn controller(&self) -> PieceController<'_> {
        PieceController::new(&self.board, &self.config.kicks)
    }

    fn try_move(
        &mut self,
        command: impl FnOnce(&PieceController<'_>, Piece) -> Option<Piece>,
    ) -> CommandResult {
        let Some(piece) = self.active else {
            return CommandResult::NoOp;
        };
        let Some(moved) = command(&self.controller(), piece) else {
            return CommandResult::NoOp;
        };
        self.active = Some(moved);
        if self.phase.is_locking() && self.lock.resets < self.config.lock_reset_cap {
            self.lock.ticks = 0;
            self.lock.resets += 1;
        }
        CommandResult::Applied
    }

    fn tick(&mut self) -> CommandResult {
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);

        if let Some(piece) = self.active {
            match self.controller().soft_drop(piece) {
                Some(dropped) => {
                    log::trace!("gravity moved {:?} to row {}", piece.kind(), dropped.position().row());
                    self.active = Some(dropped);
                    self.phase = Phase::Falling;
                }
                None if self.phase.is_falling() => {
                    self.phase = Phase::Locking;
                    self.lock.ticks = 0;
                    if self.config.lock_delay_ticks == 0 {
                        self.lock_active();
                    }
                }
                None => {
                    self.lock.ticks += 1;
                    if self.lock.ticks >= self.config.lock_delay_ticks {
                        self.lock_active();
                    }
                }
            }
        }

        let limit_reached = self
            .config
            .time_limit_ticks
            .is_some_and(|limit| self.elapsed_ticks >= limit);
        if limit_reached && !self.is_game_over() {
            self.end(EndReason::TimeLimit);
        }
        CommandResult::Applied
    }

    fn hard_drop(&mut self) -> CommandResult {
        let Some(piece) = self.active else {
            return CommandResult::NoOp;
        };
        self.active = Some(self.controller().hard_drop(piece));
        self.lock_active();
        CommandResult::Applied
    }

    /// Commits the active piece, clears rows and spawns the next piece.
    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        if !piece.is_inside() {
            log::debug!("{:?} locked above the board", piece.kind());
            self.end(EndReason::LockOut);
            return;
        }

        self.board.commit(piece.cells(), piece.kind());
        log::debug!(
            "locked {:?} at ({}, {}) rotation {}",
            piece.kind(),
            piece.position().col(),
            piece.position().row(),
            piece.rotation().index()
        );

        self.phase = Phase::Clearing;
        let rows = self.board.clear_full_rows();
        let delta = self.score.record_lock(rows.count(), &self.config);
        if rows.is_empty() {
            self.last_clear = None;
        } else {
            log::debug!(
                "cleared rows {:?} for {} points (level {})",
                rows.rows(),
                delta.points,
                self.level()
            );
            self.last_clear = Some(LineClear {
                kind: piece.kind(),
                rows,
                delta,
            });
        }

        let lines = self.lines_cleared();
        if self.config.line_target.is_some_and(|target| lines >= target) {
            self.end(EndReason::LineTarget);
            return;
        }

        self.phase = Phase::Spawning;
        self.spawn();
    }

    fn spawn(&mut self) {
        let piece = Piece::new(self.next.pop_next());
        self.lock = LockDelay::default();
        if !piece.fits(&self.board) {
            self.end(EndReason::TopOut);
            return;
        }
        log::debug!("spawned {:?}", piece.kind());
        self.active = Some(piece);
        self.phase = Phase::Falling;
    }

    fn end(&mut self, reason: EndReason) {
        log::info!(
            "game over ({reason}): score {}, level {}, lines {}",
            self.score(),
            self.level(),
            self.lines_cleared()
        );
        self.active = None;
        self.phase = Phase::GameOver;
        self.end_reason = Some(reason);
    }
}
