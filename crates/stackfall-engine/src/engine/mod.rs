//! Game rules and session state.
//!
//! This module drives the core data structures through the game loop:
//!
//! - [`GameSession`] - Tick-driven state machine applying [`Command`]s
//! - [`PieceController`] - Movement, rotation with kicks, ghost and hard drop
//! - [`NextQueue`] - 7-bag piece generation from a [`PieceSeed`]
//! - [`ScoreEngine`] - Score, level and line counting
//! - [`GameConfig`] - Difficulty and game-mode settings
//! - [`Snapshot`] - Immutable view for renderers
//! - [`SaveData`] - Serializable session record
//!
//! # Game Flow
//!
//! 1. [`GameSession::new`] spawns the first piece from the next queue
//! 2. The driver forwards player input and a [`Command::Tick`] every
//!    [`GameSession::fall_interval`]
//! 3. Grounded pieces lock after the lock delay, or at once on hard drop
//! 4. Full rows are cleared and scored, then the next piece spawns
//! 5. The session ends on top out, lock out, or a configured goal
//!
//! # Example
//!
//! ```
//! use stackfall_engine::{Command, GameConfig, GameSession};
//!
//! let mut session = GameSession::new(GameConfig::default()).unwrap();
//! while !session.is_game_over() {
//!     session.apply(Command::HardDrop);
//! }
//!
//! let save = session.save();
//! let restored = GameSession::restore(save).unwrap();
//! assert_eq!(restored.snapshot(), session.snapshot());
//! ```

pub use self::{
    config::*, controller::*, next_queue::*, save::*, score::*, session::*, snapshot::*,
};

mod config;
mod controller;
mod next_queue;
mod save;
mod score;
mod session;
mod snapshot;
