//! A deterministic, tick-based maze-chase simulation core.
//!
//! The crate contains no rendering, audio or input handling. An embedder
//! constructs a [`Game`], drives it with [`Game::tick`] at sixty ticks per
//! second, feeds it [`GameCommand`] intents and drains [`GameEvent`]
//! notifications after each tick. Two games built with the same
//! [`GameConfig`] and fed the same commands replay identically.

pub mod constants;
pub mod error;
pub mod events;
pub mod game;
pub mod highscores;
pub mod level;
pub mod map;
pub mod systems;
pub mod timer;

pub use error::{GameError, GameResult};
pub use events::{CheatCommand, GameCommand, GameEvent};
pub use game::{Game, GameConfig, GameSnapshot, GameState, GameVariant};
