//! Inbound intents and outbound notifications.
//!
//! Commands are the only way input reaches the simulation; it never polls
//! devices. Events are the only way state changes leave it mid-tick: systems
//! write them, the game model queues them, and presentation/audio layers
//! drain the queue after each `update`.

use bevy_ecs::event::Event;

use crate::game::GameState;
use crate::map::Direction;
use crate::systems::components::{BonusSymbol, Personality};

/// A discrete input intent. Raw device handling lives outside the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameCommand {
    Steer(Direction),
    InsertCoin,
    StartGame,
    ToggleAutopilot,
    ToggleImmunity,
    Cheat(CheatCommand),
}

/// Debug/cheat intents, separate so they can be gated by the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheatCommand {
    EatAllPellets,
    AddLives,
    KillAllGhosts,
    AdvanceLevel,
}

impl From<CheatCommand> for GameCommand {
    fn from(cheat: CheatCommand) -> Self {
        GameCommand::Cheat(cheat)
    }
}

/// Outbound notification emitted by the simulation, one closed enum of nine
/// kinds. Delivered in emission order through [`crate::game::Game::drain_events`].
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    LevelCreated {
        number: u32,
        demo: bool,
    },
    BonusActivated {
        symbol: BonusSymbol,
        moving: bool,
    },
    BonusEaten {
        value: u32,
    },
    BonusExpired,
    GhostEaten {
        ghost: Personality,
        value: u32,
    },
    PacDying,
    SpecialScoreReached {
        threshold: u32,
    },
    HuntingPhaseStarted {
        phase_index: u8,
    },
    GameStateChanged {
        from: GameState,
        to: GameState,
    },
}
