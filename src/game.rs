//! The game model.
//!
//! [`Game`] owns the ECS world and its schedule. Embedders call [`Game::tick`]
//! sixty times a second, push intents through [`Game::handle`] and drain
//! notifications with [`Game::drain_events`]; everything else is internal.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use strum_macros::AsRefStr;
use tracing::{debug, info, warn};

use crate::constants::{stage as stage_ticks, RAW_BOARD};
use crate::error::{GameError, GameResult};
use crate::events::{CheatCommand, GameCommand, GameEvent};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::level::{HuntingDurations, MapSelection};
use crate::map::{Direction, Map};
use crate::systems::bonus::{update_bonus, BonusPhase, BonusSlot};
use crate::systems::components::{
    BonusSymbol, EventQueue, GhostBundle, GhostMeta, GhostState, LevelState, Pac, Personality,
    PlayerBundle, PlayerControlled, Position, SimRng, Velocity,
};
use crate::systems::ghost::{update_ghosts, Gatekeeper};
use crate::systems::hunting::{update_hunting_phase, HuntingTimer};
use crate::systems::player::update_player;
use crate::systems::score::{update_score, Scoreboard};
use crate::timer::{TickTimer, TimerDuration};

/// Which rule set the bonus follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GameVariant {
    /// The bonus parks below the ghost house for a bounded time.
    Classic,
    /// The bonus wanders in through a tunnel and leaves through one.
    Deluxe,
}

/// Construction-time settings. Everything that varies between embedders and
/// test setups goes through here; the simulation reads it as a resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub variant: GameVariant,
    /// Seed for the simulation RNG; equal seeds give equal runs.
    pub seed: u64,
    pub hunting_durations: HuntingDurations,
    /// Faithful oddity of the original: Shadow and Speedy roam randomly
    /// during the first scatter phase of every level.
    pub first_scatter_roam_bug: bool,
    /// Directory the high-score file lives in; `None` disables persistence.
    pub data_dir: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            variant: GameVariant::Classic,
            seed: 0xC0FFEE,
            hunting_durations: HuntingDurations::default(),
            first_scatter_roam_bug: true,
            data_dir: None,
        }
    }
}

/// The coarse stage the whole game is in. Actor systems only run during
/// `Hunting`; every other state is a timed pause or a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GameState {
    Boot,
    Intro,
    Ready,
    Hunting,
    PacDying,
    LevelComplete,
    LevelTransition,
    GameOver,
}

/// Stage sequencing state: the current [`GameState`], its countdown and the
/// coin counter.
#[derive(Resource, Debug)]
pub struct Stage {
    state: GameState,
    timer: TickTimer,
    credits: u8,
}

impl Stage {
    fn new() -> Self {
        Self {
            state: GameState::Boot,
            timer: TickTimer::new(TimerDuration::Ticks(0)),
            credits: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn credits(&self) -> u8 {
        self.credits
    }

    /// A stage already in [`GameState::Hunting`], for driving single systems
    /// in tests.
    #[cfg(test)]
    pub(crate) fn hunting() -> Self {
        Self {
            state: GameState::Hunting,
            timer: TickTimer::indefinite(),
            credits: 0,
        }
    }

    fn transition(&mut self, to: GameState, duration: TimerDuration, events: &mut EventQueue) {
        if to == self.state {
            return;
        }
        debug!(from = self.state.as_ref(), to = to.as_ref(), "stage transition");
        events.emit(GameEvent::GameStateChanged {
            from: self.state,
            to,
        });
        self.state = to;
        self.timer.reset(duration);
    }
}

/// Sequences the stages. Runs ahead of every other system so state changes
/// take effect on the tick they are decided.
pub(crate) fn update_stage(world: &mut World) {
    world.resource_scope(|world, mut stage: Mut<Stage>| {
        stage.timer.tick();
        match stage.state {
            GameState::Boot => {
                let mut events = world.resource_mut::<EventQueue>();
                stage.transition(
                    GameState::Intro,
                    TimerDuration::Ticks(stage_ticks::ATTRACT_IDLE_TICKS),
                    &mut events,
                );
            }
            GameState::Intro => {
                if stage.timer.has_expired() {
                    start_game(world, &mut stage, true);
                }
            }
            GameState::Ready => {
                if stage.timer.has_expired() {
                    let mut events = world.resource_mut::<EventQueue>();
                    stage.transition(GameState::Hunting, TimerDuration::Indefinite, &mut events);
                }
            }
            GameState::Hunting => {
                let complete = world.resource::<LevelState>().is_complete();
                let pac_alive = world
                    .query_filtered::<&Pac, With<PlayerControlled>>()
                    .single(world)
                    .is_ok_and(|pac| pac.alive);
                let mut events = world.resource_mut::<EventQueue>();
                if !pac_alive {
                    stage.transition(
                        GameState::PacDying,
                        TimerDuration::Ticks(
                            stage_ticks::DYING_FREEZE_TICKS + stage_ticks::DYING_TICKS,
                        ),
                        &mut events,
                    );
                } else if complete {
                    stage.transition(
                        GameState::LevelComplete,
                        TimerDuration::Ticks(stage_ticks::LEVEL_COMPLETE_TICKS),
                        &mut events,
                    );
                }
            }
            GameState::PacDying => {
                if stage.timer.has_expired() {
                    let mut scoreboard = world.resource_mut::<Scoreboard>();
                    scoreboard.lose_life();
                    let lives = scoreboard.lives();
                    if lives > 0 {
                        revive_level(world);
                        let mut events = world.resource_mut::<EventQueue>();
                        stage.transition(
                            GameState::Ready,
                            TimerDuration::Ticks(stage_ticks::READY_TICKS),
                            &mut events,
                        );
                    } else {
                        finish_game(world);
                        let mut events = world.resource_mut::<EventQueue>();
                        stage.transition(
                            GameState::GameOver,
                            TimerDuration::Ticks(stage_ticks::GAME_OVER_TICKS),
                            &mut events,
                        );
                    }
                }
            }
            GameState::LevelComplete => {
                if stage.timer.has_expired() {
                    let mut events = world.resource_mut::<EventQueue>();
                    stage.transition(
                        GameState::LevelTransition,
                        TimerDuration::Ticks(stage_ticks::LEVEL_TRANSITION_TICKS),
                        &mut events,
                    );
                }
            }
            GameState::LevelTransition => {
                if stage.timer.has_expired() {
                    let (number, demo) = {
                        let level = world.resource::<LevelState>();
                        (level.number, level.demo)
                    };
                    create_level(world, number + 1, demo);
                    let mut events = world.resource_mut::<EventQueue>();
                    stage.transition(
                        GameState::Ready,
                        TimerDuration::Ticks(stage_ticks::READY_TICKS),
                        &mut events,
                    );
                }
            }
            GameState::GameOver => {
                if stage.timer.has_expired() {
                    let mut events = world.resource_mut::<EventQueue>();
                    stage.transition(
                        GameState::Intro,
                        TimerDuration::Ticks(stage_ticks::ATTRACT_IDLE_TICKS),
                        &mut events,
                    );
                }
            }
        }
    });
}

fn start_game(world: &mut World, stage: &mut Stage, demo: bool) {
    info!(demo, "starting game");
    world.insert_resource(Scoreboard::default());
    create_level(world, 1, demo);
    let mut events = world.resource_mut::<EventQueue>();
    stage.transition(
        GameState::Ready,
        TimerDuration::Ticks(stage_ticks::READY_TICKS),
        &mut events,
    );
}

/// Installs the per-level resources and places the actors for level `number`.
fn create_level(world: &mut World, number: u32, demo: bool) {
    let level = {
        let map = world.resource::<Map>();
        LevelState::new(number, demo, map)
    };
    let durations = world.resource::<GameConfig>().hunting_durations.clone();
    world.insert_resource(level);
    world.insert_resource(HuntingTimer::for_level(number, &durations));
    world.insert_resource(Gatekeeper::for_level(number));
    world.resource_mut::<BonusSlot>().0 = None;
    reset_actors(world, Some(demo));
    info!(number, demo, "level created");
    world
        .resource_mut::<EventQueue>()
        .emit(GameEvent::LevelCreated { number, demo });
}

/// Puts Pac and the ghosts back on their starting marks. `autopilot` of
/// `None` keeps the current setting (revivals), `Some` forces it (new games).
fn reset_actors(world: &mut World, autopilot: Option<bool>) {
    let (pac_start, house_front, house_slots) = {
        let map = world.resource::<Map>();
        (map.pac_start, map.house.front, map.house.slots)
    };

    let mut players = world.query_filtered::<(&mut Pac, &mut Position, &mut Velocity), With<PlayerControlled>>();
    if let Ok((mut pac, mut position, mut velocity)) = players.single_mut(world) {
        let autopilot = autopilot.unwrap_or(pac.autopilot);
        *pac = Pac::new(autopilot);
        *position = Position::at_tile(pac_start);
        *velocity = Velocity {
            direction: Direction::Left,
            wish: Direction::Left,
            speed: 0.0,
        };
    }

    let mut ghosts = world.query::<(
        &Personality,
        &mut GhostState,
        &mut GhostMeta,
        &mut Position,
        &mut Velocity,
    )>();
    for (personality, mut state, mut meta, mut position, mut velocity) in ghosts.iter_mut(world) {
        let slot = house_slots[personality.slot_index()];
        *meta = GhostMeta::new(slot);
        if *personality == Personality::Shadow {
            *state = GhostState::HuntingPac;
            *position = Position::at_tile(house_front);
            *velocity = Velocity {
                direction: Direction::Left,
                wish: Direction::Left,
                speed: 0.0,
            };
        } else {
            *state = GhostState::Locked;
            *position = Position::at_tile(slot);
            *velocity = Velocity {
                direction: Direction::Up,
                wish: Direction::Up,
                speed: 0.0,
            };
        }
    }
}

/// After a death with lives left: same level, same food, fresh schedule.
fn revive_level(world: &mut World) {
    let number = {
        let mut level = world.resource_mut::<LevelState>();
        level.suspend_elroy();
        level.number
    };
    let durations = world.resource::<GameConfig>().hunting_durations.clone();
    world.insert_resource(HuntingTimer::for_level(number, &durations));
    world.insert_resource(Gatekeeper::for_level(number));
    world.resource_mut::<BonusSlot>().0 = None;
    reset_actors(world, None);
    debug!(number, "level revived after death");
}

/// Records the finished run in the high-score table. Demo runs are discarded.
fn finish_game(world: &mut World) {
    let level = world.resource::<LevelState>();
    if level.demo {
        return;
    }
    let entry = HighScoreEntry {
        score: world.resource::<Scoreboard>().score(),
        level: level.number,
    };
    let mut scores = world.resource_mut::<HighScores>();
    if !scores.submit(entry) {
        return;
    }
    info!(score = entry.score, level = entry.level, "new high score");
    let config = world.resource::<GameConfig>();
    if let Some(dir) = &config.data_dir {
        let path = HighScores::file_path(dir, config.variant);
        if let Err(err) = world.resource::<HighScores>().save(&path) {
            warn!(%err, "could not persist high scores");
        }
    }
}

/// A read-only view of an actor for presentation layers.
#[derive(Debug, Clone, Copy)]
pub struct ActorSnapshot {
    pub position: Vec2,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy)]
pub struct GhostSnapshot {
    pub personality: Personality,
    pub state: GhostState,
    pub actor: ActorSnapshot,
}

#[derive(Debug, Clone, Copy)]
pub struct BonusSnapshot {
    pub symbol: BonusSymbol,
    pub position: Vec2,
}

/// Everything a frame of presentation needs, copied out of the world.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub state: GameState,
    pub score: u32,
    pub high_score: u32,
    pub lives: u8,
    pub credits: u8,
    pub level: u32,
    pub demo: bool,
    /// Board/palette rotation for the current level.
    pub map_selection: MapSelection,
    pub food_remaining: u32,
    pub hunting_phase: u8,
    pub pac: ActorSnapshot,
    pub pac_alive: bool,
    pub pac_power_remaining: Option<u64>,
    pub ghosts: Vec<GhostSnapshot>,
    pub bonus: Option<BonusSnapshot>,
}

/// The simulation core. One instance is one arcade cabinet.
pub struct Game {
    world: World,
    schedule: Schedule,
    ticks: u64,
}

impl Game {
    /// Builds the world: parses the board, loads the high scores and spawns
    /// the five actors. The game boots into the intro screen.
    ///
    /// # Errors
    ///
    /// Fails when the embedded board does not parse or the high-score file
    /// exists but cannot be read.
    pub fn new(config: GameConfig) -> GameResult<Self> {
        let map = Map::parse(&RAW_BOARD)?;
        let high_scores = match &config.data_dir {
            Some(dir) => HighScores::load(&HighScores::file_path(dir, config.variant))?,
            None => HighScores::default(),
        };

        let mut world = World::new();
        world.insert_resource(Stage::new());
        world.insert_resource(EventQueue::default());
        world.insert_resource(Scoreboard::default());
        world.insert_resource(BonusSlot::default());
        world.insert_resource(SimRng(SmallRng::seed_from_u64(config.seed)));
        world.insert_resource(high_scores);
        world.insert_resource(map);
        world.insert_resource(config);

        world.spawn(PlayerBundle {
            player: PlayerControlled,
            pac: Pac::new(true),
            position: Position(Vec2::ZERO),
            velocity: Velocity {
                direction: Direction::Left,
                wish: Direction::Left,
                speed: 0.0,
            },
        });
        for personality in Personality::ALL {
            world.spawn(GhostBundle {
                personality,
                position: Position(Vec2::ZERO),
                velocity: Velocity {
                    direction: Direction::Up,
                    wish: Direction::Up,
                    speed: 0.0,
                },
                state: GhostState::Locked,
                meta: GhostMeta::new(glam::IVec2::ZERO),
            });
        }
        create_level(&mut world, 1, true);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                update_stage,
                update_hunting_phase,
                update_ghosts,
                update_player,
                update_bonus,
                update_score,
            )
                .chain(),
        );

        Ok(Self {
            world,
            schedule,
            ticks: 0,
        })
    }

    /// Advances the simulation by exactly one tick (1/60th of a second).
    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
        self.ticks += 1;
    }

    /// Ticks run since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> GameState {
        self.world.resource::<Stage>().state()
    }

    /// Applies one input intent at the current tick boundary.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] when the intent makes no sense
    /// right now, e.g. starting a game without a credit.
    pub fn handle(&mut self, command: GameCommand) -> GameResult<()> {
        match command {
            GameCommand::Steer(direction) => {
                let mut players = self
                    .world
                    .query_filtered::<&mut Velocity, With<PlayerControlled>>();
                if let Ok(mut velocity) = players.single_mut(&mut self.world) {
                    velocity.wish = direction;
                }
                Ok(())
            }
            GameCommand::InsertCoin => {
                let demo = self.world.resource::<LevelState>().demo;
                let mut stage = self.world.resource_mut::<Stage>();
                stage.credits = stage.credits.saturating_add(1);
                let credits = stage.credits;
                debug!(credits, "coin inserted");
                // A coin during the attract demo brings the intro back.
                if demo && stage.state != GameState::Intro {
                    self.world.resource_scope(|world, mut stage: Mut<Stage>| {
                        let mut events = world.resource_mut::<EventQueue>();
                        stage.transition(
                            GameState::Intro,
                            TimerDuration::Indefinite,
                            &mut events,
                        );
                    });
                }
                Ok(())
            }
            GameCommand::StartGame => {
                let stage = self.world.resource::<Stage>();
                let startable = matches!(
                    stage.state,
                    GameState::Intro | GameState::GameOver
                ) || self.world.resource::<LevelState>().demo;
                if !startable {
                    return Err(GameError::InvalidState(
                        "a game is already running".into(),
                    ));
                }
                if self.world.resource::<Stage>().credits == 0 {
                    return Err(GameError::InvalidState("no credits".into()));
                }
                self.world.resource_mut::<Stage>().credits -= 1;
                self.world.resource_scope(|world, mut stage: Mut<Stage>| {
                    start_game(world, &mut stage, false);
                });
                Ok(())
            }
            GameCommand::ToggleAutopilot => {
                let mut players = self.world.query_filtered::<&mut Pac, With<PlayerControlled>>();
                if let Ok(mut pac) = players.single_mut(&mut self.world) {
                    pac.autopilot = !pac.autopilot;
                    debug!(autopilot = pac.autopilot, "autopilot toggled");
                }
                Ok(())
            }
            GameCommand::ToggleImmunity => {
                let mut players = self.world.query_filtered::<&mut Pac, With<PlayerControlled>>();
                if let Ok(mut pac) = players.single_mut(&mut self.world) {
                    pac.immune = !pac.immune;
                    debug!(immune = pac.immune, "immunity toggled");
                }
                Ok(())
            }
            GameCommand::Cheat(cheat) => self.handle_cheat(cheat),
        }
    }

    fn handle_cheat(&mut self, cheat: CheatCommand) -> GameResult<()> {
        debug!(?cheat, "cheat applied");
        match cheat {
            CheatCommand::EatAllPellets => {
                self.world.resource_mut::<LevelState>().eat_all_pellets();
            }
            CheatCommand::AddLives => {
                self.world.resource_mut::<Scoreboard>().add_life();
            }
            CheatCommand::KillAllGhosts => {
                let mut ghosts = self.world.query::<(&mut GhostState, &mut GhostMeta)>();
                for (mut state, mut meta) in ghosts.iter_mut(&mut self.world) {
                    if matches!(*state, GhostState::HuntingPac | GhostState::Frightened) {
                        *state = GhostState::Eaten;
                        meta.relock.reset(TimerDuration::Ticks(0));
                    }
                }
            }
            CheatCommand::AdvanceLevel => {
                if self.state() != GameState::Hunting {
                    return Err(GameError::InvalidState("not hunting".into()));
                }
                self.world.resource_scope(|world, mut stage: Mut<Stage>| {
                    let mut events = world.resource_mut::<EventQueue>();
                    stage.transition(
                        GameState::LevelComplete,
                        TimerDuration::Ticks(stage_ticks::LEVEL_COMPLETE_TICKS),
                        &mut events,
                    );
                });
            }
        }
        Ok(())
    }

    /// Removes and returns every notification queued since the last call,
    /// in emission order.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world
            .resource_mut::<EventQueue>()
            .0
            .drain(..)
            .collect()
    }

    /// Copies the presentation-relevant state out of the world.
    pub fn snapshot(&mut self) -> GameSnapshot {
        let (pac_actor, pac_alive, pac_power_remaining) = {
            let mut players = self
                .world
                .query_filtered::<(&Pac, &Position, &Velocity), With<PlayerControlled>>();
            let (pac, position, velocity) = players
                .single(&self.world)
                .expect("the player entity always exists");
            (
                ActorSnapshot {
                    position: position.0,
                    direction: velocity.direction,
                },
                pac.alive,
                pac.has_power()
                    .then(|| pac.power.remaining_ticks())
                    .flatten(),
            )
        };

        let mut ghosts = Vec::with_capacity(Personality::ALL.len());
        let mut ghost_query =
            self.world
                .query::<(&Personality, &GhostState, &Position, &Velocity)>();
        for (personality, state, position, velocity) in ghost_query.iter(&self.world) {
            ghosts.push(GhostSnapshot {
                personality: *personality,
                state: *state,
                actor: ActorSnapshot {
                    position: position.0,
                    direction: velocity.direction,
                },
            });
        }
        ghosts.sort_by_key(|g| g.personality.as_usize());

        let bonus = self.world.resource::<BonusSlot>().0.as_ref().and_then(|bonus| {
            let position = match &bonus.phase {
                BonusPhase::Parked { tile, .. } => Map::center_of(*tile),
                BonusPhase::Wandering(route) => route.position.0,
                BonusPhase::Consumed { .. } => return None,
            };
            Some(BonusSnapshot {
                symbol: bonus.symbol,
                position,
            })
        });

        let stage = self.world.resource::<Stage>();
        let level = self.world.resource::<LevelState>();
        let scoreboard = self.world.resource::<Scoreboard>();
        let high_scores = self.world.resource::<HighScores>();

        GameSnapshot {
            state: stage.state(),
            score: scoreboard.score(),
            high_score: high_scores.best().max(scoreboard.score()),
            lives: scoreboard.lives(),
            credits: stage.credits(),
            level: level.number,
            demo: level.demo,
            map_selection: level.map_selection,
            food_remaining: level.food_remaining(),
            hunting_phase: self.world.resource::<HuntingTimer>().phase_index(),
            pac: pac_actor,
            pac_alive,
            pac_power_remaining,
            ghosts,
            bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_boots_into_intro() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        assert_eq!(game.state(), GameState::Boot);
        game.tick();
        assert_eq!(game.state(), GameState::Intro);
    }

    #[test]
    fn test_start_without_credit_is_rejected() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.tick();
        let result = game.handle(GameCommand::StartGame);
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_coin_then_start_reaches_ready() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.tick();
        game.handle(GameCommand::InsertCoin).unwrap();
        game.handle(GameCommand::StartGame).unwrap();
        assert_eq!(game.state(), GameState::Ready);
        let snapshot = game.snapshot();
        assert!(!snapshot.demo);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.lives, crate::constants::score::INITIAL_LIVES);
    }
}
