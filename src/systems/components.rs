//! Components, bundles and shared resources of the simulation world.

use std::collections::VecDeque;

use bevy_ecs::{bundle::Bundle, component::Component, resource::Resource};
use glam::{IVec2, Vec2};
use rand::rngs::SmallRng;
use smallvec::SmallVec;
use strum_macros::{AsRefStr, EnumIter};

use crate::events::GameEvent;
use crate::level::MapSelection;
use crate::map::{Direction, Food, Map};
use crate::timer::{TickTimer, TimerDuration};

/// The four fixed ghost personalities. Exactly one ghost entity exists per
/// personality per level; ghosts are reset between levels, never recreated.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Personality {
    /// The red ghost ("Blinky"); the only one affected by cruise elroy mode.
    Shadow,
    /// The pink ghost ("Pinky").
    Speedy,
    /// The cyan ghost ("Inky").
    Bashful,
    /// The orange ghost ("Clyde").
    Pokey,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Shadow,
        Personality::Speedy,
        Personality::Bashful,
        Personality::Pokey,
    ];

    pub const fn as_usize(self) -> usize {
        match self {
            Personality::Shadow => 0,
            Personality::Speedy => 1,
            Personality::Bashful => 2,
            Personality::Pokey => 3,
        }
    }

    /// Index of the house revival slot (left/center/right) for this ghost.
    /// Shadow starts outside but revives in the center slot.
    pub const fn slot_index(self) -> usize {
        match self {
            Personality::Shadow | Personality::Speedy => 1,
            Personality::Bashful => 0,
            Personality::Pokey => 2,
        }
    }

    /// The well-known arcade nickname, used only for logs.
    pub const fn nickname(self) -> &'static str {
        match self {
            Personality::Shadow => "Blinky",
            Personality::Speedy => "Pinky",
            Personality::Bashful => "Inky",
            Personality::Pokey => "Clyde",
        }
    }
}

/// Behavior state of a ghost. Only `HuntingPac` evaluates chase/scatter
/// targeting; every other state has a fixed movement rule.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GhostState {
    Locked,
    LeavingHouse,
    HuntingPac,
    Frightened,
    Eaten,
    ReturningHome,
    EnteringHouse,
}

impl GhostState {
    /// States in which a hunting-phase change requests a direction reversal.
    pub fn reverses_on_phase_change(self) -> bool {
        matches!(
            self,
            GhostState::HuntingPac | GhostState::Locked | GhostState::LeavingHouse
        )
    }
}

/// Per-ghost bookkeeping that is not part of the behavior state proper.
#[derive(Component, Debug, Clone)]
pub struct GhostMeta {
    /// Set by the hunting timer on phase changes; the ghost reverses at its
    /// next decision point.
    pub reverse_pending: bool,
    /// Order in which this ghost was eaten during the current power period.
    pub eaten_index: Option<u8>,
    /// House slot the ghost revives in.
    pub revival_slot: IVec2,
    /// Relock countdown after revival, before the ghost leaves again.
    pub relock: TickTimer,
    /// Remaining tile path while returning home as eyes.
    pub return_path: Vec<IVec2>,
}

impl GhostMeta {
    pub fn new(revival_slot: IVec2) -> Self {
        Self {
            reverse_pending: false,
            eaten_index: None,
            revival_slot,
            // Already expired: only revival arms it.
            relock: TickTimer::new(TimerDuration::Ticks(0)),
            return_path: Vec::new(),
        }
    }
}

/// A tag component for the entity controlled by the player (or autopilot).
#[derive(Default, Component)]
pub struct PlayerControlled;

/// Pac's own state: aliveness, power, hunger and control flags.
#[derive(Component, Debug, Clone)]
pub struct Pac {
    pub alive: bool,
    /// Remaining frightening power; expired means no power.
    pub power: TickTimer,
    /// Ticks since food was last eaten; presentation uses this to silence
    /// munching cues.
    pub starving_ticks: u64,
    pub autopilot: bool,
    pub immune: bool,
}

impl Pac {
    pub fn new(autopilot: bool) -> Self {
        let mut power = TickTimer::indefinite();
        power.stop();
        Self {
            alive: true,
            power,
            starving_ticks: 0,
            autopilot,
            immune: false,
        }
    }

    pub fn has_power(&self) -> bool {
        self.power.is_running() && !self.power.has_expired()
    }
}

/// Continuous pixel position of an actor.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    pub fn at_tile(tile: IVec2) -> Self {
        Position(Map::center_of(tile))
    }

    pub fn tile(&self) -> IVec2 {
        Map::tile_of(self.0)
    }
}

/// Current movement of an actor: facing, steering intent and speed in
/// pixels per tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub direction: Direction,
    /// Direction the actor wants to turn to at the next tile center.
    pub wish: Direction,
    pub speed: f32,
}

#[derive(Bundle)]
pub struct GhostBundle {
    pub personality: Personality,
    pub position: Position,
    pub velocity: Velocity,
    pub state: GhostState,
    pub meta: GhostMeta,
}

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: PlayerControlled,
    pub pac: Pac,
    pub position: Position,
    pub velocity: Velocity,
}

/// The live, mutable playfield state for the current level. Replaced
/// wholesale at level transitions; exactly one is live at a time.
#[derive(Resource, Debug, Clone)]
pub struct LevelState {
    pub number: u32,
    pub demo: bool,
    /// Board/palette rotation slot for this level.
    pub map_selection: MapSelection,
    food: Vec<Option<Food>>,
    food_total: u32,
    food_eaten: u32,
    /// Cruise elroy mode: −2..=2. Sign encodes enabled/suspended, magnitude
    /// the intensity tier.
    pub cruise_elroy: i8,
    /// Bonus activations seen this level, capped at two.
    pub bonus_activations: u8,
}

impl LevelState {
    pub fn new(number: u32, demo: bool, map: &Map) -> Self {
        Self {
            number,
            demo,
            map_selection: MapSelection::for_level(number),
            food: map.food_layout(),
            food_total: map.food_total(),
            food_eaten: 0,
            cruise_elroy: 0,
            bonus_activations: 0,
        }
    }

    pub fn food_eaten(&self) -> u32 {
        self.food_eaten
    }

    pub fn food_remaining(&self) -> u32 {
        self.food_total - self.food_eaten
    }

    pub fn is_complete(&self) -> bool {
        self.food_remaining() == 0
    }

    pub fn food_at(&self, tile: IVec2, map: &Map) -> Option<Food> {
        if !map.in_bounds(tile) {
            return None;
        }
        self.food[(tile.y * map.width() + tile.x) as usize]
    }

    /// Removes and returns the food on `tile`, if any.
    pub fn eat_at(&mut self, tile: IVec2, map: &Map) -> Option<Food> {
        if !map.in_bounds(tile) {
            return None;
        }
        let food = self.food[(tile.y * map.width() + tile.x) as usize].take();
        if food.is_some() {
            self.food_eaten += 1;
        }
        food
    }

    /// Eats every remaining pellet, leaving energizers in place (cheat).
    pub fn eat_all_pellets(&mut self) {
        for slot in self.food.iter_mut() {
            if *slot == Some(Food::Pellet) {
                *slot = None;
                self.food_eaten += 1;
            }
        }
    }

    /// Tiles that still hold food, in board order.
    pub fn food_tiles(&self, map: &Map) -> SmallVec<[IVec2; 8]> {
        let mut tiles = SmallVec::new();
        for (index, slot) in self.food.iter().enumerate() {
            if slot.is_some() {
                tiles.push(IVec2::new(index as i32 % map.width(), index as i32 / map.width()));
            }
        }
        tiles
    }

    /// Cruise elroy tier if enabled, 0 while disabled or suspended.
    pub fn elroy_tier(&self) -> u8 {
        self.cruise_elroy.max(0) as u8
    }

    /// Suspends elroy mode without clearing the tier.
    pub fn suspend_elroy(&mut self) {
        if self.cruise_elroy > 0 {
            self.cruise_elroy = -self.cruise_elroy;
        }
    }

    /// Restores a suspended elroy tier.
    pub fn resume_elroy(&mut self) {
        if self.cruise_elroy < 0 {
            self.cruise_elroy = -self.cruise_elroy;
        }
    }
}

/// Bonus symbol ids, in table order. The discriminant indexes
/// [`crate::constants::bonus::BONUS_VALUE_FACTORS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum BonusSymbol {
    Cherries = 0,
    Strawberry = 1,
    Orange = 2,
    Pretzel = 3,
    Apple = 4,
    Pear = 5,
    Banana = 6,
}

impl BonusSymbol {
    pub const ALL: [BonusSymbol; 7] = [
        BonusSymbol::Cherries,
        BonusSymbol::Strawberry,
        BonusSymbol::Orange,
        BonusSymbol::Pretzel,
        BonusSymbol::Apple,
        BonusSymbol::Pear,
        BonusSymbol::Banana,
    ];

    pub fn from_index(index: u8) -> BonusSymbol {
        Self::ALL[index as usize]
    }

    pub fn value(self) -> u32 {
        crate::constants::bonus::BONUS_VALUE_FACTORS[self as usize] * 100
    }
}

/// The outbound notification queue. Systems append, the embedder drains
/// after each tick.
#[derive(Resource, Debug, Default)]
pub struct EventQueue(pub VecDeque<GameEvent>);

impl EventQueue {
    pub fn emit(&mut self, event: GameEvent) {
        self.0.push_back(event);
    }
}

/// The simulation RNG. Seeded once from the config so runs are reproducible.
#[derive(Resource, Debug)]
pub struct SimRng(pub SmallRng);
