//! The bonus (fruit) lifecycle.
//!
//! A bonus is offered twice per level, at fixed food-eaten counts. Depending
//! on the game variant it either sits below the ghost house for a bounded
//! time or wanders in through one tunnel, passes behind the house and leaves
//! through a tunnel again.

use bevy_ecs::prelude::*;
use glam::IVec2;
use rand::Rng;
use tracing::debug;

use crate::constants::bonus::{
    ACTIVATION_FOOD_COUNTS, EATEN_DISPLAY_TICKS, STATIC_EDIBLE_SECONDS, SYMBOL_WEIGHTS,
};
use crate::constants::mechanics::{BASE_SPEED, BONUS_SPEED_FACTOR};
use crate::constants::TICKS_PER_SECOND;
use crate::events::GameEvent;
use crate::game::{GameConfig, GameState, GameVariant, Stage};
use crate::map::Map;
use crate::systems::components::{
    BonusSymbol, EventQueue, LevelState, Pac, PlayerControlled, Position, SimRng,
};
use crate::systems::movement::move_towards;
use crate::systems::score::Scoreboard;
use crate::timer::{TickTimer, TimerDuration};

/// A moving bonus following a precomputed tile route. Waypoints are stored
/// reversed so the next one is always `last()`.
#[derive(Debug, Clone)]
pub struct BonusRoute {
    pub position: Position,
    waypoints: Vec<IVec2>,
}

impl BonusRoute {
    fn new(map: &Map, entry: IVec2, exit: IVec2) -> Option<Self> {
        // Looping past the house front, around the back and out again.
        let stops = [entry, map.house.front, map.house.behind, map.house.front, exit];
        let mut tiles = vec![entry];
        for pair in stops.windows(2) {
            let leg = map.path(pair[0], pair[1], false)?;
            tiles.extend(leg.into_iter().skip(1));
        }
        tiles.reverse();
        Some(Self {
            position: Position::at_tile(entry),
            waypoints: tiles,
        })
    }

    /// Advances along the route; true once the exit is reached.
    fn advance(&mut self, speed: f32) -> bool {
        loop {
            let Some(&next) = self.waypoints.last() else {
                return true;
            };
            if self.position.tile() == next && self.position.0 == Map::center_of(next) {
                self.waypoints.pop();
                continue;
            }
            if move_towards(&mut self.position, Map::center_of(next), speed) {
                self.waypoints.pop();
            }
            return self.waypoints.is_empty();
        }
    }

    pub fn tile(&self) -> IVec2 {
        self.position.tile()
    }
}

/// Where a live bonus currently is in its life.
#[derive(Debug, Clone)]
pub enum BonusPhase {
    /// Sitting on a fixed tile until the edible window closes.
    Parked { tile: IVec2, timer: TickTimer },
    /// Wandering along its route; expires on exit.
    Wandering(BonusRoute),
    /// Already eaten; the value display lingers briefly.
    Consumed { timer: TickTimer },
}

#[derive(Debug, Clone)]
pub struct Bonus {
    pub symbol: BonusSymbol,
    pub phase: BonusPhase,
}

impl Bonus {
    /// Board tile the bonus occupies, if it is still edible.
    pub fn edible_tile(&self) -> Option<IVec2> {
        match &self.phase {
            BonusPhase::Parked { tile, .. } => Some(*tile),
            BonusPhase::Wandering(route) => Some(route.tile()),
            BonusPhase::Consumed { .. } => None,
        }
    }
}

/// The single bonus slot. At most one bonus exists at a time.
#[derive(Resource, Debug, Default)]
pub struct BonusSlot(pub Option<Bonus>);

/// Symbol for a fresh bonus: fixed through level 7, weighted random beyond.
fn select_symbol(level_number: u32, rng: &mut SimRng) -> BonusSymbol {
    if level_number <= 7 {
        return BonusSymbol::from_index(level_number as u8 - 1);
    }
    let total: u32 = SYMBOL_WEIGHTS.iter().sum();
    let mut draw = rng.0.random_range(0..total);
    for (index, weight) in SYMBOL_WEIGHTS.iter().enumerate() {
        if draw < *weight {
            return BonusSymbol::from_index(index as u8);
        }
        draw -= weight;
    }
    unreachable!("weights cover the draw range");
}

fn spawn_bonus(
    map: &Map,
    config: &GameConfig,
    level: &LevelState,
    rng: &mut SimRng,
) -> Option<Bonus> {
    let symbol = select_symbol(level.number, rng);
    let phase = match config.variant {
        GameVariant::Classic => {
            let (lo, hi) = STATIC_EDIBLE_SECONDS;
            let ticks = rng
                .0
                .random_range((lo * TICKS_PER_SECOND as f32) as u64..=(hi * TICKS_PER_SECOND as f32) as u64);
            BonusPhase::Parked {
                tile: map.house.behind,
                timer: TickTimer::new(TimerDuration::Ticks(ticks)),
            }
        }
        GameVariant::Deluxe => {
            let entry = map.portals[rng.0.random_range(0..2)];
            let exit = map.portals[rng.0.random_range(0..2)];
            BonusPhase::Wandering(BonusRoute::new(map, entry, exit)?)
        }
    };
    Some(Bonus { symbol, phase })
}

/// Activates, moves, feeds and expires the bonus.
pub(crate) fn update_bonus(
    stage: Res<Stage>,
    map: Res<Map>,
    config: Res<GameConfig>,
    mut level: ResMut<LevelState>,
    mut slot: ResMut<BonusSlot>,
    mut rng: ResMut<SimRng>,
    mut scoreboard: ResMut<Scoreboard>,
    mut events: ResMut<EventQueue>,
    pac_query: Single<(&Position, &Pac), With<PlayerControlled>>,
) {
    if stage.state() != GameState::Hunting {
        return;
    }
    let (pac_position, pac) = pac_query.into_inner();

    // Each activation mark is consumed exactly once when the food count
    // crosses it. A mark reached while a bonus is still live is forfeited,
    // not deferred.
    let activations = level.bonus_activations as usize;
    if activations < ACTIVATION_FOOD_COUNTS.len()
        && level.food_eaten() >= ACTIVATION_FOOD_COUNTS[activations]
    {
        level.bonus_activations += 1;
        if slot.0.is_some() {
            debug!(
                mark = ACTIVATION_FOOD_COUNTS[activations],
                "bonus still live, activation forfeited"
            );
        } else if let Some(bonus) = spawn_bonus(&map, &config, &level, &mut rng) {
            let moving = matches!(bonus.phase, BonusPhase::Wandering(_));
            debug!(symbol = bonus.symbol.as_ref(), moving, "bonus activated");
            events.emit(GameEvent::BonusActivated {
                symbol: bonus.symbol,
                moving,
            });
            slot.0 = Some(bonus);
        }
    }

    let Some(bonus) = slot.0.as_mut() else {
        return;
    };

    // Pac eats the bonus by sharing its tile.
    if pac.alive && bonus.edible_tile() == Some(pac_position.tile()) {
        let value = bonus.symbol.value();
        scoreboard.add(value);
        debug!(symbol = bonus.symbol.as_ref(), value, "bonus eaten");
        events.emit(GameEvent::BonusEaten { value });
        bonus.phase = BonusPhase::Consumed {
            timer: TickTimer::new(TimerDuration::Ticks(EATEN_DISPLAY_TICKS)),
        };
        return;
    }

    let symbol = bonus.symbol;
    let done = match &mut bonus.phase {
        BonusPhase::Parked { timer, .. } => {
            timer.tick();
            if timer.has_expired() {
                debug!(symbol = symbol.as_ref(), "bonus expired");
                events.emit(GameEvent::BonusExpired);
                true
            } else {
                false
            }
        }
        BonusPhase::Wandering(route) => {
            if route.advance(BASE_SPEED * BONUS_SPEED_FACTOR) {
                debug!(symbol = symbol.as_ref(), "bonus left the board");
                events.emit(GameEvent::BonusExpired);
                true
            } else {
                false
            }
        }
        BonusPhase::Consumed { timer } => {
            timer.tick();
            timer.has_expired()
        }
    };
    if done {
        slot.0 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;
    use rand::SeedableRng;

    fn rng() -> SimRng {
        SimRng(rand::rngs::SmallRng::seed_from_u64(7))
    }

    #[test]
    fn test_symbol_fixed_on_early_levels() {
        let mut rng = rng();
        assert_eq!(select_symbol(1, &mut rng), BonusSymbol::Cherries);
        assert_eq!(select_symbol(4, &mut rng), BonusSymbol::Pretzel);
        assert_eq!(select_symbol(7, &mut rng), BonusSymbol::Banana);
    }

    #[test]
    fn test_symbol_draw_covers_all_on_high_levels() {
        let mut rng = rng();
        let mut seen = [false; 7];
        for _ in 0..2_000 {
            seen[select_symbol(8, &mut rng) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_symbol_values_follow_factor_table() {
        assert_eq!(BonusSymbol::Cherries.value(), 100);
        assert_eq!(BonusSymbol::Orange.value(), 500);
        assert_eq!(BonusSymbol::Pretzel.value(), 700);
        assert_eq!(BonusSymbol::Banana.value(), 5_000);
    }

    #[test]
    fn test_route_runs_portal_to_portal() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        let mut route = BonusRoute::new(&map, map.portals[0], map.portals[1]).unwrap();
        assert_eq!(route.tile(), map.portals[0]);
        let mut passed_behind = false;
        for _ in 0..10_000 {
            passed_behind |= route.tile() == map.house.behind;
            if route.advance(1.25) {
                break;
            }
        }
        assert!(passed_behind);
        assert_eq!(route.tile(), map.portals[1]);
    }
}
