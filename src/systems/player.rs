//! Pac movement, eating and energizer power.

use bevy_ecs::prelude::*;
use glam::IVec2;
use tracing::{debug, trace};

use crate::constants::mechanics::BASE_SPEED;
use crate::constants::score::{ENERGIZER_POINTS, PELLET_POINTS};
use crate::game::{GameState, Stage};
use crate::level::LevelData;
use crate::map::{Food, Map};
use crate::systems::components::{
    GhostState, LevelState, Pac, PlayerControlled, Position, Velocity,
};
use crate::systems::ghost::Gatekeeper;
use crate::systems::movement::{self, tile_distance};
use crate::systems::score::Scoreboard;
use crate::timer::TimerDuration;

/// Moves Pac, eats food under him and starts power periods.
pub(crate) fn update_player(
    stage: Res<Stage>,
    map: Res<Map>,
    mut level: ResMut<LevelState>,
    mut gatekeeper: ResMut<Gatekeeper>,
    mut scoreboard: ResMut<Scoreboard>,
    pac_query: Single<(&mut Pac, &mut Position, &mut Velocity), With<PlayerControlled>>,
    mut ghosts: Query<(&mut GhostState, &mut Velocity), Without<PlayerControlled>>,
) {
    if stage.state() != GameState::Hunting {
        return;
    }

    let (mut pac, mut position, mut velocity) = pac_query.into_inner();
    if !pac.alive {
        return;
    }

    pac.power.tick();
    pac.starving_ticks += 1;

    let data = LevelData::for_level(level.number);
    velocity.speed = if pac.has_power() {
        BASE_SPEED * data.pac_power_speed_pct as f32 / 100.0
    } else {
        BASE_SPEED * data.pac_speed_pct as f32 / 100.0
    };

    let outcome = movement::step(&map, &mut position, &mut velocity, false);
    if pac.autopilot && (outcome.entered_tile.is_some() || outcome.blocked) {
        if let Some(wish) = autopilot_wish(&map, &level, position.tile()) {
            velocity.wish = wish;
        }
    }

    let tile = position.tile();
    let Some(food) = level.eat_at(tile, &map) else {
        return;
    };
    pac.starving_ticks = 0;
    gatekeeper.feed();

    match food {
        Food::Pellet => {
            trace!(?tile, remaining = level.food_remaining(), "pellet eaten");
            scoreboard.add(PELLET_POINTS);
        }
        Food::Energizer => {
            debug!(?tile, power_seconds = data.pac_power_seconds, "energizer eaten");
            scoreboard.add(ENERGIZER_POINTS);
            scoreboard.reset_kill_streak();
            // Hunting ghosts reverse on every energizer; they only turn blue
            // while a power period actually runs.
            let frighten = data.pac_power_seconds > 0;
            if frighten {
                pac.power
                    .reset(TimerDuration::seconds(data.pac_power_seconds as f32));
            }
            for (mut state, mut ghost_velocity) in &mut ghosts {
                if *state == GhostState::HuntingPac {
                    ghost_velocity.wish = ghost_velocity.direction.opposite();
                    if frighten {
                        *state = GhostState::Frightened;
                    }
                }
            }
        }
    }
}

/// Greedy demo steering: head for the nearest remaining food.
fn autopilot_wish(map: &Map, level: &LevelState, tile: IVec2) -> Option<crate::map::Direction> {
    let target = level
        .food_tiles(map)
        .into_iter()
        .min_by(|a, b| {
            tile_distance(tile, *a)
                .partial_cmp(&tile_distance(tile, *b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
    let path = map.path(tile, target, false)?;
    let next = *path.get(1)?;
    let step = next - tile;
    crate::map::Direction::DIRECTIONS
        .into_iter()
        .find(|dir| dir.as_ivec2() == step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;
    use crate::map::Direction;

    #[test]
    fn test_autopilot_heads_for_food() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        let mut level = LevelState::new(1, true, &map);
        // Leave exactly one pellet, to the right of the start row.
        for tile in level.food_tiles(&map) {
            if tile != IVec2::new(26, 29) {
                level.eat_at(tile, &map);
            }
        }
        let wish = autopilot_wish(&map, &level, IVec2::new(1, 29)).unwrap();
        assert_eq!(wish, Direction::Right);
    }
}
