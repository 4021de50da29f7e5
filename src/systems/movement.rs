//! Shared maze-walking rules.
//!
//! Every actor moves in continuous pixel space along tile centerlines. Turns
//! happen only at tile centers; reversals are allowed anywhere. All speeds in
//! this core stay below one tile per tick, so a single step never skips a
//! decision point.

use glam::{IVec2, Vec2};

use crate::constants::CELL_SIZE;
use crate::map::{Direction, Map};
use crate::systems::components::{Position, Velocity};

const CENTER_EPSILON: f32 = 0.01;

/// What happened during one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// The actor entered this new tile during the step.
    pub entered_tile: Option<IVec2>,
    /// The actor is stopped at a tile center against a wall.
    pub blocked: bool,
}

fn along(dir: Direction, point: Vec2, center: Vec2) -> f32 {
    let v = dir.as_ivec2();
    (point - center).dot(Vec2::new(v.x as f32, v.y as f32))
}

fn snap_to_centerline(dir: Direction, pos: Vec2, center: Vec2) -> Vec2 {
    match dir {
        Direction::Left | Direction::Right => Vec2::new(pos.x, center.y),
        Direction::Up | Direction::Down => Vec2::new(center.x, pos.y),
    }
}

/// Advances an actor by one tick worth of movement.
///
/// The wish direction is honored at the next tile center (or immediately for
/// a reversal); a blocked actor stops exactly on the center.
pub fn step(map: &Map, pos: &mut Position, vel: &mut Velocity, through_door: bool) -> StepOutcome {
    let before_tile = pos.tile();
    let tile = before_tile;
    let center = Map::center_of(tile);

    // Reversals do not wait for a decision point.
    if vel.wish == vel.direction.opposite() {
        vel.direction = vel.wish;
    }

    let at_center = along(vel.direction, pos.0, center).abs() < CENTER_EPSILON;
    if at_center {
        if vel.wish != vel.direction && map.is_walkable(map.wrap(tile + vel.wish.as_ivec2()), through_door) {
            vel.direction = vel.wish;
        }
        if !map.is_walkable(map.wrap(tile + vel.direction.as_ivec2()), through_door) {
            pos.0 = center;
            return StepOutcome {
                entered_tile: None,
                blocked: true,
            };
        }
    }

    let dir_vec = vel.direction.as_ivec2();
    let motion = Vec2::new(dir_vec.x as f32, dir_vec.y as f32) * vel.speed;
    let mut next = pos.0 + motion;

    // Clamp on the center we are about to cross when a turn is wanted there
    // or the tile ahead is a wall. The sub-pixel remainder is dropped; the
    // decision is made on the next tick.
    let s_old = along(vel.direction, pos.0, center);
    let s_new = along(vel.direction, next, center);
    if s_old < -CENTER_EPSILON && s_new >= 0.0 {
        let wants_turn = vel.wish != vel.direction && map.is_walkable(map.wrap(tile + vel.wish.as_ivec2()), through_door);
        let ahead_blocked = !map.is_walkable(map.wrap(tile + dir_vec), through_door);
        if wants_turn || ahead_blocked {
            next = center;
        }
    }

    next = snap_to_centerline(vel.direction, next, center);

    // Portal wrap-around.
    let span = map.width() as f32 * CELL_SIZE as f32;
    if next.x < 0.0 {
        next.x += span;
    } else if next.x >= span {
        next.x -= span;
    }

    pos.0 = next;
    let after_tile = pos.tile();
    StepOutcome {
        entered_tile: (after_tile != before_tile).then_some(after_tile),
        blocked: false,
    }
}

/// Straight-line movement towards a pixel target, axis by axis (horizontal
/// first). Used inside the ghost house where maze steering does not apply.
/// Returns true once the target is reached.
pub fn move_towards(pos: &mut Position, target: Vec2, speed: f32) -> bool {
    let mut remaining = speed;

    let dx = target.x - pos.0.x;
    if dx.abs() > CENTER_EPSILON {
        let step = dx.abs().min(remaining);
        pos.0.x += step * dx.signum();
        remaining -= step;
    }

    let dy = target.y - pos.0.y;
    if remaining > 0.0 && dy.abs() > CENTER_EPSILON {
        let step = dy.abs().min(remaining);
        pos.0.y += step * dy.signum();
    }

    (target - pos.0).length() <= CENTER_EPSILON
}

/// Euclidean distance between two tiles, the metric the original targeting
/// rules use.
pub fn tile_distance(a: IVec2, b: IVec2) -> f32 {
    let d = b - a;
    ((d.x * d.x + d.y * d.y) as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;
    use crate::systems::components::{Position, Velocity};

    fn test_map() -> Map {
        Map::parse(&RAW_BOARD).unwrap()
    }

    #[test]
    fn test_straight_movement_advances() {
        let map = test_map();
        // Open corridor on the top pellet row.
        let mut pos = Position::at_tile(IVec2::new(6, 5));
        let mut vel = Velocity {
            direction: Direction::Right,
            wish: Direction::Right,
            speed: 1.0,
        };
        let before = pos.0;
        let outcome = step(&map, &mut pos, &mut vel, false);
        assert!(!outcome.blocked);
        assert_eq!(pos.0.x, before.x + 1.0);
        assert_eq!(pos.0.y, before.y);
    }

    #[test]
    fn test_blocked_at_wall_center() {
        let map = test_map();
        // Tile (1,1) has a wall above.
        let mut pos = Position::at_tile(IVec2::new(1, 1));
        let mut vel = Velocity {
            direction: Direction::Up,
            wish: Direction::Up,
            speed: 1.0,
        };
        let outcome = step(&map, &mut pos, &mut vel, false);
        assert!(outcome.blocked);
        assert_eq!(pos.0, Map::center_of(IVec2::new(1, 1)));
    }

    #[test]
    fn test_reversal_applies_immediately() {
        let map = test_map();
        let mut pos = Position::at_tile(IVec2::new(6, 5));
        let mut vel = Velocity {
            direction: Direction::Right,
            wish: Direction::Right,
            speed: 1.0,
        };
        step(&map, &mut pos, &mut vel, false);
        vel.wish = Direction::Left;
        step(&map, &mut pos, &mut vel, false);
        assert_eq!(vel.direction, Direction::Left);
        assert_eq!(pos.0, Map::center_of(IVec2::new(6, 5)));
    }

    #[test]
    fn test_portal_wraps_position() {
        let map = test_map();
        let mut pos = Position::at_tile(IVec2::new(0, 14));
        let mut vel = Velocity {
            direction: Direction::Left,
            wish: Direction::Left,
            speed: 2.0,
        };
        // Walk left through the portal; x must wrap to the right edge.
        for _ in 0..4 {
            step(&map, &mut pos, &mut vel, false);
        }
        assert!(pos.tile().x > 20);
    }

    #[test]
    fn test_move_towards_reports_arrival_on_the_landing_tick() {
        let target = Map::center_of(IVec2::new(6, 5));
        let mut pos = Position(target - Vec2::new(1.0, 0.0));
        // The whole budget lands exactly on the target; arrival is reported
        // on this call, not the next one.
        assert!(move_towards(&mut pos, target, 1.0));
        assert_eq!(pos.0, target);
    }

    #[test]
    fn test_move_towards_reaches_target() {
        let target = Map::center_of(IVec2::new(13, 14));
        let mut pos = Position::at_tile(IVec2::new(11, 14));
        let mut done = false;
        for _ in 0..40 {
            if move_towards(&mut pos, target, 0.5) {
                done = true;
                break;
            }
        }
        assert!(done);
        assert_eq!(pos.0, target);
    }
}
