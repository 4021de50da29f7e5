//! This module contains all the constants used in the simulation.

use std::time::Duration;

use glam::UVec2;

/// Fixed simulation rate: one tick is 1/60th of a second.
pub const TICKS_PER_SECOND: u64 = 60;

pub const TICK_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / TICKS_PER_SECOND as f64) as u64);

/// The size of each cell, in pixels.
pub const CELL_SIZE: u32 = 8;
/// The size of the game board, in cells.
pub const BOARD_CELL_SIZE: UVec2 = UVec2::new(28, 31);

/// The raw layout of the game board, as a 2D array of characters.
///
/// `#` wall, `.` pellet, `o` energizer, `T` tunnel portal, `=` house door,
/// `0` starting position of Pac, space for open floor.
pub const RAW_BOARD: [&str; BOARD_CELL_SIZE.y as usize] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###==### ##.#     ",
    "######.## #      # ##.######",
    "T     .   #      #   .     T",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......0 .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// Movement mechanics shared by every actor.
pub mod mechanics {
    /// Full (100%) actor speed, in pixels per tick.
    pub const BASE_SPEED: f32 = 1.25;
    /// Ghost speed while bouncing inside or leaving the house, in pixels per tick.
    pub const HOUSE_SPEED: f32 = 0.5;
    /// Ghost speed while returning home as eyes, in pixels per tick.
    pub const RETURN_HOME_SPEED: f32 = 2.0;
    /// Moving-bonus speed factor, applied to [`BASE_SPEED`].
    pub const BONUS_SPEED_FACTOR: f32 = 1.25;
    /// Levels on which tunnel tiles slow hunting ghosts down.
    pub const TUNNEL_SLOWDOWN_MAX_LEVEL: u32 = 3;
    /// Ticks a revived ghost stays locked before leaving the house again.
    pub const RELOCK_TICKS: u64 = 30;
    /// Ticks an eaten ghost holds still, showing its value, before the eyes
    /// head home.
    pub const EATEN_PAUSE_TICKS: u64 = 30;
}

/// Point values and score thresholds.
pub mod score {
    /// Points for a single pellet.
    pub const PELLET_POINTS: u32 = 10;
    /// Points for an energizer.
    pub const ENERGIZER_POINTS: u32 = 50;
    /// Escalating points per ghost killed within one power period.
    pub const KILLED_GHOST_VALUES: [u32; 4] = [200, 400, 800, 1600];
    /// Bonus for killing all four ghosts within a single power period.
    pub const ALL_GHOSTS_KILLED_POINTS: u32 = 12_000;
    /// Score thresholds at which an extra life is granted.
    pub const EXTRA_LIFE_THRESHOLDS: [u32; 1] = [10_000];
    /// Lives at the start of a game.
    pub const INITIAL_LIVES: u8 = 3;
}

/// Bonus (fruit) tuning.
pub mod bonus {
    /// Food-eaten counts at which a bonus is activated.
    pub const ACTIVATION_FOOD_COUNTS: [u32; 2] = [64, 176];
    /// `value = BONUS_VALUE_FACTORS[symbol] * 100`
    pub const BONUS_VALUE_FACTORS: [u32; 7] = [1, 2, 5, 7, 10, 20, 50];
    /// Weighted buckets for the symbol draw on levels above 7. The draw is
    /// uniform over `0..320`; weights are 50/50/50/50/40/40/40.
    pub const SYMBOL_WEIGHTS: [u32; 7] = [50, 50, 50, 50, 40, 40, 40];
    /// A static bonus stays edible between these many seconds (inclusive lower bound).
    pub const STATIC_EDIBLE_SECONDS: (f32, f32) = (9.0, 10.0);
    /// Ticks an eaten bonus value stays displayed before the slot resets.
    pub const EATEN_DISPLAY_TICKS: u64 = 120;
}

/// Timings for the stage machine sequencing READY, dying and level-complete pauses.
pub mod stage {
    /// Ticks of the READY! pause before hunting starts.
    pub const READY_TICKS: u64 = 120;
    /// Ticks Pac stays frozen before the dying animation would play.
    pub const DYING_FREEZE_TICKS: u64 = 60;
    /// Ticks of the full dying sequence after the freeze.
    pub const DYING_TICKS: u64 = 90;
    /// Ticks of the level-complete flash before the next level is created.
    pub const LEVEL_COMPLETE_TICKS: u64 = 120;
    /// Ticks of black screen between two levels.
    pub const LEVEL_TRANSITION_TICKS: u64 = 60;
    /// Ticks the intro screen idles before a demo game starts.
    pub const ATTRACT_IDLE_TICKS: u64 = 300;
    /// Ticks the GAME OVER banner stays before returning to the intro.
    pub const GAME_OVER_TICKS: u64 = 180;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_time() {
        let expected_nanos = (1_000_000_000.0 / 60.0) as u64;
        assert_eq!(TICK_TIME.as_nanos() as u64, expected_nanos);
    }

    #[test]
    fn test_raw_board_dimensions() {
        assert_eq!(RAW_BOARD.len(), BOARD_CELL_SIZE.y as usize);
        for row in RAW_BOARD.iter() {
            assert_eq!(row.len(), BOARD_CELL_SIZE.x as usize);
        }
    }

    #[test]
    fn test_raw_board_energizers() {
        let count: usize = RAW_BOARD.iter().map(|row| row.chars().filter(|&c| c == 'o').count()).sum();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_raw_board_house_door() {
        assert!(RAW_BOARD.iter().any(|row| row.contains("==")));
    }

    #[test]
    fn test_raw_board_portals() {
        let tunnel_row = RAW_BOARD[14];
        assert_eq!(tunnel_row.chars().next().unwrap(), 'T');
        assert_eq!(tunnel_row.chars().last().unwrap(), 'T');
    }

    #[test]
    fn test_kill_values_escalate() {
        for pair in score::KILLED_GHOST_VALUES.windows(2) {
            assert!(pair[1] == pair[0] * 2);
        }
    }

    #[test]
    fn test_symbol_weights_cover_draw_range() {
        assert_eq!(bonus::SYMBOL_WEIGHTS.iter().sum::<u32>(), 320);
    }
}
