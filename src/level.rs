//! Per-level tuning data.
//!
//! All numbers here are data, not behavior: the level table is clamped to its
//! last row for high levels, and the hunting phase durations are carried as
//! configuration so the third-party reverse-engineered values can be corrected
//! without touching the state machines.

/// One row of the level table. Speed fields are percentages applied as
/// `pct / 100 * BASE_SPEED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelData {
    pub pac_speed_pct: u32,
    pub ghost_speed_pct: u32,
    pub ghost_tunnel_speed_pct: u32,
    /// Remaining food count at which cruise elroy tier 1 starts.
    pub elroy1_dots_left: u32,
    pub elroy1_speed_pct: u32,
    /// Remaining food count at which cruise elroy tier 2 starts.
    pub elroy2_dots_left: u32,
    pub elroy2_speed_pct: u32,
    pub pac_power_speed_pct: u32,
    pub ghost_frightened_speed_pct: u32,
    pub pac_power_seconds: u32,
    pub num_flashes: u32,
}

impl LevelData {
    /// Returns the table row for `min(n, table size)`. Level numbers start
    /// at 1; levels beyond the table reuse the last row.
    pub fn for_level(number: u32) -> &'static LevelData {
        assert!(number >= 1, "level numbers start at 1");
        let index = (number as usize - 1).min(LEVEL_DATA.len() - 1);
        &LEVEL_DATA[index]
    }
}

const fn row(data: [u32; 11]) -> LevelData {
    LevelData {
        pac_speed_pct: data[0],
        ghost_speed_pct: data[1],
        ghost_tunnel_speed_pct: data[2],
        elroy1_dots_left: data[3],
        elroy1_speed_pct: data[4],
        elroy2_dots_left: data[5],
        elroy2_speed_pct: data[6],
        pac_power_speed_pct: data[7],
        ghost_frightened_speed_pct: data[8],
        pac_power_seconds: data[9],
        num_flashes: data[10],
    }
}

/// The level table. Sourced from reverse-engineering notes of the arcade
/// original; levels beyond row 21 clamp to the last row.
pub const LEVEL_DATA: [LevelData; 21] = [
    row([80, 75, 40, 20, 80, 10, 85, 90, 50, 6, 5]),
    row([90, 85, 45, 30, 90, 15, 95, 95, 55, 5, 5]),
    row([90, 85, 45, 40, 90, 20, 95, 95, 55, 4, 5]),
    row([90, 85, 45, 40, 90, 20, 95, 95, 55, 3, 5]),
    row([100, 95, 50, 40, 100, 20, 105, 100, 60, 2, 5]),
    row([100, 95, 50, 50, 100, 25, 105, 100, 60, 5, 5]),
    row([100, 95, 50, 50, 100, 25, 105, 100, 60, 2, 5]),
    row([100, 95, 50, 50, 100, 25, 105, 100, 60, 2, 5]),
    row([100, 95, 50, 60, 100, 30, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 60, 100, 30, 105, 100, 60, 5, 5]),
    row([100, 95, 50, 60, 100, 30, 105, 100, 60, 2, 5]),
    row([100, 95, 50, 80, 100, 40, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 80, 100, 40, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 80, 100, 40, 105, 100, 60, 3, 5]),
    row([100, 95, 50, 100, 100, 50, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 100, 100, 50, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 100, 100, 50, 105, 100, 60, 0, 0]),
    row([100, 95, 50, 100, 100, 50, 105, 100, 60, 1, 3]),
    row([100, 95, 50, 120, 100, 60, 105, 100, 60, 0, 0]),
    row([100, 95, 50, 120, 100, 60, 105, 100, 60, 0, 0]),
    row([90, 95, 50, 120, 100, 60, 105, 90, 60, 0, 0]),
];

/// One hunting schedule: durations in ticks for phases 0..=7, alternating
/// scatter/chase. `None` means indefinite (chase forever, by convention the
/// final entry).
pub type PhaseDurations = [Option<u64>; 8];

/// The hunting phase duration tables, per level band. Treated as
/// configuration: the defaults come from third-party reverse-engineering
/// notes of uncertain accuracy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuntingDurations {
    pub level_1: PhaseDurations,
    pub levels_2_to_4: PhaseDurations,
    pub levels_5_up: PhaseDurations,
}

impl HuntingDurations {
    pub fn for_level(&self, number: u32) -> &PhaseDurations {
        match number {
            0..=1 => &self.level_1,
            2..=4 => &self.levels_2_to_4,
            _ => &self.levels_5_up,
        }
    }
}

impl Default for HuntingDurations {
    fn default() -> Self {
        Self {
            level_1: [
                Some(420),
                Some(1200),
                Some(420),
                Some(1200),
                Some(300),
                Some(1200),
                Some(300),
                None,
            ],
            levels_2_to_4: [
                Some(420),
                Some(1200),
                Some(420),
                Some(1200),
                Some(300),
                Some(61980),
                Some(1),
                None,
            ],
            levels_5_up: [
                Some(300),
                Some(1200),
                Some(300),
                Some(1200),
                Some(300),
                Some(62220),
                Some(1),
                None,
            ],
        }
    }
}

/// World map and color palette chosen for a level. With a single board in
/// this core the map number only selects presentation data, but the rotation
/// rule itself is simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSelection {
    pub map_number: u8,
    pub palette_index: u8,
}

impl MapSelection {
    /// Deterministic map/palette rotation: maps 1..=4 carry levels 1..=13,
    /// then maps 3 and 4 alternate every four levels with cycling palettes.
    pub fn for_level(number: u32) -> Self {
        assert!(number >= 1, "level numbers start at 1");
        match number {
            1..=2 => Self {
                map_number: 1,
                palette_index: 0,
            },
            3..=5 => Self {
                map_number: 2,
                palette_index: 1,
            },
            6..=9 => Self {
                map_number: 3,
                palette_index: 2,
            },
            10..=13 => Self {
                map_number: 4,
                palette_index: 3,
            },
            _ => {
                let block = (number - 14) / 4;
                if block % 2 == 0 {
                    Self {
                        map_number: 3,
                        palette_index: (4 + block % 4) as u8 % 6,
                    }
                } else {
                    Self {
                        map_number: 4,
                        palette_index: (4 + block % 4) as u8 % 6,
                    }
                }
            }
        }
    }
}
