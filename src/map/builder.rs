//! Board parsing and maze geometry.
//!
//! Translates the character board from [`crate::constants::RAW_BOARD`] into a
//! tile grid plus the derived geometry the simulation needs: the food layer,
//! tunnel tiles, the ghost house (door, interior slots, front and rear
//! approach tiles) and the two tunnel portals.

use bitflags::bitflags;
use glam::{IVec2, Vec2};
use pathfinding::prelude::astar;
use smallvec::SmallVec;

use crate::constants::{BOARD_CELL_SIZE, CELL_SIZE};
use crate::error::ParseError;
use crate::map::direction::Direction;

/// Static tile classification after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    /// The ghost house door. Walkable only for ghosts entering or leaving the house.
    Door,
}

/// Food initially present on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Food {
    Pellet,
    Energizer,
}

bitflags! {
    /// Per-tile attribute flags, orthogonal to the [`Tile`] kind.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TileFlags: u8 {
        /// Part of a tunnel: hunting ghosts are slowed here on early levels.
        const TUNNEL = 1 << 0;
        /// Inside the ghost house.
        const HOUSE = 1 << 1;
        /// A wrap-around portal at the board border.
        const PORTAL = 1 << 2;
    }
}

/// Geometry of the ghost house.
#[derive(Debug, Clone)]
pub struct House {
    /// The two door tiles.
    pub door: [IVec2; 2],
    /// Tile directly above the door; ghosts finish leaving (and start
    /// entering) the house here.
    pub front: IVec2,
    /// Tile on the corridor behind (below) the house, used by bonus routes.
    pub behind: IVec2,
    /// Interior revival slots: left, center, right.
    pub slots: [IVec2; 3],
}

/// The parsed, immutable maze. Built once and shared by every level; the
/// mutable food state lives on the level, not here.
#[derive(Debug, Clone, bevy_ecs::resource::Resource)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    flags: Vec<TileFlags>,
    food: Vec<Option<Food>>,
    food_total: u32,
    pub pac_start: IVec2,
    pub house: House,
    /// The two tunnel portals, left then right.
    pub portals: [IVec2; 2],
    /// Scatter corner targets indexed by personality
    /// (Shadow, Speedy, Bashful, Pokey).
    pub scatter_corners: [IVec2; 4],
}

impl Map {
    /// Parses a raw character board.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the board dimensions are wrong, a character
    /// is unknown, or the house/portal/start declarations are malformed.
    pub fn parse(raw: &[&str]) -> Result<Self, ParseError> {
        let height = BOARD_CELL_SIZE.y as usize;
        let width = BOARD_CELL_SIZE.x as usize;
        if raw.len() != height {
            return Err(ParseError::InvalidRowCount(raw.len(), height));
        }

        let mut tiles = vec![Tile::Wall; width * height];
        let mut flags = vec![TileFlags::default(); width * height];
        let mut food = vec![None; width * height];
        let mut pac_start = None;
        let mut door: Vec<IVec2> = Vec::new();
        let mut portals: Vec<IVec2> = Vec::new();
        let mut food_total = 0u32;

        for (y, row) in raw.iter().enumerate() {
            if row.len() != width {
                return Err(ParseError::InvalidRowWidth {
                    row: y,
                    width: row.len(),
                    expected: width,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = IVec2::new(x as i32, y as i32);
                let index = y * width + x;
                tiles[index] = match ch {
                    '#' => Tile::Wall,
                    ' ' => Tile::Floor,
                    '.' => {
                        food[index] = Some(Food::Pellet);
                        food_total += 1;
                        Tile::Floor
                    }
                    'o' => {
                        food[index] = Some(Food::Energizer);
                        food_total += 1;
                        Tile::Floor
                    }
                    '0' => {
                        if pac_start.replace(tile).is_some() {
                            return Err(ParseError::DuplicatePacStart);
                        }
                        Tile::Floor
                    }
                    'T' => {
                        portals.push(tile);
                        flags[index] |= TileFlags::PORTAL;
                        Tile::Floor
                    }
                    '=' => {
                        door.push(tile);
                        Tile::Door
                    }
                    other => return Err(ParseError::UnknownCharacter(other)),
                };
            }
        }

        let pac_start = pac_start.ok_or(ParseError::MissingPacStart)?;
        if door.len() != 2 {
            return Err(ParseError::InvalidHouseDoorCount(door.len()));
        }
        if portals.len() != 2 {
            return Err(ParseError::InvalidPortalCount(portals.len()));
        }
        portals.sort_by_key(|p| p.x);
        door.sort_by_key(|p| p.x);

        let mut map = Map {
            width: width as i32,
            height: height as i32,
            tiles,
            flags,
            food,
            food_total,
            pac_start,
            house: House {
                door: [door[0], door[1]],
                front: door[0] + IVec2::new(0, -1),
                behind: IVec2::ZERO, // filled in below
                slots: [IVec2::ZERO; 3],
            },
            portals: [portals[0], portals[1]],
            scatter_corners: [IVec2::ZERO; 4],
        };
        map.mark_tunnels();
        map.resolve_house(door[0])?;

        let (w, h) = (map.width, map.height);
        // Scatter corners: Shadow top-right, Speedy top-left,
        // Bashful bottom-right, Pokey bottom-left.
        map.scatter_corners = [
            IVec2::new(w - 3, 0),
            IVec2::new(2, 0),
            IVec2::new(w - 1, h - 1),
            IVec2::new(0, h - 1),
        ];
        Ok(map)
    }

    /// Flags every walkable tile on a portal row near the border as tunnel.
    fn mark_tunnels(&mut self) {
        let portal_rows: Vec<i32> = self.portals.iter().map(|p| p.y).collect();
        for y in portal_rows {
            for x in 0..self.width {
                let tile = IVec2::new(x, y);
                let near_border = x < 7 || x >= self.width - 7;
                if near_border && self.tile(tile) == Tile::Floor {
                    let index = self.index(tile);
                    self.flags[index] |= TileFlags::TUNNEL;
                }
            }
        }
    }

    /// Flood-fills the house interior from below the door and derives the
    /// revival slots and front/rear approach tiles.
    fn resolve_house(&mut self, door_left: IVec2) -> Result<(), ParseError> {
        let seed = door_left + IVec2::new(0, 1);
        if self.tile(seed) != Tile::Floor {
            return Err(ParseError::InvalidHouseDoorCount(2));
        }

        let mut stack = vec![seed];
        let mut interior: Vec<IVec2> = Vec::new();
        while let Some(tile) = stack.pop() {
            if interior.contains(&tile) {
                continue;
            }
            let index = self.index(tile);
            self.flags[index] |= TileFlags::HOUSE;
            interior.push(tile);
            for dir in Direction::DIRECTIONS {
                let next = tile + dir.as_ivec2();
                if self.in_bounds(next) && self.tile(next) == Tile::Floor && !interior.contains(&next) {
                    stack.push(next);
                }
            }
        }

        let min_x = interior.iter().map(|t| t.x).min().unwrap();
        let max_x = interior.iter().map(|t| t.x).max().unwrap();
        let min_y = interior.iter().map(|t| t.y).min().unwrap();
        let max_y = interior.iter().map(|t| t.y).max().unwrap();
        let mid_y = (min_y + max_y) / 2;
        let mid_x = (min_x + max_x) / 2;

        self.house.slots = [
            IVec2::new(min_x, mid_y),
            IVec2::new(mid_x, mid_y),
            IVec2::new(max_x, mid_y),
        ];
        // One tile below the bottom wall of the house.
        self.house.behind = IVec2::new(mid_x, max_y + 2);
        Ok(())
    }

    #[inline]
    fn index(&self, tile: IVec2) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    pub fn in_bounds(&self, tile: IVec2) -> bool {
        tile.x >= 0 && tile.x < self.width && tile.y >= 0 && tile.y < self.height
    }

    /// Wraps a tile horizontally across the portal row; other out-of-bounds
    /// tiles are returned unchanged.
    pub fn wrap(&self, tile: IVec2) -> IVec2 {
        if tile.x < 0 {
            IVec2::new(self.width - 1, tile.y)
        } else if tile.x >= self.width {
            IVec2::new(0, tile.y)
        } else {
            tile
        }
    }

    pub fn tile(&self, tile: IVec2) -> Tile {
        if !self.in_bounds(tile) {
            return Tile::Wall;
        }
        self.tiles[self.index(tile)]
    }

    pub fn flags(&self, tile: IVec2) -> TileFlags {
        if !self.in_bounds(tile) {
            return TileFlags::default();
        }
        self.flags[self.index(tile)]
    }

    /// Whether an actor may stand on `tile`. The house door only yields for
    /// ghosts passing through it.
    pub fn is_walkable(&self, tile: IVec2, through_door: bool) -> bool {
        let tile = self.wrap(tile);
        match self.tile(tile) {
            Tile::Floor => true,
            Tile::Door => through_door,
            Tile::Wall => false,
        }
    }

    pub fn is_tunnel(&self, tile: IVec2) -> bool {
        self.flags(tile).contains(TileFlags::TUNNEL)
    }

    pub fn is_inside_house(&self, tile: IVec2) -> bool {
        self.flags(tile).contains(TileFlags::HOUSE)
    }

    pub fn is_portal(&self, tile: IVec2) -> bool {
        self.flags(tile).contains(TileFlags::PORTAL)
    }

    /// The initial food layer, cloned into each new level.
    pub fn food_layout(&self) -> Vec<Option<Food>> {
        self.food.clone()
    }

    pub fn food_total(&self) -> u32 {
        self.food_total
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Pixel position of a tile center.
    pub fn center_of(tile: IVec2) -> Vec2 {
        Vec2::new(
            tile.x as f32 * CELL_SIZE as f32 + CELL_SIZE as f32 / 2.0,
            tile.y as f32 * CELL_SIZE as f32 + CELL_SIZE as f32 / 2.0,
        )
    }

    /// Tile containing a pixel position.
    pub fn tile_of(pos: Vec2) -> IVec2 {
        IVec2::new(
            (pos.x / CELL_SIZE as f32).floor() as i32,
            (pos.y / CELL_SIZE as f32).floor() as i32,
        )
    }

    /// Walkable neighbor tiles, honoring portal wrap.
    pub fn walkable_neighbors(&self, tile: IVec2, through_door: bool) -> SmallVec<[(IVec2, Direction); 4]> {
        let mut neighbors = SmallVec::new();
        for dir in Direction::DIRECTIONS {
            let next = self.wrap(tile + dir.as_ivec2());
            if self.is_walkable(next, through_door) {
                neighbors.push((next, dir));
            }
        }
        neighbors
    }

    /// Shortest tile path between two tiles, including both endpoints.
    pub fn path(&self, from: IVec2, to: IVec2, through_door: bool) -> Option<Vec<IVec2>> {
        let (path, _cost) = astar(
            &from,
            |&tile| {
                self.walkable_neighbors(tile, through_door)
                    .into_iter()
                    .map(|(next, _)| (next, 1u32))
                    .collect::<SmallVec<[(IVec2, u32); 4]>>()
            },
            |&tile| {
                let d = to - tile;
                (d.x.abs() + d.y.abs()) as u32
            },
            |&tile| tile == to,
        )?;
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;

    #[test]
    fn test_parse_board() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        assert_eq!(map.width(), 28);
        assert_eq!(map.height(), 31);
        assert_eq!(map.pac_start, IVec2::new(13, 23));
        assert_eq!(map.portals, [IVec2::new(0, 14), IVec2::new(27, 14)]);
    }

    #[test]
    fn test_house_geometry() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        assert_eq!(map.house.door, [IVec2::new(13, 12), IVec2::new(14, 12)]);
        assert_eq!(map.house.front, IVec2::new(13, 11));
        assert_eq!(map.house.slots[1].y, 14);
        assert!(map.is_inside_house(map.house.slots[0]));
        assert!(map.is_inside_house(map.house.slots[2]));
        assert!(!map.is_inside_house(map.house.front));
    }

    #[test]
    fn test_door_blocks_non_ghosts() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        for door in map.house.door {
            assert!(!map.is_walkable(door, false));
            assert!(map.is_walkable(door, true));
        }
    }

    #[test]
    fn test_tunnel_flags() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        assert!(map.is_tunnel(IVec2::new(2, 14)));
        assert!(map.is_tunnel(IVec2::new(25, 14)));
        assert!(!map.is_tunnel(IVec2::new(13, 14)));
    }

    #[test]
    fn test_portal_wrap() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        assert_eq!(map.wrap(IVec2::new(-1, 14)), IVec2::new(27, 14));
        assert_eq!(map.wrap(IVec2::new(28, 14)), IVec2::new(0, 14));
    }

    #[test]
    fn test_path_front_to_behind_house() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        let path = map.path(map.house.front, map.house.behind, false).unwrap();
        assert_eq!(path.first(), Some(&map.house.front));
        assert_eq!(path.last(), Some(&map.house.behind));
        // The route must go around the house, never through it.
        assert!(path.iter().all(|&t| !map.is_inside_house(t)));
    }

    #[test]
    fn test_duplicate_pac_start_is_rejected() {
        let mut rows = RAW_BOARD;
        let doctored = RAW_BOARD[29].replacen('.', "0", 1);
        rows[29] = &doctored;
        assert!(matches!(
            Map::parse(&rows),
            Err(ParseError::DuplicatePacStart)
        ));
    }

    #[test]
    fn test_food_totals() {
        let map = Map::parse(&RAW_BOARD).unwrap();
        let energizers = map
            .food_layout()
            .iter()
            .filter(|f| matches!(f, Some(Food::Energizer)))
            .count();
        assert_eq!(energizers, 4);
        assert!(map.food_total() > 200);
    }
}
