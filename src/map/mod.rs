//! Maze geometry: board parsing and directions.

pub mod builder;
pub mod direction;

pub use builder::{Food, House, Map, Tile, TileFlags};
pub use direction::Direction;
