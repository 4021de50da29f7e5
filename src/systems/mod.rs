//! The per-tick simulation systems and the components they drive.

pub mod bonus;
pub mod components;
pub mod ghost;
pub mod hunting;
pub mod movement;
pub mod player;
pub mod score;
