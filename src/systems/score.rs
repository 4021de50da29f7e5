//! Score, lives and extra-life thresholds.

use bevy_ecs::prelude::*;
use tracing::debug;

use crate::constants::score::{EXTRA_LIFE_THRESHOLDS, INITIAL_LIVES};
use crate::events::GameEvent;
use crate::systems::components::EventQueue;

/// Running score and lives for the current game. Reset when a new game
/// starts, not between levels.
#[derive(Resource, Debug, Clone)]
pub struct Scoreboard {
    score: u32,
    lives: u8,
    kill_streak: u8,
    threshold_reached: [bool; EXTRA_LIFE_THRESHOLDS.len()],
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            score: 0,
            lives: INITIAL_LIVES,
            kill_streak: 0,
            threshold_reached: [false; EXTRA_LIFE_THRESHOLDS.len()],
        }
    }
}

impl Scoreboard {
    pub fn add(&mut self, points: u32) {
        self.score += points;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn add_life(&mut self) {
        self.lives = self.lives.saturating_add(1);
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    /// Consecutive ghosts eaten within the running power period.
    pub fn kill_streak(&self) -> u8 {
        self.kill_streak
    }

    /// Registers one more kill and returns the new streak length.
    pub fn bump_kill_streak(&mut self) -> u8 {
        self.kill_streak = self.kill_streak.saturating_add(1);
        self.kill_streak
    }

    /// Called on every energizer; the escalation starts over.
    pub fn reset_kill_streak(&mut self) {
        self.kill_streak = 0;
    }
}

/// Watches the score for extra-life thresholds.
pub(crate) fn update_score(mut scoreboard: ResMut<Scoreboard>, mut events: ResMut<EventQueue>) {
    for (index, &threshold) in EXTRA_LIFE_THRESHOLDS.iter().enumerate() {
        if !scoreboard.threshold_reached[index] && scoreboard.score >= threshold {
            scoreboard.threshold_reached[index] = true;
            scoreboard.add_life();
            debug!(threshold, lives = scoreboard.lives(), "extra life granted");
            events.emit(GameEvent::SpecialScoreReached { threshold });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::system::RunSystemOnce;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kill_streak_escalation() {
        let mut board = Scoreboard::default();
        assert_eq!(board.bump_kill_streak(), 1);
        assert_eq!(board.bump_kill_streak(), 2);
        board.reset_kill_streak();
        assert_eq!(board.bump_kill_streak(), 1);
    }

    #[test]
    fn test_extra_life_threshold_fires_once_per_game() {
        let mut world = World::new();
        world.insert_resource(Scoreboard::default());
        world.insert_resource(EventQueue::default());

        world.resource_mut::<Scoreboard>().add(EXTRA_LIFE_THRESHOLDS[0]);
        world.run_system_once(update_score).unwrap();
        assert_eq!(world.resource::<Scoreboard>().lives(), INITIAL_LIVES + 1);

        // Crossing the mark a second time over must not grant another life.
        world.resource_mut::<Scoreboard>().add(EXTRA_LIFE_THRESHOLDS[0]);
        world.run_system_once(update_score).unwrap();
        assert_eq!(world.resource::<Scoreboard>().lives(), INITIAL_LIVES + 1);

        let events = &world.resource::<EventQueue>().0;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            GameEvent::SpecialScoreReached {
                threshold: EXTRA_LIFE_THRESHOLDS[0]
            }
        );
    }

    #[test]
    fn test_lives_never_underflow() {
        let mut board = Scoreboard::default();
        for _ in 0..10 {
            board.lose_life();
        }
        assert_eq!(board.lives(), 0);
    }
}
