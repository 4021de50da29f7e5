//! The countable, resettable tick timer used by every state machine in the
//! simulation. One tick is 1/60th of a second; there is no other clock.

use crate::constants::TICKS_PER_SECOND;

/// Duration of a [`TickTimer`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDuration {
    Ticks(u64),
    /// Never expires on its own; the owning state machine leaves the state
    /// explicitly.
    Indefinite,
}

impl TimerDuration {
    pub fn seconds(seconds: f32) -> Self {
        TimerDuration::Ticks((seconds * TICKS_PER_SECOND as f32).round() as u64)
    }
}

/// A countdown/elapsed-tick counter. No side effects beyond counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTimer {
    duration: TimerDuration,
    current_tick: u64,
    running: bool,
}

impl TickTimer {
    pub fn new(duration: TimerDuration) -> Self {
        Self {
            duration,
            current_tick: 0,
            running: true,
        }
    }

    pub const fn indefinite() -> Self {
        Self {
            duration: TimerDuration::Indefinite,
            current_tick: 0,
            running: true,
        }
    }

    /// Resets the elapsed count and arms the timer with a new budget.
    pub fn reset(&mut self, duration: TimerDuration) {
        self.duration = duration;
        self.current_tick = 0;
        self.running = true;
    }

    /// Advances by one tick. Stopped or expired timers do not advance.
    pub fn tick(&mut self) {
        if self.running && !self.has_expired() {
            self.current_tick += 1;
        }
    }

    pub fn has_expired(&self) -> bool {
        match self.duration {
            TimerDuration::Ticks(limit) => self.current_tick >= limit,
            TimerDuration::Indefinite => false,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn remaining_ticks(&self) -> Option<u64> {
        match self.duration {
            TimerDuration::Ticks(limit) => Some(limit.saturating_sub(self.current_tick)),
            TimerDuration::Indefinite => None,
        }
    }

    /// Stops the timer entirely. A stopped timer must be `reset` to run again;
    /// this is stronger than a pause by design of the hunting schedule.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True exactly when the elapsed tick equals `s` seconds.
    pub fn at_second(&self, s: f32) -> bool {
        self.current_tick == (s * TICKS_PER_SECOND as f32) as u64
    }

    /// True while the elapsed tick lies within `[a, b)` seconds.
    pub fn between_seconds(&self, a: f32, b: f32) -> bool {
        let tick = self.current_tick as f32 / TICKS_PER_SECOND as f32;
        a <= tick && tick < b
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::indefinite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_to_expiry() {
        let mut timer = TickTimer::new(TimerDuration::Ticks(3));
        assert!(!timer.has_expired());
        timer.tick();
        timer.tick();
        assert!(!timer.has_expired());
        timer.tick();
        assert!(timer.has_expired());
        // Expired timers saturate.
        timer.tick();
        assert_eq!(timer.current_tick(), 3);
    }

    #[test]
    fn test_indefinite_never_expires() {
        let mut timer = TickTimer::indefinite();
        for _ in 0..10_000 {
            timer.tick();
        }
        assert!(!timer.has_expired());
        assert_eq!(timer.current_tick(), 10_000);
    }

    #[test]
    fn test_stop_halts_counting() {
        let mut timer = TickTimer::new(TimerDuration::Ticks(10));
        timer.tick();
        timer.stop();
        timer.tick();
        timer.tick();
        assert_eq!(timer.current_tick(), 1);
        timer.start();
        timer.tick();
        assert_eq!(timer.current_tick(), 2);
    }

    #[test]
    fn test_second_queries() {
        let mut timer = TickTimer::indefinite();
        for _ in 0..60 {
            timer.tick();
        }
        assert!(timer.at_second(1.0));
        assert!(timer.between_seconds(0.5, 1.5));
        assert!(!timer.between_seconds(1.5, 2.0));
    }

    #[test]
    fn test_seconds_duration_conversion() {
        assert_eq!(TimerDuration::seconds(6.0), TimerDuration::Ticks(360));
    }
}
