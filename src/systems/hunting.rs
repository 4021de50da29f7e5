//! The scatter/chase schedule.
//!
//! Hunting alternates between scatter and chase phases on a per-level
//! timetable. The timer pauses while Pac holds energizer power and while the
//! stage is not actively hunting; each phase change asks eligible ghosts to
//! reverse direction.

use bevy_ecs::prelude::*;
use tracing::debug;

use crate::game::{GameState, Stage};
use crate::level::{HuntingDurations, PhaseDurations};
use crate::systems::components::{EventQueue, GhostMeta, GhostState, Pac, PlayerControlled};
use crate::events::GameEvent;
use crate::timer::{TickTimer, TimerDuration};

/// The two hunting patterns. Ghost targeting branches on this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntingPhase {
    /// Each ghost heads for its own corner.
    Scatter,
    /// Each ghost evaluates its personality targeting rule.
    Chase,
}

/// Tracks the current hunting phase for the running level.
#[derive(Resource, Debug, Clone)]
pub struct HuntingTimer {
    timer: TickTimer,
    durations: PhaseDurations,
    phase_index: u8,
    announced: bool,
}

impl HuntingTimer {
    pub fn for_level(number: u32, durations: &HuntingDurations) -> Self {
        let durations = *durations.for_level(number);
        Self {
            timer: TickTimer::new(Self::budget(&durations, 0)),
            durations,
            phase_index: 0,
            announced: false,
        }
    }

    fn budget(durations: &PhaseDurations, index: u8) -> TimerDuration {
        match durations[index as usize] {
            Some(ticks) => TimerDuration::Ticks(ticks),
            None => TimerDuration::Indefinite,
        }
    }

    pub fn phase_index(&self) -> u8 {
        self.phase_index
    }

    /// Even phases scatter, odd phases chase.
    pub fn phase(&self) -> HuntingPhase {
        if self.phase_index % 2 == 0 {
            HuntingPhase::Scatter
        } else {
            HuntingPhase::Chase
        }
    }

    fn advance(&mut self) {
        debug_assert!((self.phase_index as usize) < self.durations.len() - 1);
        self.phase_index += 1;
        self.timer.reset(Self::budget(&self.durations, self.phase_index));
    }

    fn is_final_phase(&self) -> bool {
        self.phase_index as usize == self.durations.len() - 1
    }
}

/// Ticks the hunting schedule and broadcasts phase changes.
pub(crate) fn update_hunting_phase(
    stage: Res<Stage>,
    mut hunting: ResMut<HuntingTimer>,
    pac: Single<&Pac, With<PlayerControlled>>,
    mut ghosts: Query<(&GhostState, &mut GhostMeta)>,
    mut events: ResMut<EventQueue>,
) {
    if stage.state() != GameState::Hunting || !pac.alive {
        return;
    }

    if !hunting.announced {
        hunting.announced = true;
        events.emit(GameEvent::HuntingPhaseStarted { phase_index: 0 });
    }

    // Power freezes the schedule; the frightened period is not hunting time.
    if pac.has_power() {
        return;
    }

    hunting.timer.tick();
    if !hunting.timer.has_expired() || hunting.is_final_phase() {
        return;
    }

    hunting.advance();
    let phase_index = hunting.phase_index();
    debug!(phase_index, phase = ?hunting.phase(), "hunting phase change");
    events.emit(GameEvent::HuntingPhaseStarted { phase_index });

    for (state, mut meta) in &mut ghosts {
        if state.reverses_on_phase_change() {
            meta.reverse_pending = true;
        }
    }
}
