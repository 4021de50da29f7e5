//! Headless runner: boots the core, lets the attract demo play and logs
//! every event the simulation emits. Useful for watching a run without a
//! frontend attached.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pacsim::{Game, GameConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pacsim=debug")),
        )
        .init();

    // One optional argument: how many ticks to run (default one minute).
    let ticks: u64 = std::env::args()
        .nth(1)
        .map(|raw| raw.parse())
        .transpose()?
        .unwrap_or(3_600);

    let mut game = Game::new(GameConfig::default())?;
    for _ in 0..ticks {
        game.tick();
        for event in game.drain_events() {
            info!(?event, "event");
        }
    }

    let snapshot = game.snapshot();
    info!(
        state = snapshot.state.as_ref(),
        score = snapshot.score,
        level = snapshot.level,
        food_remaining = snapshot.food_remaining,
        "run finished"
    );
    Ok(())
}
