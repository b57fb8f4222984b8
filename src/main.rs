//! Ring Bounce headless driver
//!
//! Loads a scenario (JSON file or preset name), steps it at a fixed rate and
//! logs ring destruction events. Set `RUST_LOG=debug` for per-step summaries.

use std::path::Path;
use std::process::ExitCode;

use ring_bounce::sim::LogObserver;
use ring_bounce::{Scenario, SimError};

/// Hard stop when a scenario has no duration and never finishes
const MAX_RUN_SECS: f64 = 600.0;

fn load_scenario(arg: &str) -> Result<Scenario, SimError> {
    if Path::new(arg).is_file() {
        Scenario::load(arg)
    } else {
        Scenario::preset(arg)
    }
}

fn run(arg: &str) -> Result<(), SimError> {
    let scenario = load_scenario(arg)?;
    let mut sim = scenario.build()?;
    sim.set_observer(Box::new(LogObserver));

    let dt = scenario.dt();
    let limit = scenario.screen.duration_secs.unwrap_or(MAX_RUN_SECS);
    log::info!(
        "Running '{}': {} bodies, {} rings, dt={:.4}s, limit={}s, policy={:?}",
        scenario.title,
        sim.bodies().len(),
        sim.rings().len(),
        dt,
        limit,
        sim.config().policy
    );

    let mut destroyed = 0usize;
    while sim.time() < limit && !sim.is_finished() {
        sim.step(dt);
        // LogObserver already reported each event
        destroyed += sim.drain_events().len();
    }

    log::info!(
        "Stopped at t={:.2}s after {} steps: {} bodies left, {} rings left, {} destroyed",
        sim.time(),
        sim.step_index(),
        sim.bodies().len(),
        sim.rings().len(),
        destroyed
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let arg = std::env::args().nth(1).unwrap_or_else(|| "classic".to_string());
    log::info!("Ring Bounce starting with '{}'", arg);

    match run(&arg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("ring-bounce: {e}");
            ExitCode::FAILURE
        }
    }
}
