//! Portal Motion demo
//!
//! Builds a seeded sandbox scene, throws the player through a portal and
//! logs what happens. Usage: `portal-motion [seed] [ticks]`

use std::rc::Rc;

use portal_motion::host::EntityHost;
use portal_motion::sandbox::scenario::Scenario;
use portal_motion::{LogObserver, Tuning};

/// Host tick length used by the demo
const DEMO_DT: f32 = 0.05;
const DEFAULT_TICKS: usize = 400;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let ticks = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let tuning = match std::env::var("PORTAL_MOTION_TUNING") {
        Ok(path) => match std::fs::read_to_string(&path).map(|json| Tuning::from_json(&json)) {
            Ok(Ok(tuning)) => tuning,
            Ok(Err(err)) => {
                log::warn!("Ignoring tuning file {}: {}", path, err);
                Tuning::default()
            }
            Err(err) => {
                log::warn!("Could not read tuning file {}: {}", path, err);
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    };

    log::info!("Portal Motion demo starting (seed {}, {} ticks)", seed, ticks);
    let verbose = log::log_enabled!(log::Level::Debug);
    let mut scenario = Scenario::generate(seed, tuning, Rc::new(LogObserver::new(verbose)));
    scenario.run(ticks, DEMO_DT);

    match scenario.player_position() {
        Some(pos) => log::info!("Player finished at {:.2}", pos),
        None => log::info!("Player left the world"),
    }
    log::info!(
        "Player health {:?}, {} proxies still active after {} ticks",
        scenario.world.health(scenario.player),
        scenario.sim.proxies().len(),
        scenario.sim.time_ticks
    );
}
