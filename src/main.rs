//! Gravity Sandbox headless runner
//!
//! Seeds a demo scene and runs it for a fixed number of ticks, logging
//! population statistics once per simulated second.
//!
//! Usage: `gravity-sandbox [config.json] [ticks]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::DVec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use gravity_sandbox::consts::*;
    use gravity_sandbox::sim::{BodyConfig, CelestialType, Simulation};
    use gravity_sandbox::{PhysicsConfig, SimError};

    const WIDTH: f64 = 1600.0;
    const HEIGHT: f64 = 1000.0;
    const DEFAULT_TICKS: u64 = 600;
    const RANDOM_BODIES: usize = 20;

    /// Binary star pair plus a handful of random bodies
    fn seed_scene(sim: &mut Simulation) -> Result<(), SimError> {
        let (w, h) = (WIDTH, HEIGHT);
        sim.create_body(
            BodyConfig::new(CelestialType::Star, DVec2::new(w * 0.3, h * 0.5), 1000.0, 100.0)
                .with_velocity(DVec2::new(0.0, 1.0)),
        )?;
        sim.create_body(
            BodyConfig::new(CelestialType::Planet, DVec2::new(w * 0.7, h * 0.5), 800.0, 80.0)
                .with_velocity(DVec2::new(0.0, -1.0)),
        )?;

        let mut rng = Pcg32::seed_from_u64(sim.seed());
        for _ in 0..RANDOM_BODIES {
            let kind = CelestialType::sample(&mut rng);
            let position = DVec2::new(rng.random_range(0.0..w), rng.random_range(0.0..h));
            sim.create_body(BodyConfig::sampled(kind, position, &mut rng))?;
        }
        Ok(())
    }

    pub fn run() -> Result<(), SimError> {
        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => PhysicsConfig::load_or_default(path),
            None => PhysicsConfig::default(),
        };
        let ticks = args
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TICKS);

        let mut sim = Simulation::with_config(WIDTH, HEIGHT, config)?;
        seed_scene(&mut sim)?;
        log::info!(
            "Seeded {} bodies (seed {:#x}), running {} ticks",
            sim.len(),
            sim.seed(),
            ticks
        );

        let mut faults = 0;
        for _ in 0..ticks {
            let report = sim.tick();
            faults += report.faults.len();

            if sim.ticks() % UPDATE_RATE as u64 == 0 {
                log::info!(
                    "t={:>5} bodies={:>3} mass={:.1} |p|={:.2} KE={:.2} barnes-hut={}",
                    sim.ticks(),
                    sim.len(),
                    sim.total_mass(),
                    sim.total_momentum().length(),
                    sim.kinetic_energy(),
                    sim.last_report().used_barnes_hut
                );
            }
        }

        for body in sim.bodies() {
            let info = body.info();
            log::info!(
                "{} {:<12} mass={:>10.1} diameter={:>7.1} speed={:.2}",
                body.id,
                info.type_name,
                info.mass,
                info.diameter,
                info.speed
            );
        }
        if faults > 0 {
            log::warn!("{} physics faults recovered during the run", faults);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Gravity Sandbox (native) starting...");

    if let Err(err) = native::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm; nothing to run here
}
