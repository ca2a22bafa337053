use std::time::Instant;

use cgmath::Vector2;
use clap::{Parser, ValueEnum};
use nbody::{
    Simulation, SimulationParams,
    constants::{BARNES_HUT_THETA, CHECK_INTERVAL, DELTA, G, MAX_THREADS, SOFTENING},
    diagnostics,
    presets::{self, GalaxyConfig},
};
use rand::{SeedableRng, rngs::StdRng};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Unit masses spread over a square
    Uniform,
    /// A single disk galaxy
    Galaxy,
    /// Two galaxies on an approaching trajectory
    Collision,
}

/// Headless Barnes-Hut run, reporting energy drift as it goes.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long, default_value_t = 20_000)]
    bodies: usize,
    /// Worker threads, defaults to the available parallelism
    #[arg(short, long)]
    threads: Option<usize>,
    #[arg(short, long, default_value_t = 2_000)]
    steps: u64,
    #[arg(short, long, value_enum, default_value_t = Preset::Galaxy)]
    preset: Preset,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = G)]
    g: f32,
    #[arg(long, default_value_t = SOFTENING)]
    eps: f32,
    #[arg(long, default_value_t = DELTA)]
    dt: f32,
    #[arg(long, default_value_t = BARNES_HUT_THETA)]
    theta: f32,
}

fn populate(sim: &mut Simulation, preset: Preset, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let g = sim.params().g;
    let n = sim.params().body_count;
    let bodies = sim.bodies_mut();

    match preset {
        Preset::Uniform => {
            presets::uniform(bodies, &mut rng, Vector2::new(0.0, 0.0), Vector2::new(400.0, 400.0), 2.0)
        }
        Preset::Galaxy => presets::galaxy(
            bodies,
            &mut rng,
            0..n,
            &GalaxyConfig {
                center: Vector2::new(0.0, 0.0),
                velocity: Vector2::new(0.0, 0.0),
                total_mass: 1e6,
                scale_length: 40.0,
                temperature: 1.0,
            },
            g,
        ),
        Preset::Collision => {
            let split = n * 3 / 5;
            presets::galaxy(
                bodies,
                &mut rng,
                0..split,
                &GalaxyConfig {
                    center: Vector2::new(150.0, 150.0),
                    velocity: Vector2::new(0.3, -0.8),
                    total_mass: 1.5e6,
                    scale_length: 40.0,
                    temperature: 1.0,
                },
                g,
            );
            presets::galaxy(
                bodies,
                &mut rng,
                split..n,
                &GalaxyConfig {
                    center: Vector2::new(175.0, 100.0),
                    velocity: Vector2::new(-0.5, 1.2),
                    total_mass: 1e6,
                    scale_length: 30.0,
                    temperature: 1.0,
                },
                g,
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let threads = args.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_THREADS)
    });
    let params = SimulationParams::new(args.bodies, threads)
        .with_g(args.g)
        .with_eps(args.eps)
        .with_dt(args.dt)
        .with_theta(args.theta);

    let mut sim = Simulation::new(params)?;
    populate(&mut sim, args.preset, args.seed);
    log::info!(
        "Running {:?} with {} bodies on {} threads for {} steps",
        args.preset,
        args.bodies,
        threads,
        args.steps
    );

    sim.initialize()?;
    let initial_energy = diagnostics::total_energy(sim.bodies(), params.g, params.eps);
    let mut last_report = Instant::now();

    for tick in 1..=args.steps {
        sim.step()?;

        if tick % CHECK_INTERVAL == 0 || tick == args.steps {
            let energy = diagnostics::total_energy(sim.bodies(), params.g, params.eps);
            let drift = (energy - initial_energy) / initial_energy.abs();
            let interval = (tick - 1) % CHECK_INTERVAL + 1;
            log::info!(
                "tick {tick} (t = {:.3}): {} nodes, energy drift {drift:+.3e}, {:.2} ms/step",
                sim.time(),
                sim.tree().len(),
                last_report.elapsed().as_secs_f64() * 1e3 / interval as f64,
            );
            last_report = Instant::now();
        }
    }

    log::info!("Simulation finished");
    Ok(())
}
