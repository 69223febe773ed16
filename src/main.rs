//! Particle Arena headless runner
//!
//! Spawns two teams in a walled arena, steers them toward each other and
//! prints the renderer summary as JSON once per simulated second.
//!
//! Usage: `particle-arena [settings.json] [seconds]`

use glam::Vec2;

use particle_arena::consts::SIM_DT;
use particle_arena::settings::SpawnPolicy;
use particle_arena::sim::{Stepper, TickInput, World};
use particle_arena::{SimResult, Settings};

const PARTICLES_PER_TEAM: usize = 4;

fn main() {
    env_logger::init();
    log::info!("Particle Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let mut settings = match args.next() {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    let seconds: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    if settings.spawn_policy == SpawnPolicy::Origin {
        settings.spawn_policy = SpawnPolicy::Team;
    }

    if let Err(e) = run(settings, seconds) {
        log::error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(settings: Settings, seconds: u32) -> SimResult<()> {
    let mut world = World::with_settings(settings);
    world.spawn_arena("arena")?;

    let mut ids = Vec::new();
    for team in [1, 2] {
        for _ in 0..PARTICLES_PER_TEAM {
            let id = world.spawn_particle(0.0, 0.0, None)?;
            world.join_team(id.as_str(), team)?;
            ids.push((id, team));
        }
    }
    log::info!("Spawned {} particles", world.particle_count());

    let mut input = TickInput::default();
    for (id, team) in &ids {
        let heading = if *team == 1 { Vec2::X } else { Vec2::NEG_X };
        input = input.drive(id.clone(), heading);
    }

    let mut stepper = Stepper::from_settings(world.settings());
    let frames = (seconds as f32 / SIM_DT).round() as u32;
    let ticks_per_report = (1.0 / world.settings().sim_dt).round().max(1.0) as u64;
    let mut last_report = 0;
    let mut pending = Some(input);

    for _ in 0..frames {
        let input = pending.take().unwrap_or_default();
        stepper.advance(&mut world, &input, SIM_DT)?;

        if world.time_ticks() >= last_report + ticks_per_report {
            last_report = world.time_ticks();
            println!("{}", world.summary().to_json()?);
        }
    }

    log::info!("Finished after {} ticks", world.time_ticks());
    Ok(())
}
