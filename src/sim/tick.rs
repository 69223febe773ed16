//! Fixed-order simulation tick
//!
//! One tick is always: every particle's pre-step, one physics step, every
//! actor's post-step. Forces must be in place before integration and the
//! clamp-and-cache must only ever see the integrated result.

use glam::Vec2;

use super::actor::ActorId;
use super::world::World;
use crate::error::SimResult;
use crate::physics::PhysicsEngine;

/// Movement intent for one particle
#[derive(Debug, Clone, PartialEq)]
pub struct MoveIntent {
    pub id: ActorId,
    pub driven: bool,
    pub move_dir: Vec2,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Drive state changes, applied before the pre-step pass
    pub intents: Vec<MoveIntent>,
}

impl TickInput {
    pub fn drive(mut self, id: impl Into<ActorId>, move_dir: Vec2) -> Self {
        self.intents.push(MoveIntent {
            id: id.into(),
            driven: true,
            move_dir,
        });
        self
    }

    pub fn stop(mut self, id: impl Into<ActorId>) -> Self {
        self.intents.push(MoveIntent {
            id: id.into(),
            driven: false,
            move_dir: Vec2::ZERO,
        });
        self
    }
}

/// Advance the world by one fixed timestep.
///
/// Intents naming unknown actors or non-particles fail the tick before any
/// state changes.
pub fn tick<P: PhysicsEngine>(world: &mut World<P>, input: &TickInput, dt: f32) -> SimResult<()> {
    for intent in &input.intents {
        world.particle(intent.id.as_str())?;
    }
    for intent in &input.intents {
        world.set_drive(intent.id.as_str(), intent.driven, intent.move_dir)?;
    }

    // Id snapshots: hooks never run while a registry is being iterated
    for id in world.particle_ids() {
        if world.contains(id.as_str()) {
            world.pre_step(id.as_str())?;
        }
    }

    world.physics_mut().step(dt);

    for id in world.actor_ids() {
        if world.contains(id.as_str()) {
            world.post_step(id.as_str())?;
        }
    }

    world.time_ticks += 1;
    Ok(())
}

/// Fixed-timestep accumulator driving `tick` from variable frame times
#[derive(Debug, Clone)]
pub struct Stepper {
    accumulator: f32,
    dt: f32,
    max_substeps: u32,
    /// Frame time above this is treated as a stall and truncated
    max_frame_dt: f32,
}

impl Stepper {
    pub fn new(dt: f32, max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            dt,
            max_substeps,
            max_frame_dt: 0.1,
        }
    }

    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self::new(settings.sim_dt, settings.max_substeps)
    }

    /// Time banked but not yet simulated
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Run as many whole ticks as `frame_dt` covers, up to the substep cap.
    /// Time left over once the cap is hit is dropped, not carried.
    /// Intents are one-shot: they apply on the first tick only.
    ///
    /// Returns the number of ticks run.
    pub fn advance<P: PhysicsEngine>(
        &mut self,
        world: &mut World<P>,
        input: &TickInput,
        frame_dt: f32,
    ) -> SimResult<u32> {
        self.accumulator += frame_dt.min(self.max_frame_dt);

        let idle = TickInput::default();
        let mut substeps = 0;
        while self.accumulator >= self.dt && substeps < self.max_substeps {
            let input = if substeps == 0 { input } else { &idle };
            tick(world, input, self.dt)?;
            self.accumulator -= self.dt;
            substeps += 1;
        }

        if substeps == self.max_substeps && self.accumulator >= self.dt {
            log::debug!(
                "Substep cap hit, dropping {:.4}s of simulation time",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        Ok(substeps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimError;
    use crate::settings::Settings;

    fn world() -> World {
        World::with_settings(Settings::default())
    }

    #[test]
    fn test_tick_drives_and_clamps() {
        let mut world = world();
        world.spawn_particle(0.0, 0.0, Some("p")).expect("spawn");

        let input = TickInput::default().drive("p", Vec2::X);
        for _ in 0..120 {
            tick(&mut world, &input, 1.0 / 60.0).expect("tick");
        }

        // 5 u/s² for two seconds would reach 10 u/s without the cap
        let particle = world.get("p").expect("p");
        assert!((particle.velocity().length() - 2.0).abs() < 1e-4);
        assert!(particle.velocity().x > 0.0);
        assert_eq!(world.time_ticks(), 120);
    }

    #[test]
    fn test_cache_matches_body_after_tick() {
        let mut world = world();
        world.spawn_particle(1.0, 1.0, Some("p")).expect("spawn");
        let body = world.get("p").expect("p").body();
        world
            .physics_mut()
            .set_linear_velocity(body, Vec2::new(0.0, 1.0));

        tick(&mut world, &TickInput::default(), 0.5).expect("tick");

        let particle = world.get("p").expect("p");
        assert_eq!(particle.position(), world.physics().position(body));
        assert_eq!(particle.velocity(), world.physics().linear_velocity(body));
        assert!((particle.position().y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_bad_intent_fails_before_any_change() {
        let mut world = world();
        world.spawn_particle(0.0, 0.0, Some("p")).expect("spawn");
        let input = TickInput::default().drive("p", Vec2::X).drive("ghost", Vec2::Y);

        assert!(matches!(
            tick(&mut world, &input, 1.0 / 60.0),
            Err(SimError::UnknownActor(_))
        ));
        assert!(!world.get("p").expect("p").as_particle().expect("state").driven);
        assert_eq!(world.time_ticks(), 0);
    }

    #[test]
    fn test_stop_intent() {
        let mut world = world();
        world.spawn_particle(0.0, 0.0, Some("p")).expect("spawn");
        tick(&mut world, &TickInput::default().drive("p", Vec2::X), 0.1).expect("tick");
        tick(&mut world, &TickInput::default().stop("p"), 0.1).expect("tick");
        let velocity = world.get("p").expect("p").velocity();

        tick(&mut world, &TickInput::default(), 0.1).expect("tick");
        assert!((world.get("p").expect("p").velocity() - velocity).length() < 1e-6);
    }

    #[test]
    fn test_stepper_runs_whole_ticks() {
        let mut world = world();
        let mut stepper = Stepper::new(0.01, 8);

        assert_eq!(stepper.advance(&mut world, &TickInput::default(), 0.035).expect("advance"), 3);
        assert!((stepper.pending() - 0.005).abs() < 1e-4);
        assert_eq!(world.time_ticks(), 3);
    }

    #[test]
    fn test_stepper_caps_substeps() {
        let mut world = world();
        let mut stepper = Stepper::new(0.01, 4);

        assert_eq!(stepper.advance(&mut world, &TickInput::default(), 1.0).expect("advance"), 4);
        // Frame time is truncated to 0.1 s and the uncovered 0.06 s dropped
        assert_eq!(stepper.pending(), 0.0);
    }

    #[test]
    fn test_stalled_frames_do_not_bank_time() {
        let mut world = world();
        let mut stepper = Stepper::new(0.01, 4);

        for _ in 0..100 {
            let ran = stepper
                .advance(&mut world, &TickInput::default(), 1.0)
                .expect("advance");
            assert_eq!(ran, 4);
            assert!(stepper.pending() < 0.01);
        }
        assert_eq!(world.time_ticks(), 400);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut world = world();
            world.spawn_arena("arena").expect("arena");
            for i in 0..6 {
                world
                    .spawn_particle(i as f32 - 3.0, (i % 2) as f32, None)
                    .expect("spawn");
            }
            let input = TickInput::default()
                .drive("1", Vec2::new(1.0, 0.3))
                .drive("4", Vec2::new(-1.0, 0.0));
            for _ in 0..200 {
                tick(&mut world, &input, 1.0 / 60.0).expect("tick");
            }
            world.particles().map(|p| p.position()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
