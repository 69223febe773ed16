//! Spawn point providers
//!
//! The world asks its provider for a position every time a particle respawns.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::actor::Actor;
use crate::polar_to_cartesian;
use crate::settings::{Settings, SpawnPolicy};

/// Chooses where a particle (re)enters the arena
pub trait SpawnPoints {
    fn spawn_point(&mut self, particle: &Actor) -> Vec2;
}

/// Everyone spawns at the arena center
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginSpawn;

impl SpawnPoints for OriginSpawn {
    fn spawn_point(&mut self, _particle: &Actor) -> Vec2 {
        Vec2::ZERO
    }
}

/// Seeded jitter around a base point per team.
///
/// Teams 1 and 2 face each other across the x axis at half the arena width;
/// any further team gets a base on a ring between them.
#[derive(Debug, Clone)]
pub struct TeamSpawns {
    half_extents: Vec2,
    jitter: f32,
    rng: Pcg32,
}

impl TeamSpawns {
    pub fn new(half_extents: Vec2, jitter: f32, seed: u64) -> Self {
        Self {
            half_extents,
            jitter,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Center of a team's spawn area
    pub fn base(&self, team: u32) -> Vec2 {
        let reach = 0.5 * self.half_extents.x;
        match team {
            1 => Vec2::new(-reach, 0.0),
            2 => Vec2::new(reach, 0.0),
            n => {
                let theta = n as f32 * std::f32::consts::FRAC_PI_3;
                polar_to_cartesian(0.5 * self.half_extents.min_element(), theta)
            }
        }
    }
}

impl SpawnPoints for TeamSpawns {
    fn spawn_point(&mut self, particle: &Actor) -> Vec2 {
        let team = particle.as_particle().map(|p| p.team).unwrap_or(1);
        let base = self.base(team);
        if self.jitter <= 0.0 {
            return base;
        }
        let r = self.jitter * self.rng.random::<f32>().sqrt();
        let theta = self.rng.random_range(0.0..std::f32::consts::TAU);
        base + polar_to_cartesian(r, theta)
    }
}

/// Build the provider selected in settings
pub fn from_settings(settings: &Settings) -> Box<dyn SpawnPoints> {
    match settings.spawn_policy {
        SpawnPolicy::Origin => Box::new(OriginSpawn),
        SpawnPolicy::Team => Box::new(TeamSpawns::new(
            settings.arena_half_extents(),
            settings.spawn_jitter,
            settings.spawn_seed,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyHandle;
    use crate::sim::{ActorId, ActorKind, ParticleState};

    fn particle_on_team(team: u32) -> Actor {
        let mut state = ParticleState::new();
        state.team = team;
        Actor::new(
            ActorId::from("p"),
            BodyHandle {
                index: 0,
                generation: 0,
            },
            ActorKind::Particle(state),
        )
    }

    #[test]
    fn test_team_spawns_stay_near_base() {
        let mut spawns = TeamSpawns::new(Vec2::new(10.0, 6.0), 1.0, 7);
        for team in [1, 2, 3] {
            let particle = particle_on_team(team);
            let base = spawns.base(team);
            for _ in 0..50 {
                let point = spawns.spawn_point(&particle);
                assert!(point.distance(base) <= 1.0 + 1e-5);
            }
        }
        assert_eq!(spawns.base(1), Vec2::new(-5.0, 0.0));
        assert_eq!(spawns.base(2), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_team_spawns_are_deterministic() {
        let particle = particle_on_team(2);
        let mut a = TeamSpawns::new(Vec2::new(10.0, 6.0), 2.0, 99);
        let mut b = TeamSpawns::new(Vec2::new(10.0, 6.0), 2.0, 99);
        for _ in 0..10 {
            assert_eq!(a.spawn_point(&particle), b.spawn_point(&particle));
        }
    }

    #[test]
    fn test_origin_spawn() {
        assert_eq!(OriginSpawn.spawn_point(&particle_on_team(1)), Vec2::ZERO);
    }
}
