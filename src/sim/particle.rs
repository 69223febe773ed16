//! Particles: team-affiliated, drivable actors
//!
//! A particle is a dynamic bullet body with locked rotation, unit mass and a
//! circle fixture. Team changes always go through a full respawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId, ActorKind};
use super::core::Core;
use super::world::World;
use crate::error::{SimError, SimResult};
use crate::physics::{BodyDesc, BodyKind, FixtureDesc, MassData, PhysicsEngine, Shape};
use crate::{dir_to_from, distance, normalize};

/// Particle-specific actor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleState {
    pub team: u32,
    /// When set, `pre_step` pushes the body along `move_dir`
    pub driven: bool,
    /// Desired heading; normalized before use
    pub move_dir: Vec2,
    pub full: bool,
    pub core: Core,
}

impl Default for ParticleState {
    fn default() -> Self {
        Self {
            team: 1,
            driven: false,
            move_dir: Vec2::ZERO,
            full: false,
            core: Core::new(),
        }
    }
}

impl ParticleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propulsive force for this tick, if driven
    pub fn drive_force(&self, move_power: f32) -> Option<Vec2> {
        self.driven.then(|| normalize(self.move_dir) * move_power)
    }
}

/// Body descriptor shared by every particle
pub fn particle_body_desc() -> BodyDesc {
    BodyDesc {
        kind: BodyKind::Dynamic,
        bullet: true,
        linear_damping: 0.0,
        fixed_rotation: true,
        position: Vec2::ZERO,
    }
}

impl<P: PhysicsEngine> World<P> {
    /// Strictly increasing default id, skipping ids already taken
    fn next_particle_id(&mut self) -> ActorId {
        loop {
            self.particle_seq += 1;
            let id = ActorId::new(self.particle_seq.to_string());
            if !self.actors.contains_key(&id) {
                return id;
            }
        }
    }

    /// Construct a particle at `(x, y)`.
    ///
    /// Without an explicit id the next value of the particle counter is used.
    pub fn spawn_particle(&mut self, x: f32, y: f32, id: Option<&str>) -> SimResult<ActorId> {
        let id = match id {
            Some(id) => ActorId::from(id),
            None => self.next_particle_id(),
        };

        let actor = self.insert_actor(
            id,
            &particle_body_desc(),
            ActorKind::Particle(ParticleState::new()),
        )?;
        let (id, body) = (actor.id().clone(), actor.body());

        self.physics.set_mass_data(
            body,
            MassData {
                mass: self.settings.particle_mass,
                center: Vec2::ZERO,
                inertia: self.settings.particle_inertia,
            },
        );
        self.physics.set_position(body, Vec2::new(x, y));
        self.physics.create_fixture(
            body,
            &FixtureDesc::new(Shape::circle(self.settings.particle_radius)),
        );

        self.particles.insert(id.clone());
        self.update_configuration(id.as_str())?;
        log::debug!("Particle {} spawned at ({}, {})", id, x, y);
        Ok(id)
    }

    pub fn particle(&self, id: &str) -> SimResult<&Actor> {
        let actor = self.actor(id)?;
        if actor.is_particle() {
            Ok(actor)
        } else {
            Err(SimError::NotAParticle(actor.id().clone()))
        }
    }

    fn particle_state(&self, id: &str) -> SimResult<&ParticleState> {
        let actor = self.actor(id)?;
        actor
            .as_particle()
            .ok_or_else(|| SimError::NotAParticle(actor.id().clone()))
    }

    fn particle_state_mut(&mut self, id: &str) -> SimResult<&mut ParticleState> {
        let actor = self.actor_mut(id)?;
        let actor_id = actor.id().clone();
        actor.as_particle_mut().ok_or(SimError::NotAParticle(actor_id))
    }

    /// Every registered particle in id order
    pub fn particles(&self) -> impl Iterator<Item = &Actor> {
        self.particles.iter().filter_map(|id| self.actors.get(id))
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particle_ids(&self) -> Vec<ActorId> {
        self.particles.iter().cloned().collect()
    }

    /// Switch team; always followed by a full respawn
    pub fn join_team(&mut self, id: &str, team: u32) -> SimResult<()> {
        self.particle_state_mut(id)?.team = team;
        log::debug!("Particle {} joined team {}", id, team);
        self.respawn(id)
    }

    /// Move the particle to a fresh spawn point with zeroed motion and a
    /// revived core. The cache is refreshed before returning.
    pub fn respawn(&mut self, id: &str) -> SimResult<()> {
        self.particle(id)?;
        let actor = self
            .actors
            .get(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))?;
        let body = actor.body();
        let spawn_point = self.spawns.spawn_point(actor);

        self.physics.set_position(body, spawn_point);
        self.physics.set_linear_velocity(body, Vec2::ZERO);
        self.physics.set_angle(body, 0.0);
        self.physics.set_angular_velocity(body, 0.0);

        self.particle_state_mut(id)?.core.revive();
        self.update_configuration(id)
    }

    pub fn set_drive(&mut self, id: &str, driven: bool, move_dir: Vec2) -> SimResult<()> {
        let state = self.particle_state_mut(id)?;
        state.driven = driven;
        state.move_dir = move_dir;
        Ok(())
    }

    pub fn set_full(&mut self, id: &str, full: bool) -> SimResult<()> {
        self.particle_state_mut(id)?.full = full;
        Ok(())
    }

    /// Particles on the same team, excluding `id` itself
    pub fn allies(&self, id: &str) -> SimResult<Vec<&Actor>> {
        let team = self.particle_state(id)?.team;
        Ok(self
            .particles()
            .filter(|p| p.as_particle().is_some_and(|s| s.team == team) && p.id().as_str() != id)
            .collect())
    }

    /// Particles on any other team
    pub fn enemies(&self, id: &str) -> SimResult<Vec<&Actor>> {
        let team = self.particle_state(id)?.team;
        Ok(self
            .particles()
            .filter(|p| p.as_particle().is_some_and(|s| s.team != team))
            .collect())
    }

    /// Distance from `position` to the nearest ally's cached position.
    ///
    /// `f32::INFINITY` when the particle has no allies.
    pub fn ally_distance(&self, id: &str, position: Vec2) -> SimResult<f32> {
        Ok(self
            .allies(id)?
            .iter()
            .map(|ally| distance(ally.position(), position))
            .fold(f32::INFINITY, f32::min))
    }

    /// Apply this tick's propulsion. No-op for undriven particles.
    pub fn pre_step(&mut self, id: &str) -> SimResult<()> {
        let move_power = self.settings.move_power;
        let actor = self.particle(id)?;
        let body = actor.body();
        if let Some(force) = actor.as_particle().and_then(|s| s.drive_force(move_power)) {
            self.physics.apply_force_to_center(body, force);
        }
        Ok(())
    }

    /// Particle half of `post_step`, run after the base clamp-and-cache
    pub(crate) fn particle_post_step(&mut self, id: &str) -> SimResult<()> {
        if self.settings.contact_reactions {
            let force = self.contact_reaction_force(id)?;
            if force != Vec2::ZERO {
                let body = self.actor(id)?.body();
                self.physics.apply_force_to_center(body, force);
            }
        }
        self.particle_state_mut(id)?.core.tick();
        Ok(())
    }

    /// Knockback away from every touching particle plus a pull back toward
    /// the center while touching the arena wall
    fn contact_reaction_force(&self, id: &str) -> SimResult<Vec2> {
        let actor = self.particle(id)?;
        let physics = self.physics();
        let mut force = Vec2::ZERO;
        for edge in actor.contacts(physics) {
            let Some(other) = self.actor_for_body(edge.other) else {
                continue;
            };
            match other.kind {
                ActorKind::Particle(_) => {
                    let away = dir_to_from(actor.position(), other.position());
                    force += away * self.settings.knockback_force;
                }
                ActorKind::Arena { .. } => {
                    force -= normalize(actor.position()) * self.settings.arena_repulsion;
                }
                ActorKind::Plain => {}
            }
        }
        Ok(force)
    }
}
