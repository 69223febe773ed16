//! Renderer-facing summaries
//!
//! Read-only snapshots built from the actors' cached state after a tick. The
//! renderer never sees bodies, registries or the engine.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId};
use super::world::World;
use crate::error::SimResult;
use crate::physics::PhysicsEngine;

/// What the renderer knows about one particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSummary {
    pub id: ActorId,
    pub team: u32,
    pub position: Vec2,
    pub full: bool,
}

impl ParticleSummary {
    /// `None` for actors that aren't particles
    pub fn from_actor(actor: &Actor) -> Option<Self> {
        let state = actor.as_particle()?;
        Some(Self {
            id: actor.id().clone(),
            team: state.team,
            position: actor.position(),
            full: state.full,
        })
    }

    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            team: self.team,
            full: self.full as u32,
        }
    }
}

/// Per-instance GPU record for particle drawing
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 2],
    pub team: u32,
    /// 1 = filled, 0 = outline
    pub full: u32,
}

/// Snapshot of every particle after a tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub tick: u64,
    pub particles: Vec<ParticleSummary>,
}

impl WorldSummary {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Instance buffer contents, in summary order
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles.iter().map(ParticleSummary::instance).collect()
    }
}

impl<P: PhysicsEngine> World<P> {
    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            tick: self.time_ticks,
            particles: self
                .particles()
                .filter_map(ParticleSummary::from_actor)
                .collect(),
        }
    }
}
