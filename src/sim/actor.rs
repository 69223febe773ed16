//! Actor: one logical entity bound to exactly one physics body
//!
//! The actor keeps a cached snapshot of its body's position and velocity.
//! The snapshot is only authoritative right after `post_step` /
//! `update_configuration`; between those points the engine owns the truth.

use std::borrow::Borrow;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particle::ParticleState;
use crate::clamp_vec;
use crate::consts::DEFAULT_MAX_SPEED;
use crate::physics::{BodyHandle, Contacts, Fixtures, PhysicsEngine};

/// Stable identity of an actor, also stored in its body's user-data slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ActorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Kind-specific state carried by an actor
#[derive(Debug, Clone)]
pub enum ActorKind {
    /// Plain body with no gameplay behavior
    Plain,
    /// Static arena boundary
    Arena { half_extents: Vec2 },
    Particle(ParticleState),
}

impl ActorKind {
    /// Coarse dispatch tag
    pub fn label(&self) -> &'static str {
        match self {
            ActorKind::Plain => "actor",
            ActorKind::Arena { .. } => "arena",
            ActorKind::Particle(_) => "particle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    body: BodyHandle,
    removed: bool,
    /// Velocity magnitude cap enforced on every configuration update
    pub max_speed: f32,
    position: Vec2,
    velocity: Vec2,
    pub(crate) kind: ActorKind,
}

impl Actor {
    pub(crate) fn new(id: ActorId, body: BodyHandle, kind: ActorKind) -> Self {
        Self {
            id,
            body,
            removed: false,
            max_speed: DEFAULT_MAX_SPEED,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            kind,
        }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Cached position from the last configuration update
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Cached (clamped) velocity from the last configuration update
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn as_particle(&self) -> Option<&ParticleState> {
        match &self.kind {
            ActorKind::Particle(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_particle_mut(&mut self) -> Option<&mut ParticleState> {
        match &mut self.kind {
            ActorKind::Particle(state) => Some(state),
            _ => None,
        }
    }

    pub fn is_particle(&self) -> bool {
        matches!(self.kind, ActorKind::Particle(_))
    }

    /// Pull the body's state, clamp its velocity to `max_speed`, push the
    /// clamped velocity back into the body and cache both.
    ///
    /// A removed actor has no body; its cache is left as it was.
    pub fn update_configuration<P: PhysicsEngine + ?Sized>(&mut self, physics: &mut P) {
        if self.removed || !physics.contains_body(self.body) {
            return;
        }
        self.position = physics.position(self.body);
        self.velocity = clamp_vec(physics.linear_velocity(self.body), self.max_speed);
        physics.set_linear_velocity(self.body, self.velocity);
    }

    /// Base post-step: clamp and cache. Kind-specific reactions run after this.
    pub fn post_step<P: PhysicsEngine + ?Sized>(&mut self, physics: &mut P) {
        self.update_configuration(physics);
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Collision shapes attached to the body; empty once removed
    pub fn fixtures<'a, P: PhysicsEngine + ?Sized>(&self, physics: &'a P) -> Fixtures<'a, P> {
        if self.removed {
            Fixtures::empty(physics)
        } else {
            Fixtures::new(physics, self.body)
        }
    }

    /// Contact pairs the body is part of after the last step; empty once removed
    pub fn contacts<'a, P: PhysicsEngine + ?Sized>(&self, physics: &'a P) -> Contacts<'a, P> {
        if self.removed {
            Contacts::empty(physics)
        } else {
            Contacts::new(physics, self.body)
        }
    }
}
