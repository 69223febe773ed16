//! World: owner of the physics engine and the actor/particle registries
//!
//! Registries are ordered maps keyed by actor id so every pass over them has a
//! stable, deterministic order.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::actor::{Actor, ActorId, ActorKind};
use super::spawn::{self, SpawnPoints};
use crate::consts::ARENA_WALL;
use crate::error::{SimError, SimResult};
use crate::physics::{BodyDesc, BodyHandle, FixtureDesc, PhysicsEngine, Shape, SimplePhysics};
use crate::settings::Settings;

pub struct World<P: PhysicsEngine = SimplePhysics> {
    pub(crate) physics: P,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    pub(crate) particles: BTreeSet<ActorId>,
    pub(crate) spawns: Box<dyn SpawnPoints>,
    pub(crate) settings: Settings,
    /// Last sequence number handed out as a default particle id
    pub(crate) particle_seq: u64,
    /// Completed simulation ticks
    pub(crate) time_ticks: u64,
}

impl World<SimplePhysics> {
    /// World backed by the reference engine
    pub fn with_settings(settings: Settings) -> Self {
        Self::new(SimplePhysics::new(), settings)
    }
}

impl<P: PhysicsEngine> World<P> {
    pub fn new(physics: P, settings: Settings) -> Self {
        let spawns = spawn::from_settings(&settings);
        log::info!(
            "World created (spawn policy: {}, max speed: {})",
            settings.spawn_policy.as_str(),
            settings.max_speed
        );
        Self {
            physics,
            actors: BTreeMap::new(),
            particles: BTreeSet::new(),
            spawns,
            settings,
            particle_seq: 0,
            time_ticks: 0,
        }
    }

    /// Replace the spawn point provider
    pub fn set_spawns(&mut self, spawns: Box<dyn SpawnPoints>) {
        self.spawns = spawns;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn get(&self, id: &str) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actors.contains_key(id)
    }

    /// Every registered actor in id order
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Snapshot of registered ids, safe to hold while mutating the world
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.keys().cloned().collect()
    }

    pub(crate) fn actor(&self, id: &str) -> SimResult<&Actor> {
        self.actors
            .get(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))
    }

    pub(crate) fn actor_mut(&mut self, id: &str) -> SimResult<&mut Actor> {
        self.actors
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))
    }

    /// Register an actor of `kind` with a fresh body built from `desc`.
    ///
    /// Fails without touching the registry or the engine if `id` is taken.
    pub(crate) fn insert_actor(
        &mut self,
        id: ActorId,
        desc: &BodyDesc,
        kind: ActorKind,
    ) -> SimResult<&mut Actor> {
        if self.actors.contains_key(&id) {
            log::warn!("Rejected actor construction: id {} is already in use", id);
            return Err(SimError::DuplicateId(id));
        }

        let body = self.physics.create_body(desc);
        self.physics.set_user_data(body, id.clone());

        let mut actor = Actor::new(id.clone(), body, kind);
        actor.max_speed = self.settings.max_speed;
        log::debug!("Actor {} ({}) created", id, actor.label());

        Ok(self.actors.entry(id).or_insert(actor))
    }

    /// Construct a plain actor around a body built from `desc`
    pub fn spawn_actor(&mut self, id: impl Into<ActorId>, desc: &BodyDesc) -> SimResult<ActorId> {
        let actor = self.insert_actor(id.into(), desc, ActorKind::Plain)?;
        Ok(actor.id().clone())
    }

    /// Construct the static arena boundary: four walls enclosing the
    /// configured half extents
    pub fn spawn_arena(&mut self, id: impl Into<ActorId>) -> SimResult<ActorId> {
        let half = self.settings.arena_half_extents();
        let actor = self.insert_actor(
            id.into(),
            &BodyDesc::fixed(Vec2::ZERO),
            ActorKind::Arena { half_extents: half },
        )?;
        let (id, body) = (actor.id().clone(), actor.body());

        let t = ARENA_WALL;
        let walls = [
            (Vec2::new(0.5 * t, half.y + t), Vec2::new(-half.x - 0.5 * t, 0.0)),
            (Vec2::new(0.5 * t, half.y + t), Vec2::new(half.x + 0.5 * t, 0.0)),
            (Vec2::new(half.x + t, 0.5 * t), Vec2::new(0.0, -half.y - 0.5 * t)),
            (Vec2::new(half.x + t, 0.5 * t), Vec2::new(0.0, half.y + 0.5 * t)),
        ];
        for (half_extents, offset) in walls {
            self.physics
                .create_fixture(body, &FixtureDesc::new(Shape::rect(half_extents, offset)));
        }

        self.update_configuration(id.as_str())?;
        log::info!("Arena {} spans {:?}", id, half);
        Ok(id)
    }

    /// Read the body, clamp its velocity and refresh the actor's cache
    pub fn update_configuration(&mut self, id: &str) -> SimResult<()> {
        let actor = self
            .actors
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))?;
        actor.update_configuration(&mut self.physics);
        Ok(())
    }

    /// Post-integration hook: clamp-and-cache first, then kind-specific
    /// reactions
    pub fn post_step(&mut self, id: &str) -> SimResult<()> {
        let actor = self
            .actors
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))?;
        actor.post_step(&mut self.physics);

        if actor.is_particle() {
            self.particle_post_step(id)?;
        }
        Ok(())
    }

    /// Unregister an actor, mark it removed and release its body.
    ///
    /// The removed record is handed back to the caller.
    pub fn remove(&mut self, id: &str) -> SimResult<Actor> {
        let mut actor = self
            .actors
            .remove(id)
            .ok_or_else(|| SimError::UnknownActor(ActorId::from(id)))?;
        self.particles.remove(id);
        actor.mark_removed();

        if self.physics.contains_body(actor.body()) {
            self.physics.destroy_body(actor.body());
        }
        log::debug!("Actor {} ({}) removed", id, actor.label());
        Ok(actor)
    }

    /// Resolve a body back to its live actor through the user-data slot
    pub fn actor_for_body(&self, body: BodyHandle) -> Option<&Actor> {
        if !self.physics.contains_body(body) {
            return None;
        }
        let id = self.physics.user_data(body)?;
        self.actors.get(id).filter(|actor| actor.body() == body)
    }

    /// Ids of live actors currently touching `id`, in contact order
    pub fn contact_actors(&self, id: &str) -> SimResult<Vec<ActorId>> {
        let actor = self.actor(id)?;
        Ok(actor
            .contacts(&self.physics)
            .filter_map(|edge| self.actor_for_body(edge.other))
            .map(|other| other.id().clone())
            .collect())
    }
}
