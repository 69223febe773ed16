//! Simulation core
//!
//! Everything that keeps the game's actors and the physics engine in sync.
//! This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by actor id)
//! - No rendering or platform dependencies

pub mod actor;
pub mod core;
pub mod particle;
pub mod spawn;
pub mod summary;
pub mod tick;
pub mod world;

pub use actor::{Actor, ActorId, ActorKind};
pub use self::core::Core;
pub use particle::{ParticleState, particle_body_desc};
pub use spawn::{OriginSpawn, SpawnPoints, TeamSpawns};
pub use summary::{ParticleInstance, ParticleSummary, WorldSummary};
pub use tick::{MoveIntent, Stepper, TickInput, tick};
pub use world::World;
