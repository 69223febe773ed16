//! Error type for world and settings operations

use thiserror::Error;

use crate::sim::ActorId;

/// Errors surfaced to the world owner / tick driver. Nothing here is retried.
#[derive(Debug, Error)]
pub enum SimError {
    /// Another live actor already holds this id
    #[error("actor id {0} is already in use")]
    DuplicateId(ActorId),

    #[error("no actor with id {0}")]
    UnknownActor(ActorId),

    #[error("actor {0} is not a particle")]
    NotAParticle(ActorId),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
