//! Simulation settings
//!
//! Persisted as JSON. Missing fields fall back to the defaults in `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};

/// Spawn point policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// Every particle respawns at the arena center
    #[default]
    Origin,
    /// Seeded jitter around a per-team base
    Team,
}

impl SpawnPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpawnPolicy::Origin => "origin",
            SpawnPolicy::Team => "team",
        }
    }
}

/// Simulation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Stepping ===
    /// Fixed timestep in seconds
    pub sim_dt: f32,
    /// Substep cap per frame for the fixed-timestep stepper
    pub max_substeps: u32,

    // === Actors ===
    /// Velocity cap applied to newly constructed actors
    pub max_speed: f32,
    /// Force magnitude applied to driven particles
    pub move_power: f32,
    pub particle_mass: f32,
    pub particle_inertia: f32,
    pub particle_radius: f32,

    // === Arena ===
    pub arena_half_extents: [f32; 2],

    // === Spawning ===
    pub spawn_policy: SpawnPolicy,
    /// Seed for team spawn jitter
    pub spawn_seed: u64,
    /// Jitter radius around a team base
    pub spawn_jitter: f32,

    // === Contact reactions ===
    /// Enables knockback between touching particles and arena repulsion
    pub contact_reactions: bool,
    pub knockback_force: f32,
    pub arena_repulsion: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sim_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,

            max_speed: DEFAULT_MAX_SPEED,
            move_power: MOVE_POWER,
            particle_mass: PARTICLE_MASS,
            particle_inertia: PARTICLE_INERTIA,
            particle_radius: PARTICLE_RADIUS,

            arena_half_extents: [ARENA_HX, ARENA_HY],

            spawn_policy: SpawnPolicy::Origin,
            spawn_seed: 0,
            spawn_jitter: 1.0,

            contact_reactions: false,
            knockback_force: KNOCKBACK_FORCE,
            arena_repulsion: ARENA_REPULSION,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file, falling back to defaults when the
    /// file is missing or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(SimError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Arena half extents as a vector
    pub fn arena_half_extents(&self) -> glam::Vec2 {
        glam::Vec2::from(self.arena_half_extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "max_speed": 3.5, "spawn_policy": "team" }"#)
            .expect("valid json");
        assert_eq!(settings.max_speed, 3.5);
        assert_eq!(settings.spawn_policy, SpawnPolicy::Team);
        assert_eq!(settings.move_power, MOVE_POWER);
        assert!(!settings.contact_reactions);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut settings = Settings::default();
        settings.contact_reactions = true;
        settings.spawn_seed = 42;
        let json = settings.to_json().expect("serialize");
        assert_eq!(Settings::from_json(&json).expect("parse"), settings);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Settings::from_json("{ not json").is_err());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let settings = Settings::load("/nonexistent/particle-arena/settings.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("particle-arena-settings-{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.max_speed = 4.0;
        settings.save(&path).expect("save");
        assert_eq!(Settings::load(&path), settings);
        let _ = std::fs::remove_file(&path);
    }
}
