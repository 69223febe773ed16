//! Particle Arena - entity/physics synchronization core
//!
//! Core modules:
//! - `physics`: Capability interface to the rigid-body engine, plus a reference engine
//! - `sim`: Actors, particles, the world registries and the fixed-order tick driver
//! - `settings`: Data-driven tunables loaded from JSON
//! - `error`: Error type shared by every fallible operation

pub mod error;
pub mod physics;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::Settings;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default velocity cap for every actor
    pub const DEFAULT_MAX_SPEED: f32 = 2.0;
    /// Propulsive force applied to a driven particle
    pub const MOVE_POWER: f32 = 5.0;

    /// Particle body shaping
    pub const PARTICLE_MASS: f32 = 1.0;
    pub const PARTICLE_INERTIA: f32 = 0.25;
    pub const PARTICLE_RADIUS: f32 = 0.5;

    /// Arena half extents
    pub const ARENA_HX: f32 = 10.0;
    pub const ARENA_HY: f32 = 6.0;
    /// Wall thickness of the arena boundary fixtures
    pub const ARENA_WALL: f32 = 1.0;

    /// Contact reaction strengths (only used when reactions are enabled)
    pub const KNOCKBACK_FORCE: f32 = 5.0;
    pub const ARENA_REPULSION: f32 = 15.0;
}

/// Cap the magnitude of `v` at `max`, keeping its direction.
///
/// Vectors already within the cap are returned unchanged.
#[inline]
pub fn clamp_vec(v: Vec2, max: f32) -> Vec2 {
    let length = v.length();
    if length > max && length > 0.0 {
        v * (max / length)
    } else {
        v
    }
}

/// Unit vector in the direction of `v`, or zero for the zero vector
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit direction pointing to `to` from `from`
#[inline]
pub fn dir_to_from(to: Vec2, from: Vec2) -> Vec2 {
    normalize(to - from)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_vec_caps_magnitude() {
        let clamped = clamp_vec(Vec2::new(10.0, 0.0), 2.0);
        assert!((clamped - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_clamp_vec_leaves_slow_vectors() {
        let v = Vec2::new(1.0, -1.0);
        assert_eq!(clamp_vec(v, 2.0), v);
        assert_eq!(clamp_vec(Vec2::ZERO, 2.0), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(normalize(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(normalize(Vec2::new(0.0, -3.0)), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_dir_to_from() {
        let dir = dir_to_from(Vec2::new(3.0, 0.0), Vec2::new(1.0, 0.0));
        assert_eq!(dir, Vec2::X);
        assert!((distance(Vec2::ZERO, Vec2::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_clamp_never_exceeds_cap(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0, cap in 0.1f32..50.0) {
            let v = Vec2::new(x, y);
            let clamped = clamp_vec(v, cap);
            prop_assert!(clamped.length() <= cap * (1.0 + 1e-5));
            if v.length() > cap {
                prop_assert!((clamped.length() - cap).abs() < cap * 1e-4);
                prop_assert!((normalize(clamped) - normalize(v)).length() < 1e-4);
            } else {
                prop_assert_eq!(clamped, v);
            }
        }

        #[test]
        fn prop_normalize_is_unit_or_zero(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0) {
            let n = normalize(Vec2::new(x, y));
            prop_assert!(n == Vec2::ZERO || (n.length() - 1.0).abs() < 1e-4);
        }
    }
}
