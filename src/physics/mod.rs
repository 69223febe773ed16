//! Rigid-body physics capability interface
//!
//! The simulation core never owns a physics engine implementation. It talks to
//! one through [`PhysicsEngine`]: bodies are created from a [`BodyDesc`], their
//! kinematic state is read and written through handles, and collision state is
//! exposed as linked fixture and contact-edge lists that can be walked from a
//! body outward.
//!
//! [`SimplePhysics`] is the reference engine used by the demo binary and tests.

pub mod simple;

pub use simple::SimplePhysics;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::ActorId;

/// Generational handle to a body owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Handle to a collision shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureHandle(pub u32);

/// Handle to one entry of a body's contact-edge list.
///
/// Only valid until the next [`PhysicsEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactEdgeHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    #[default]
    Dynamic,
}

/// Everything needed to allocate a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    /// Fast-moving body; the engine must prevent it tunneling through thin geometry
    pub bullet: bool,
    pub linear_damping: f32,
    /// Rotation locked: angular velocity is ignored during integration
    pub fixed_rotation: bool,
    pub position: Vec2,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            bullet: false,
            linear_damping: 0.0,
            fixed_rotation: false,
            position: Vec2::ZERO,
        }
    }
}

impl BodyDesc {
    /// Static body at `position`
    pub fn fixed(position: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            position,
            ..Default::default()
        }
    }
}

/// Mass properties of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassData {
    pub mass: f32,
    /// Center of mass offset in body space
    pub center: Vec2,
    /// Rotational inertia about the center of mass
    pub inertia: f32,
}

/// Collision shape in body space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32, offset: Vec2 },
    /// Axis-aligned box
    Rect { half_extents: Vec2, offset: Vec2 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle {
            radius,
            offset: Vec2::ZERO,
        }
    }

    pub fn rect(half_extents: Vec2, offset: Vec2) -> Self {
        Shape::Rect {
            half_extents,
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDesc {
    pub shape: Shape,
    /// Bounciness (0 = inelastic, 1 = fully elastic)
    pub restitution: f32,
}

impl FixtureDesc {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            restitution: 0.0,
        }
    }
}

/// A collision shape attached to a body, linked to the body's next fixture
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub body: BodyHandle,
    pub shape: Shape,
    pub restitution: f32,
    pub next: Option<FixtureHandle>,
}

/// An active contact pair produced by the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub fixture_a: FixtureHandle,
    pub fixture_b: FixtureHandle,
    /// Contact normal pointing from A to B
    pub normal: Vec2,
    /// Overlap depth before resolution
    pub depth: f32,
}

/// One body's view of a contact: the pair plus the body on the other side
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEdge {
    pub contact: Contact,
    pub other: BodyHandle,
    pub next: Option<ContactEdgeHandle>,
}

/// Capability set the simulation core needs from a rigid-body engine.
///
/// Passing a handle whose body has been destroyed is a caller bug; engines may
/// panic the way slice indexing does.
pub trait PhysicsEngine {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    fn destroy_body(&mut self, body: BodyHandle);
    fn contains_body(&self, body: BodyHandle) -> bool;

    fn position(&self, body: BodyHandle) -> Vec2;
    fn set_position(&mut self, body: BodyHandle, position: Vec2);
    fn angle(&self, body: BodyHandle) -> f32;
    fn set_angle(&mut self, body: BodyHandle, angle: f32);
    fn linear_velocity(&self, body: BodyHandle) -> Vec2;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2);
    fn angular_velocity(&self, body: BodyHandle) -> f32;
    fn set_angular_velocity(&mut self, body: BodyHandle, omega: f32);

    fn set_mass_data(&mut self, body: BodyHandle, mass: MassData);
    /// Accumulate a force through the center of mass for the next step
    fn apply_force_to_center(&mut self, body: BodyHandle, force: Vec2);

    fn set_user_data(&mut self, body: BodyHandle, data: ActorId);
    fn user_data(&self, body: BodyHandle) -> Option<&ActorId>;

    fn create_fixture(&mut self, body: BodyHandle, desc: &FixtureDesc) -> FixtureHandle;
    /// Head of the body's fixture list
    fn fixture_list(&self, body: BodyHandle) -> Option<FixtureHandle>;
    fn fixture(&self, fixture: FixtureHandle) -> &Fixture;

    /// Head of the body's contact-edge list
    fn contact_list(&self, body: BodyHandle) -> Option<ContactEdgeHandle>;
    fn contact_edge(&self, edge: ContactEdgeHandle) -> &ContactEdge;

    /// Integrate every body once and rebuild contacts
    fn step(&mut self, dt: f32);
}

/// Lazy walk over a body's fixture list
pub struct Fixtures<'a, P: PhysicsEngine + ?Sized> {
    engine: &'a P,
    cursor: Option<FixtureHandle>,
}

impl<'a, P: PhysicsEngine + ?Sized> Fixtures<'a, P> {
    pub fn new(engine: &'a P, body: BodyHandle) -> Self {
        Self {
            engine,
            cursor: engine.fixture_list(body),
        }
    }

    /// Walk that yields nothing, for actors without a live body
    pub fn empty(engine: &'a P) -> Self {
        Self {
            engine,
            cursor: None,
        }
    }
}

impl<P: PhysicsEngine + ?Sized> Clone for Fixtures<'_, P> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine,
            cursor: self.cursor,
        }
    }
}

impl<'a, P: PhysicsEngine + ?Sized> Iterator for Fixtures<'a, P> {
    type Item = (FixtureHandle, &'a Fixture);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let fixture = self.engine.fixture(handle);
        self.cursor = fixture.next;
        Some((handle, fixture))
    }
}

/// Lazy walk over a body's contact-edge list
pub struct Contacts<'a, P: PhysicsEngine + ?Sized> {
    engine: &'a P,
    cursor: Option<ContactEdgeHandle>,
}

impl<'a, P: PhysicsEngine + ?Sized> Contacts<'a, P> {
    pub fn new(engine: &'a P, body: BodyHandle) -> Self {
        Self {
            engine,
            cursor: engine.contact_list(body),
        }
    }

    pub fn empty(engine: &'a P) -> Self {
        Self {
            engine,
            cursor: None,
        }
    }
}

impl<P: PhysicsEngine + ?Sized> Clone for Contacts<'_, P> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine,
            cursor: self.cursor,
        }
    }
}

impl<'a, P: PhysicsEngine + ?Sized> Iterator for Contacts<'a, P> {
    type Item = &'a ContactEdge;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let edge = self.engine.contact_edge(handle);
        self.cursor = edge.next;
        Some(edge)
    }
}
