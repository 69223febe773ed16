//! Reference rigid-body engine
//!
//! Small, deterministic and good enough for an arena of a few hundred bodies:
//! - Semi-implicit Euler integration with linear damping
//! - Circle and axis-aligned rect fixtures
//! - Brute-force overlap detection, positional correction and impulse response
//! - Bullet bodies split the step into substeps so they can't skip thin walls
//!
//! Contacts found during a step are kept until the next step and exposed as
//! per-body linked edge lists, the same shape a Box2D-style engine uses.

use glam::Vec2;

use super::{
    BodyDesc, BodyHandle, BodyKind, Contact, ContactEdge, ContactEdgeHandle, Fixture,
    FixtureDesc, FixtureHandle, MassData, PhysicsEngine, Shape,
};
use crate::sim::ActorId;

/// Upper bound on bullet substeps within one step
pub const MAX_BULLET_SUBSTEPS: u32 = 8;
/// Fraction of overlap removed per resolution pass
const CORRECTION_PERCENT: f32 = 0.8;
/// Overlap tolerated without positional correction
const CORRECTION_SLOP: f32 = 0.005;

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    bullet: bool,
    linear_damping: f32,
    fixed_rotation: bool,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    inv_mass: f32,
    center: Vec2,
    inertia: f32,
    force: Vec2,
    user_data: Option<ActorId>,
    fixture_list: Option<FixtureHandle>,
    contact_list: Option<ContactEdgeHandle>,
}

impl Body {
    fn new(desc: &BodyDesc) -> Self {
        let dynamic = desc.kind == BodyKind::Dynamic;
        Self {
            kind: desc.kind,
            bullet: desc.bullet,
            linear_damping: desc.linear_damping,
            fixed_rotation: desc.fixed_rotation,
            position: desc.position,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            inv_mass: if dynamic { 1.0 } else { 0.0 },
            center: Vec2::ZERO,
            inertia: if dynamic { 1.0 } else { 0.0 },
            force: Vec2::ZERO,
            user_data: None,
            fixture_list: None,
            contact_list: None,
        }
    }

    fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Shape placed in world space for one substep
#[derive(Debug, Clone, Copy)]
enum WorldShape {
    Circle { center: Vec2, radius: f32 },
    Rect { center: Vec2, half_extents: Vec2 },
}

impl WorldShape {
    /// Smallest feature size, used to size bullet substeps
    fn min_extent(&self) -> f32 {
        match *self {
            WorldShape::Circle { radius, .. } => radius,
            WorldShape::Rect { half_extents, .. } => half_extents.min_element(),
        }
    }
}

/// Deterministic reference implementation of [`PhysicsEngine`]
#[derive(Debug, Clone, Default)]
pub struct SimplePhysics {
    slots: Vec<Slot>,
    free: Vec<u32>,
    fixtures: Vec<Option<Fixture>>,
    free_fixtures: Vec<u32>,
    contacts: Vec<Contact>,
    edges: Vec<ContactEdge>,
    /// Constant acceleration applied to dynamic bodies
    pub gravity: Vec2,
}

impl SimplePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Mass properties of a body; static bodies report zero mass
    pub fn mass_data(&self, handle: BodyHandle) -> MassData {
        let body = self.body(handle);
        MassData {
            mass: if body.inv_mass > 0.0 { 1.0 / body.inv_mass } else { 0.0 },
            center: body.center,
            inertia: body.inertia,
        }
    }

    /// Contacts produced by the last step, in detection order
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    fn body(&self, handle: BodyHandle) -> &Body {
        match self.slots.get(handle.index as usize) {
            Some(Slot {
                generation,
                body: Some(body),
            }) if *generation == handle.generation => body,
            _ => panic!("stale body handle {:?}", handle),
        }
    }

    fn body_mut(&mut self, handle: BodyHandle) -> &mut Body {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot {
                generation,
                body: Some(body),
            }) if *generation == handle.generation => body,
            _ => panic!("stale body handle {:?}", handle),
        }
    }

    fn live_handles(&self) -> Vec<BodyHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.body.is_some())
            .map(|(index, slot)| BodyHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    fn world_shape(&self, fixture: &Fixture) -> WorldShape {
        let body = self.body(fixture.body);
        match fixture.shape {
            Shape::Circle { radius, offset } => WorldShape::Circle {
                center: body.position + Vec2::from_angle(body.angle).rotate(offset),
                radius,
            },
            Shape::Rect {
                half_extents,
                offset,
            } => WorldShape::Rect {
                center: body.position + offset,
                half_extents,
            },
        }
    }

    /// Substeps needed so no bullet moves more than half its smallest feature
    fn substep_count(&self, dt: f32) -> u32 {
        let mut count = 1;
        for slot in &self.slots {
            let Some(body) = &slot.body else { continue };
            if !body.bullet || !body.is_dynamic() {
                continue;
            }
            let velocity = body.linear_velocity + body.force * body.inv_mass * dt;
            let travel = velocity.length() * dt;
            let mut extent = f32::INFINITY;
            let mut cursor = body.fixture_list;
            while let Some(handle) = cursor {
                let Some(fixture) = &self.fixtures[handle.0 as usize] else { break };
                extent = extent.min(self.world_shape(fixture).min_extent());
                cursor = fixture.next;
            }
            if extent.is_finite() && extent > 0.0 {
                let needed = (travel / (0.5 * extent)).ceil() as u32;
                count = count.max(needed);
            }
        }
        count.clamp(1, MAX_BULLET_SUBSTEPS)
    }

    fn integrate(&mut self, h: f32) {
        let gravity = self.gravity;
        for slot in &mut self.slots {
            let Some(body) = &mut slot.body else { continue };
            if !body.is_dynamic() {
                continue;
            }
            body.linear_velocity += (gravity + body.force * body.inv_mass) * h;
            body.linear_velocity *= 1.0 / (1.0 + h * body.linear_damping);
            if body.fixed_rotation || body.inertia <= 0.0 {
                body.angular_velocity = 0.0;
            } else {
                body.angle += body.angular_velocity * h;
            }
            body.position += body.linear_velocity * h;
        }
    }

    /// Detect overlaps between fixtures of different bodies, resolve them and
    /// record each touching pair once per step.
    fn collide(&mut self) {
        let live: Vec<(FixtureHandle, Fixture)> = self
            .fixtures
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.clone().map(|f| (FixtureHandle(i as u32), f)))
            .collect();

        for i in 0..live.len() {
            for j in (i + 1)..live.len() {
                let (ha, fa) = &live[i];
                let (hb, fb) = &live[j];
                if fa.body == fb.body {
                    continue;
                }
                if !self.body(fa.body).is_dynamic() && !self.body(fb.body).is_dynamic() {
                    continue;
                }
                let Some((normal, depth)) =
                    overlap(self.world_shape(fa), self.world_shape(fb))
                else {
                    continue;
                };

                self.resolve(fa.body, fb.body, normal, depth, fa.restitution.max(fb.restitution));

                let contact = Contact {
                    body_a: fa.body,
                    body_b: fb.body,
                    fixture_a: *ha,
                    fixture_b: *hb,
                    normal,
                    depth,
                };
                match self
                    .contacts
                    .iter_mut()
                    .find(|c| c.fixture_a == *ha && c.fixture_b == *hb)
                {
                    Some(existing) => existing.depth = existing.depth.max(depth),
                    None => self.contacts.push(contact),
                }
            }
        }
    }

    fn resolve(&mut self, a: BodyHandle, b: BodyHandle, normal: Vec2, depth: f32, restitution: f32) {
        let (inv_a, vel_a) = {
            let body = self.body(a);
            (body.inv_mass, body.linear_velocity)
        };
        let (inv_b, vel_b) = {
            let body = self.body(b);
            (body.inv_mass, body.linear_velocity)
        };
        let total = inv_a + inv_b;
        if total <= 0.0 {
            return;
        }

        let correction = normal * ((depth - CORRECTION_SLOP).max(0.0) / total * CORRECTION_PERCENT);
        let approach = (vel_b - vel_a).dot(normal);
        let impulse = if approach < 0.0 {
            normal * (-(1.0 + restitution) * approach / total)
        } else {
            Vec2::ZERO
        };

        let body_a = self.body_mut(a);
        body_a.position -= correction * inv_a;
        body_a.linear_velocity -= impulse * inv_a;
        let body_b = self.body_mut(b);
        body_b.position += correction * inv_b;
        body_b.linear_velocity += impulse * inv_b;
    }

    /// Rebuild every body's contact-edge list from `self.contacts`
    fn rebuild_edges(&mut self) {
        self.edges.clear();
        for slot in &mut self.slots {
            if let Some(body) = &mut slot.body {
                body.contact_list = None;
            }
        }
        let contacts = std::mem::take(&mut self.contacts);
        // Prepend in reverse so each list walks in detection order
        for contact in contacts.iter().rev() {
            for (owner, other) in [
                (contact.body_b, contact.body_a),
                (contact.body_a, contact.body_b),
            ] {
                let handle = ContactEdgeHandle(self.edges.len() as u32);
                let body = self.body_mut(owner);
                let next = body.contact_list.replace(handle);
                self.edges.push(ContactEdge {
                    contact: *contact,
                    other,
                    next,
                });
            }
        }
        self.contacts = contacts;
    }
}

/// Overlap test returning the normal from `a` to `b` and the penetration depth
fn overlap(a: WorldShape, b: WorldShape) -> Option<(Vec2, f32)> {
    match (a, b) {
        (
            WorldShape::Circle { center: ca, radius: ra },
            WorldShape::Circle { center: cb, radius: rb },
        ) => {
            let delta = cb - ca;
            let dist = delta.length();
            let reach = ra + rb;
            if dist >= reach {
                return None;
            }
            let normal = if dist > 0.0 { delta / dist } else { Vec2::X };
            Some((normal, reach - dist))
        }
        (
            WorldShape::Circle { center, radius },
            WorldShape::Rect {
                center: rc,
                half_extents,
            },
        ) => circle_rect(center, radius, rc, half_extents).map(|(n, d)| (-n, d)),
        (
            WorldShape::Rect {
                center: rc,
                half_extents,
            },
            WorldShape::Circle { center, radius },
        ) => circle_rect(center, radius, rc, half_extents),
        (
            WorldShape::Rect {
                center: ca,
                half_extents: ha,
            },
            WorldShape::Rect {
                center: cb,
                half_extents: hb,
            },
        ) => {
            let delta = cb - ca;
            let overlap = ha + hb - delta.abs();
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                return None;
            }
            if overlap.x < overlap.y {
                Some((Vec2::new(delta.x.signum(), 0.0), overlap.x))
            } else {
                Some((Vec2::new(0.0, delta.y.signum()), overlap.y))
            }
        }
    }
}

/// Circle against an axis-aligned box. Normal points from the box to the circle.
fn circle_rect(center: Vec2, radius: f32, rect_center: Vec2, half: Vec2) -> Option<(Vec2, f32)> {
    let local = center - rect_center;
    let closest = local.clamp(-half, half);
    let delta = local - closest;
    let dist = delta.length();

    if dist > 0.0 {
        if dist >= radius {
            return None;
        }
        return Some((delta / dist, radius - dist));
    }

    // Center inside the box: push out along the shallowest axis
    let to_edge = half - local.abs();
    if to_edge.x < to_edge.y {
        let sign = if local.x < 0.0 { -1.0 } else { 1.0 };
        Some((Vec2::new(sign, 0.0), to_edge.x + radius))
    } else {
        let sign = if local.y < 0.0 { -1.0 } else { 1.0 };
        Some((Vec2::new(0.0, sign), to_edge.y + radius))
    }
}

impl PhysicsEngine for SimplePhysics {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let body = Body::new(desc);
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                BodyHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                BodyHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn destroy_body(&mut self, handle: BodyHandle) {
        let body = self.body(handle);
        let mut cursor = body.fixture_list;
        while let Some(fixture) = cursor {
            cursor = self.fixtures[fixture.0 as usize]
                .take()
                .and_then(|f| f.next);
            self.free_fixtures.push(fixture.0);
        }

        let slot = &mut self.slots[handle.index as usize];
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);

        self.contacts
            .retain(|c| c.body_a != handle && c.body_b != handle);
        self.rebuild_edges();
    }

    fn contains_body(&self, handle: BodyHandle) -> bool {
        matches!(
            self.slots.get(handle.index as usize),
            Some(Slot { generation, body: Some(_) }) if *generation == handle.generation
        )
    }

    fn position(&self, body: BodyHandle) -> Vec2 {
        self.body(body).position
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        self.body_mut(body).position = position;
    }

    fn angle(&self, body: BodyHandle) -> f32 {
        self.body(body).angle
    }

    fn set_angle(&mut self, body: BodyHandle, angle: f32) {
        self.body_mut(body).angle = angle;
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vec2 {
        self.body(body).linear_velocity
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        let body = self.body_mut(body);
        if body.is_dynamic() {
            body.linear_velocity = velocity;
        }
    }

    fn angular_velocity(&self, body: BodyHandle) -> f32 {
        self.body(body).angular_velocity
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, omega: f32) {
        let body = self.body_mut(body);
        if body.is_dynamic() && !body.fixed_rotation {
            body.angular_velocity = omega;
        }
    }

    fn set_mass_data(&mut self, body: BodyHandle, mass: MassData) {
        let body = self.body_mut(body);
        if !body.is_dynamic() {
            return;
        }
        body.inv_mass = if mass.mass > 0.0 { 1.0 / mass.mass } else { 1.0 };
        body.center = mass.center;
        body.inertia = mass.inertia.max(0.0);
    }

    fn apply_force_to_center(&mut self, body: BodyHandle, force: Vec2) {
        let body = self.body_mut(body);
        if body.is_dynamic() {
            body.force += force;
        }
    }

    fn set_user_data(&mut self, body: BodyHandle, data: ActorId) {
        self.body_mut(body).user_data = Some(data);
    }

    fn user_data(&self, body: BodyHandle) -> Option<&ActorId> {
        self.body(body).user_data.as_ref()
    }

    fn create_fixture(&mut self, body: BodyHandle, desc: &FixtureDesc) -> FixtureHandle {
        let handle = match self.free_fixtures.pop() {
            Some(index) => FixtureHandle(index),
            None => {
                self.fixtures.push(None);
                FixtureHandle((self.fixtures.len() - 1) as u32)
            }
        };
        let next = self.body_mut(body).fixture_list.replace(handle);
        self.fixtures[handle.0 as usize] = Some(Fixture {
            body,
            shape: desc.shape,
            restitution: desc.restitution,
            next,
        });
        handle
    }

    fn fixture_list(&self, body: BodyHandle) -> Option<FixtureHandle> {
        self.body(body).fixture_list
    }

    fn fixture(&self, fixture: FixtureHandle) -> &Fixture {
        match self.fixtures.get(fixture.0 as usize) {
            Some(Some(f)) => f,
            _ => panic!("stale fixture handle {:?}", fixture),
        }
    }

    fn contact_list(&self, body: BodyHandle) -> Option<ContactEdgeHandle> {
        self.body(body).contact_list
    }

    fn contact_edge(&self, edge: ContactEdgeHandle) -> &ContactEdge {
        &self.edges[edge.0 as usize]
    }

    fn step(&mut self, dt: f32) {
        self.contacts.clear();
        let substeps = self.substep_count(dt);
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.integrate(h);
            self.collide();
        }

        for handle in self.live_handles() {
            self.body_mut(handle).force = Vec2::ZERO;
        }
        self.rebuild_edges();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_at(physics: &mut SimplePhysics, position: Vec2) -> BodyHandle {
        physics.create_body(&BodyDesc {
            position,
            ..Default::default()
        })
    }

    #[test]
    fn test_force_integrates_into_velocity() {
        let mut physics = SimplePhysics::new();
        let body = dynamic_at(&mut physics, Vec2::ZERO);
        physics.set_mass_data(
            body,
            MassData {
                mass: 2.0,
                center: Vec2::ZERO,
                inertia: 0.25,
            },
        );
        physics.apply_force_to_center(body, Vec2::new(4.0, 0.0));
        physics.step(0.5);

        // a = F/m = 2, v = a * dt = 1
        assert!((physics.linear_velocity(body) - Vec2::new(1.0, 0.0)).length() < 1e-5);
        assert!(physics.position(body).x > 0.0);

        // Forces are cleared after each step
        physics.step(0.5);
        assert!((physics.linear_velocity(body) - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_static_bodies_ignore_velocity() {
        let mut physics = SimplePhysics::new();
        let wall = physics.create_body(&BodyDesc::fixed(Vec2::new(1.0, 1.0)));
        physics.set_linear_velocity(wall, Vec2::new(5.0, 0.0));
        physics.apply_force_to_center(wall, Vec2::new(5.0, 0.0));
        physics.step(1.0);
        assert_eq!(physics.position(wall), Vec2::new(1.0, 1.0));
        assert_eq!(physics.linear_velocity(wall), Vec2::ZERO);
    }

    #[test]
    fn test_fixed_rotation_locks_angle() {
        let mut physics = SimplePhysics::new();
        let body = physics.create_body(&BodyDesc {
            fixed_rotation: true,
            ..Default::default()
        });
        physics.set_angular_velocity(body, 3.0);
        physics.step(1.0);
        assert_eq!(physics.angle(body), 0.0);
        assert_eq!(physics.angular_velocity(body), 0.0);
    }

    #[test]
    fn test_linear_damping_slows_body() {
        let mut physics = SimplePhysics::new();
        let body = physics.create_body(&BodyDesc {
            linear_damping: 1.0,
            ..Default::default()
        });
        physics.set_linear_velocity(body, Vec2::new(2.0, 0.0));
        physics.step(1.0);
        assert!((physics.linear_velocity(body).x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_overlapping_circles_produce_contact_edges() {
        let mut physics = SimplePhysics::new();
        let a = dynamic_at(&mut physics, Vec2::ZERO);
        let b = dynamic_at(&mut physics, Vec2::new(0.8, 0.0));
        physics.create_fixture(a, &FixtureDesc::new(Shape::circle(0.5)));
        physics.create_fixture(b, &FixtureDesc::new(Shape::circle(0.5)));
        physics.step(1.0 / 60.0);

        assert_eq!(physics.contacts().len(), 1);
        let edge = physics.contact_edge(physics.contact_list(a).expect("a has a contact"));
        assert_eq!(edge.other, b);
        assert!(edge.next.is_none());
        let edge = physics.contact_edge(physics.contact_list(b).expect("b has a contact"));
        assert_eq!(edge.other, a);
        assert!(edge.contact.normal.x > 0.0);

        // Pushed apart
        assert!(physics.position(b).x - physics.position(a).x > 0.8);
    }

    #[test]
    fn test_circle_stopped_by_wall() {
        let mut physics = SimplePhysics::new();
        let wall = physics.create_body(&BodyDesc::fixed(Vec2::ZERO));
        physics.create_fixture(
            wall,
            &FixtureDesc::new(Shape::rect(Vec2::new(0.5, 5.0), Vec2::new(3.0, 0.0))),
        );
        let ball = physics.create_body(&BodyDesc {
            bullet: true,
            ..Default::default()
        });
        physics.create_fixture(ball, &FixtureDesc::new(Shape::circle(0.5)));
        physics.set_linear_velocity(ball, Vec2::new(60.0, 0.0));

        for _ in 0..10 {
            physics.step(1.0 / 60.0);
        }
        // Never passes the wall's near face (x = 2.5) by more than the radius
        assert!(physics.position(ball).x < 2.5);
        assert!(physics.linear_velocity(ball).x <= 0.0);
    }

    #[test]
    fn test_destroy_body_invalidates_handle_and_contacts() {
        let mut physics = SimplePhysics::new();
        let a = dynamic_at(&mut physics, Vec2::ZERO);
        let b = dynamic_at(&mut physics, Vec2::new(0.5, 0.0));
        physics.create_fixture(a, &FixtureDesc::new(Shape::circle(0.5)));
        physics.create_fixture(b, &FixtureDesc::new(Shape::circle(0.5)));
        physics.step(1.0 / 60.0);
        assert!(physics.contact_list(a).is_some());

        physics.destroy_body(b);
        assert!(!physics.contains_body(b));
        assert!(physics.contact_list(a).is_none());
        assert_eq!(physics.body_count(), 1);

        // Slot reuse bumps the generation
        let c = dynamic_at(&mut physics, Vec2::ZERO);
        assert_eq!(c.index, b.index);
        assert_ne!(c.generation, b.generation);
        assert!(!physics.contains_body(b));
    }

    #[test]
    fn test_create_destroy_churn_reuses_storage() {
        let mut physics = SimplePhysics::new();
        for _ in 0..1000 {
            let body = dynamic_at(&mut physics, Vec2::ZERO);
            physics.create_fixture(body, &FixtureDesc::new(Shape::circle(0.5)));
            physics.create_fixture(body, &FixtureDesc::new(Shape::circle(0.25)));
            physics.step(1.0 / 60.0);
            physics.destroy_body(body);
        }

        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.slots.len(), 1);
        assert_eq!(physics.fixtures.len(), 2);
        assert!(physics.fixtures.iter().all(Option::is_none));

        // A reused fixture slot belongs to its new body only
        let body = dynamic_at(&mut physics, Vec2::ZERO);
        let fixture = physics.create_fixture(body, &FixtureDesc::new(Shape::circle(0.5)));
        assert_eq!(physics.fixture(fixture).body, body);
        assert!(physics.fixture(fixture).next.is_none());
        assert_eq!(physics.fixtures.len(), 2);
    }

    #[test]
    fn test_user_data_roundtrip() {
        let mut physics = SimplePhysics::new();
        let body = dynamic_at(&mut physics, Vec2::ZERO);
        assert!(physics.user_data(body).is_none());
        physics.set_user_data(body, ActorId::from("p1"));
        assert_eq!(physics.user_data(body), Some(&ActorId::from("p1")));
    }
}
