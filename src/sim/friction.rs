//! Surface friction sampling
//!
//! Probes the nodes just outside each face of a collision box. A face in
//! contact with walkable nodes slows motion that slides along it; the
//! per-face corner data is also what impact damage is weighted by.

use glam::Vec3;

use crate::host::{CollisionBox, WorldQuery};
use crate::node_pos;
use crate::settings::FrictionTuning;

/// Which face of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Face pointing toward -axis
    Min,
    /// Face pointing toward +axis
    Max,
}

impl Side {
    #[inline]
    fn index(self) -> usize {
        match self {
            Side::Min => 0,
            Side::Max => 1,
        }
    }
}

/// Solidity of the four corners of one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceContact {
    pub corners: [bool; 4],
}

impl FaceContact {
    pub const NONE: FaceContact = FaceContact { corners: [false; 4] };
    pub const FULL: FaceContact = FaceContact { corners: [true; 4] };

    pub fn solid_count(&self) -> usize {
        self.corners.iter().filter(|&&c| c).count()
    }

    /// Share of the face touching something solid (0..=1)
    pub fn fraction(&self) -> f32 {
        self.solid_count() as f32 / 4.0
    }
}

/// Contact data for all six faces, indexed by axis (0 = x, 1 = y, 2 = z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contacts {
    faces: [[FaceContact; 2]; 3],
}

impl Contacts {
    pub fn face(&self, axis: usize, side: Side) -> FaceContact {
        self.faces[axis][side.index()]
    }

    pub fn set_face(&mut self, axis: usize, side: Side, contact: FaceContact) {
        self.faces[axis][side.index()] = contact;
    }

    pub fn with_face(mut self, axis: usize, side: Side, contact: FaceContact) -> Self {
        self.set_face(axis, side, contact);
        self
    }

    pub fn touching(&self) -> bool {
        self.faces.iter().flatten().any(|f| f.solid_count() > 0)
    }

    /// How firmly motion along `axis` rubs against faces of the other axes
    fn grip(&self, axis: usize) -> f32 {
        let sum: f32 = (0..3)
            .filter(|&a| a != axis)
            .flat_map(|a| self.faces[a].iter())
            .map(FaceContact::fraction)
            .sum();
        sum.min(1.0)
    }
}

/// This tick's friction result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionSample {
    pub velocity: Vec3,
    pub contacts: Contacts,
}

/// Probe which face corners of a box at `position` touch walkable nodes
pub fn sample_contacts<W: WorldQuery + ?Sized>(
    world: &W,
    position: Vec3,
    collision_box: &CollisionBox,
    tuning: &FrictionTuning,
) -> Contacts {
    let (min, max) = collision_box.at(position);
    let eps = tuning.contact_epsilon;
    let inset = tuning.corner_inset;
    let mut contacts = Contacts::default();

    for axis in 0..3 {
        let b = (axis + 1) % 3;
        let c = (axis + 2) % 3;
        let (b_lo, b_hi) = (min[b] + inset, max[b] - inset);
        let (c_lo, c_hi) = (min[c] + inset, max[c] - inset);
        let spans = [(b_lo, c_lo), (b_hi, c_lo), (b_lo, c_hi), (b_hi, c_hi)];

        for (side, plane) in [(Side::Min, min[axis] - eps), (Side::Max, max[axis] + eps)] {
            let mut face = FaceContact::NONE;
            for (corner, &(bv, cv)) in face.corners.iter_mut().zip(spans.iter()) {
                let mut probe = Vec3::ZERO;
                probe[axis] = plane;
                probe[b] = bv;
                probe[c] = cv;
                *corner = world.node(node_pos(probe)).is_walkable();
            }
            contacts.set_face(axis, side, face);
        }
    }

    contacts
}

/// Decelerate `velocity` for one tick of sliding contact.
///
/// Each axis loses up to `deceleration * grip * dtime`, where grip is the
/// contact fraction of the faces that axis slides along. Velocity never
/// reverses sign from friction alone.
pub fn sample<W: WorldQuery + ?Sized>(
    dtime: f32,
    position: Vec3,
    velocity: Vec3,
    collision_box: &CollisionBox,
    world: &W,
    tuning: &FrictionTuning,
) -> FrictionSample {
    let contacts = sample_contacts(world, position, collision_box, tuning);
    let mut out = velocity;
    for axis in 0..3 {
        let loss = tuning.deceleration * contacts.grip(axis) * dtime;
        out[axis] = toward_zero(velocity[axis], loss);
    }
    FrictionSample {
        velocity: out,
        contacts,
    }
}

#[inline]
fn toward_zero(v: f32, amount: f32) -> f32 {
    if v > 0.0 {
        (v - amount).max(0.0)
    } else {
        (v + amount).min(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NodeInfo;
    use crate::sandbox::SandboxWorld;
    use glam::IVec3;

    fn floor_world() -> SandboxWorld {
        let mut world = SandboxWorld::new();
        world.fill(IVec3::new(-5, 0, -5), IVec3::new(5, 0, 5), NodeInfo::SOLID);
        world
    }

    /// Player standing on the floor at y = 0
    fn standing() -> Vec3 {
        Vec3::new(0.0, 0.501, 0.0)
    }

    #[test]
    fn test_floor_contact_detected() {
        let world = floor_world();
        let contacts = sample_contacts(
            &world,
            standing(),
            &CollisionBox::default(),
            &FrictionTuning::default(),
        );
        assert_eq!(contacts.face(1, Side::Min), FaceContact::FULL);
        assert_eq!(contacts.face(1, Side::Max).solid_count(), 0);
        assert_eq!(contacts.face(0, Side::Min).solid_count(), 0);
    }

    #[test]
    fn test_sliding_on_floor_slows_horizontal_only() {
        let world = floor_world();
        let tuning = FrictionTuning::default();
        let v = Vec3::new(10.0, 0.0, -10.0);
        let s = sample(0.1, standing(), v, &CollisionBox::default(), &world, &tuning);
        let loss = tuning.deceleration * 0.1;
        assert!((s.velocity.x - (10.0 - loss)).abs() < 1e-5);
        assert!((s.velocity.z - (-10.0 + loss)).abs() < 1e-5);
        assert_eq!(s.velocity.y, 0.0);
    }

    #[test]
    fn test_friction_never_reverses() {
        let world = floor_world();
        let v = Vec3::new(0.1, 0.0, 0.0);
        let s = sample(1.0, standing(), v, &CollisionBox::default(), &world, &FrictionTuning::default());
        assert_eq!(s.velocity.x, 0.0);
    }

    #[test]
    fn test_free_flight_keeps_velocity() {
        let world = floor_world();
        let v = Vec3::new(3.0, -4.0, 5.0);
        let s = sample(
            0.1,
            Vec3::new(0.0, 10.0, 0.0),
            v,
            &CollisionBox::default(),
            &world,
            &FrictionTuning::default(),
        );
        assert_eq!(s.velocity, v);
        assert!(!s.contacts.touching());
    }

    #[test]
    fn test_partial_ledge_contact() {
        // Only nodes with x >= 1 exist; a player at x = 0.5 straddles the edge
        let mut world = SandboxWorld::new();
        world.fill(IVec3::new(1, 0, -2), IVec3::new(3, 0, 2), NodeInfo::SOLID);
        let contacts = sample_contacts(
            &world,
            Vec3::new(0.6, 0.501, 0.0),
            &CollisionBox::default(),
            &FrictionTuning::default(),
        );
        assert_eq!(contacts.face(1, Side::Min).solid_count(), 2);
    }

    #[test]
    fn test_unknown_nodes_give_no_contact() {
        let mut world = SandboxWorld::new();
        world.fill(IVec3::new(-5, 0, -5), IVec3::new(5, 0, 5), NodeInfo::Unknown);
        let contacts = sample_contacts(
            &world,
            standing(),
            &CollisionBox::default(),
            &FrictionTuning::default(),
        );
        assert!(!contacts.touching());
    }
}
