//! Portal plane intersection
//!
//! Each tick a portal looks at nearby entities, predicts where they'll be
//! one look-ahead step from now in its own frame, and warps any whose path
//! pierces the portal rectangle from the front.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::basis::BasisFrame;
use crate::closest_point_on_line;
use crate::error::PersistError;
use crate::host::{Body, EntityHost, EntityId, WorldQuery};
use crate::observe::Observer;
use crate::persistence::{Activation, PortalRecord};

/// Portal rectangle in local (east, north) coordinates, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortalBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl PortalBounds {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Where a path through local space pierces the z = 0 plane.
///
/// `local_pos` must be in front (z >= 0) and `local_pos + local_offset`
/// must end on or behind the plane. Returns the local (east, north) hit.
pub fn plane_crossing(local_pos: Vec3, local_offset: Vec3) -> Option<Vec2> {
    if local_pos.z < 0.0 {
        return None;
    }
    if local_pos.z + local_offset.z > 0.0 {
        return None;
    }
    // Resting on the plane without moving into it
    if local_offset.z >= 0.0 {
        return None;
    }
    let t = local_pos.z / -local_offset.z;
    Some(local_pos.truncate() + local_offset.truncate() * t)
}

/// A one-way teleport plane
#[derive(Debug, Clone, PartialEq)]
pub struct PortalPlane {
    /// Host object carrying this portal
    pub id: EntityId,
    pub position: Vec3,
    pub basis: BasisFrame,
    pub bounds: PortalBounds,
    /// Exit point (just a position, not another portal)
    pub target: Vec3,
    pub enabled: bool,
    pub poll_radius: f32,
}

impl PortalPlane {
    /// Unconfigured portal: zero-size rectangle, disabled
    pub fn new(id: EntityId, position: Vec3, poll_radius: f32) -> Self {
        Self {
            id,
            position,
            basis: BasisFrame::IDENTITY,
            bounds: PortalBounds::default(),
            target: position,
            enabled: false,
            poll_radius,
        }
    }

    /// Build a portal for a host object that just activated.
    ///
    /// A restored portal takes every field from its blob or fails.
    pub fn activate(
        id: EntityId,
        position: Vec3,
        activation: &Activation,
        poll_radius: f32,
    ) -> Result<Self, PersistError> {
        let mut portal = Self::new(id, position, poll_radius);
        if let Activation::Restored(blob) = activation {
            portal.apply_record(&PortalRecord::decode(blob)?);
        }
        Ok(portal)
    }

    /// Set geometry and destination, and switch the portal on
    pub fn configure(&mut self, basis: BasisFrame, bounds: PortalBounds, target: Vec3) {
        self.basis = basis;
        self.bounds = bounds;
        self.target = target;
        self.enabled = true;
    }

    pub fn record(&self) -> PortalRecord {
        PortalRecord::new(self.bounds, self.basis, self.target, self.enabled)
    }

    pub fn apply_record(&mut self, record: &PortalRecord) {
        self.bounds = record.bounds();
        self.basis = record.basis();
        self.target = record.target;
        self.enabled = record.enabled;
    }

    /// Serialize on unload
    pub fn save(&self) -> Result<String, PersistError> {
        self.record().encode()
    }

    /// World position in portal-local coordinates
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.basis.to_local(world - self.position)
    }

    /// Distance from the line through the portal centre along its normal
    pub fn axis_distance(&self, p: Vec3) -> f32 {
        let on_axis = closest_point_on_line(self.position, self.position + self.basis.out, p);
        (p - on_axis).length()
    }

    /// Local crossing point if an entity at `pos` moving at `velocity`
    /// passes through the rectangle within `lookahead` seconds.
    pub fn crossing(&self, pos: Vec3, velocity: Vec3, lookahead: f32) -> Option<Vec2> {
        let local_pos = self.to_local(pos);
        let local_offset = self.basis.to_local(velocity * lookahead);
        plane_crossing(local_pos, local_offset).filter(|hit| self.bounds.contains(*hit))
    }

    /// Poll nearby entities and warp the ones crossing this tick.
    ///
    /// Attached entities are skipped; they travel with their root.
    /// Velocity is left untouched. Returns the ids that were moved.
    pub fn step<H>(&self, host: &mut H, lookahead: f32, observer: &dyn Observer) -> Vec<EntityId>
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        if !self.enabled {
            return Vec::new();
        }

        let mut warped = Vec::new();
        for id in host.entities_in_radius(self.position, self.poll_radius) {
            if id == self.id || host.attachment(id).is_some() {
                continue;
            }
            let Some(body) = Body::resolve(host, id) else {
                continue;
            };
            let (Some(pos), Some(vel)) = (body.position(host), body.velocity(host)) else {
                continue;
            };

            if self.crossing(pos, vel, lookahead).is_some() {
                host.set_position(id, self.target);
                observer.teleported(id, pos, self.target);
                warped.push(id);
            } else {
                observer.near_miss(self.id, id, self.axis_distance(pos));
            }
        }
        warped
    }
}
