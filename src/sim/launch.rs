//! Launch pads
//!
//! A pad is a node that flings whoever stands on it with a fixed velocity
//! read from the node's metadata.

use glam::{IVec3, Vec3};

use crate::error::ConfigError;
use crate::host::{EntityHost, EntityId, WorldQuery};
use crate::node_pos;

/// How far below an entity's feet the pad node is looked for
const STANDING_PROBE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchPad {
    pub node: IVec3,
    pub velocity: Vec3,
}

impl LaunchPad {
    pub fn new(node: IVec3, velocity: Vec3) -> Self {
        Self { node, velocity }
    }

    /// Read the launch vector from metadata, stored as `[x, y, z]`
    pub fn from_meta(node: IVec3, meta: &str) -> Result<Self, ConfigError> {
        let v: [f32; 3] = serde_json::from_str(meta)?;
        if v.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::BadLaunchVector(v));
        }
        Ok(Self::new(node, Vec3::from_array(v)))
    }

    pub fn to_meta(&self) -> String {
        let v = self.velocity.to_array();
        format!("[{}, {}, {}]", v[0], v[1], v[2])
    }

    /// Unattached entities whose feet are on this node
    pub fn riders<H>(&self, host: &H) -> Vec<EntityId>
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        let centre = self.node.as_vec3() + Vec3::new(0.0, 0.5, 0.0);
        host.entities_in_radius(centre, 1.0)
            .into_iter()
            .filter(|&id| host.attachment(id).is_none())
            .filter(|&id| {
                host.position(id)
                    .is_some_and(|p| node_pos(p - Vec3::new(0.0, STANDING_PROBE, 0.0)) == self.node)
            })
            .collect()
    }
}
