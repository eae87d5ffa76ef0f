//! Portal Motion - portal plane crossing and fling physics for voxel worlds
//!
//! Core modules:
//! - `sim`: Per-tick logic (portal intersection, motion proxies, friction, impact damage)
//! - `host`: Interfaces the surrounding game runtime must provide
//! - `sandbox`: In-memory host used by tests and the demo binary
//! - `persistence`: Portal field blobs and activation markers
//! - `settings`: Data-driven tuning

pub mod error;
pub mod host;
pub mod observe;
pub mod persistence;
pub mod sandbox;
pub mod settings;
pub mod sim;

pub use error::{AttachError, ConfigError, PersistError};
pub use observe::{LogObserver, Observer};
pub use settings::Tuning;

use glam::{IVec3, Vec3};

/// Tuned constants
pub mod consts {
    /// Look-ahead used by portals to predict next-tick displacement
    pub const PORTAL_PREDICTION_DT: f32 = 0.1;
    /// Default radius a portal polls for candidate entities
    pub const PORTAL_POLL_RADIUS: f32 = 4.0;

    /// Downward acceleration applied to motion proxies (m/s²)
    pub const GRAVITY: f32 = 9.81;
    /// Sliding deceleration against a fully-contacting face (m/s²)
    pub const FRICTION_DECELERATION: f32 = 6.0;
    /// How far past the collision box a face probe reaches
    pub const CONTACT_EPSILON: f32 = 0.05;
    /// Face corners are pulled inward so they don't sample neighbouring nodes
    pub const CORNER_INSET: f32 = 0.01;

    /// Velocity delta (m/s in one tick) that causes no damage.
    /// Matches the host's own fall-damage onset.
    pub const DAMAGE_THRESHOLD: f32 = 13.4;
    pub const DAMAGE_SCALE: f32 = 0.2;
    pub const DAMAGE_EXPONENT: f32 = 1.5;

    /// Below this speed a supported entity is released
    pub const GROUND_RELEASE_SPEED: f32 = 4.0;
    /// Below this speed an entity in liquid is released
    pub const SWIM_RELEASE_SPEED: f32 = 1.0;
    /// Depth below the footprint probed for walkable support
    pub const SUPPORT_PROBE_DEPTH: f32 = 0.1;
}

/// Node containing a world position (nodes are unit cubes centred on integers)
#[inline]
pub fn node_pos(pos: Vec3) -> IVec3 {
    (pos + 0.5).floor().as_ivec3()
}

/// Closest point to `p` on the infinite line through `a` and `b`.
///
/// Not clamped to the segment. Degenerate lines (a == b) return `a`.
#[inline]
pub fn closest_point_on_line(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return a;
    }
    let t = (p - a).dot(ab) / len_sq;
    a + ab * t
}
