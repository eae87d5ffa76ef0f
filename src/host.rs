//! Interfaces consumed from the surrounding game runtime
//!
//! The simulation never owns entities or nodes. Everything it touches goes
//! through [`EntityHost`] and [`WorldQuery`], and every lookup may come back
//! empty: entities disappear between ticks and chunks may not be loaded.

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a host entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of thing an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled
    Player,
    /// Any other host object (crates, projectiles, motion proxies)
    Object,
}

/// An entity resolved to its kind, with uniform access to kinematics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    Player(EntityId),
    Object(EntityId),
}

impl Body {
    /// Look up an entity's kind. `None` when it no longer exists.
    pub fn resolve<H: EntityHost + ?Sized>(host: &H, id: EntityId) -> Option<Self> {
        host.kind(id).map(|kind| match kind {
            EntityKind::Player => Body::Player(id),
            EntityKind::Object => Body::Object(id),
        })
    }

    pub fn id(self) -> EntityId {
        match self {
            Body::Player(id) | Body::Object(id) => id,
        }
    }

    pub fn is_player(self) -> bool {
        matches!(self, Body::Player(_))
    }

    /// Effective velocity (players and objects report it differently)
    pub fn velocity<H: EntityHost + ?Sized>(self, host: &H) -> Option<Vec3> {
        match self {
            Body::Player(id) => host.player_velocity(id),
            Body::Object(id) => host.object_velocity(id),
        }
    }

    pub fn position<H: EntityHost + ?Sized>(self, host: &H) -> Option<Vec3> {
        host.position(self.id())
    }
}

/// Axis-aligned collision box relative to an entity's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl CollisionBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// From the host's six-scalar layout `[xmin, ymin, zmin, xmax, ymax, zmax]`
    pub fn from_array(b: [f32; 6]) -> Self {
        Self {
            min: Vec3::new(b[0], b[1], b[2]),
            max: Vec3::new(b[3], b[4], b[5]),
        }
    }

    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    /// Same box with its bottom moved to local y = 0 (height preserved)
    pub fn grounded(&self) -> Self {
        let height = self.max.y - self.min.y;
        Self {
            min: Vec3::new(self.min.x, 0.0, self.min.z),
            max: Vec3::new(self.max.x, height, self.max.z),
        }
    }

    /// The four XZ corners of the box floor
    pub fn footprint(&self) -> Footprint {
        Footprint {
            corners: [
                (self.min.x, self.min.z),
                (self.min.x, self.max.z),
                (self.max.x, self.min.z),
                (self.max.x, self.max.z),
            ],
        }
    }

    /// World-space bounds when the owning entity stands at `pos`
    pub fn at(&self, pos: Vec3) -> (Vec3, Vec3) {
        (pos + self.min, pos + self.max)
    }
}

impl Default for CollisionBox {
    /// Player-sized box
    fn default() -> Self {
        Self::from_array([-0.3, 0.0, -0.3, 0.3, 1.7, 0.3])
    }
}

/// XZ corner offsets of a collision box floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub corners: [(f32, f32); 4],
}

impl Footprint {
    /// Corner positions in world space, lowered by `depth`
    pub fn points_below(&self, pos: Vec3, depth: f32) -> [Vec3; 4] {
        self.corners
            .map(|(x, z)| Vec3::new(pos.x + x, pos.y - depth, pos.z + z))
    }
}

/// Object properties the simulation reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProps {
    pub weight: f32,
    pub collision_box: CollisionBox,
    /// Ignores punches and attacks
    pub immortal: bool,
    /// Can be targeted by player interaction
    pub pointable: bool,
}

impl Default for PhysicalProps {
    fn default() -> Self {
        Self {
            weight: 5.0,
            collision_box: CollisionBox::default(),
            immortal: false,
            pointable: true,
        }
    }
}

/// Parent link of an attached entity
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub parent: EntityId,
    pub bone: String,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Attachment {
    /// Attach at the parent's origin with no rotation
    pub fn at_origin(parent: EntityId) -> Self {
        Self {
            parent,
            bone: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }
}

/// Why health changed; hosts use this for damage-immunity rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageReason {
    Fall,
    Punch,
    Set,
}

/// Everything a host needs to create an object
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSpec {
    pub position: Vec3,
    pub velocity: Vec3,
    pub props: PhysicalProps,
    /// Handed back to the object on activation
    pub staticdata: String,
}

/// Liquid classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidKind {
    None,
    Source,
    Flowing,
}

/// Result of a node lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeInfo {
    /// Not loaded or not registered. Never solid, never liquid.
    Unknown,
    Known { walkable: bool, liquid: LiquidKind },
}

impl NodeInfo {
    pub const AIR: NodeInfo = NodeInfo::Known {
        walkable: false,
        liquid: LiquidKind::None,
    };
    pub const SOLID: NodeInfo = NodeInfo::Known {
        walkable: true,
        liquid: LiquidKind::None,
    };
    pub const WATER_SOURCE: NodeInfo = NodeInfo::Known {
        walkable: false,
        liquid: LiquidKind::Source,
    };
    pub const WATER_FLOWING: NodeInfo = NodeInfo::Known {
        walkable: false,
        liquid: LiquidKind::Flowing,
    };

    pub fn is_walkable(&self) -> bool {
        matches!(self, NodeInfo::Known { walkable: true, .. })
    }

    pub fn is_liquid(&self) -> bool {
        matches!(
            self,
            NodeInfo::Known {
                liquid: LiquidKind::Source | LiquidKind::Flowing,
                ..
            }
        )
    }
}

/// Entity runtime of the host
///
/// Setters on missing entities are silently ignored, matching how hosts
/// treat stale object references.
pub trait EntityHost {
    /// `None` once the entity is gone
    fn kind(&self, id: EntityId) -> Option<EntityKind>;
    fn position(&self, id: EntityId) -> Option<Vec3>;
    fn set_position(&mut self, id: EntityId, pos: Vec3);
    fn player_velocity(&self, id: EntityId) -> Option<Vec3>;
    fn object_velocity(&self, id: EntityId) -> Option<Vec3>;
    fn set_velocity(&mut self, id: EntityId, vel: Vec3);
    fn add_velocity(&mut self, id: EntityId, vel: Vec3);
    fn set_acceleration(&mut self, id: EntityId, acc: Vec3);
    fn properties(&self, id: EntityId) -> Option<PhysicalProps>;
    fn set_properties(&mut self, id: EntityId, props: PhysicalProps);
    fn attachment(&self, id: EntityId) -> Option<Attachment>;
    fn set_attach(&mut self, child: EntityId, attachment: Attachment);
    fn detach(&mut self, child: EntityId);
    fn spawn(&mut self, spec: SpawnSpec) -> EntityId;
    fn remove(&mut self, id: EntityId);
    fn health(&self, id: EntityId) -> Option<i32>;
    fn set_health(&mut self, id: EntityId, hp: i32, reason: DamageReason);

    fn is_valid(&self, id: EntityId) -> bool {
        self.kind(id).is_some()
    }
}

/// Node and spatial queries against the host world
pub trait WorldQuery {
    fn node(&self, pos: IVec3) -> NodeInfo;
    /// Entities whose position lies within `radius` of `center`, in id order
    fn entities_in_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId>;
}
