//! In-memory host world
//!
//! A small stand-in for the real game runtime: an entity store, a sparse
//! node map and a fixed-step integrator with voxel collision. Good enough to
//! drive the simulation end to end in tests and the demo binary.

pub mod scenario;

use std::collections::{BTreeMap, HashMap};

use glam::{IVec3, Vec3};

use crate::consts::GRAVITY;
use crate::host::{
    Attachment, CollisionBox, DamageReason, EntityHost, EntityId, EntityKind, NodeInfo,
    PhysicalProps, SpawnSpec, WorldQuery,
};
use crate::node_pos;
use crate::persistence::FRESH_MARKER;

/// Gap left between a box and the face it was stopped against
const SKIN: f32 = 0.001;
/// Longest move tested for collision in one go (keeps fast bodies from tunnelling)
const MAX_SUBSTEP: f32 = 0.4;
/// Attachment chains deeper than this are not followed
const MAX_CHAIN: usize = 4;

pub const PLAYER_HEALTH: i32 = 20;

#[derive(Debug, Clone)]
struct Entity {
    kind: EntityKind,
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    props: PhysicalProps,
    attachment: Option<Attachment>,
    health: Option<i32>,
    last_damage: Option<DamageReason>,
    /// Ignores collision and gravity (portal frames and other fixtures)
    fixture: bool,
    staticdata: String,
}

impl Entity {
    fn object(spec: SpawnSpec) -> Self {
        Self {
            kind: EntityKind::Object,
            position: spec.position,
            velocity: spec.velocity,
            acceleration: Vec3::ZERO,
            props: spec.props,
            attachment: None,
            health: None,
            last_damage: None,
            fixture: false,
            staticdata: spec.staticdata,
        }
    }
}

/// Sandbox implementation of [`EntityHost`] and [`WorldQuery`]
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    entities: BTreeMap<EntityId, Entity>,
    nodes: HashMap<IVec3, NodeInfo>,
    next_id: u32,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one node. Unset nodes read as air.
    pub fn set_node(&mut self, pos: IVec3, info: NodeInfo) {
        self.nodes.insert(pos, info);
    }

    /// Set every node in the inclusive box `lo..=hi`
    pub fn fill(&mut self, lo: IVec3, hi: IVec3, info: NodeInfo) {
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    self.nodes.insert(IVec3::new(x, y, z), info);
                }
            }
        }
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, entity);
        id
    }

    /// Player with full health, under gravity
    pub fn spawn_player(&mut self, position: Vec3) -> EntityId {
        self.insert(Entity {
            kind: EntityKind::Player,
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::new(0.0, -GRAVITY, 0.0),
            props: PhysicalProps {
                weight: 75.0,
                ..PhysicalProps::default()
            },
            attachment: None,
            health: Some(PLAYER_HEALTH),
            last_damage: None,
            fixture: false,
            staticdata: String::new(),
        })
    }

    /// Loose unit-sized object under gravity
    pub fn spawn_object(&mut self, position: Vec3, velocity: Vec3) -> EntityId {
        let mut entity = Entity::object(SpawnSpec {
            position,
            velocity,
            props: PhysicalProps {
                collision_box: CollisionBox::from_array([-0.4, -0.4, -0.4, 0.4, 0.4, 0.4]),
                ..PhysicalProps::default()
            },
            staticdata: FRESH_MARKER.to_string(),
        });
        entity.acceleration = Vec3::new(0.0, -GRAVITY, 0.0);
        self.insert(entity)
    }

    /// Immovable object that carries behaviour (portals)
    pub fn spawn_marker(&mut self, position: Vec3) -> EntityId {
        let mut entity = Entity::object(SpawnSpec {
            position,
            velocity: Vec3::ZERO,
            props: PhysicalProps {
                immortal: true,
                pointable: false,
                ..PhysicalProps::default()
            },
            staticdata: FRESH_MARKER.to_string(),
        });
        entity.fixture = true;
        self.insert(entity)
    }

    pub fn acceleration(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|e| e.acceleration)
    }

    pub fn last_damage(&self, id: EntityId) -> Option<DamageReason> {
        self.entities.get(&id).and_then(|e| e.last_damage)
    }

    pub fn staticdata(&self, id: EntityId) -> Option<&str> {
        self.entities.get(&id).map(|e| e.staticdata.as_str())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Player-style attack. Immortal entities shrug it off.
    pub fn punch(&mut self, id: EntityId, amount: i32) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if entity.props.immortal {
            return false;
        }
        match entity.health.as_mut() {
            Some(hp) => {
                *hp = (*hp - amount).max(0);
                entity.last_damage = Some(DamageReason::Punch);
                true
            }
            None => false,
        }
    }

    /// Advance every free entity by `dt`: gravity, motion, collision.
    ///
    /// Players standing on ground stop moving sideways, as an idle player
    /// would. Attached entities just follow their parents.
    pub fn integrate(&mut self, dt: f32) {
        for id in self.entity_ids() {
            let Some(e) = self.entities.get(&id) else {
                continue;
            };
            if e.attachment.is_some() || e.fixture {
                continue;
            }
            let (kind, bbox) = (e.kind, e.props.collision_box);
            let mut pos = e.position;
            let mut vel = e.velocity + e.acceleration * dt;

            let mut landed = false;
            for axis in 0..3 {
                let delta = vel[axis] * dt;
                if self.sweep_axis(&mut pos, &mut vel, &bbox, axis, delta) && axis == 1 && delta < 0.0 {
                    landed = true;
                }
            }
            if kind == EntityKind::Player && landed {
                vel.x = 0.0;
                vel.z = 0.0;
            }

            if let Some(e) = self.entities.get_mut(&id) {
                e.position = pos;
                e.velocity = vel;
            }
        }
        self.follow_parents();
    }

    fn box_blocked(&self, min: Vec3, max: Vec3) -> bool {
        let lo = node_pos(min);
        let hi = ((max + 0.5).ceil() - 1.0).as_ivec3();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    if self.node(IVec3::new(x, y, z)).is_walkable() {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Move along one axis, stopping flush against walkable nodes.
    /// Returns whether the move was blocked.
    fn sweep_axis(
        &self,
        pos: &mut Vec3,
        vel: &mut Vec3,
        bbox: &CollisionBox,
        axis: usize,
        delta: f32,
    ) -> bool {
        if delta == 0.0 {
            return false;
        }
        // Already embedded: don't fight it
        let (min, max) = bbox.at(*pos);
        if self.box_blocked(min, max) {
            pos[axis] += delta;
            return false;
        }

        let steps = (delta.abs() / MAX_SUBSTEP).ceil().max(1.0) as usize;
        let step = delta / steps as f32;
        for _ in 0..steps {
            let mut next = *pos;
            next[axis] += step;
            let (min, max) = bbox.at(next);
            if self.box_blocked(min, max) {
                if step < 0.0 {
                    let face = (min[axis] + 0.5).floor() + 0.5;
                    next[axis] = face - bbox.min[axis] + SKIN;
                } else {
                    let face = (max[axis] + 0.5).floor() - 0.5;
                    next[axis] = face - bbox.max[axis] - SKIN;
                }
                let (min, max) = bbox.at(next);
                if !self.box_blocked(min, max) {
                    *pos = next;
                }
                vel[axis] = 0.0;
                return true;
            }
            *pos = next;
        }
        false
    }

    /// Snap attached entities to their parents
    fn follow_parents(&mut self) {
        for _ in 0..MAX_CHAIN {
            let updates: Vec<(EntityId, Vec3)> = self
                .entities
                .iter()
                .filter_map(|(id, e)| {
                    let link = e.attachment.as_ref()?;
                    let parent = self.entities.get(&link.parent)?;
                    Some((*id, parent.position + link.position))
                })
                .collect();
            if updates.is_empty() {
                return;
            }
            for (id, pos) in updates {
                if let Some(e) = self.entities.get_mut(&id) {
                    e.position = pos;
                }
            }
        }
    }
}

impl EntityHost for SandboxWorld {
    fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(&id).map(|e| e.kind)
    }

    fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|e| e.position)
    }

    fn set_position(&mut self, id: EntityId, pos: Vec3) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.position = pos;
            self.follow_parents();
        }
    }

    fn player_velocity(&self, id: EntityId) -> Option<Vec3> {
        self.entities
            .get(&id)
            .filter(|e| e.kind == EntityKind::Player)
            .map(|e| e.velocity)
    }

    fn object_velocity(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|e| e.velocity)
    }

    fn set_velocity(&mut self, id: EntityId, vel: Vec3) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.velocity = vel;
        }
    }

    fn add_velocity(&mut self, id: EntityId, vel: Vec3) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.velocity += vel;
        }
    }

    fn set_acceleration(&mut self, id: EntityId, acc: Vec3) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.acceleration = acc;
        }
    }

    fn properties(&self, id: EntityId) -> Option<PhysicalProps> {
        self.entities.get(&id).map(|e| e.props)
    }

    fn set_properties(&mut self, id: EntityId, props: PhysicalProps) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.props = props;
        }
    }

    fn attachment(&self, id: EntityId) -> Option<Attachment> {
        self.entities.get(&id).and_then(|e| e.attachment.clone())
    }

    fn set_attach(&mut self, child: EntityId, attachment: Attachment) {
        if child == attachment.parent || !self.entities.contains_key(&attachment.parent) {
            return;
        }
        if let Some(e) = self.entities.get_mut(&child) {
            e.attachment = Some(attachment);
            self.follow_parents();
        }
    }

    fn detach(&mut self, child: EntityId) {
        if let Some(e) = self.entities.get_mut(&child) {
            e.attachment = None;
        }
    }

    fn spawn(&mut self, spec: SpawnSpec) -> EntityId {
        self.insert(Entity::object(spec))
    }

    /// Removing a parent drops its children's attachments
    fn remove(&mut self, id: EntityId) {
        if self.entities.remove(&id).is_none() {
            return;
        }
        for e in self.entities.values_mut() {
            if e.attachment.as_ref().is_some_and(|link| link.parent == id) {
                e.attachment = None;
            }
        }
    }

    fn health(&self, id: EntityId) -> Option<i32> {
        self.entities.get(&id).and_then(|e| e.health)
    }

    fn set_health(&mut self, id: EntityId, hp: i32, reason: DamageReason) {
        if let Some(e) = self.entities.get_mut(&id) {
            if e.health.is_some() {
                e.health = Some(hp.max(0));
                e.last_damage = Some(reason);
            }
        }
    }
}

impl WorldQuery for SandboxWorld {
    fn node(&self, pos: IVec3) -> NodeInfo {
        self.nodes.get(&pos).copied().unwrap_or(NodeInfo::AIR)
    }

    fn entities_in_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let r_sq = radius * radius;
        self.entities
            .iter()
            .filter(|(_, e)| e.position.distance_squared(center) <= r_sq)
            .map(|(id, _)| *id)
            .collect()
    }
}
