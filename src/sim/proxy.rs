//! Motion proxies
//!
//! When something is moving too fast to be under its own control, it gets
//! attached to an invisible, immortal host object that falls, slides and
//! crashes on its behalf. The proxy re-checks its captive every tick and
//! lets go as soon as the entity is slow and supported, or the handle has
//! gone stale.
//!
//! Lifecycle: `Uninitialized -> Attached -> Destroyed`. Cleanup can happen
//! straight from attach when the entity doesn't need holding.

use std::rc::Rc;

use glam::Vec3;

use super::damage::{apply_damage, impact_damage};
use super::friction;
use crate::error::AttachError;
use crate::host::{
    Attachment, Body, CollisionBox, EntityHost, EntityId, EntityKind, Footprint, PhysicalProps,
    SpawnSpec, WorldQuery,
};
use crate::node_pos;
use crate::observe::{Observer, ReleaseReason};
use crate::persistence::{Activation, FRESH_MARKER};
use crate::settings::Tuning;

/// Longest parent chain followed when looking for a root
const MAX_ATTACH_DEPTH: usize = 64;

/// Proxy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Spawned, nothing attached yet
    Uninitialized,
    /// Holding an entity
    Attached,
    /// Proxy object removed; nothing more will happen
    Destroyed,
}

/// Spawn parameters for a proxy object
pub fn proxy_spawn_spec(position: Vec3, velocity: Vec3) -> SpawnSpec {
    SpawnSpec {
        position,
        velocity,
        props: PhysicalProps {
            weight: 0.0,
            collision_box: CollisionBox::default(),
            immortal: true,
            pointable: false,
        },
        staticdata: FRESH_MARKER.to_string(),
    }
}

/// Kinematic stand-in that carries another entity
pub struct MotionProxy {
    /// The proxy's own host object
    id: EntityId,
    /// Captive entity. Only ever looked up, never trusted.
    controlled: Option<EntityId>,
    state: ProxyState,
    /// Velocity after last tick's friction; `None` until one tick has run
    last_velocity: Option<Vec3>,
    collision_box: CollisionBox,
    footprint: Option<Footprint>,
    tuning: Tuning,
    observer: Rc<dyn Observer>,
}

impl std::fmt::Debug for MotionProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionProxy")
            .field("id", &self.id)
            .field("controlled", &self.controlled)
            .field("state", &self.state)
            .field("last_velocity", &self.last_velocity)
            .finish_non_exhaustive()
    }
}

impl MotionProxy {
    pub fn new(id: EntityId, tuning: Tuning, observer: Rc<dyn Observer>) -> Self {
        Self {
            id,
            controlled: None,
            state: ProxyState::Uninitialized,
            last_velocity: None,
            collision_box: CollisionBox::default(),
            footprint: None,
            tuning,
            observer,
        }
    }

    /// Proxy for a host object that just activated.
    ///
    /// Proxies are never saved, so one coming back from storage removes
    /// itself straight away and is returned already destroyed.
    pub fn activate<H: EntityHost + ?Sized>(
        host: &mut H,
        id: EntityId,
        activation: &Activation,
        tuning: Tuning,
        observer: Rc<dyn Observer>,
    ) -> Self {
        let mut proxy = Self::new(id, tuning, observer);
        if !activation.is_fresh() {
            proxy.cleanup(host, ReleaseReason::Restored);
        }
        proxy
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn controlled(&self) -> Option<EntityId> {
        self.controlled
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == ProxyState::Attached
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ProxyState::Destroyed
    }

    /// Take control of `entity`.
    ///
    /// Errors are contract violations and leave the proxy untouched. On
    /// success the hold check runs immediately, so an entity that doesn't
    /// need carrying is released before this returns.
    pub fn attach<H>(&mut self, host: &mut H, entity: EntityId) -> Result<(), AttachError>
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        if self.state != ProxyState::Uninitialized {
            return Err(AttachError::AlreadySetUp(self.id));
        }
        if !host.is_valid(entity) {
            return Err(AttachError::MissingEntity(entity));
        }
        if host.kind(entity) != Some(EntityKind::Player) {
            return Err(AttachError::NotControllable(entity));
        }
        if let Some(link) = host.attachment(entity) {
            return Err(AttachError::AlreadyParented {
                child: entity,
                parent: link.parent,
            });
        }
        let (Some(position), Some(props)) = (host.position(entity), host.properties(entity)) else {
            return Err(AttachError::MissingEntity(entity));
        };

        let collision_box = props.collision_box.grounded();
        self.collision_box = collision_box;
        self.footprint = Some(collision_box.footprint());

        let mut own = host.properties(self.id).unwrap_or_default();
        own.weight = props.weight;
        own.collision_box = collision_box;
        own.immortal = true;
        own.pointable = false;
        host.set_properties(self.id, own);
        host.set_acceleration(self.id, Vec3::new(0.0, -self.tuning.gravity, 0.0));
        host.set_position(self.id, position);
        host.set_attach(entity, Attachment::at_origin(self.id));

        self.controlled = Some(entity);
        self.state = ProxyState::Attached;
        self.observer.captured(self.id, entity);

        if let Some(reason) = self.check_hold(host) {
            self.cleanup(host, reason);
        }
        Ok(())
    }

    /// Decide whether to keep holding. `Some(reason)` means let go.
    ///
    /// Node lookups that come back unknown never count as support.
    pub fn check_hold<H>(&self, host: &H) -> Option<ReleaseReason>
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        if self.state != ProxyState::Attached {
            return Some(ReleaseReason::NotSetUp);
        }
        let Some(entity) = self.controlled.filter(|&e| host.is_valid(e)) else {
            return Some(ReleaseReason::EntityMissing);
        };
        let Some(position) = host.position(entity) else {
            return Some(ReleaseReason::EntityRemoved);
        };
        if host.attachment(entity).map(|link| link.parent) != Some(self.id) {
            return Some(ReleaseReason::Reparented);
        }
        if host.health(entity).is_some_and(|hp| hp <= 0) {
            return Some(ReleaseReason::Dead);
        }

        // Without a speed reading stay attached
        let speed = host.object_velocity(self.id)?.length();
        let hold = &self.tuning.hold;

        if speed < hold.ground_speed {
            let supported = self.footprint.is_some_and(|fp| {
                fp.points_below(position, hold.support_depth)
                    .iter()
                    .any(|p| host.node(node_pos(*p)).is_walkable())
            });
            if supported {
                return Some(ReleaseReason::Grounded);
            }
        }

        if speed < hold.swim_speed && host.node(node_pos(position)).is_liquid() {
            return Some(ReleaseReason::Swimming);
        }

        None
    }

    /// One simulation tick: friction, impact damage, hold check.
    pub fn on_step<H>(&mut self, host: &mut H, dtime: f32)
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        match self.state {
            ProxyState::Attached => {}
            ProxyState::Uninitialized => {
                self.cleanup(host, ReleaseReason::NotSetUp);
                return;
            }
            ProxyState::Destroyed => return,
        }
        let (Some(position), Some(velocity)) = (host.position(self.id), host.object_velocity(self.id))
        else {
            self.cleanup(host, ReleaseReason::ProxyMissing);
            return;
        };

        let sample = friction::sample(
            dtime,
            position,
            velocity,
            &self.collision_box,
            &*host,
            &self.tuning.friction,
        );
        host.set_velocity(self.id, sample.velocity);

        if let (Some(previous), Some(entity)) = (self.last_velocity, self.controlled) {
            let amount = impact_damage(previous, sample.velocity, &sample.contacts, &self.tuning.damage);
            if amount > 0 {
                if let Some(health) = apply_damage(host, entity, amount) {
                    self.observer.damaged(entity, amount, health);
                }
            }
        }
        self.last_velocity = Some(sample.velocity);

        if let Some(reason) = self.check_hold(&*host) {
            self.cleanup(host, reason);
        }
    }

    /// Detach the captive (if it is still ours) and remove the proxy.
    ///
    /// Safe to call any number of times.
    pub fn cleanup<H: EntityHost + ?Sized>(&mut self, host: &mut H, reason: ReleaseReason) {
        if self.state == ProxyState::Destroyed {
            return;
        }
        let mut released = None;
        if let Some(entity) = self.controlled {
            let ours = host
                .attachment(entity)
                .is_some_and(|link| link.parent == self.id);
            if ours {
                host.detach(entity);
                // Hand the carried momentum back
                if let Some(velocity) = host.object_velocity(self.id) {
                    host.set_velocity(entity, velocity);
                }
                released = Some(entity);
            }
        }
        host.remove(self.id);
        self.state = ProxyState::Destroyed;
        self.observer.released(self.id, released, reason);
    }
}

/// Result of a fling
#[derive(Debug)]
pub enum Flung {
    /// A player was handed to this new proxy
    Captured(MotionProxy),
    /// A plain object had the velocity added directly
    Pushed(EntityId),
}

impl Flung {
    /// Entity whose motion was affected
    pub fn affected(&self) -> EntityId {
        match self {
            Flung::Captured(proxy) => proxy.id(),
            Flung::Pushed(id) => *id,
        }
    }
}

/// Follow parent links up from `start` to the unattached root
pub fn attachment_root<H: EntityHost + ?Sized>(host: &H, start: EntityId) -> Option<EntityId> {
    let mut current = start;
    for _ in 0..MAX_ATTACH_DEPTH {
        if !host.is_valid(current) {
            return None;
        }
        match host.attachment(current) {
            Some(link) => current = link.parent,
            None => return Some(current),
        }
    }
    log::warn!("Attachment chain from {} is too deep, giving up", start);
    None
}

/// Throw whatever `start` ultimately rides on.
///
/// Players get a fresh proxy carrying their current velocity plus
/// `add_velocity`; anything else just has the velocity added.
pub fn fling_entity<H>(
    host: &mut H,
    start: EntityId,
    add_velocity: Vec3,
    tuning: Tuning,
    observer: Rc<dyn Observer>,
) -> Result<Flung, AttachError>
where
    H: EntityHost + WorldQuery + ?Sized,
{
    let root = attachment_root(host, start).ok_or(AttachError::MissingEntity(start))?;
    match Body::resolve(host, root) {
        None => Err(AttachError::MissingEntity(root)),
        Some(Body::Object(id)) => {
            host.add_velocity(id, add_velocity);
            Ok(Flung::Pushed(id))
        }
        Some(body @ Body::Player(id)) => {
            let velocity = body.velocity(host).unwrap_or(Vec3::ZERO) + add_velocity;
            let position = host.position(id).ok_or(AttachError::MissingEntity(id))?;

            // Spawn already moving so the attach-time hold check sees the speed
            let proxy_id = host.spawn(proxy_spawn_spec(position, velocity));
            let mut proxy = MotionProxy::new(proxy_id, tuning, observer);
            if let Err(err) = proxy.attach(host, id) {
                proxy.cleanup(host, ReleaseReason::NotSetUp);
                return Err(err);
            }
            if proxy.is_attached() {
                host.set_velocity(proxy_id, velocity);
            }
            Ok(Flung::Captured(proxy))
        }
    }
}
