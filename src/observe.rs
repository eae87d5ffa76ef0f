//! Injected observability hooks
//!
//! Components report what they do through an [`Observer`] handed to them at
//! construction. [`LogObserver`] forwards to the `log` facade.

use glam::Vec3;

use crate::host::EntityId;

/// Why a motion proxy let go of its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// Attach never completed
    NotSetUp,
    /// Entity handle no longer resolves
    EntityMissing,
    /// Entity exists but has no position (left the world)
    EntityRemoved,
    /// Something else parented the entity
    Reparented,
    /// Entity health reached zero
    Dead,
    /// Slow and standing on walkable ground
    Grounded,
    /// Nearly stopped inside liquid
    Swimming,
    /// The proxy object itself vanished
    ProxyMissing,
    /// Loaded from saved state, which proxies never survive
    Restored,
}

/// Receives simulation events. All methods default to no-ops.
pub trait Observer {
    fn teleported(&self, _entity: EntityId, _from: Vec3, _to: Vec3) {}
    fn near_miss(&self, _portal: EntityId, _entity: EntityId, _axis_distance: f32) {}
    fn captured(&self, _proxy: EntityId, _entity: EntityId) {}
    fn released(&self, _proxy: EntityId, _entity: Option<EntityId>, _reason: ReleaseReason) {}
    fn damaged(&self, _entity: EntityId, _amount: i32, _health: i32) {}
    fn portal_dropped(&self, _portal: EntityId, _error: &str) {}
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Observer writing to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver {
    /// Emit per-tick chatter (near misses) at debug level
    pub verbose: bool,
}

impl LogObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Observer for LogObserver {
    fn teleported(&self, entity: EntityId, from: Vec3, to: Vec3) {
        log::info!("Teleported {} from {:.2} to {:.2}", entity, from, to);
    }

    fn near_miss(&self, portal: EntityId, entity: EntityId, axis_distance: f32) {
        if self.verbose {
            log::debug!(
                "Portal {} skipped {} ({:.2} from axis)",
                portal,
                entity,
                axis_distance
            );
        }
    }

    fn captured(&self, proxy: EntityId, entity: EntityId) {
        log::info!("Proxy {} took control of {}", proxy, entity);
    }

    fn released(&self, proxy: EntityId, entity: Option<EntityId>, reason: ReleaseReason) {
        match entity {
            Some(entity) => log::info!("Proxy {} released {} ({:?})", proxy, entity, reason),
            None => log::info!("Proxy {} cleaned up ({:?})", proxy, reason),
        }
    }

    fn damaged(&self, entity: EntityId, amount: i32, health: i32) {
        log::info!("{} took {} impact damage, health now {}", entity, amount, health);
    }

    fn portal_dropped(&self, portal: EntityId, error: &str) {
        log::warn!("Removing portal {}: {}", portal, error);
    }
}
