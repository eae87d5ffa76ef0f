//! Simulation state
//!
//! Everything the simulation keeps between ticks: portals, live motion
//! proxies and launch pads. The entities themselves belong to the host.

use std::rc::Rc;

use glam::Vec3;

use super::launch::LaunchPad;
use super::portal::PortalPlane;
use super::proxy::{Flung, MotionProxy, fling_entity};
use crate::error::{AttachError, PersistError};
use crate::host::{EntityHost, EntityId, WorldQuery};
use crate::observe::Observer;
use crate::persistence::Activation;
use crate::settings::Tuning;

pub struct Simulation {
    pub tuning: Tuning,
    pub(crate) observer: Rc<dyn Observer>,
    pub(crate) portals: Vec<PortalPlane>,
    pub(crate) proxies: Vec<MotionProxy>,
    pub(crate) pads: Vec<LaunchPad>,
    pub time_ticks: u64,
}

impl Simulation {
    pub fn new(tuning: Tuning, observer: Rc<dyn Observer>) -> Self {
        Self {
            tuning,
            observer,
            portals: Vec::new(),
            proxies: Vec::new(),
            pads: Vec::new(),
            time_ticks: 0,
        }
    }

    /// Register the portal carried by host object `id`.
    ///
    /// A portal whose saved blob can't be read removes its host object
    /// instead of running half-configured. A missing host object is an
    /// error; nothing is registered.
    pub fn add_portal<H: EntityHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: EntityId,
        activation: &Activation,
    ) -> Result<&mut PortalPlane, PersistError> {
        let Some(position) = host.position(id) else {
            let err = PersistError::MissingObject(id);
            self.observer.portal_dropped(id, &err.to_string());
            return Err(err);
        };
        match PortalPlane::activate(id, position, activation, self.tuning.portal.poll_radius) {
            Ok(portal) => {
                self.portals.retain(|p| p.id != id);
                self.portals.push(portal);
                let last = self.portals.len() - 1;
                Ok(&mut self.portals[last])
            }
            Err(err) => {
                self.observer.portal_dropped(id, &err.to_string());
                host.remove(id);
                Err(err)
            }
        }
    }

    pub fn portal(&self, id: EntityId) -> Option<&PortalPlane> {
        self.portals.iter().find(|p| p.id == id)
    }

    pub fn portal_mut(&mut self, id: EntityId) -> Option<&mut PortalPlane> {
        self.portals.iter_mut().find(|p| p.id == id)
    }

    pub fn portals(&self) -> &[PortalPlane] {
        &self.portals
    }

    /// Forget a portal and return its saved blob
    pub fn unload_portal(&mut self, id: EntityId) -> Option<Result<String, PersistError>> {
        let idx = self.portals.iter().position(|p| p.id == id)?;
        let portal = self.portals.remove(idx);
        Some(portal.save())
    }

    pub fn add_launch_pad(&mut self, pad: LaunchPad) {
        self.pads.push(pad);
    }

    /// Fling `start` (or whatever it rides on). Returns the affected entity.
    pub fn fling<H>(&mut self, host: &mut H, start: EntityId, add_velocity: Vec3) -> Result<EntityId, AttachError>
    where
        H: EntityHost + WorldQuery + ?Sized,
    {
        let flung = fling_entity(host, start, add_velocity, self.tuning, self.observer.clone())?;
        let affected = flung.affected();
        if let Flung::Captured(proxy) = flung {
            if !proxy.is_destroyed() {
                self.proxies.push(proxy);
            }
        }
        Ok(affected)
    }

    /// A proxy object came back from storage; it removes itself
    pub fn restore_proxy<H: EntityHost + ?Sized>(&mut self, host: &mut H, id: EntityId, staticdata: &str) {
        let proxy = MotionProxy::activate(
            host,
            id,
            &Activation::from_staticdata(staticdata),
            self.tuning,
            self.observer.clone(),
        );
        if !proxy.is_destroyed() {
            self.proxies.push(proxy);
        }
    }

    pub fn proxies(&self) -> &[MotionProxy] {
        &self.proxies
    }

    /// The live proxy currently holding `entity`, if any
    pub fn proxy_for(&self, entity: EntityId) -> Option<&MotionProxy> {
        self.proxies
            .iter()
            .find(|p| p.is_attached() && p.controlled() == Some(entity))
    }

    pub fn is_captured(&self, entity: EntityId) -> bool {
        self.proxy_for(entity).is_some()
    }
}
