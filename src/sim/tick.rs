//! Fixed timestep simulation tick
//!
//! Runs every portal, then every launch pad, then every motion proxy, in
//! registration order. Each sees the host as left by the ones before it.

use glam::Vec3;

use super::state::Simulation;
use crate::host::{EntityHost, WorldQuery};

/// Advance the simulation by one fixed step.
///
/// The host is expected to have integrated entity motion for this step
/// already.
pub fn tick<H>(sim: &mut Simulation, host: &mut H, dt: f32)
where
    H: EntityHost + WorldQuery + ?Sized,
{
    sim.time_ticks += 1;

    // Portals go away with their host object
    sim.portals.retain(|p| {
        let alive = host.is_valid(p.id);
        if !alive {
            log::debug!("Portal {} lost its host object", p.id);
        }
        alive
    });

    let lookahead = sim.tuning.portal.prediction_dt;
    let mut exits = Vec::new();
    for portal in &sim.portals {
        exits.extend(portal.step(host, lookahead, &*sim.observer));
    }

    if sim.tuning.portal.capture_on_exit {
        for id in exits {
            if let Err(err) = sim.fling(host, id, Vec3::ZERO) {
                log::warn!("Could not capture {} after teleport: {}", id, err);
            }
        }
    }

    let mut launches = Vec::new();
    for pad in &sim.pads {
        for id in pad.riders(&*host) {
            launches.push((id, pad.velocity));
        }
    }
    for (id, velocity) in launches {
        if let Err(err) = sim.fling(host, id, velocity) {
            log::warn!("Launch pad failed to fling {}: {}", id, err);
        }
    }

    for proxy in &mut sim.proxies {
        proxy.on_step(host, dt);
    }
    sim.proxies.retain(|p| !p.is_destroyed());
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::IVec3;

    use super::*;
    use crate::error::PersistError;
    use crate::host::{EntityId, NodeInfo};
    use crate::observe::NullObserver;
    use crate::persistence::{Activation, FRESH_MARKER};
    use crate::sandbox::SandboxWorld;
    use crate::settings::Tuning;
    use crate::sim::basis::BasisFrame;
    use crate::sim::launch::LaunchPad;
    use crate::sim::portal::PortalBounds;

    const DT: f32 = 0.05;

    fn sim() -> Simulation {
        Simulation::new(Tuning::default(), Rc::new(NullObserver))
    }

    fn run(sim: &mut Simulation, world: &mut SandboxWorld, ticks: usize) {
        for _ in 0..ticks {
            world.integrate(DT);
            tick(sim, world, DT);
        }
    }

    fn floor(world: &mut SandboxWorld) {
        world.fill(IVec3::new(-20, 0, -20), IVec3::new(20, 0, 20), NodeInfo::SOLID);
    }

    fn portal_at(sim: &mut Simulation, world: &mut SandboxWorld, pos: Vec3, target: Vec3) -> EntityId {
        let id = world.spawn_marker(pos);
        let portal = sim
            .add_portal(world, id, &Activation::from_staticdata(FRESH_MARKER))
            .unwrap();
        portal.configure(BasisFrame::IDENTITY, PortalBounds::new(-1.0, 1.0, -1.0, 1.0), target);
        id
    }

    #[test]
    fn test_portal_exit_captures_player() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        floor(&mut world);
        portal_at(&mut sim, &mut world, Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 40.0, 0.0));

        // One integration step brings it to z = 0.4, then the look-ahead crosses
        let player = world.spawn_player(Vec3::new(0.0, 1.5, 1.0));
        world.set_acceleration(player, Vec3::ZERO);
        world.set_velocity(player, Vec3::new(0.0, 0.0, -12.0));

        world.integrate(DT);
        tick(&mut sim, &mut world, DT);

        let pos = world.position(player).unwrap();
        assert!(pos.y > 30.0, "player should be at the exit, got {pos}");
        assert!(sim.is_captured(player));
    }

    #[test]
    fn test_no_capture_when_disabled() {
        let mut tuning = Tuning::default();
        tuning.portal.capture_on_exit = false;
        let mut sim = Simulation::new(tuning, Rc::new(NullObserver));
        let mut world = SandboxWorld::new();
        portal_at(&mut sim, &mut world, Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 40.0, 0.0));

        let player = world.spawn_player(Vec3::new(0.0, 1.5, 0.3));
        world.set_velocity(player, Vec3::new(0.0, 0.0, -12.0));
        tick(&mut sim, &mut world, DT);

        assert_eq!(world.position(player), Some(Vec3::new(0.0, 40.0, 0.0)));
        assert!(!sim.is_captured(player));
    }

    #[test]
    fn test_fling_lifecycle_ends_on_ground() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        floor(&mut world);
        let player = world.spawn_player(Vec3::new(0.0, 0.501, 0.0));

        sim.fling(&mut world, player, Vec3::new(8.0, 6.0, 0.0)).unwrap();
        assert!(sim.is_captured(player));

        run(&mut sim, &mut world, 200);
        assert!(!sim.is_captured(player));
        assert!(sim.proxies().is_empty());
        assert!(world.attachment(player).is_none());
        // Landed downrange, unhurt by a gentle hop
        assert!(world.position(player).unwrap().x > 2.0);
        assert_eq!(world.health(player), Some(20));
        // Only the player and nothing left behind
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_hard_landing_hurts() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        floor(&mut world);
        let player = world.spawn_player(Vec3::new(0.0, 0.501, 0.0));

        // Straight up at 40 m/s, comes back down at roughly the same speed
        sim.fling(&mut world, player, Vec3::new(0.0, 40.0, 0.0)).unwrap();
        run(&mut sim, &mut world, 400);

        assert!(!sim.is_captured(player));
        let hp = world.health(player).unwrap();
        assert!(hp < 20 && hp > 0, "health {hp}");
    }

    #[test]
    fn test_launch_pad_flings_rider() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        floor(&mut world);
        sim.add_launch_pad(LaunchPad::new(IVec3::new(0, 0, 0), Vec3::new(0.0, 12.0, 0.0)));
        let player = world.spawn_player(Vec3::new(0.0, 0.501, 0.0));

        tick(&mut sim, &mut world, DT);
        assert!(sim.is_captured(player));
        let proxy = sim.proxy_for(player).unwrap().id();
        assert_eq!(world.object_velocity(proxy), Some(Vec3::new(0.0, 12.0, 0.0)));
    }

    #[test]
    fn test_corrupt_portal_removes_itself() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let id = world.spawn_marker(Vec3::ZERO);
        let result = sim.add_portal(&mut world, id, &Activation::Restored("{broken".into()));
        assert!(result.is_err());
        assert!(sim.portal(id).is_none());
        assert!(!world.is_valid(id));
    }

    #[test]
    fn test_unload_and_restore_portal() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let id = portal_at(&mut sim, &mut world, Vec3::new(3.0, 1.0, 3.0), Vec3::new(9.0, 9.0, 9.0));
        let before = sim.portal(id).cloned().unwrap();

        let blob = sim.unload_portal(id).unwrap().unwrap();
        assert!(sim.portal(id).is_none());

        sim.add_portal(&mut world, id, &Activation::Restored(blob)).unwrap();
        assert_eq!(sim.portal(id), Some(&before));
    }

    #[test]
    fn test_removed_portal_stops_teleporting() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let id = portal_at(&mut sim, &mut world, Vec3::new(0.0, 1.5, 0.0), Vec3::new(50.0, 50.0, 50.0));
        world.remove(id);

        let rock = world.spawn_object(Vec3::new(0.0, 1.5, 0.3), Vec3::new(0.0, 0.0, -12.0));
        tick(&mut sim, &mut world, DT);

        assert_eq!(world.position(rock), Some(Vec3::new(0.0, 1.5, 0.3)));
        assert!(sim.portal(id).is_none());
        assert!(sim.portals().is_empty());
    }

    #[test]
    fn test_portal_needs_host_object() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let result = sim.add_portal(&mut world, EntityId(999), &Activation::Fresh);
        assert!(matches!(result, Err(PersistError::MissingObject(EntityId(999)))));
        assert!(sim.portals().is_empty());
    }

    #[test]
    fn test_unattached_proxy_cleans_up_on_tick() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let id = world.spawn_marker(Vec3::new(0.0, 5.0, 0.0));
        sim.restore_proxy(&mut world, id, FRESH_MARKER);
        assert_eq!(sim.proxies().len(), 1);

        tick(&mut sim, &mut world, DT);
        assert!(sim.proxies().is_empty());
        assert!(!world.is_valid(id));
    }

    #[test]
    fn test_restored_proxy_is_dropped() {
        let mut sim = sim();
        let mut world = SandboxWorld::new();
        let id = world.spawn_marker(Vec3::ZERO);
        sim.restore_proxy(&mut world, id, "");
        assert!(sim.proxies().is_empty());
        assert!(!world.is_valid(id));
    }
}
