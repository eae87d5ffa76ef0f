//! Seeded demo scenes
//!
//! A launch pad throws the player through a portal onto a distant landing
//! field. A handful of crates are scattered around, some lobbed at the
//! portal. Same seed, same scene.

use std::rc::Rc;

use glam::{IVec3, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::SandboxWorld;
use crate::host::{EntityHost, EntityId, NodeInfo};
use crate::observe::Observer;
use crate::persistence::{Activation, FRESH_MARKER};
use crate::settings::Tuning;
use crate::sim::{BasisFrame, LaunchPad, PortalBounds, Simulation, tick};

/// Where the portal sits and where it leads
pub const PORTAL_POS: Vec3 = Vec3::new(0.0, 1.5, -6.0);
pub const EXIT_POS: Vec3 = Vec3::new(100.0, 20.0, 0.0);
/// Pad the player starts on
pub const PAD_NODE: IVec3 = IVec3::new(0, 0, 4);
pub const PAD_VELOCITY: Vec3 = Vec3::new(0.0, 7.0, -9.0);

pub struct Scenario {
    pub world: SandboxWorld,
    pub sim: Simulation,
    pub player: EntityId,
    pub portal: EntityId,
    pub crates: Vec<EntityId>,
}

impl Scenario {
    pub fn generate(seed: u64, tuning: Tuning, observer: Rc<dyn Observer>) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = SandboxWorld::new();
        let mut sim = Simulation::new(tuning, observer);

        // Start area and landing field, with a pond at the far end
        world.fill(IVec3::new(-15, 0, -15), IVec3::new(15, 0, 15), NodeInfo::SOLID);
        world.fill(IVec3::new(85, 0, -45), IVec3::new(130, 0, 15), NodeInfo::SOLID);
        world.fill(IVec3::new(115, 1, -5), IVec3::new(125, 2, 5), NodeInfo::WATER_SOURCE);
        // Beyond the landing field nothing is loaded yet
        world.fill(IVec3::new(131, 0, -45), IVec3::new(140, 0, 15), NodeInfo::Unknown);

        let portal = world.spawn_marker(PORTAL_POS);
        if let Ok(frame) = sim.add_portal(&mut world, portal, &Activation::from_staticdata(FRESH_MARKER)) {
            frame.configure(
                BasisFrame::IDENTITY,
                PortalBounds::new(-1.0, 1.0, -1.5, 1.5),
                EXIT_POS,
            );
        }

        sim.add_launch_pad(LaunchPad::new(PAD_NODE, PAD_VELOCITY));
        let player = world.spawn_player(PAD_NODE.as_vec3() + Vec3::new(0.0, 0.501, 0.0));

        let count = rng.random_range(3..8);
        let mut crates = Vec::with_capacity(count);
        for _ in 0..count {
            let pos = Vec3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(2.0..6.0),
                rng.random_range(-2.0..10.0),
            );
            let velocity = if rng.random_bool(0.5) {
                // Lob it roughly at the portal
                let to_portal = (PORTAL_POS - pos).normalize_or_zero();
                to_portal * rng.random_range(8.0..14.0) + Vec3::Y * 3.0
            } else {
                Vec3::ZERO
            };
            crates.push(world.spawn_object(pos, velocity));
        }

        log::info!(
            "Scenario {}: {} crates, player {}, portal {}",
            seed,
            crates.len(),
            player,
            portal
        );

        Self {
            world,
            sim,
            player,
            portal,
            crates,
        }
    }

    /// Integrate the world then tick the simulation
    pub fn step(&mut self, dt: f32) {
        self.world.integrate(dt);
        tick(&mut self.sim, &mut self.world, dt);
    }

    pub fn run(&mut self, ticks: usize, dt: f32) {
        for _ in 0..ticks {
            self.step(dt);
        }
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.world.position(self.player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::NullObserver;

    const DT: f32 = 0.05;

    fn scenario(seed: u64) -> Scenario {
        Scenario::generate(seed, Tuning::default(), Rc::new(NullObserver))
    }

    #[test]
    fn test_same_seed_same_scene() {
        let a = scenario(7);
        let b = scenario(7);
        assert_eq!(a.crates.len(), b.crates.len());
        for (x, y) in a.crates.iter().zip(&b.crates) {
            assert_eq!(a.world.position(*x), b.world.position(*y));
            assert_eq!(a.world.object_velocity(*x), b.world.object_velocity(*y));
        }
    }

    #[test]
    fn test_player_reaches_landing_field() {
        let mut s = scenario(1);
        s.step(DT);
        assert!(s.sim.is_captured(s.player));

        s.run(600, DT);
        let pos = s.player_position().unwrap();
        assert!(pos.x > 80.0, "player ended at {pos}");
        assert!(!s.sim.is_captured(s.player));
        assert!(s.sim.proxies().is_empty());
        let hp = s.world.health(s.player).unwrap();
        assert!(hp > 0 && hp < 20, "health {hp}");
    }
}
