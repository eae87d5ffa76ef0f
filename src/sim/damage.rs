//! Impact damage from sudden deceleration
//!
//! A velocity change within one tick above the threshold hurts, growing
//! super-linearly, and is weighted by how much of the face that took the
//! hit was actually against something solid.

use glam::Vec3;

use super::friction::{Contacts, Side};
use crate::host::{DamageReason, EntityHost, EntityId};
use crate::settings::DamageTuning;

/// Damage contributed by one axis before flooring
pub fn axis_damage(delta: f32, fraction: f32, tuning: &DamageTuning) -> f32 {
    let excess = (delta.abs() - tuning.threshold).max(0.0);
    if excess == 0.0 {
        return 0.0;
    }
    (excess * tuning.scale).powf(tuning.exponent) * fraction
}

/// Integer damage for the velocity change `old -> new`.
///
/// A negative delta means the entity was stopped while moving toward +axis,
/// so the +axis (max) face is the one that hit.
pub fn impact_damage(old: Vec3, new: Vec3, contacts: &Contacts, tuning: &DamageTuning) -> i32 {
    let delta = new - old;
    let total: f32 = (0..3)
        .map(|axis| {
            let d = delta[axis];
            let side = if d < 0.0 { Side::Max } else { Side::Min };
            axis_damage(d, contacts.face(axis, side).fraction(), tuning)
        })
        .sum();
    total.floor() as i32
}

/// Subtract `amount` from an entity's health, never below zero.
///
/// Returns the new health, or `None` if the entity has no health.
pub fn apply_damage<H: EntityHost + ?Sized>(host: &mut H, entity: EntityId, amount: i32) -> Option<i32> {
    let hp = host.health(entity)?;
    let new_hp = (hp - amount).max(0);
    host.set_health(entity, new_hp, DamageReason::Fall);
    Some(new_hp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::friction::FaceContact;

    fn tuning() -> DamageTuning {
        DamageTuning::default()
    }

    #[test]
    fn test_threshold_is_harmless() {
        let contacts = Contacts::default();
        let dmg = impact_damage(Vec3::new(13.4, 0.0, 0.0), Vec3::ZERO, &contacts, &tuning());
        assert_eq!(dmg, 0);
    }

    #[test]
    fn test_threshold_harmless_even_when_solid() {
        let contacts = Contacts::default().with_face(0, Side::Max, FaceContact::FULL);
        let dmg = impact_damage(Vec3::new(13.4, 0.0, 0.0), Vec3::ZERO, &contacts, &tuning());
        assert_eq!(dmg, 0);
    }

    #[test]
    fn test_full_contact_curve() {
        // Stopped from 23.4 m/s moving +X into a wall: excess 10 -> 2^1.5
        let contacts = Contacts::default().with_face(0, Side::Max, FaceContact::FULL);
        let dmg = impact_damage(Vec3::new(23.4, 0.0, 0.0), Vec3::ZERO, &contacts, &tuning());
        assert_eq!(dmg, 2);
    }

    #[test]
    fn test_face_follows_delta_sign() {
        // Landing: falling velocity -> 0 is a positive delta, bottom face hit
        let floor = Contacts::default().with_face(1, Side::Min, FaceContact::FULL);
        let dmg = impact_damage(Vec3::new(0.0, -33.4, 0.0), Vec3::ZERO, &floor, &tuning());
        // (20 * 0.2)^1.5 = 8
        assert_eq!(dmg, 8);

        // Same delta, but only the ceiling is solid
        let ceiling = Contacts::default().with_face(1, Side::Max, FaceContact::FULL);
        let dmg = impact_damage(Vec3::new(0.0, -33.4, 0.0), Vec3::ZERO, &ceiling, &tuning());
        assert_eq!(dmg, 0);
    }

    #[test]
    fn test_partial_contact_scales() {
        let half = FaceContact {
            corners: [true, true, false, false],
        };
        let contacts = Contacts::default().with_face(1, Side::Min, half);
        let dmg = impact_damage(Vec3::new(0.0, -33.4, 0.0), Vec3::ZERO, &contacts, &tuning());
        assert_eq!(dmg, 4);
    }

    #[test]
    fn test_axes_sum_before_floor() {
        // 2.83 + 2.83 floors to 5, not 2 + 2
        let contacts = Contacts::default()
            .with_face(0, Side::Max, FaceContact::FULL)
            .with_face(2, Side::Max, FaceContact::FULL);
        let dmg = impact_damage(Vec3::new(23.4, 0.0, 23.4), Vec3::ZERO, &contacts, &tuning());
        assert_eq!(dmg, 5);
    }

    #[test]
    fn test_apply_damage_clamps_at_zero() {
        use crate::sandbox::SandboxWorld;

        let mut world = SandboxWorld::new();
        let player = world.spawn_player(Vec3::ZERO);
        world.set_health(player, 3, DamageReason::Set);
        assert_eq!(apply_damage(&mut world, player, 10), Some(0));
        assert_eq!(world.health(player), Some(0));
        assert_eq!(world.last_damage(player), Some(DamageReason::Fall));
    }
}
