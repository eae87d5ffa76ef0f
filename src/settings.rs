//! Tuning knobs
//!
//! Every tuned constant lives here so a host can override them from JSON.
//! Missing fields fall back to the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Surface friction sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionTuning {
    /// Deceleration against a fully-contacting face (m/s²)
    pub deceleration: f32,
    /// Probe distance past the box boundary
    pub contact_epsilon: f32,
    /// Inward pull of face corners
    pub corner_inset: f32,
}

impl Default for FrictionTuning {
    fn default() -> Self {
        Self {
            deceleration: FRICTION_DECELERATION,
            contact_epsilon: CONTACT_EPSILON,
            corner_inset: CORNER_INSET,
        }
    }
}

/// Impact damage curve: `((|dv| - threshold) * scale) ^ exponent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageTuning {
    pub threshold: f32,
    pub scale: f32,
    pub exponent: f32,
}

impl Default for DamageTuning {
    fn default() -> Self {
        Self {
            threshold: DAMAGE_THRESHOLD,
            scale: DAMAGE_SCALE,
            exponent: DAMAGE_EXPONENT,
        }
    }
}

/// When a motion proxy hands its entity back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldTuning {
    /// Release on walkable support below this speed
    pub ground_speed: f32,
    /// Release in liquid below this speed
    pub swim_speed: f32,
    /// How far under the footprint to look for support
    pub support_depth: f32,
}

impl Default for HoldTuning {
    fn default() -> Self {
        Self {
            ground_speed: GROUND_RELEASE_SPEED,
            swim_speed: SWIM_RELEASE_SPEED,
            support_depth: SUPPORT_PROBE_DEPTH,
        }
    }
}

/// Portal polling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalTuning {
    /// Look-ahead for the crossing prediction
    pub prediction_dt: f32,
    /// Poll radius given to freshly created portals
    pub poll_radius: f32,
    /// Hand exiting entities to a motion proxy
    pub capture_on_exit: bool,
}

impl Default for PortalTuning {
    fn default() -> Self {
        Self {
            prediction_dt: PORTAL_PREDICTION_DT,
            poll_radius: PORTAL_POLL_RADIUS,
            capture_on_exit: true,
        }
    }
}

/// All simulation tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration of motion proxies (m/s²)
    pub gravity: f32,
    pub friction: FrictionTuning,
    pub damage: DamageTuning,
    pub hold: HoldTuning,
    pub portal: PortalTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: FrictionTuning::default(),
            damage: DamageTuning::default(),
            hold: HoldTuning::default(),
            portal: PortalTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning = serde_json::from_str(json)?;
        log::debug!("Loaded tuning: {:?}", tuning);
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 20.0, "hold": { "swim_speed": 0.5 } }"#)
            .unwrap();
        assert_eq!(tuning.gravity, 20.0);
        assert_eq!(tuning.hold.swim_speed, 0.5);
        assert_eq!(tuning.hold.ground_speed, GROUND_RELEASE_SPEED);
        assert_eq!(tuning.damage, DamageTuning::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut tuning = Tuning::default();
        tuning.portal.capture_on_exit = false;
        tuning.damage.exponent = 2.0;
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            Tuning::from_json("{ gravity: }"),
            Err(ConfigError::Parse(_))
        ));
    }
}
