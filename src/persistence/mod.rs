//! Saved state
//!
//! Portals survive world reloads as a JSON blob of named fields. Motion
//! proxies never do: anything other than the fresh marker means "restored"
//! and a restored proxy removes itself.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::sim::basis::BasisFrame;
use crate::sim::portal::PortalBounds;

/// Static data hosts hand to objects spawned this session
pub const FRESH_MARKER: &str = "fresh";

/// How an object came into being
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Newly created this session
    Fresh,
    /// Loaded from storage with this blob
    Restored(String),
}

impl Activation {
    pub fn from_staticdata(data: &str) -> Self {
        if data == FRESH_MARKER {
            Activation::Fresh
        } else {
            Activation::Restored(data.to_string())
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Activation::Fresh)
    }
}

/// Persisted portal fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalRecord {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub east: Vec3,
    pub north: Vec3,
    pub out: Vec3,
    pub target: Vec3,
    pub enabled: bool,
}

impl PortalRecord {
    pub fn new(bounds: PortalBounds, basis: BasisFrame, target: Vec3, enabled: bool) -> Self {
        Self {
            min_x: bounds.min_x,
            max_x: bounds.max_x,
            min_y: bounds.min_y,
            max_y: bounds.max_y,
            east: basis.east,
            north: basis.north,
            out: basis.out,
            target,
            enabled,
        }
    }

    pub fn bounds(&self) -> PortalBounds {
        PortalBounds {
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }

    pub fn basis(&self) -> BasisFrame {
        BasisFrame::new(self.east, self.north, self.out)
    }

    pub fn encode(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Every field must be present; there is no partial recovery
    pub fn decode(blob: &str) -> Result<Self, PersistError> {
        if blob.trim().is_empty() {
            return Err(PersistError::Empty);
        }
        let record: PortalRecord = serde_json::from_str(blob)?;
        if !record.basis().is_orthonormal(1e-3) {
            log::warn!("Restored portal basis is not orthonormal: {:?}", record.basis());
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PortalRecord {
        PortalRecord::new(
            PortalBounds::new(-1.0, 1.0, -0.5, 2.0),
            BasisFrame::new(Vec3::Z, Vec3::Y, -Vec3::X),
            Vec3::new(100.0, 12.5, -40.0),
            true,
        )
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample();
        let blob = record.encode().unwrap();
        let back = PortalRecord::decode(&blob).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.bounds(), record.bounds());
        assert_eq!(back.basis(), record.basis());
    }

    #[test]
    fn test_corrupt_blob_rejected() {
        assert!(matches!(PortalRecord::decode(""), Err(PersistError::Empty)));
        assert!(matches!(
            PortalRecord::decode("{\"min_x\": 1.0"),
            Err(PersistError::Malformed(_))
        ));
        // Missing fields are not filled in
        assert!(matches!(
            PortalRecord::decode("{\"min_x\": 1.0, \"enabled\": true}"),
            Err(PersistError::Malformed(_))
        ));
    }

    #[test]
    fn test_activation_marker() {
        assert!(Activation::from_staticdata(FRESH_MARKER).is_fresh());
        assert_eq!(
            Activation::from_staticdata(""),
            Activation::Restored(String::new())
        );
    }
}
