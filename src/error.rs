//! Error types

use crate::host::EntityId;

/// Contract violations when attaching an entity to a motion proxy.
///
/// These signal a caller bug. The proxy is left exactly as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// Attach was already called on this proxy
    #[error("motion proxy {0} has already been set up")]
    AlreadySetUp(EntityId),

    /// Entity doesn't exist (or lost its position)
    #[error("entity {0} is not present")]
    MissingEntity(EntityId),

    /// Only players can be carried by a proxy
    #[error("entity {0} is not a controllable entity")]
    NotControllable(EntityId),

    /// Entity already hangs off another parent
    #[error("entity {child} is already attached to {parent}")]
    AlreadyParented { child: EntityId, parent: EntityId },
}

/// Saved portal state could not be restored
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    /// The host object carrying the portal is gone
    #[error("portal object {0} is not present")]
    MissingObject(EntityId),

    #[error("portal record is empty")]
    Empty,

    #[error("malformed portal record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Tuning or trigger metadata could not be parsed
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("launch vector must be finite, got {0:?}")]
    BadLaunchVector([f32; 3]),
}
