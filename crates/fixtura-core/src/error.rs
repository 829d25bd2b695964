use thiserror::Error;

use crate::schema::EntityType;

/// Core error type shared across Fixtura crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The domain violates internal invariants.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// No definition is registered for the entity type.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(EntityType),
    /// The entity type has no attribute with the given name.
    #[error("unknown attribute: {entity_type}.{attribute}")]
    UnknownAttribute {
        entity_type: EntityType,
        attribute: String,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by Fixtura crates.
pub type Result<T> = std::result::Result<T, Error>;
