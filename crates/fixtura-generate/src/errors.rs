use thiserror::Error;

use fixtura_core::{EntityType, ForeignKeyId, GatewayError};

/// Errors emitted while generating or resolving entities.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A value could not be produced for an attribute.
    #[error("cannot generate {entity_type}.{attribute}: {message}")]
    Attribute {
        entity_type: EntityType,
        attribute: String,
        message: String,
    },
    #[error("cannot resolve foreign key {foreign_key}: {message}")]
    DependencyResolution {
        foreign_key: ForeignKeyId,
        message: String,
    },
    /// Persisting a generated entity failed; `entity` renders the offender.
    #[error("{source} [{entity}]")]
    Persistence {
        entity: String,
        #[source]
        source: GatewayError,
    },
    #[error(transparent)]
    Domain(#[from] fixtura_core::Error),
}
