use std::io;

use thiserror::Error;

use fixtura_core::{EntityType, GatewayError};
use fixtura_generate::GenerationError;

/// Failure of an entity lifecycle test.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A lifecycle check did not hold.
    #[error("{entity_type}: {message}")]
    Assertion {
        entity_type: EntityType,
        message: String,
    },
    #[error("{source} [{entity}]")]
    Persistence {
        entity: String,
        #[source]
        source: GatewayError,
    },
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Domain(#[from] fixtura_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LifecycleError {
    pub fn assertion(entity_type: &EntityType, message: impl Into<String>) -> Self {
        LifecycleError::Assertion {
            entity_type: entity_type.clone(),
            message: message.into(),
        }
    }

    pub fn persistence(entity: impl ToString, source: GatewayError) -> Self {
        LifecycleError::Persistence {
            entity: entity.to_string(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("logging error: {0}")]
    Init(String),
}
