//! Core contracts and helpers for Fixtura.
//!
//! This crate defines the domain metadata types, the entity container, the
//! persistence gateway contract, and validation helpers shared by the
//! generator and the lifecycle harness.

pub mod entity;
pub mod error;
pub mod gateway;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;

pub use entity::{Entity, Key};
pub use error::{Error, Result};
pub use gateway::{ConnectionProvider, Gateway, GatewayError};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use schema::{
    Attribute, AttributeDefinition, Domain, EntityDefinition, EntityType, ForeignKeyDefinition,
    ForeignKeyId, PrimaryKey,
};
pub use types::{Value, ValueKind};
pub use validation::validate_domain;
