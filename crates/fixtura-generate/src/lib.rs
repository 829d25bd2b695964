//! Random entity generation and foreign-key dependency resolution for
//! Fixtura.
//!
//! The value generator produces constraint-respecting attribute values from
//! a seedable random source, the builder assembles them into entities and
//! the resolver persists every entity a type references before it is used.

pub mod builder;
pub mod errors;
pub mod foreign;
pub mod generators;
pub mod hooks;
pub mod settings;

pub use builder::{ColumnFilter, build_entity, populate_entity, random_entity, randomize};
pub use errors::GenerationError;
pub use foreign::{DependencyResolver, Persisted, Resolution, ResolvedForeignKeys, insert_or_select};
pub use generators::{Generated, ValueGenerator};
pub use hooks::{DefaultHooks, FixtureHooks};
pub use settings::{GeneratorSettings, NumericBounds};
