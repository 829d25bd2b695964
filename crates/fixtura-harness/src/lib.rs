//! Entity lifecycle test harness for Fixtura.
//!
//! [`EntityTestUnit`] drives the insert/select/update/delete round trip of
//! an entity type through a [`fixtura_core::Gateway`], resolving every
//! foreign-key dependency first and rolling the transaction back at the end.
//! [`MemoryDatabase`] is an in-memory gateway for exercising domains without
//! a real store.

pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod memory;
pub mod model;
pub mod transaction;

pub use config::{TestUnitConfig, load_config};
pub use engine::EntityTestUnit;
pub use errors::{ConfigError, LifecycleError, LoggingError};
pub use logging::{LogFormat, LogOptions, init_logging};
pub use memory::{MemoryDatabase, MemoryGateway};
pub use model::{LifecycleReport, LifecycleStage, SuiteReport, TypeOutcome};
pub use transaction::TransactionScope;
