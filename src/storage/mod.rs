//! Storage module for recordings, curve points and configuration.

pub mod config;
pub mod curve_store;
pub mod database;
pub mod memory;
pub mod schema;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use curve_store::SqliteCurveStore;
pub use database::{Database, DatabaseError};
pub use memory::MemoryCurveStore;
pub use store::CurveStore;
