//! Infrastructure layer: record stores (in-memory and Postgres), the
//! application services built on them, and configuration.

pub mod config;
pub mod services;
pub mod store;

pub use config::{AppConfig, BootstrapAdmin, ConfigError};
pub use services::{Registry, ServiceError, ServiceResult, Stores};
pub use store::{InMemoryStore, PostgresStore, Record, Store, StoreError};
