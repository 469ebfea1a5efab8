//! Configuration model and persistence for the routing service

pub mod schema;
pub mod store;

pub use schema::{AppConfig, LogLevel, Protocol, ProxyRule};
pub use store::{ConfigStore, DEFAULT_CONFIG_FILE};
