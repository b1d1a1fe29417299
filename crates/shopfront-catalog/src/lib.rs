//! # shopfront-catalog: Product Orchestration for Shopfront
//!
//! [`ProductService`] runs every product operation as
//! authenticate → authorize → validate → persist → publish, talking to the
//! outside world only through the traits in [`ports`]. [`MediaService`]
//! accepts the uploads those products reference.
//!
//! ## Modules
//!
//! - [`service`] - ProductService (create, update, delete, restore, find, ...)
//! - [`media`] - MediaService (upload checks, storage, metadata)
//! - [`ports`] - AuthService, ProductRepository, EventBus, MediaResolver,
//!   MediaRepository, FileStorage
//! - [`validate`] - Core rules plus media resolution
//! - [`context`] - Request-scoped values
//! - [`error`] - CatalogError
//! - [`config`] - Env + TOML configuration
//! - [`telemetry`] - tracing-subscriber setup
//! - [`auth`] - JWT bearer-token adapter
//! - [`in_memory`] - Adapters for tests and local development

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod in_memory;
pub mod media;
pub mod ports;
pub mod service;
pub mod telemetry;
pub mod validate;

pub use config::{CatalogConfig, ConfigError, LogFormat};
pub use context::RequestContext;
pub use error::{CatalogError, CatalogResult};
pub use media::{MediaLimits, MediaService};
pub use service::ProductService;
