//! Storage and access-decision layer for the Keygate PIN access-control backend.
//!
//! This crate owns the SQLite schema and every piece of logic that reads or
//! writes it:
//!
//! - [`Database`] - Connection pool manager with embedded migrations
//! - [`repositories`] - Per-table data access traits with SQLite implementations
//! - [`AccessStore`] - The narrow persistence interface the verify path consumes
//! - [`DeviceRegistry`] - Resolves a request origin to an active device
//! - [`AccessDecisionEngine`] - Admin PIN → user PIN → deny precedence
//! - [`AuditLogger`] - One append-only row per completed decision
//! - [`AccessService`] - The verify-and-record unit of work
//! - [`RegistrationService`] - Device/user registration, configuration, listings
//!
//! # Multi-tenancy
//!
//! Users, configuration and logs are scoped to a device. In single-tenant
//! deployments the scope degrades to one implicit device whose rows carry a
//! `NULL` device id.
//!
//! # Example
//!
//! ```no_run
//! use keygate_core::{AccessDefaults, TenancyMode};
//! use keygate_storage::{
//!     AccessService, Database, DatabaseConfig, RegistrationService, SqliteAccessStore,
//!     VerificationRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("keygate.db")).await?;
//! let defaults = AccessDefaults::default();
//!
//! let registration =
//!     RegistrationService::new(db.pool().clone(), defaults.clone(), TenancyMode::MultiTenant);
//! let lobby = registration.register_device("Lobby", "10.0.0.5", None).await?;
//! registration
//!     .register_user(Some(lobby.id), "ana", "Ana", "Souza", "4821", "")
//!     .await?;
//!
//! let access = AccessService::new(
//!     SqliteAccessStore::new(db.pool().clone()),
//!     defaults,
//!     TenancyMode::MultiTenant,
//! );
//! let outcome = access
//!     .verify_access(&VerificationRequest::new("4821", "10.0.0.5".parse()?))
//!     .await?;
//!
//! assert!(outcome.granted());
//! println!("{}", outcome.message()); // "Acesso autorizado para ana"
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! - PIN comparisons are constant-time (`subtle`, via [`keygate_core::Pin`])
//! - `User` and `SystemConfig` never print PINs or passwords in `Debug` output,
//!   and users never serialize them
//! - Access-log rows are protected against updates by a database trigger

pub mod audit;
pub mod connection;
pub mod engine;
pub mod error;
pub mod messages;
pub mod models;
pub mod registration;
pub mod registry;
pub mod repositories;
pub mod service;
pub mod store;
pub mod transaction;

pub use audit::AuditLogger;
pub use connection::{Database, DatabaseConfig};
pub use engine::{AccessDecisionEngine, Verdict};
pub use error::{AccessError, AccessResult, StorageError, StorageResult};
pub use messages::DisplayMessages;
pub use models::{AccessLog, AccessLogEntry, ConfigUpdate, Device, SystemConfig, User};
pub use registration::{EffectiveConfig, RegistrationService};
pub use registry::{DeviceRegistry, DeviceScope};
pub use repositories::{
    AccessLogRepository, DeviceRepository, SqliteAccessLogRepository, SqliteDeviceRepository,
    SqliteSystemConfigRepository, SqliteUserRepository, SystemConfigRepository, UserRepository,
};
pub use service::{AccessService, VerificationOutcome, VerificationRequest};
pub use store::{AccessStore, SqliteAccessStore};
