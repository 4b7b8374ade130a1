//! Core domain primitives for the Keygate PIN access-control backend.
//!
//! This crate has no I/O. It holds the value types shared by the storage layer
//! and the HTTP surface: the validated [`Pin`], the [`AccessReason`] attached to
//! every decision, the deployment [`TenancyMode`] and the [`AccessDefaults`]
//! injected at boot.

pub mod constants;
pub mod defaults;
pub mod error;
pub mod types;

pub use defaults::AccessDefaults;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
