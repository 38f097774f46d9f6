//! Shared types, errors, and configuration for Hisaab.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with decimal precision and round-half-up
//! - Typed IDs for type-safe entity references
//! - Explicit tenant/actor context passed into every posting operation
//! - Application-wide error types and the engine error taxonomy
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerSettings};
pub use error::{AppError, AppResult, ErrorKind};
pub use types::TenantContext;
