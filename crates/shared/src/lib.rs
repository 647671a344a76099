//! Shared types, errors, and configuration for Innkeep.
//!
//! This crate provides common types used across all other crates:
//! - Money stored as integer cents
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
