//! services/showroom/src/error.rs
//!
//! Defines the primary error type for the showroom service.

use crate::config::ConfigError;
use showroom_core::error::StoreError;
use showroom_core::ports::PortError;

/// The primary error type for the `showroom` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a failed store operation, validation errors included.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failed schema migration.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a failure to encode command output.
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Represents a bad command line.
    #[error("Usage: {0}")]
    Usage(String),
}
