//! crates/showroom_core/src/ports.rs
//!
//! Defines the contracts (traits) for the collaborators the data layer consumes.
//! These traits form the boundary of the hexagonal architecture, allowing the stores
//! to be independent of the concrete key-value backend, image provider or clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Car, CarImage};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable, process-wide string store that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Best-effort remote image search.
#[async_trait]
pub trait ImageSearchService: Send + Sync {
    /// Returns up to `count` images matching `query`.
    async fn search(&self, query: &str, count: usize) -> PortResult<Vec<CarImage>>;
}

/// Read-only vehicle reference data.
pub trait CatalogSource: Send + Sync {
    fn cars(&self) -> &[Car];

    fn find(&self, car_id: &str) -> Option<&Car> {
        self.cars().iter().find(|car| car.id == car_id)
    }
}

/// Source of the current time, injected so TTL and session accounting can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
