//! crates/showroom_core/src/store.rs
//!
//! The generic persistence-backed collection every concrete store is built on.
//!
//! An `EntityStore<T>` owns exactly one key in the `KeyValueStore`. The value is loaded
//! once, held in memory, and written back in full after every mutation. Mutations hold
//! the store's write lock across the persist call, so two concurrent mutations on the
//! same store are applied one after the other instead of overwriting each other.
//!
//! If the initial read fails the store is marked degraded: it serves the default, and
//! the first mutation re-reads the key before writing so stored data is never clobbered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::ports::{KeyValueStore, PortError};

//=========================================================================================
// Options and Keys
//=========================================================================================

/// Logical names of the persisted collections. The full key is `prefix + name`.
pub mod keys {
    pub const USERS: &str = "users";
    pub const CURRENT_USER: &str = "current_user";
    pub const REVIEWS: &str = "reviews";
    pub const THEME: &str = "theme";
    pub const VIEW_HISTORY: &str = "view_history";
    pub const USER_STATS: &str = "user_stats";
    pub const IMAGE_CACHE: &str = "image_cache";
    pub const NOTIFICATION_SETTINGS: &str = "notification_settings";
}

pub const DEFAULT_KEY_PREFIX: &str = "@car_showroom_";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_IMAGE_SEARCH_COUNT: usize = 5;
pub const DEFAULT_IMAGE_CACHE_TTL_HOURS: i64 = 24;

/// Tunables shared by all stores.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub key_prefix: String,
    pub image_cache_ttl: Duration,
    pub image_search_count: usize,
    pub history_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            image_cache_ttl: Duration::hours(DEFAULT_IMAGE_CACHE_TTL_HOURS),
            image_search_count: DEFAULT_IMAGE_SEARCH_COUNT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl StoreOptions {
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }
}

//=========================================================================================
// Collection
//=========================================================================================

/// A value that can be owned by an `EntityStore`.
pub trait Collection: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Repairs or drops records that parsed but break an invariant.
    fn sanitize(self) -> Self {
        self
    }
}

//=========================================================================================
// EntityStore
//=========================================================================================

pub struct EntityStore<T: Collection> {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    state: RwLock<T>,
    degraded: AtomicBool,
}

impl<T: Collection> EntityStore<T> {
    /// Reads the collection from `kv`, falling back to `T::default()`.
    ///
    /// An absent or unreadable value is replaced by the default and the default is
    /// persisted. A backend read failure also yields the default, but the store is
    /// marked degraded and nothing is written until the key has been read successfully.
    pub async fn load(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (value, write_back, degraded) = match kv.get(&key).await {
            Ok(raw) => {
                let (value, write_back) = decode::<T>(&key, raw);
                (value, write_back, false)
            }
            Err(e) => {
                error!(key = %key, "Failed to read stored value: {}", e);
                (T::default(), false, true)
            }
        };

        let store = Self {
            kv,
            key,
            state: RwLock::new(value),
            degraded: AtomicBool::new(degraded),
        };
        if write_back {
            let initial = store.state.read().await.clone();
            // Already logged inside persist; the in-memory default is still usable.
            let _ = store.persist(&initial).await;
        }
        store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True while the stored value has not been read successfully.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// A clone of the current value.
    pub async fn snapshot(&self) -> T {
        self.state.read().await.clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Applies `f` to a copy of the value, persists the copy, then commits it.
    ///
    /// If `f` returns an error nothing is written. If persisting fails the in-memory
    /// value is left as it was and `StoreError::Persistence` is returned. A degraded
    /// store re-reads its key first and refuses the mutation if that read fails too.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut T) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.state.write().await;
        if self.is_degraded() {
            let raw = self.kv.get(&self.key).await.map_err(|e| {
                error!(key = %self.key, "Stored value is still unreadable: {}", e);
                StoreError::from(e)
            })?;
            let (value, _) = decode::<T>(&self.key, raw);
            *guard = value;
            self.degraded.store(false, Ordering::SeqCst);
            info!(key = %self.key, "Recovered stored value");
        }
        let mut next = guard.clone();
        let output = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(output)
    }

    /// Replaces the value with the default and persists it.
    pub async fn reset(&self) -> StoreResult<()> {
        self.mutate(|value| {
            *value = T::default();
            Ok(())
        })
        .await
    }

    /// Deletes the key from the backend and resets memory to the default.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut guard = self.state.write().await;
        self.kv.remove(&self.key).await.map_err(|e| {
            error!(key = %self.key, "Failed to remove stored value: {}", e);
            StoreError::from(e)
        })?;
        *guard = T::default();
        self.degraded.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn persist(&self, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| {
            error!(key = %self.key, "Failed to serialize value: {}", e);
            PortError::Unexpected(e.to_string())
        })?;
        self.kv.set(&self.key, &raw).await.map_err(|e| {
            error!(key = %self.key, "Failed to persist value: {}", e);
            StoreError::from(e)
        })
    }
}

/// Parses a raw stored value. The flag is true when the default should be written back.
fn decode<T: Collection>(key: &str, raw: Option<String>) -> (T, bool) {
    match raw {
        Some(raw) => match serde_json::from_str::<T>(&raw) {
            Ok(parsed) => (parsed.sanitize(), false),
            Err(e) => {
                warn!(key = %key, "Discarding unreadable stored value: {}", e);
                (T::default(), true)
            }
        },
        None => {
            debug!(key = %key, "No stored value, initializing default");
            (T::default(), true)
        }
    }
}
