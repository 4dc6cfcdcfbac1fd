//! crates/showroom_core/src/image_cache.rs
//!
//! TTL-gated cache of remote image search results, one entry per car.
//!
//! Callers always get a list back. Search failures and empty results fall back to
//! whatever was cached before, however old.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::domain::{CarImage, ImageCacheEntry};
use crate::error::StoreResult;
use crate::ports::{Clock, ImageSearchService, KeyValueStore};
use crate::store::{keys, Collection, EntityStore, StoreOptions};

impl Collection for Vec<ImageCacheEntry> {
    fn sanitize(self) -> Self {
        let mut entries: Vec<ImageCacheEntry> = Vec::with_capacity(self.len());
        for entry in self {
            if !entries.iter().any(|e| e.car_id == entry.car_id) {
                entries.push(entry);
            }
        }
        entries
    }
}

pub struct ImageCache {
    entries: EntityStore<Vec<ImageCacheEntry>>,
    search: Arc<dyn ImageSearchService>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    count: usize,
}

impl ImageCache {
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        options: &StoreOptions,
        search: Arc<dyn ImageSearchService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entries: EntityStore::load(kv, options.key(keys::IMAGE_CACHE)).await,
            search,
            clock,
            ttl: options.image_cache_ttl,
            count: options.image_search_count,
        }
    }

    /// Cached images while fresh, otherwise a new search.
    pub async fn get_car_images(&self, car_id: &str, query: &str) -> Vec<CarImage> {
        let cached = self.entry(car_id).await;
        if let Some(entry) = &cached {
            if self.is_fresh(entry.last_fetched) {
                debug!(car_id, "Image cache hit");
                return entry.images.clone();
            }
            debug!(car_id, "Image cache entry is stale");
        }
        self.fetch_and_store(car_id, query, cached).await
    }

    /// Searches again regardless of the cached entry's age.
    pub async fn refresh_car_images(&self, car_id: &str, query: &str) -> Vec<CarImage> {
        let cached = self.entry(car_id).await;
        self.fetch_and_store(car_id, query, cached).await
    }

    /// Drops the whole persisted cache.
    pub async fn clear_cache(&self) -> StoreResult<()> {
        self.entries.clear().await?;
        info!("Image cache cleared");
        Ok(())
    }

    /// Cached images without fetching, fresh or not.
    pub async fn cached_images(&self, car_id: &str) -> Option<Vec<CarImage>> {
        self.entry(car_id).await.map(|entry| entry.images)
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read(|entries| entries.len()).await
    }

    /// A fetch time in the future (clock moved back) counts as stale.
    fn is_fresh(&self, last_fetched: DateTime<Utc>) -> bool {
        let age = self.clock.now() - last_fetched;
        age >= Duration::zero() && age < self.ttl
    }

    async fn entry(&self, car_id: &str) -> Option<ImageCacheEntry> {
        self.entries
            .read(|entries| entries.iter().find(|e| e.car_id == car_id).cloned())
            .await
    }

    async fn fetch_and_store(
        &self,
        car_id: &str,
        query: &str,
        cached: Option<ImageCacheEntry>,
    ) -> Vec<CarImage> {
        let fallback = || cached.map(|entry| entry.images).unwrap_or_default();

        let images = match self.search.search(query, self.count).await {
            Ok(images) if !images.is_empty() => images,
            Ok(_) => {
                info!(car_id, query, "Image search returned nothing, using cached images");
                return fallback();
            }
            Err(e) => {
                warn!(car_id, query, "Image search failed, using cached images: {}", e);
                return fallback();
            }
        };

        let entry = ImageCacheEntry {
            car_id: car_id.to_string(),
            images: images.clone(),
            last_fetched: self.clock.now(),
        };
        let stored = self
            .entries
            .mutate(|entries| {
                match entries.iter_mut().find(|e| e.car_id == entry.car_id) {
                    Some(existing) => *existing = entry,
                    None => entries.push(entry),
                }
                Ok(())
            })
            .await;
        if stored.is_ok() {
            debug!(car_id, count = images.len(), "Image cache updated");
        }
        // A failed write is already logged; the fresh images are still usable.
        images
    }
}
