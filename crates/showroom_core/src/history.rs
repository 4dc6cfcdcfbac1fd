//! crates/showroom_core/src/history.rs
//!
//! Recently viewed cars, most recent first, one entry per car.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Car, ViewHistoryItem};
use crate::error::StoreResult;
use crate::ports::{Clock, KeyValueStore};
use crate::store::{keys, Collection, EntityStore, StoreOptions};

/// How many entries `most_viewed` returns.
pub const MOST_VIEWED_LIMIT: usize = 10;

impl Collection for Vec<ViewHistoryItem> {
    fn sanitize(self) -> Self {
        let mut items: Vec<ViewHistoryItem> = Vec::with_capacity(self.len());
        for mut item in self {
            if items.iter().any(|i| i.car.id == item.car.id) {
                continue;
            }
            item.view_count = item.view_count.max(1);
            items.push(item);
        }
        items
    }
}

pub struct HistoryStore {
    items: EntityStore<Vec<ViewHistoryItem>>,
    limit: usize,
    clock: Arc<dyn Clock>,
}

impl HistoryStore {
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        options: &StoreOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let items = EntityStore::load(kv, options.key(keys::VIEW_HISTORY)).await;
        Self {
            items,
            limit: options.history_limit,
            clock,
        }
    }

    /// Records a view: bumps and moves an existing entry to the front, or inserts a new
    /// one there, then trims the tail down to the limit.
    pub async fn add_to_history(&self, car: &Car) -> StoreResult<ViewHistoryItem> {
        let now = self.clock.now();
        let limit = self.limit;

        let item = self
            .items
            .mutate(|items| {
                let item = match items.iter().position(|i| i.car.id == car.id) {
                    Some(index) => {
                        let mut existing = items.remove(index);
                        existing.car = car.clone();
                        existing.view_count += 1;
                        existing.viewed_at = now;
                        existing
                    }
                    None => ViewHistoryItem {
                        car: car.clone(),
                        viewed_at: now,
                        view_count: 1,
                    },
                };
                items.insert(0, item.clone());
                items.truncate(limit);
                Ok(item)
            })
            .await?;

        debug!(car_id = %car.id, view_count = item.view_count, "Car added to history");
        Ok(item)
    }

    pub async fn remove_from_history(&self, car_id: &str) -> StoreResult<()> {
        self.items
            .mutate(|items| {
                items.retain(|i| i.car.id != car_id);
                Ok(())
            })
            .await
    }

    pub async fn clear_history(&self) -> StoreResult<()> {
        self.items.reset().await
    }

    /// 0 when the car is not in the history.
    pub async fn view_count(&self, car_id: &str) -> u32 {
        self.items
            .read(|items| {
                items
                    .iter()
                    .find(|i| i.car.id == car_id)
                    .map_or(0, |i| i.view_count)
            })
            .await
    }

    pub async fn last_viewed(&self) -> Option<ViewHistoryItem> {
        self.items.read(|items| items.first().cloned()).await
    }

    /// Top entries by view count; equal counts keep their recency order.
    pub async fn most_viewed(&self) -> Vec<ViewHistoryItem> {
        let mut items = self.items.snapshot().await;
        items.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        items.truncate(MOST_VIEWED_LIMIT);
        items
    }

    /// The first `n` entries in recency order.
    pub async fn recent(&self, n: usize) -> Vec<ViewHistoryItem> {
        self.items
            .read(|items| items.iter().take(n).cloned().collect())
            .await
    }

    pub async fn entries(&self) -> Vec<ViewHistoryItem> {
        self.items.snapshot().await
    }

    pub async fn len(&self) -> usize {
        self.items.read(|items| items.len()).await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
