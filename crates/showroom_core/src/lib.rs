pub mod auth;
pub mod catalog;
pub mod clock;
pub mod domain;
pub mod error;
pub mod favorites;
pub mod history;
pub mod image_cache;
pub mod memory;
pub mod ports;
pub mod preferences;
pub mod ratings;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::AuthStore;
pub use catalog::{compare, CarComparison, StaticCatalog};
pub use clock::{ManualClock, SystemClock};
pub use domain::{
    Attribution, AuthSuccess, Car, CarImage, ImageCacheEntry, ImageUrls, NewUser,
    NotificationSettings, Review, ThemePreference, User, UserUpdate, ViewHistoryItem,
};
pub use error::{StoreError, StoreResult};
pub use favorites::FavoritesStore;
pub use history::HistoryStore;
pub use image_cache::ImageCache;
pub use memory::MemoryKeyValueStore;
pub use ports::{CatalogSource, Clock, ImageSearchService, KeyValueStore, PortError, PortResult};
pub use preferences::{NotificationSettingsStore, ThemeStore};
pub use ratings::RatingsStore;
pub use stats::{Achievement, StatsReport, StatsStore, UserStats};
pub use store::{EntityStore, StoreOptions};
