//! services/showroom/src/app.rs
//!
//! The `Showroom` context: every store, created once at startup and passed to callers.
//!
//! Stores stay independent of each other; the event methods here are where one user
//! action touches several of them (a car view updates history and stats, a review
//! updates ratings and stats). Stats updates are best-effort and never fail the action.

use std::sync::Arc;

use showroom_core::catalog::{compare, CarComparison, StaticCatalog};
use showroom_core::domain::{Car, CarImage, Review, ViewHistoryItem};
use showroom_core::error::StoreResult;
use showroom_core::ports::{CatalogSource, Clock, ImageSearchService, KeyValueStore, PortError};
use showroom_core::stats::Achievement;
use showroom_core::store::StoreOptions;
use showroom_core::{
    AuthStore, FavoritesStore, HistoryStore, ImageCache, NotificationSettingsStore, RatingsStore,
    StatsStore, ThemeStore,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

//=========================================================================================
// Dependencies
//=========================================================================================

/// Everything the stores need from the outside world.
#[derive(Clone)]
pub struct ShowroomDeps {
    pub kv: Arc<dyn KeyValueStore>,
    pub image_search: Arc<dyn ImageSearchService>,
    pub catalog: Arc<StaticCatalog>,
    pub clock: Arc<dyn Clock>,
    pub options: StoreOptions,
}

//=========================================================================================
// Filters
//=========================================================================================

/// Catalog filters; the kind name is what the stats record.
#[derive(Debug, Clone, PartialEq)]
pub enum CarFilter {
    Brand(String),
    FuelType(String),
    Drivetrain(String),
    MaxPrice(u32),
}

impl CarFilter {
    pub fn kind(&self) -> &'static str {
        match self {
            CarFilter::Brand(_) => "brand",
            CarFilter::FuelType(_) => "fuel_type",
            CarFilter::Drivetrain(_) => "drivetrain",
            CarFilter::MaxPrice(_) => "max_price",
        }
    }

    pub fn matches(&self, car: &Car) -> bool {
        match self {
            CarFilter::Brand(brand) => car.brand.eq_ignore_ascii_case(brand),
            CarFilter::FuelType(fuel) => car.fuel_type.eq_ignore_ascii_case(fuel),
            CarFilter::Drivetrain(drivetrain) => car.drivetrain.eq_ignore_ascii_case(drivetrain),
            CarFilter::MaxPrice(max) => car.price <= *max,
        }
    }
}

//=========================================================================================
// Showroom
//=========================================================================================

pub struct Showroom {
    pub auth: Arc<AuthStore>,
    pub ratings: RatingsStore,
    pub favorites: FavoritesStore,
    pub history: HistoryStore,
    pub stats: StatsStore,
    pub images: ImageCache,
    pub theme: ThemeStore,
    pub notifications: NotificationSettingsStore,
    pub catalog: Arc<StaticCatalog>,
}

impl Showroom {
    /// Loads every store and opens a stats session.
    pub async fn init(deps: ShowroomDeps) -> Self {
        let ShowroomDeps {
            kv,
            image_search,
            catalog,
            clock,
            options,
        } = deps;

        let auth = Arc::new(AuthStore::load(kv.clone(), &options, clock.clone()).await);
        let (ratings, history, stats, images, theme, notifications) = tokio::join!(
            RatingsStore::load(kv.clone(), &options, auth.clone(), clock.clone()),
            HistoryStore::load(kv.clone(), &options, clock.clone()),
            StatsStore::load(kv.clone(), &options, clock.clone()),
            ImageCache::load(kv.clone(), &options, image_search, clock.clone()),
            ThemeStore::load(kv.clone(), &options),
            NotificationSettingsStore::load(kv, &options),
        );

        let showroom = Self {
            auth,
            ratings,
            favorites: FavoritesStore::new(),
            history,
            stats,
            images,
            theme,
            notifications,
            catalog,
        };

        if let Err(e) = showroom.stats.start_session().await {
            warn!("Failed to start stats session: {}", e);
        }
        info!(cars = showroom.catalog.cars().len(), "Showroom initialized");
        showroom
    }

    /// Closes the stats session so its time is counted.
    pub async fn shutdown(&self) {
        track(self.stats.end_session().await);
        info!("Showroom shut down");
    }

    pub fn car(&self, car_id: &str) -> Result<&Car, AppError> {
        self.catalog
            .find(car_id)
            .ok_or_else(|| AppError::Port(PortError::NotFound(format!("Car {}", car_id))))
    }

    pub async fn view_car(&self, car_id: &str) -> Result<ViewHistoryItem, AppError> {
        let car = self.car(car_id)?;
        let item = self.history.add_to_history(car).await?;
        track(self.stats.record_car_view(car).await);
        Ok(item)
    }

    /// Returns whether the car is a favorite afterwards.
    pub async fn toggle_favorite(&self, car_id: &str) -> Result<bool, AppError> {
        let car = self.car(car_id)?;
        let is_favorite = self.favorites.toggle(car).await;
        track(self.stats.record_favorite(is_favorite).await);
        Ok(is_favorite)
    }

    pub async fn compare_cars(
        &self,
        left_id: &str,
        right_id: &str,
    ) -> Result<CarComparison, AppError> {
        let comparison = compare(self.car(left_id)?, self.car(right_id)?);
        track(self.stats.record_comparison().await);
        Ok(comparison)
    }

    pub async fn submit_review(
        &self,
        car_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<Review, AppError> {
        self.car(car_id)?;
        let review = self.ratings.add_review(car_id, rating, comment).await?;
        track(self.stats.record_review().await);
        Ok(review)
    }

    pub async fn edit_review(
        &self,
        review_id: Uuid,
        rating: u8,
        comment: &str,
    ) -> Result<Review, AppError> {
        Ok(self.ratings.update_review(review_id, rating, comment).await?)
    }

    pub async fn search_catalog(&self, term: &str) -> Vec<Car> {
        let results = self.catalog.search(term).into_iter().cloned().collect();
        track(self.stats.record_search(term).await);
        results
    }

    pub async fn apply_filter(&self, filter: &CarFilter) -> Vec<Car> {
        let results = self
            .catalog
            .cars()
            .iter()
            .filter(|car| filter.matches(car))
            .cloned()
            .collect();
        track(self.stats.record_filter(filter.kind()).await);
        results
    }

    pub async fn share_car(&self, car_id: &str) -> Result<(), AppError> {
        self.car(car_id)?;
        track(self.stats.record_share().await);
        Ok(())
    }

    /// Images for a car, searched by "brand model" when the cache is stale.
    pub async fn car_images(&self, car_id: &str, refresh: bool) -> Result<Vec<CarImage>, AppError> {
        let car = self.car(car_id)?;
        let query = car.display_name();
        let images = if refresh {
            self.images.refresh_car_images(car_id, &query).await
        } else {
            self.images.get_car_images(car_id, &query).await
        };
        Ok(images)
    }
}

/// Logs a failed stats update instead of failing the user action.
fn track(result: StoreResult<Vec<Achievement>>) {
    if let Err(e) = result {
        warn!("Failed to update stats: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use showroom_core::domain::{Attribution, ImageUrls, NewUser};
    use showroom_core::error::StoreError;
    use showroom_core::ports::PortResult;
    use showroom_core::{ManualClock, MemoryKeyValueStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageSearchService for CountingSearch {
        async fn search(&self, query: &str, _count: usize) -> PortResult<Vec<CarImage>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CarImage {
                id: format!("{}-{}", query, call),
                urls: ImageUrls::default(),
                width: 800,
                height: 600,
                description: None,
                attribution: Attribution::default(),
            }])
        }
    }

    struct Fixture {
        showroom: Showroom,
        kv: Arc<MemoryKeyValueStore>,
        clock: Arc<ManualClock>,
        search: Arc<CountingSearch>,
    }

    async fn fixture_on(kv: Arc<MemoryKeyValueStore>) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let search = Arc::new(CountingSearch::default());
        let showroom = Showroom::init(ShowroomDeps {
            kv: kv.clone(),
            image_search: search.clone(),
            catalog: Arc::new(StaticCatalog::default()),
            clock: clock.clone(),
            options: StoreOptions::default(),
        })
        .await;
        Fixture {
            showroom,
            kv,
            clock,
            search,
        }
    }

    async fn fixture() -> Fixture {
        fixture_on(Arc::new(MemoryKeyValueStore::new())).await
    }

    const PORSCHE: &str = "porsche-911-turbo-s";
    const TESLA: &str = "tesla-model-s-plaid";

    #[tokio::test]
    async fn viewing_updates_history_and_stats() {
        let f = fixture().await;
        f.showroom.view_car(PORSCHE).await.unwrap();
        let item = f.showroom.view_car(PORSCHE).await.unwrap();
        assert_eq!(item.view_count, 2);

        let stats = f.showroom.stats.stats().await;
        assert_eq!(stats.total_car_views, 2);
        assert_eq!(stats.most_viewed_car.as_deref(), Some(PORSCHE));
        assert!(stats.has_achievement("first_view"));

        assert!(matches!(
            f.showroom.view_car("lada-niva").await,
            Err(AppError::Port(PortError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn favorites_feed_the_counter() {
        let f = fixture().await;
        assert!(f.showroom.toggle_favorite(PORSCHE).await.unwrap());
        assert!(f.showroom.toggle_favorite(TESLA).await.unwrap());
        assert!(!f.showroom.toggle_favorite(PORSCHE).await.unwrap());

        assert_eq!(f.showroom.favorites.count().await, 1);
        assert_eq!(f.showroom.stats.stats().await.total_favorites, 1);
    }

    #[tokio::test]
    async fn review_flow() {
        let f = fixture().await;
        assert!(matches!(
            f.showroom.submit_review(PORSCHE, 5, "Great").await,
            Err(AppError::Store(StoreError::NoActiveSession))
        ));

        f.showroom
            .auth
            .register(NewUser {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                password: "1234".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        f.showroom.auth.logout().await.unwrap();
        f.showroom.auth.login("A@X.com", "1234").await.unwrap();

        let review = f.showroom.submit_review(PORSCHE, 5, "Great").await.unwrap();
        assert!(matches!(
            f.showroom.submit_review(PORSCHE, 3, "Actually ok").await,
            Err(AppError::Store(StoreError::DuplicateReview))
        ));
        f.showroom
            .edit_review(review.id, 3, "Actually ok")
            .await
            .unwrap();

        assert_eq!(f.showroom.ratings.average_rating(PORSCHE).await, 3.0);
        assert_eq!(f.showroom.stats.stats().await.total_reviews, 1);
    }

    #[tokio::test]
    async fn search_filter_compare_share() {
        let f = fixture().await;
        assert_eq!(f.showroom.search_catalog("porsche").await.len(), 2);
        let electric = f
            .showroom
            .apply_filter(&CarFilter::FuelType("electric".to_string()))
            .await;
        assert_eq!(electric.len(), 3);
        assert_eq!(
            f.showroom.apply_filter(&CarFilter::MaxPrice(90_000)).await.len(),
            2
        );

        let comparison = f.showroom.compare_cars(PORSCHE, TESLA).await.unwrap();
        assert_eq!(comparison.rows.len(), 6);
        f.showroom.share_car(TESLA).await.unwrap();

        let stats = f.showroom.stats.stats().await;
        assert_eq!(stats.total_searches, 1);
        assert_eq!(stats.total_comparisons, 1);
        assert_eq!(stats.total_shares, 1);
        assert_eq!(stats.most_used_filter.as_deref(), Some("fuel_type"));
    }

    #[tokio::test]
    async fn images_are_cached_per_car() {
        let f = fixture().await;
        let first = f.showroom.car_images(PORSCHE, false).await.unwrap();
        assert_eq!(first[0].id, "Porsche 911 Turbo S-0");

        f.clock.advance(Duration::hours(1));
        f.showroom.car_images(PORSCHE, false).await.unwrap();
        assert_eq!(f.search.calls.load(Ordering::SeqCst), 1);

        let refreshed = f.showroom.car_images(PORSCHE, true).await.unwrap();
        assert_eq!(refreshed[0].id, "Porsche 911 Turbo S-1");
    }

    #[tokio::test]
    async fn session_time_is_counted_across_restarts() {
        let f = fixture().await;
        f.clock.advance(Duration::minutes(30));
        f.showroom.shutdown().await;

        let again = fixture_on(f.kv.clone()).await;
        again.clock.advance(Duration::minutes(40));
        again.showroom.shutdown().await;

        let report = again.showroom.stats.report().await;
        assert_eq!(report.session_count, 2);
        assert_eq!(report.time_in_app, "1h 10m");
        assert!(report.achievements.iter().any(|a| a.id == "dedicated"));
    }
}
