//! crates/showroom_core/src/stats.rs
//!
//! Usage counters, frequency tables, time-in-app accounting and one-way achievements.
//!
//! Everything is kept in a single `UserStats` document under the `user_stats` key.
//! Counters only grow, except `total_favorites` which follows unfavoriting. Unlocked
//! achievements are never removed, even when the counter behind them goes back down.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::Car;
use crate::error::StoreResult;
use crate::ports::{Clock, KeyValueStore};
use crate::store::{keys, Collection, EntityStore, StoreOptions};

//=========================================================================================
// Frequency Tables
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub key: String,
    pub count: u64,
}

/// Counts per key, kept in first-seen order so ties resolve to the earliest key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(Vec<FrequencyEntry>);

impl FrequencyTable {
    /// Adds one to `key` and returns the new count.
    pub fn increment(&mut self, key: &str) -> u64 {
        match self.0.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.count += 1;
                entry.count
            }
            None => {
                self.0.push(FrequencyEntry {
                    key: key.to_string(),
                    count: 1,
                });
                1
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.0.iter().find(|e| e.key == key).map_or(0, |e| e.count)
    }

    /// Highest count; on a tie the first-inserted key wins.
    pub fn most_frequent(&self) -> Option<&FrequencyEntry> {
        self.0.iter().fold(None, |best: Option<&FrequencyEntry>, entry| match best {
            Some(b) if b.count >= entry.count => Some(b),
            _ => Some(entry),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn dedup(&mut self) {
        let mut merged: Vec<FrequencyEntry> = Vec::with_capacity(self.0.len());
        for entry in self.0.drain(..) {
            match merged.iter_mut().find(|e| e.key == entry.key) {
                Some(existing) => existing.count += entry.count,
                None => merged.push(entry),
            }
        }
        self.0 = merged;
    }
}

//=========================================================================================
// UserStats
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_car_views: u64,
    pub total_favorites: u64,
    pub total_comparisons: u64,
    pub total_reviews: u64,
    pub total_searches: u64,
    pub total_shares: u64,
    /// Seconds.
    pub total_time_in_app: u64,
    pub session_count: u64,
    pub first_open_date: Option<DateTime<Utc>>,
    pub last_open_date: Option<DateTime<Utc>>,
    pub session_start: Option<DateTime<Utc>>,
    pub car_views: FrequencyTable,
    pub brand_views: FrequencyTable,
    pub search_terms: FrequencyTable,
    pub filters_used: FrequencyTable,
    pub most_viewed_car: Option<String>,
    pub favorite_brand: Option<String>,
    pub most_searched_term: Option<String>,
    pub most_used_filter: Option<String>,
    pub achievements: Vec<String>,
}

impl Collection for UserStats {
    fn sanitize(mut self) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(self.achievements.len());
        for id in self.achievements.drain(..) {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.achievements = unique;

        for table in [
            &mut self.car_views,
            &mut self.brand_views,
            &mut self.search_terms,
            &mut self.filters_used,
        ] {
            table.dedup();
        }
        self.refresh_pointers();
        self
    }
}

impl UserStats {
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    /// Experience points: a fixed weighted sum of the counters.
    pub fn experience(&self) -> u64 {
        self.total_car_views * 10
            + self.total_favorites * 50
            + self.total_comparisons * 30
            + self.total_reviews * 100
            + self.total_shares * 75
    }

    fn refresh_pointers(&mut self) {
        self.most_viewed_car = self.car_views.most_frequent().map(|e| e.key.clone());
        self.favorite_brand = self.brand_views.most_frequent().map(|e| e.key.clone());
        self.most_searched_term = self.search_terms.most_frequent().map(|e| e.key.clone());
        self.most_used_filter = self.filters_used.most_frequent().map(|e| e.key.clone());
    }

    /// Appends every newly satisfied achievement, in catalog order.
    fn unlock_achievements(&mut self) -> Vec<Achievement> {
        let mut unlocked = Vec::new();
        for achievement in ACHIEVEMENTS.iter() {
            if !self.has_achievement(achievement.id) && achievement.requirement.is_met(self) {
                self.achievements.push(achievement.id.to_string());
                unlocked.push(*achievement);
            }
        }
        unlocked
    }
}

//=========================================================================================
// Achievements
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "counter", content = "threshold", rename_all = "camelCase")]
pub enum Requirement {
    CarViews(u64),
    Favorites(u64),
    Comparisons(u64),
    Reviews(u64),
    Searches(u64),
    Shares(u64),
    /// Seconds.
    TimeInApp(u64),
}

impl Requirement {
    pub fn is_met(&self, stats: &UserStats) -> bool {
        match *self {
            Requirement::CarViews(n) => stats.total_car_views >= n,
            Requirement::Favorites(n) => stats.total_favorites >= n,
            Requirement::Comparisons(n) => stats.total_comparisons >= n,
            Requirement::Reviews(n) => stats.total_reviews >= n,
            Requirement::Searches(n) => stats.total_searches >= n,
            Requirement::Shares(n) => stats.total_shares >= n,
            Requirement::TimeInApp(n) => stats.total_time_in_app >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub requirement: Requirement,
}

pub const ACHIEVEMENTS: [Achievement; 10] = [
    Achievement {
        id: "first_view",
        title: "First Look",
        description: "View your first car",
        icon: "eye",
        requirement: Requirement::CarViews(1),
    },
    Achievement {
        id: "car_enthusiast",
        title: "Car Enthusiast",
        description: "View 10 cars",
        icon: "car",
        requirement: Requirement::CarViews(10),
    },
    Achievement {
        id: "car_expert",
        title: "Car Expert",
        description: "View 50 cars",
        icon: "speedometer",
        requirement: Requirement::CarViews(50),
    },
    Achievement {
        id: "first_favorite",
        title: "Love at First Sight",
        description: "Add your first favorite",
        icon: "heart",
        requirement: Requirement::Favorites(1),
    },
    Achievement {
        id: "collector",
        title: "Collector",
        description: "Keep 5 favorites",
        icon: "albums",
        requirement: Requirement::Favorites(5),
    },
    Achievement {
        id: "comparator",
        title: "Analyst",
        description: "Compare cars 5 times",
        icon: "git-compare",
        requirement: Requirement::Comparisons(5),
    },
    Achievement {
        id: "critic",
        title: "Critic",
        description: "Write your first review",
        icon: "star",
        requirement: Requirement::Reviews(1),
    },
    Achievement {
        id: "explorer",
        title: "Explorer",
        description: "Run 10 searches",
        icon: "search",
        requirement: Requirement::Searches(10),
    },
    Achievement {
        id: "sharer",
        title: "Spread the Word",
        description: "Share a car",
        icon: "share-social",
        requirement: Requirement::Shares(1),
    },
    Achievement {
        id: "dedicated",
        title: "Dedicated",
        description: "Spend an hour in the showroom",
        icon: "time",
        requirement: Requirement::TimeInApp(3600),
    },
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

//=========================================================================================
// Report
//=========================================================================================

pub const XP_PER_LEVEL: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total_car_views: u64,
    pub total_favorites: u64,
    pub total_comparisons: u64,
    pub total_reviews: u64,
    pub total_searches: u64,
    pub total_shares: u64,
    pub session_count: u64,
    /// "{hours}h {minutes}m"
    pub time_in_app: String,
    pub days_active: i64,
    pub experience: u64,
    pub level: u64,
    /// 0..=100 towards the next level.
    pub level_progress: u8,
    pub most_viewed_car: Option<String>,
    pub favorite_brand: Option<String>,
    pub most_searched_term: Option<String>,
    pub most_used_filter: Option<String>,
    pub achievements: Vec<Achievement>,
    pub achievements_available: usize,
}

impl StatsReport {
    pub fn from_stats(stats: &UserStats) -> Self {
        let experience = stats.experience();
        let days_active = match (stats.first_open_date, stats.last_open_date) {
            (Some(first), Some(last)) => {
                (last.date_naive() - first.date_naive()).num_days().max(0) + 1
            }
            _ => 0,
        };
        let achievements = ACHIEVEMENTS
            .iter()
            .filter(|a| stats.has_achievement(a.id))
            .copied()
            .collect();

        Self {
            total_car_views: stats.total_car_views,
            total_favorites: stats.total_favorites,
            total_comparisons: stats.total_comparisons,
            total_reviews: stats.total_reviews,
            total_searches: stats.total_searches,
            total_shares: stats.total_shares,
            session_count: stats.session_count,
            time_in_app: format_duration(stats.total_time_in_app),
            days_active,
            experience,
            level: experience / XP_PER_LEVEL + 1,
            // Always < 100 since the remainder is < XP_PER_LEVEL.
            level_progress: ((experience % XP_PER_LEVEL) * 100 / XP_PER_LEVEL) as u8,
            most_viewed_car: stats.most_viewed_car.clone(),
            favorite_brand: stats.favorite_brand.clone(),
            most_searched_term: stats.most_searched_term.clone(),
            most_used_filter: stats.most_used_filter.clone(),
            achievements,
            achievements_available: ACHIEVEMENTS.len(),
        }
    }
}

fn format_duration(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

//=========================================================================================
// StatsStore
//=========================================================================================

pub struct StatsStore {
    stats: EntityStore<UserStats>,
    clock: Arc<dyn Clock>,
}

impl StatsStore {
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        options: &StoreOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stats: EntityStore::load(kv, options.key(keys::USER_STATS)).await,
            clock,
        }
    }

    pub async fn stats(&self) -> UserStats {
        self.stats.snapshot().await
    }

    pub async fn report(&self) -> StatsReport {
        self.stats.read(StatsReport::from_stats).await
    }

    pub async fn record_car_view(&self, car: &Car) -> StoreResult<Vec<Achievement>> {
        self.record(|stats| {
            stats.total_car_views += 1;
            stats.car_views.increment(&car.id);
            stats.brand_views.increment(&car.brand);
        })
        .await
    }

    /// `added` is false when a car was unfavorited; the counter never goes below zero.
    pub async fn record_favorite(&self, added: bool) -> StoreResult<Vec<Achievement>> {
        self.record(|stats| {
            if added {
                stats.total_favorites += 1;
            } else {
                stats.total_favorites = stats.total_favorites.saturating_sub(1);
            }
        })
        .await
    }

    pub async fn record_comparison(&self) -> StoreResult<Vec<Achievement>> {
        self.record(|stats| stats.total_comparisons += 1).await
    }

    pub async fn record_review(&self) -> StoreResult<Vec<Achievement>> {
        self.record(|stats| stats.total_reviews += 1).await
    }

    /// Terms are trimmed and lowercased; blank searches are not counted.
    pub async fn record_search(&self, term: &str) -> StoreResult<Vec<Achievement>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.record(|stats| {
            stats.total_searches += 1;
            stats.search_terms.increment(&term);
        })
        .await
    }

    pub async fn record_filter(&self, filter_kind: &str) -> StoreResult<Vec<Achievement>> {
        let filter_kind = filter_kind.trim().to_string();
        if filter_kind.is_empty() {
            return Ok(Vec::new());
        }
        self.record(|stats| {
            stats.filters_used.increment(&filter_kind);
        })
        .await
    }

    pub async fn record_share(&self) -> StoreResult<Vec<Achievement>> {
        self.record(|stats| stats.total_shares += 1).await
    }

    pub async fn check_achievements(&self) -> StoreResult<Vec<Achievement>> {
        self.record(|_| {}).await
    }

    /// Marks the start of an app session.
    pub async fn start_session(&self) -> StoreResult<()> {
        let now = self.clock.now();
        self.stats
            .mutate(|stats| {
                if stats.session_start.is_some() {
                    warn!("Previous session was never ended, its time is lost");
                }
                stats.session_start = Some(now);
                stats.session_count += 1;
                stats.first_open_date.get_or_insert(now);
                stats.last_open_date = Some(now);
                Ok(())
            })
            .await
    }

    /// Adds the time since `start_session` to the running total.
    pub async fn end_session(&self) -> StoreResult<Vec<Achievement>> {
        let now = self.clock.now();
        let unlocked = self
            .stats
            .mutate(|stats| {
                let Some(start) = stats.session_start.take() else {
                    return Ok(None);
                };
                let elapsed = (now - start).num_seconds().max(0) as u64;
                stats.total_time_in_app += elapsed;
                stats.last_open_date = Some(now);
                info!(elapsed_seconds = elapsed, "Session ended");
                Ok(Some(stats.unlock_achievements()))
            })
            .await?;

        match unlocked {
            Some(unlocked) => {
                log_unlocked(&unlocked);
                Ok(unlocked)
            }
            None => {
                warn!("end_session called without an active session");
                Ok(Vec::new())
            }
        }
    }

    pub async fn reset(&self) -> StoreResult<()> {
        self.stats.reset().await?;
        info!("Stats reset");
        Ok(())
    }

    async fn record(&self, f: impl FnOnce(&mut UserStats)) -> StoreResult<Vec<Achievement>> {
        let unlocked = self
            .stats
            .mutate(|stats| {
                f(stats);
                stats.refresh_pointers();
                Ok(stats.unlock_achievements())
            })
            .await?;
        log_unlocked(&unlocked);
        Ok(unlocked)
    }
}

fn log_unlocked(unlocked: &[Achievement]) {
    for achievement in unlocked {
        info!(achievement = achievement.id, "Achievement unlocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryKeyValueStore;
    use crate::test_support::{car, car_with_brand, epoch};
    use chrono::Duration;

    async fn store() -> (StatsStore, Arc<ManualClock>, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = StatsStore::load(kv.clone(), &StoreOptions::default(), clock.clone()).await;
        (store, clock, kv)
    }

    fn ids(achievements: &[Achievement]) -> Vec<&'static str> {
        achievements.iter().map(|a| a.id).collect()
    }

    #[test]
    fn frequency_table_ties_go_to_first_seen() {
        let mut table = FrequencyTable::default();
        assert!(table.most_frequent().is_none());

        table.increment("bmw");
        table.increment("audi");
        assert_eq!(table.most_frequent().unwrap().key, "bmw");

        table.increment("audi");
        assert_eq!(table.most_frequent().unwrap().key, "audi");
        table.increment("bmw");
        assert_eq!(table.most_frequent().unwrap().key, "bmw");
        assert_eq!(table.get("audi"), 2);
        assert_eq!(table.get("tesla"), 0);
    }

    #[test]
    fn catalog_has_ten_unique_ids() {
        let mut seen: Vec<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
        assert!(find_achievement("first_view").is_some());
        assert!(find_achievement("nope").is_none());
    }

    #[tokio::test]
    async fn first_view_unlocks_once() {
        let (stats, _, _) = store().await;

        let unlocked = stats.record_car_view(&car("c1")).await.unwrap();
        assert_eq!(ids(&unlocked), vec!["first_view"]);

        assert!(stats.check_achievements().await.unwrap().is_empty());
        let current = stats.stats().await;
        assert_eq!(current.total_car_views, 1);
        assert_eq!(current.achievements, vec!["first_view".to_string()]);
    }

    #[tokio::test]
    async fn achievements_are_never_revoked() {
        let (stats, _, _) = store().await;
        for _ in 0..5 {
            stats.record_favorite(true).await.unwrap();
        }
        assert!(stats.stats().await.has_achievement("collector"));

        for _ in 0..7 {
            stats.record_favorite(false).await.unwrap();
        }
        let current = stats.stats().await;
        assert_eq!(current.total_favorites, 0);
        assert!(current.has_achievement("collector"));
        assert!(current.has_achievement("first_favorite"));
    }

    #[tokio::test]
    async fn view_pointers_follow_counts() {
        let (stats, _, _) = store().await;
        stats.record_car_view(&car_with_brand("c1", "BMW")).await.unwrap();
        stats.record_car_view(&car_with_brand("c2", "Audi")).await.unwrap();
        stats.record_car_view(&car_with_brand("c3", "Audi")).await.unwrap();

        let current = stats.stats().await;
        assert_eq!(current.most_viewed_car.as_deref(), Some("c1"));
        assert_eq!(current.favorite_brand.as_deref(), Some("Audi"));
        assert_eq!(current.car_views.get("c3"), 1);
    }

    #[tokio::test]
    async fn searches_are_normalized() {
        let (stats, _, _) = store().await;
        stats.record_search("  Porsche ").await.unwrap();
        stats.record_search("porsche").await.unwrap();
        stats.record_search("tesla").await.unwrap();
        stats.record_search("   ").await.unwrap();
        stats.record_filter("brand").await.unwrap();

        let current = stats.stats().await;
        assert_eq!(current.total_searches, 3);
        assert_eq!(current.search_terms.get("porsche"), 2);
        assert_eq!(current.most_searched_term.as_deref(), Some("porsche"));
        assert_eq!(current.most_used_filter.as_deref(), Some("brand"));
    }

    #[tokio::test]
    async fn session_time_accumulates() {
        let (stats, clock, _) = store().await;

        stats.start_session().await.unwrap();
        clock.advance(Duration::minutes(45));
        assert!(stats.end_session().await.unwrap().is_empty());

        clock.advance(Duration::days(2));
        stats.start_session().await.unwrap();
        clock.advance(Duration::minutes(20));
        let unlocked = stats.end_session().await.unwrap();
        assert_eq!(ids(&unlocked), vec!["dedicated"]);

        // Ending twice adds nothing.
        assert!(stats.end_session().await.unwrap().is_empty());

        let current = stats.stats().await;
        assert_eq!(current.total_time_in_app, 65 * 60);
        assert_eq!(current.session_count, 2);
        assert_eq!(current.first_open_date, Some(epoch()));

        let report = stats.report().await;
        assert_eq!(report.time_in_app, "1h 5m");
        assert_eq!(report.days_active, 3);
    }

    #[tokio::test]
    async fn report_levels() {
        let (stats, _, _) = store().await;
        let empty = stats.report().await;
        assert_eq!(empty.level, 1);
        assert_eq!(empty.level_progress, 0);
        assert_eq!(empty.days_active, 0);
        assert_eq!(empty.time_in_app, "0h 0m");

        // 12 views (120) + 2 favorites (100) + 3 comparisons (90) + 8 reviews (800) + 1 share (75)
        for n in 0..12 {
            stats.record_car_view(&car(&format!("c{}", n))).await.unwrap();
        }
        for _ in 0..2 {
            stats.record_favorite(true).await.unwrap();
        }
        for _ in 0..3 {
            stats.record_comparison().await.unwrap();
        }
        for _ in 0..8 {
            stats.record_review().await.unwrap();
        }
        stats.record_share().await.unwrap();

        let report = stats.report().await;
        assert_eq!(report.experience, 1185);
        assert_eq!(report.level, 2);
        assert_eq!(report.level_progress, 18);
        assert_eq!(
            ids(&report.achievements),
            vec!["first_view", "car_enthusiast", "first_favorite", "critic", "sharer"]
        );
        assert_eq!(report.achievements_available, 10);
    }

    #[tokio::test]
    async fn reset_and_reload() {
        let (stats, _, kv) = store().await;
        stats.record_share().await.unwrap();

        let reloaded =
            StatsStore::load(kv.clone(), &StoreOptions::default(), Arc::new(ManualClock::new(epoch())))
                .await;
        assert_eq!(reloaded.stats().await.total_shares, 1);

        reloaded.reset().await.unwrap();
        assert_eq!(reloaded.stats().await, UserStats::default());
    }

    #[tokio::test]
    async fn sanitize_repairs_stored_document() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let key = StoreOptions::default().key(keys::USER_STATS);
        kv.set(
            &key,
            r#"{"totalCarViews":3,"achievements":["first_view","first_view"],
                "carViews":[{"key":"c1","count":1},{"key":"c2","count":1},{"key":"c2","count":1}]}"#,
        )
        .await
        .unwrap();

        let stats = StatsStore::load(kv, &StoreOptions::default(), Arc::new(ManualClock::new(epoch())))
            .await;
        let current = stats.stats().await;
        assert_eq!(current.total_car_views, 3);
        assert_eq!(current.achievements, vec!["first_view".to_string()]);
        assert_eq!(current.car_views.len(), 2);
        assert_eq!(current.most_viewed_car.as_deref(), Some("c2"));
    }
}
