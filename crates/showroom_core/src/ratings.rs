//! crates/showroom_core/src/ratings.rs
//!
//! Star ratings and written reviews, one per user per car.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthStore;
use crate::domain::Review;
use crate::error::{StoreError, StoreResult};
use crate::ports::{Clock, KeyValueStore};
use crate::store::{keys, Collection, EntityStore, StoreOptions};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

impl Collection for Vec<Review> {
    fn sanitize(self) -> Self {
        let mut reviews: Vec<Review> = Vec::with_capacity(self.len());
        for review in self {
            if !(MIN_RATING..=MAX_RATING).contains(&review.rating)
                || review.comment.trim().is_empty()
            {
                warn!(review_id = %review.id, "Dropping stored review with invalid content");
                continue;
            }
            if reviews
                .iter()
                .any(|r| r.car_id == review.car_id && r.user_id == review.user_id)
            {
                warn!(review_id = %review.id, "Dropping duplicate stored review");
                continue;
            }
            reviews.push(review);
        }
        reviews
    }
}

pub struct RatingsStore {
    reviews: EntityStore<Vec<Review>>,
    auth: Arc<AuthStore>,
    clock: Arc<dyn Clock>,
}

impl RatingsStore {
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        options: &StoreOptions,
        auth: Arc<AuthStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews: EntityStore::load(kv, options.key(keys::REVIEWS)).await,
            auth,
            clock,
        }
    }

    /// Adds the logged-in user's review for `car_id`.
    pub async fn add_review(&self, car_id: &str, rating: u8, comment: &str) -> StoreResult<Review> {
        let comment = validate(rating, comment)?;
        let user = self
            .auth
            .current_user()
            .await
            .ok_or(StoreError::NoActiveSession)?;

        let review = Review {
            id: Uuid::now_v7(),
            car_id: car_id.to_string(),
            user_id: user.id,
            user_name: user.name,
            rating,
            comment,
            date: self.clock.now(),
        };

        let review = self
            .reviews
            .mutate(|reviews| {
                if reviews
                    .iter()
                    .any(|r| r.car_id == review.car_id && r.user_id == review.user_id)
                {
                    return Err(StoreError::DuplicateReview);
                }
                reviews.push(review.clone());
                Ok(review)
            })
            .await?;

        info!(review_id = %review.id, car_id = %review.car_id, rating, "Review added");
        Ok(review)
    }

    /// Rewrites rating, comment and date of an existing review.
    ///
    /// Ownership is not checked here; callers only offer editing on the user's own review.
    pub async fn update_review(
        &self,
        review_id: Uuid,
        rating: u8,
        comment: &str,
    ) -> StoreResult<Review> {
        let comment = validate(rating, comment)?;
        let now = self.clock.now();

        let review = self
            .reviews
            .mutate(|reviews| {
                let review = reviews
                    .iter_mut()
                    .find(|r| r.id == review_id)
                    .ok_or(StoreError::ReviewNotFound(review_id))?;
                review.rating = rating;
                review.comment = comment;
                review.date = now;
                Ok(review.clone())
            })
            .await?;

        info!(%review_id, rating, "Review updated");
        Ok(review)
    }

    /// Removes the review if present; a missing id is not an error.
    pub async fn delete_review(&self, review_id: Uuid) -> StoreResult<()> {
        self.reviews
            .mutate(|reviews| {
                reviews.retain(|r| r.id != review_id);
                Ok(())
            })
            .await?;
        info!(%review_id, "Review deleted");
        Ok(())
    }

    /// Reviews for a car, newest first.
    pub async fn reviews_for_car(&self, car_id: &str) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read(|reviews| reviews.iter().filter(|r| r.car_id == car_id).cloned().collect())
            .await;
        reviews.sort_by(|a, b| b.date.cmp(&a.date));
        reviews
    }

    /// Mean rating for a car, 0.0 when it has no reviews.
    pub async fn average_rating(&self, car_id: &str) -> f64 {
        self.reviews
            .read(|reviews| {
                let (sum, count) = reviews
                    .iter()
                    .filter(|r| r.car_id == car_id)
                    .fold((0u32, 0u32), |(sum, count), r| (sum + u32::from(r.rating), count + 1));
                if count == 0 {
                    0.0
                } else {
                    f64::from(sum) / f64::from(count)
                }
            })
            .await
    }

    pub async fn review_count(&self, car_id: &str) -> usize {
        self.reviews
            .read(|reviews| reviews.iter().filter(|r| r.car_id == car_id).count())
            .await
    }

    /// Number of reviews per star, index 0 is one star.
    pub async fn rating_distribution(&self, car_id: &str) -> [usize; 5] {
        self.reviews
            .read(|reviews| {
                let mut counts = [0usize; 5];
                for review in reviews.iter().filter(|r| r.car_id == car_id) {
                    counts[usize::from(review.rating - MIN_RATING)] += 1;
                }
                counts
            })
            .await
    }

    /// The logged-in user's review for a car.
    pub async fn user_review(&self, car_id: &str) -> Option<Review> {
        let user = self.auth.current_user().await?;
        self.reviews
            .read(|reviews| {
                reviews
                    .iter()
                    .find(|r| r.car_id == car_id && r.user_id == user.id)
                    .cloned()
            })
            .await
    }
}

fn validate(rating: u8, comment: &str) -> StoreResult<String> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(StoreError::InvalidRating(rating));
    }
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(StoreError::EmptyComment);
    }
    Ok(comment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::NewUser;
    use crate::memory::MemoryKeyValueStore;
    use crate::test_support::epoch;
    use chrono::Duration;

    struct Fixture {
        auth: Arc<AuthStore>,
        ratings: RatingsStore,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let options = StoreOptions::default();
        let auth = Arc::new(AuthStore::load(kv.clone(), &options, clock.clone()).await);
        let ratings = RatingsStore::load(kv, &options, auth.clone(), clock.clone()).await;
        Fixture {
            auth,
            ratings,
            clock,
        }
    }

    async fn sign_up(auth: &AuthStore, email: &str) {
        auth.register(NewUser {
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            password: "1234".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn add_then_read_back_trimmed_comment() {
        let f = fixture().await;
        sign_up(&f.auth, "a@x.com").await;

        for rating in MIN_RATING..=MAX_RATING {
            let car_id = format!("car-{}", rating);
            f.ratings
                .add_review(&car_id, rating, "  Great car  ")
                .await
                .unwrap();
            let review = f.ratings.user_review(&car_id).await.unwrap();
            assert_eq!(review.rating, rating);
            assert_eq!(review.comment, "Great car");
        }
    }

    #[tokio::test]
    async fn validation_failures() {
        let f = fixture().await;

        assert!(matches!(
            f.ratings.add_review("c1", 5, "Great").await,
            Err(StoreError::NoActiveSession)
        ));

        sign_up(&f.auth, "a@x.com").await;
        assert!(matches!(
            f.ratings.add_review("c1", 0, "Great").await,
            Err(StoreError::InvalidRating(0))
        ));
        assert!(matches!(
            f.ratings.add_review("c1", 6, "Great").await,
            Err(StoreError::InvalidRating(6))
        ));
        assert!(matches!(
            f.ratings.add_review("c1", 3, "   ").await,
            Err(StoreError::EmptyComment)
        ));
        assert_eq!(f.ratings.review_count("c1").await, 0);
    }

    #[tokio::test]
    async fn second_review_for_same_car_is_rejected() {
        let f = fixture().await;
        sign_up(&f.auth, "a@x.com").await;

        f.ratings.add_review("c1", 5, "Great").await.unwrap();
        let result = f.ratings.add_review("c1", 3, "Actually ok").await;
        assert!(matches!(result, Err(StoreError::DuplicateReview)));
        assert_eq!(f.ratings.review_count("c1").await, 1);

        // Another user can still review the same car.
        sign_up(&f.auth, "b@x.com").await;
        f.ratings.add_review("c1", 1, "Meh").await.unwrap();
        assert_eq!(f.ratings.review_count("c1").await, 2);
    }

    #[tokio::test]
    async fn update_always_refreshes_date() {
        let f = fixture().await;
        sign_up(&f.auth, "a@x.com").await;
        let review = f.ratings.add_review("c1", 4, "Nice").await.unwrap();

        f.clock.advance(Duration::minutes(5));
        let updated = f.ratings.update_review(review.id, 4, "Nice").await.unwrap();
        assert_eq!(updated.id, review.id);
        assert_eq!(updated.date, epoch() + Duration::minutes(5));

        let missing = Uuid::new_v4();
        assert!(matches!(
            f.ratings.update_review(missing, 4, "Nice").await,
            Err(StoreError::ReviewNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn averages_and_ordering() {
        let f = fixture().await;
        assert_eq!(f.ratings.average_rating("c1").await, 0.0);

        for (email, rating) in [("a@x.com", 5), ("b@x.com", 3), ("c@x.com", 4)] {
            sign_up(&f.auth, email).await;
            f.ratings.add_review("c1", rating, "ok").await.unwrap();
            f.clock.advance(Duration::seconds(1));
        }

        assert_eq!(f.ratings.average_rating("c1").await, 4.0);
        assert_eq!(f.ratings.rating_distribution("c1").await, [0, 0, 1, 1, 1]);

        let ratings: Vec<u8> = f
            .ratings
            .reviews_for_car("c1")
            .await
            .iter()
            .map(|r| r.rating)
            .collect();
        assert_eq!(ratings, vec![4, 3, 5]);
    }

    #[tokio::test]
    async fn delete_is_unconditional() {
        let f = fixture().await;
        sign_up(&f.auth, "a@x.com").await;
        let review = f.ratings.add_review("c1", 2, "Loud").await.unwrap();

        f.ratings.delete_review(review.id).await.unwrap();
        f.ratings.delete_review(review.id).await.unwrap();
        assert!(f.ratings.user_review("c1").await.is_none());

        // The slot is free again.
        f.ratings.add_review("c1", 4, "Grew on me").await.unwrap();
    }

    #[tokio::test]
    async fn login_update_flow() {
        let f = fixture().await;
        sign_up(&f.auth, "a@x.com").await;
        f.auth.logout().await.unwrap();
        f.auth.login("A@X.com", "1234").await.unwrap();

        let review = f.ratings.add_review("c1", 5, "Great").await.unwrap();
        assert!(matches!(
            f.ratings.add_review("c1", 3, "Actually ok").await,
            Err(StoreError::DuplicateReview)
        ));
        f.ratings
            .update_review(review.id, 3, "Actually ok")
            .await
            .unwrap();
        assert_eq!(f.ratings.average_rating("c1").await, 3.0);
    }
}
