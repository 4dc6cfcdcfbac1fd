//! crates/showroom_core/src/favorites.rs
//!
//! Favorite cars for the running session. Held in memory only.

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::Car;

#[derive(Default)]
pub struct FavoritesStore {
    cars: RwLock<Vec<Car>>,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the car was already a favorite.
    pub async fn add(&self, car: &Car) -> bool {
        let mut cars = self.cars.write().await;
        if cars.iter().any(|c| c.id == car.id) {
            return false;
        }
        cars.push(car.clone());
        debug!(car_id = %car.id, "Added favorite");
        true
    }

    /// Returns false if the car was not a favorite.
    pub async fn remove(&self, car_id: &str) -> bool {
        let mut cars = self.cars.write().await;
        let before = cars.len();
        cars.retain(|c| c.id != car_id);
        before != cars.len()
    }

    /// Flips the favorite state and returns the new one.
    pub async fn toggle(&self, car: &Car) -> bool {
        let mut cars = self.cars.write().await;
        if let Some(index) = cars.iter().position(|c| c.id == car.id) {
            cars.remove(index);
            false
        } else {
            cars.push(car.clone());
            true
        }
    }

    pub async fn is_favorite(&self, car_id: &str) -> bool {
        self.cars.read().await.iter().any(|c| c.id == car_id)
    }

    pub async fn list(&self) -> Vec<Car> {
        self.cars.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.cars.read().await.len()
    }

    pub async fn clear(&self) {
        self.cars.write().await.clear();
    }
}
