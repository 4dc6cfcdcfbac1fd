//! crates/showroom_core/src/test_support.rs
//!
//! Shared fixtures for the unit tests in this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{Attribution, Car, CarImage, ImageUrls};
use crate::memory::MemoryKeyValueStore;
use crate::ports::{ImageSearchService, KeyValueStore, PortError, PortResult};

/// Memory store whose reads and writes can be made to fail.
#[derive(Default)]
pub struct FlakyKeyValueStore {
    inner: MemoryKeyValueStore,
    fail_writes: AtomicBool,
    /// Writes to keys ending with this suffix fail.
    failing_key: Mutex<Option<String>>,
    /// Key suffixes whose next read fails once.
    failing_reads: Mutex<Vec<String>>,
}

impl FlakyKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_to(&self, key_suffix: &str) {
        *self.failing_key.lock().unwrap() = Some(key_suffix.to_string());
    }

    pub fn fail_next_read(&self, key_suffix: &str) {
        self.failing_reads.lock().unwrap().push(key_suffix.to_string());
    }

    fn check(&self, key: &str) -> PortResult<()> {
        let key_fails = self
            .failing_key
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| key.ends_with(suffix));
        if key_fails || self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        {
            let mut failing = self.failing_reads.lock().unwrap();
            if let Some(pos) = failing.iter().position(|suffix| key.ends_with(suffix.as_str())) {
                failing.remove(pos);
                return Err(PortError::Storage("database is locked".to_string()));
            }
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.check(key)?;
        self.inner.remove(key).await
    }
}

/// Image search that replays scripted responses and counts calls.
#[derive(Default)]
pub struct ScriptedImageSearch {
    responses: Mutex<Vec<PortResult<Vec<CarImage>>>>,
    calls: AtomicUsize,
}

impl ScriptedImageSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response; responses are served in push order.
    pub fn push(&self, response: PortResult<Vec<CarImage>>) {
        self.responses.lock().unwrap().push(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSearchService for ScriptedImageSearch {
    async fn search(&self, _query: &str, count: usize) -> PortResult<Vec<CarImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(Vec::new());
        }
        responses
            .remove(0)
            .map(|images| images.into_iter().take(count).collect())
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn car(id: &str) -> Car {
    car_with_brand(id, "Porsche")
}

pub fn car_with_brand(id: &str, brand: &str) -> Car {
    Car {
        id: id.to_string(),
        brand: brand.to_string(),
        model: format!("Model {}", id),
        year: 2023,
        price: 100_000,
        horsepower: 400,
        torque: 500,
        max_speed: 300,
        acceleration: 4.0,
        weight: 1500,
        engine: "3.0L Flat-6".to_string(),
        transmission: "8-speed PDK".to_string(),
        drivetrain: "RWD".to_string(),
        fuel_type: "Gasoline".to_string(),
        description: "Test car".to_string(),
        images: Vec::new(),
    }
}

pub fn image(id: &str) -> CarImage {
    let url = format!("https://images.example.com/{}", id);
    CarImage {
        id: id.to_string(),
        urls: ImageUrls {
            raw: url.clone(),
            full: url.clone(),
            regular: url.clone(),
            small: url.clone(),
            thumb: url,
        },
        width: 1920,
        height: 1080,
        description: None,
        attribution: Attribution {
            author_name: "Jane Doe".to_string(),
            author_url: None,
        },
    }
}
