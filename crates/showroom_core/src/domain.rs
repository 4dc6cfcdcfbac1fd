//! crates/showroom_core/src/domain.rs
//!
//! Defines the core data structures of the showroom.
//! Every persisted record derives `Serialize`/`Deserialize` so it can be stored as
//! JSON in the key-value store; field names are camelCase on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Catalog
//=========================================================================================

/// A vehicle from the read-only catalog. Stores keep snapshots of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    /// Price in whole US dollars.
    pub price: u32,
    pub horsepower: u32,
    /// Torque in Nm.
    pub torque: u32,
    /// Top speed in km/h.
    pub max_speed: u32,
    /// 0-100 km/h in seconds.
    pub acceleration: f32,
    /// Curb weight in kg.
    pub weight: u32,
    pub engine: String,
    pub transmission: String,
    pub drivetrain: String,
    pub fuel_type: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Car {
    /// "Brand Model", used as the default image search query.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

//=========================================================================================
// Users
//=========================================================================================

// Stored user record. `password_hash` is an argon2 PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password_hash: String,
    #[serde(default)]
    pub date_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub date_birth: Option<NaiveDate>,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub date_birth: Option<NaiveDate>,
}

/// Returned by a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub user: User,
    pub message: String,
}

//=========================================================================================
// Reviews
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub car_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    /// 1 to 5 stars.
    pub rating: u8,
    pub comment: String,
    pub date: DateTime<Utc>,
}

//=========================================================================================
// View History
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewHistoryItem {
    pub car: Car,
    pub viewed_at: DateTime<Utc>,
    pub view_count: u32,
}

//=========================================================================================
// Remote Images
//=========================================================================================

/// Image URLs at the resolutions the search provider offers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrls {
    pub raw: String,
    pub full: String,
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

/// Credit for the photographer, shown next to the image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub author_name: String,
    pub author_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarImage {
    pub id: String,
    pub urls: ImageUrls,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub attribution: Attribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCacheEntry {
    pub car_id: String,
    pub images: Vec<CarImage>,
    pub last_fetched: DateTime<Utc>,
}

//=========================================================================================
// Preferences
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub new_arrivals: bool,
    pub price_alerts: bool,
    /// Hour of day (0..=23) for the daily reminder.
    pub reminder_hour: u8,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            new_arrivals: true,
            price_alerts: false,
            reminder_hour: 18,
        }
    }
}
