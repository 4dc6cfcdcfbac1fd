//! crates/showroom_core/src/preferences.rs
//!
//! Theme and notification preferences.

use std::sync::Arc;

use tracing::info;

use crate::domain::{NotificationSettings, ThemePreference};
use crate::error::{StoreError, StoreResult};
use crate::ports::KeyValueStore;
use crate::store::{keys, Collection, EntityStore, StoreOptions};

impl Collection for ThemePreference {}

impl Collection for NotificationSettings {
    fn sanitize(mut self) -> Self {
        if self.reminder_hour > 23 {
            self.reminder_hour = NotificationSettings::default().reminder_hour;
        }
        self
    }
}

pub struct ThemeStore {
    theme: EntityStore<ThemePreference>,
}

impl ThemeStore {
    pub async fn load(kv: Arc<dyn KeyValueStore>, options: &StoreOptions) -> Self {
        Self {
            theme: EntityStore::load(kv, options.key(keys::THEME)).await,
        }
    }

    pub async fn current(&self) -> ThemePreference {
        self.theme.snapshot().await
    }

    pub async fn set(&self, theme: ThemePreference) -> StoreResult<()> {
        self.theme
            .mutate(|current| {
                *current = theme;
                Ok(())
            })
            .await?;
        info!(?theme, "Theme changed");
        Ok(())
    }

    /// Dark becomes light; light and system become dark.
    pub async fn toggle(&self) -> StoreResult<ThemePreference> {
        self.theme
            .mutate(|current| {
                *current = match *current {
                    ThemePreference::Dark => ThemePreference::Light,
                    ThemePreference::Light | ThemePreference::System => ThemePreference::Dark,
                };
                Ok(*current)
            })
            .await
    }
}

pub struct NotificationSettingsStore {
    settings: EntityStore<NotificationSettings>,
}

impl NotificationSettingsStore {
    pub async fn load(kv: Arc<dyn KeyValueStore>, options: &StoreOptions) -> Self {
        Self {
            settings: EntityStore::load(kv, options.key(keys::NOTIFICATION_SETTINGS)).await,
        }
    }

    pub async fn current(&self) -> NotificationSettings {
        self.settings.snapshot().await
    }

    /// Applies `f` to the settings; an out-of-range reminder hour is rejected.
    pub async fn update(
        &self,
        f: impl FnOnce(&mut NotificationSettings),
    ) -> StoreResult<NotificationSettings> {
        self.settings
            .mutate(|settings| {
                f(settings);
                if settings.reminder_hour > 23 {
                    return Err(StoreError::InvalidValue {
                        field: "reminder_hour",
                        reason: format!("{} is not an hour of the day", settings.reminder_hour),
                    });
                }
                Ok(settings.clone())
            })
            .await
    }

    pub async fn reset(&self) -> StoreResult<()> {
        self.settings.reset().await
    }
}
