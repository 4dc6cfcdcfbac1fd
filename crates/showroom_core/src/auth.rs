//! crates/showroom_core/src/auth.rs
//!
//! Local accounts and the single active session.
//!
//! Users live under the `users` key, the id of the logged-in user under `current_user`.
//! Passwords are stored as salted argon2 hashes.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{AuthSuccess, NewUser, User, UserUpdate};
use crate::error::{StoreError, StoreResult};
use crate::ports::{Clock, KeyValueStore, PortError};
use crate::store::{keys, Collection, EntityStore, StoreOptions};

impl Collection for Vec<User> {
    // Emails must stay unique; a later duplicate is dropped.
    fn sanitize(self) -> Self {
        let mut seen = Vec::with_capacity(self.len());
        let mut users = Vec::with_capacity(self.len());
        for user in self {
            let email = normalize_email(&user.email);
            if seen.contains(&email) {
                warn!(user_id = %user.id, "Dropping stored user with duplicate email");
                continue;
            }
            seen.push(email);
            users.push(user);
        }
        users
    }
}

/// Id of the logged-in user, if any.
impl Collection for Option<Uuid> {}

pub struct AuthStore {
    users: EntityStore<Vec<User>>,
    session: EntityStore<Option<Uuid>>,
    clock: Arc<dyn Clock>,
}

impl AuthStore {
    /// Loads users and the session pointer. A pointer to an unknown user is dropped.
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        options: &StoreOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let users = EntityStore::load(kv.clone(), options.key(keys::USERS)).await;
        let session = EntityStore::load(kv, options.key(keys::CURRENT_USER)).await;
        let store = Self {
            users,
            session,
            clock,
        };

        // An unreadable user list says nothing about whether the session is stale.
        let session = store.session.snapshot().await;
        if let (Some(user_id), false) = (session, store.users.is_degraded()) {
            let known = store.users.read(|users| users.iter().any(|u| u.id == user_id)).await;
            if !known {
                warn!(%user_id, "Stored session points to an unknown user, clearing it");
                if let Err(e) = store.set_session(None).await {
                    error!("Failed to clear stale session: {}", e);
                }
            }
        }
        store
    }

    pub async fn register(&self, data: NewUser) -> StoreResult<AuthSuccess> {
        let name = required("Name", &data.name)?;
        let email = required("Email", &data.email)?;
        required("Password", &data.password)?;
        let password_hash = hash_password(&data.password)?;

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            phone: data.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            password_hash,
            date_birth: data.date_birth,
            created_at: self.clock.now(),
        };

        let user = self
            .users
            .mutate(|users| {
                let wanted = normalize_email(&user.email);
                if users.iter().any(|u| normalize_email(&u.email) == wanted) {
                    return Err(StoreError::DuplicateEmail);
                }
                users.push(user.clone());
                Ok(user)
            })
            .await?;

        if let Err(e) = self.set_session(Some(user.id)).await {
            // Roll the account back so the registration can be retried.
            let user_id = user.id;
            if let Err(rollback) = self
                .users
                .mutate(|users| {
                    users.retain(|u| u.id != user_id);
                    Ok(())
                })
                .await
            {
                error!(%user_id, "Failed to roll back registration: {}", rollback);
            }
            return Err(e);
        }
        info!(user_id = %user.id, "User registered");

        Ok(AuthSuccess {
            message: format!("Welcome to the showroom, {}!", user.name),
            user,
        })
    }

    /// Email matches case-insensitively; the password must verify against the hash.
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<AuthSuccess> {
        let wanted = normalize_email(email);
        let user = self
            .users
            .read(|users| {
                users
                    .iter()
                    .find(|u| normalize_email(&u.email) == wanted)
                    .cloned()
            })
            .await
            .ok_or(StoreError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        self.set_session(Some(user.id)).await?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthSuccess {
            message: format!("Welcome back, {}!", user.name),
            user,
        })
    }

    /// Clears the session only; the user record is untouched.
    pub async fn logout(&self) -> StoreResult<()> {
        self.set_session(None).await?;
        info!("User logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        let user_id = self.session.snapshot().await?;
        self.users
            .read(|users| users.iter().find(|u| u.id == user_id).cloned())
            .await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_some()
    }

    /// Merges the provided fields into the logged-in user's record. The id never changes.
    pub async fn update_user(&self, update: UserUpdate) -> StoreResult<User> {
        let user_id = self
            .session
            .snapshot()
            .await
            .ok_or(StoreError::NoActiveSession)?;

        let name = update.name.as_deref().map(|n| required("Name", n)).transpose()?;
        let email = update.email.as_deref().map(|e| required("Email", e)).transpose()?;
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                required("Password", password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self
            .users
            .mutate(|users| {
                if let Some(email) = &email {
                    let wanted = normalize_email(email);
                    if users
                        .iter()
                        .any(|u| u.id != user_id && normalize_email(&u.email) == wanted)
                    {
                        return Err(StoreError::DuplicateEmail);
                    }
                }

                let user = users
                    .iter_mut()
                    .find(|u| u.id == user_id)
                    .ok_or(StoreError::NoActiveSession)?;
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(email) = email {
                    user.email = email;
                }
                if let Some(phone) = update.phone {
                    let phone = phone.trim().to_string();
                    user.phone = (!phone.is_empty()).then_some(phone);
                }
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
                if let Some(date_birth) = update.date_birth {
                    user.date_birth = Some(date_birth);
                }
                Ok(user.clone())
            })
            .await?;

        info!(user_id = %user.id, "User profile updated");
        Ok(user)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read(|users| users.len()).await
    }

    async fn set_session(&self, user_id: Option<Uuid>) -> StoreResult<()> {
        self.session
            .mutate(|current| {
                *current = user_id;
                Ok(())
            })
            .await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &'static str, value: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            StoreError::from(PortError::Unexpected("failed to hash password".to_string()))
        })
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            false
        }
    }
}
