//! crates/showroom_core/src/error.rs
//!
//! Outcome type for every store operation. Validation variants carry messages that
//! can be shown to the user as-is; `Persistence` means the operation had no effect.

use uuid::Uuid;

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("You need to be logged in to do that")]
    NoActiveSession,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Rating must be between 1 and 5 stars, got {0}")]
    InvalidRating(u8),

    #[error("Please write a comment")]
    EmptyComment,

    #[error("You have already reviewed this car")]
    DuplicateReview,

    #[error("Review {0} not found")]
    ReviewNotFound(Uuid),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The key-value store or serialization failed; in-memory state is unchanged.
    #[error("Could not save changes: {0}")]
    Persistence(#[from] PortError),
}

impl StoreError {
    /// True for errors caused by user input rather than the environment.
    pub fn is_validation(&self) -> bool {
        !matches!(self, StoreError::Persistence(_))
    }
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
