//! Persistence gateway implementations.
//!
//! Each workflow declares the storage seam it needs (`AssessmentStore`,
//! `RecommendationSource`, `CertificationStore`, `NotificationStore`); the
//! stores in this module implement all of them so a single handle can be
//! shared across the HTTP surface.

pub mod memory;
pub mod postgres;

pub use memory::{FailurePoint, MemoryStore, MemoryTransaction};
pub use postgres::{PgAttemptTransaction, PgStore};

use crate::domain::UnknownStatus;
use crate::workflows::assessments::AssessmentStore;
use crate::workflows::certifications::CertificationStore;
use crate::workflows::notifications::NotificationStore;
use crate::workflows::recommendations::RecommendationSource;

/// Error enumeration for persistence gateway failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

impl From<UnknownStatus> for StoreError {
    fn from(value: UnknownStatus) -> Self {
        StoreError::Corrupt(value.to_string())
    }
}

/// Every storage seam the HTTP surface needs, implemented by one handle.
pub trait LearningStore:
    AssessmentStore + RecommendationSource + CertificationStore + NotificationStore
{
}

impl<T> LearningStore for T where
    T: AssessmentStore + RecommendationSource + CertificationStore + NotificationStore
{
}
