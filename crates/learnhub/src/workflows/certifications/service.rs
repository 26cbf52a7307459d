use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::domain::{Certification, CertificationFilter};
use super::repository::CertificationStore;
use crate::domain::CertificationId;
use crate::store::StoreError;

/// Read-side facade that reports certificates with their status as of today.
pub struct CertificationService<S> {
    store: Arc<S>,
}

impl<S> CertificationService<S>
where
    S: CertificationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: CertificationFilter,
    ) -> Result<Vec<Certification>, CertificationError> {
        self.list_as_of(filter, Utc::now().date_naive()).await
    }

    pub async fn list_as_of(
        &self,
        filter: CertificationFilter,
        today: NaiveDate,
    ) -> Result<Vec<Certification>, CertificationError> {
        let certifications = self.store.certifications(filter).await?;
        Ok(certifications
            .into_iter()
            .map(|certification| certification.as_of(today))
            .collect())
    }

    pub async fn get(&self, id: &CertificationId) -> Result<Certification, CertificationError> {
        self.get_as_of(id, Utc::now().date_naive()).await
    }

    pub async fn get_as_of(
        &self,
        id: &CertificationId,
        today: NaiveDate,
    ) -> Result<Certification, CertificationError> {
        self.store
            .certification(id)
            .await?
            .map(|certification| certification.as_of(today))
            .ok_or(CertificationError::NotFound(*id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CertificationError {
    #[error("certification {0} not found")]
    NotFound(CertificationId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
