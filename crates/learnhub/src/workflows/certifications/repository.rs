use async_trait::async_trait;

use super::domain::{Certification, CertificationFilter};
use crate::domain::CertificationId;
use crate::store::StoreError;

/// Read access to issued certificates.
#[async_trait]
pub trait CertificationStore: Send + Sync + 'static {
    /// Certificates matching the filter, newest first.
    async fn certifications(
        &self,
        filter: CertificationFilter,
    ) -> Result<Vec<Certification>, StoreError>;

    async fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, StoreError>;
}
