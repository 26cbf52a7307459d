use async_trait::async_trait;
use chrono::NaiveDate;

use super::domain::{Assessment, AssessmentAttempt, NewAttempt};
use crate::domain::{AssessmentId, CourseId, EmployeeId, Enrollment, EnrollmentId};
use crate::store::StoreError;
use crate::workflows::certifications::{Certification, NewCertification};

/// Storage seam for the attempt workflow.
#[async_trait]
pub trait AssessmentStore: Send + Sync + 'static {
    type Transaction: AttemptTransaction;

    /// Opens a unit of work. Dropping it without `commit` discards every write.
    async fn begin(&self) -> Result<Self::Transaction, StoreError>;

    /// Attempts for an assessment, most recent first.
    async fn attempts_for_assessment(
        &self,
        assessment: &AssessmentId,
    ) -> Result<Vec<AssessmentAttempt>, StoreError>;
}

/// Operations executed inside the attempt transaction.
#[async_trait]
pub trait AttemptTransaction: Send {
    async fn assessment(&mut self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError>;

    async fn insert_attempt(&mut self, attempt: NewAttempt)
        -> Result<AssessmentAttempt, StoreError>;

    /// At most one `Active` enrollment for the pair; ties are resolved arbitrarily.
    async fn active_enrollment(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// Marks the enrollment `Completed` at 100%.
    async fn complete_enrollment(&mut self, id: &EnrollmentId) -> Result<Enrollment, StoreError>;

    /// A non-revoked certificate for the pair that has not expired by `today`.
    async fn active_certification(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
        today: NaiveDate,
    ) -> Result<Option<Certification>, StoreError>;

    /// Returns `None` when the certificate number is already taken.
    async fn insert_certification(
        &mut self,
        certification: NewCertification,
    ) -> Result<Option<Certification>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
