use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{CourseCandidate, EnrollmentProgress};
use crate::domain::{CourseId, Employee, EmployeeId};
use crate::store::StoreError;

/// Read-only queries backing the recommendation scorer.
///
/// Every candidate query returns active courses only, ordered by the
/// signal it ranks on, and applies `limit` before any exclusion.
#[async_trait]
pub trait RecommendationSource: Send + Sync + 'static {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn completed_course_ids(
        &self,
        employee: &EmployeeId,
    ) -> Result<HashSet<CourseId>, StoreError>;

    /// Ordered by enrollments held by employees of `department`.
    async fn department_popular_courses(
        &self,
        department: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError>;

    /// Courses whose description contains `designation`, case-insensitively.
    async fn role_matching_courses(
        &self,
        designation: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError>;

    /// Ordered by enrollments created at or after `since`.
    async fn trending_courses(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError>;

    /// `Pending` and `Active` enrollments, newest first.
    async fn in_progress_enrollments(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<EnrollmentProgress>, StoreError>;
}
