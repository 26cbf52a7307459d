use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use tracing::debug;

use super::domain::{CourseRecommendation, LearningPath};
use super::repository::RecommendationSource;
use super::scorer::{
    learning_path, rank, CandidatePools, DEPARTMENT_POOL_LIMIT, ROLE_POOL_LIMIT,
    TRENDING_POOL_LIMIT, TRENDING_WINDOW_DAYS,
};
use crate::domain::EmployeeId;
use crate::store::StoreError;

/// On-demand course recommendations; never touches the attempt workflow.
pub struct RecommendationService<S> {
    source: Arc<S>,
}

impl<S> RecommendationService<S>
where
    S: RecommendationSource,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub async fn recommend(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<CourseRecommendation>, RecommendationError> {
        self.recommend_at(employee_id, Utc::now()).await
    }

    pub async fn recommend_at(
        &self,
        employee_id: &EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourseRecommendation>, RecommendationError> {
        let employee = self
            .source
            .employee(employee_id)
            .await?
            .ok_or(RecommendationError::EmployeeNotFound(*employee_id))?;

        let completed = self.source.completed_course_ids(employee_id).await?;
        let department = self
            .source
            .department_popular_courses(&employee.department, DEPARTMENT_POOL_LIMIT)
            .await?;
        let role = if employee.designation.trim().is_empty() {
            Vec::new()
        } else {
            self.source
                .role_matching_courses(&employee.designation, ROLE_POOL_LIMIT)
                .await?
        };
        let trending = self
            .source
            .trending_courses(trending_since(now), TRENDING_POOL_LIMIT)
            .await?;

        let ranked = rank(
            &employee,
            &completed,
            CandidatePools {
                department,
                role,
                trending,
            },
        );

        debug!(
            %employee_id,
            completed = completed.len(),
            recommended = ranked.len(),
            "recommendations ranked"
        );
        Ok(ranked)
    }

    pub async fn learning_path(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<LearningPath, RecommendationError> {
        self.learning_path_at(employee_id, Utc::now()).await
    }

    pub async fn learning_path_at(
        &self,
        employee_id: &EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<LearningPath, RecommendationError> {
        let recommended_courses = self.recommend_at(employee_id, now).await?;
        let current_courses = self.source.in_progress_enrollments(employee_id).await?;
        let learning_path =
            learning_path(&current_courses, &recommended_courses, now.date_naive());

        Ok(LearningPath {
            current_courses,
            recommended_courses,
            learning_path,
        })
    }
}

/// Midnight UTC, thirty days before `now`.
pub fn trending_since(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today
        .checked_sub_days(Days::new(TRENDING_WINDOW_DAYS))
        .unwrap_or(today)
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
