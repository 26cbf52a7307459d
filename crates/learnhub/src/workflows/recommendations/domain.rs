use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Course, CourseId, EnrollmentId, EnrollmentStatus};

/// Active course plus the enrollment count it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCandidate {
    pub course: Course,
    pub enrollment_count: i64,
}

impl CourseCandidate {
    pub fn new(course: Course, enrollment_count: i64) -> Self {
        Self {
            course,
            enrollment_count,
        }
    }
}

/// Which signal put a course on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Department,
    Role,
    Trending,
}

impl RecommendationType {
    /// Score of the first-ranked entry in the pool.
    pub const fn base_score(self) -> i32 {
        match self {
            RecommendationType::Department => 90,
            RecommendationType::Role => 75,
            RecommendationType::Trending => 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    #[serde(flatten)]
    pub course: Course,
    pub recommendation_score: i32,
    pub recommendation_reason: String,
    pub recommendation_type: RecommendationType,
}

/// Open enrollment with the figures the learning path needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentProgress {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub title: String,
    pub duration_hours: Option<i32>,
    pub progress_percentage: f64,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEntryStatus {
    InProgress,
    Recommended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathEntry {
    pub course_id: CourseId,
    pub title: String,
    pub priority: PathPriority,
    pub status: PathEntryStatus,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub current_courses: Vec<EnrollmentProgress>,
    pub recommended_courses: Vec<CourseRecommendation>,
    pub learning_path: Vec<LearningPathEntry>,
}
