//! Rule-based course recommendations and the personalized learning path.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scorer;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CourseCandidate, CourseRecommendation, EnrollmentProgress, LearningPath, LearningPathEntry,
    PathEntryStatus, PathPriority, RecommendationType,
};
pub use repository::RecommendationSource;
pub use router::recommendation_router;
pub use scorer::{rank, CandidatePools, MAX_RECOMMENDATIONS};
pub use service::{trending_since, RecommendationError, RecommendationService};
