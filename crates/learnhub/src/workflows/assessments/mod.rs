//! Assessment attempts: scoring, the atomic attempt workflow, and its routes.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Assessment, AssessmentAttempt, AttemptStatus, AttemptSubmission, NewAttempt,
    SubmissionRejection, ValidatedAttempt,
};
pub use repository::{AssessmentStore, AttemptTransaction};
pub use router::assessment_router;
pub use scoring::decide_outcome;
pub use service::{
    AttemptService, AttemptServiceError, SubmissionOutcome, CERTIFICATE_NUMBER_ATTEMPTS,
};
