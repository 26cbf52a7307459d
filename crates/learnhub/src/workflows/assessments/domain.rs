use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AssessmentId, AttemptId, CourseId, EmployeeId, UnknownStatus};

/// Scored quiz attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub course_id: CourseId,
    pub title: String,
    /// Minimum percentage needed to pass.
    pub passing_score: f64,
    pub total_points: Option<i32>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptStatus {
    Passed,
    Failed,
}

impl AttemptStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AttemptStatus::Passed => "Passed",
            AttemptStatus::Failed => "Failed",
        }
    }

    pub const fn is_passed(self) -> bool {
        matches!(self, AttemptStatus::Passed)
    }
}

impl FromStr for AttemptStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Passed" => Ok(AttemptStatus::Passed),
            "Failed" => Ok(AttemptStatus::Failed),
            other => Err(UnknownStatus::new("attempt", other)),
        }
    }
}

/// Append-only record of one scored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub id: AttemptId,
    pub assessment_id: AssessmentId,
    pub employee_id: EmployeeId,
    pub score: f64,
    pub status: AttemptStatus,
    pub attempted_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Attempt row to be written by the persistence gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub id: AttemptId,
    pub assessment_id: AssessmentId,
    pub employee_id: EmployeeId,
    pub score: f64,
    pub status: AttemptStatus,
    /// Used for both the attempted and completed marks.
    pub recorded_at: DateTime<Utc>,
}

impl NewAttempt {
    pub fn into_attempt(self) -> AssessmentAttempt {
        AssessmentAttempt {
            id: self.id,
            assessment_id: self.assessment_id,
            employee_id: self.employee_id,
            score: self.score,
            status: self.status,
            attempted_at: self.recorded_at,
            completed_at: self.recorded_at,
        }
    }
}

/// Raw request body for an attempt submission.
///
/// Fields stay loosely typed so missing or malformed values surface as
/// invalid input instead of a deserialization rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptSubmission {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
}

/// Submission that passed input validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedAttempt {
    pub employee_id: EmployeeId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionRejection {
    #[error("Employee ID and score are required")]
    MissingFields,
    #[error("employee_id must be a valid identifier")]
    MalformedEmployeeId,
    #[error("score must be a number")]
    MalformedScore,
}

impl AttemptSubmission {
    pub fn new(employee_id: EmployeeId, score: f64) -> Self {
        Self {
            employee_id: Some(employee_id.to_string()),
            score: serde_json::Number::from_f64(score).map(Value::Number),
        }
    }

    pub fn validate(&self) -> Result<ValidatedAttempt, SubmissionRejection> {
        let raw_employee = self
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let (raw_employee, raw_score) = match (raw_employee, self.score.as_ref()) {
            (Some(employee), Some(score)) if !score.is_null() => (employee, score),
            _ => return Err(SubmissionRejection::MissingFields),
        };

        let employee_id = raw_employee
            .parse::<EmployeeId>()
            .map_err(|_| SubmissionRejection::MalformedEmployeeId)?;

        let score = match raw_score {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|score| score.is_finite())
        .ok_or(SubmissionRejection::MalformedScore)?;

        Ok(ValidatedAttempt { employee_id, score })
    }
}
