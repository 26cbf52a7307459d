//! Identifiers and the catalog entities shared by every workflow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_identifier!(
    /// Employee record identifier (not the HR-facing employee number).
    EmployeeId
);
uuid_identifier!(
    /// Login account identifier; notifications are addressed to users, not employees.
    UserId
);
uuid_identifier!(CourseId);
uuid_identifier!(AssessmentId);
uuid_identifier!(AttemptId);
uuid_identifier!(EnrollmentId);
uuid_identifier!(CertificationId);
uuid_identifier!(NotificationId);

/// Read-only employee profile consumed by the scorer and the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub employee_name: String,
    pub department: String,
    pub designation: String,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseStatus {
    Active,
    Inactive,
}

impl CourseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CourseStatus::Active => "Active",
            CourseStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for CourseStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Active" => Ok(CourseStatus::Active),
            "Inactive" => Ok(CourseStatus::Inactive),
            other => Err(UnknownStatus::new("course", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    /// Nominal effort in hours.
    pub duration_hours: Option<i32>,
    pub status: CourseStatus,
}

/// Lifecycle of an employee's registration in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
    Expired,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "Pending",
            EnrollmentStatus::Active => "Active",
            EnrollmentStatus::Completed => "Completed",
            EnrollmentStatus::Cancelled => "Cancelled",
            EnrollmentStatus::Expired => "Expired",
        }
    }

    /// Pending and Active enrollments count as in progress.
    pub const fn is_open(self) -> bool {
        matches!(self, EnrollmentStatus::Pending | EnrollmentStatus::Active)
    }
}

impl FromStr for EnrollmentStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Pending" => Ok(EnrollmentStatus::Pending),
            "Active" => Ok(EnrollmentStatus::Active),
            "Completed" => Ok(EnrollmentStatus::Completed),
            "Cancelled" => Ok(EnrollmentStatus::Cancelled),
            "Expired" => Ok(EnrollmentStatus::Expired),
            other => Err(UnknownStatus::new("enrollment", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub completion_percentage: f64,
    pub enrollment_date: DateTime<Utc>,
}

/// A stored status label that does not map onto a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {entity} status '{value}'")]
pub struct UnknownStatus {
    pub entity: &'static str,
    pub value: String,
}

impl UnknownStatus {
    pub(crate) fn new(entity: &'static str, value: &str) -> Self {
        Self {
            entity,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_parse_and_serialize_transparently() {
        let raw = "6f1c5a8e-2d4b-4c1a-9a57-0c7b8f9d2e11";
        let id: AssessmentId = raw.parse().expect("valid uuid");
        assert_eq!(id.to_string(), raw);
        assert_eq!(
            serde_json::to_value(id).expect("serializes"),
            serde_json::Value::String(raw.to_string())
        );
        assert!("not-a-uuid".parse::<AssessmentId>().is_err());
    }

    #[test]
    fn enrollment_status_round_trips_labels() {
        for status in [
            EnrollmentStatus::Pending,
            EnrollmentStatus::Active,
            EnrollmentStatus::Completed,
            EnrollmentStatus::Cancelled,
            EnrollmentStatus::Expired,
        ] {
            assert_eq!(status.label().parse::<EnrollmentStatus>(), Ok(status));
        }
        assert!(EnrollmentStatus::Pending.is_open());
        assert!(!EnrollmentStatus::Completed.is_open());
    }

    #[test]
    fn unknown_status_names_entity() {
        let err = "Paused".parse::<CourseStatus>().expect_err("unknown label");
        assert_eq!(err.to_string(), "unknown course status 'Paused'");
    }
}
