use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CourseId, EmployeeId, NotificationId, UnknownStatus, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Assessment,
    Certification,
    Enrollment,
    Deadline,
    Info,
}

impl NotificationCategory {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationCategory::Assessment => "assessment",
            NotificationCategory::Certification => "certification",
            NotificationCategory::Enrollment => "enrollment",
            NotificationCategory::Deadline => "deadline",
            NotificationCategory::Info => "info",
        }
    }
}

impl FromStr for NotificationCategory {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "assessment" => Ok(NotificationCategory::Assessment),
            "certification" => Ok(NotificationCategory::Certification),
            "enrollment" => Ok(NotificationCategory::Enrollment),
            "deadline" => Ok(NotificationCategory::Deadline),
            "info" => Ok(NotificationCategory::Info),
            other => Err(UnknownStatus::new("notification", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub category: NotificationCategory,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(user_id: UserId, message: String, category: NotificationCategory) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            message,
            category,
            created_at: Utc::now(),
        }
    }

    pub fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            message: self.message,
            category: self.category,
            read: false,
            created_at: self.created_at,
        }
    }
}

/// Something worth telling an employee about once the triggering write has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    AssessmentResult {
        employee_id: EmployeeId,
        assessment_title: String,
        score: f64,
        passed: bool,
    },
    CertificationIssued {
        employee_id: EmployeeId,
        course_id: CourseId,
        certificate_number: String,
    },
}

impl NotificationEvent {
    pub fn employee_id(&self) -> EmployeeId {
        match self {
            NotificationEvent::AssessmentResult { employee_id, .. }
            | NotificationEvent::CertificationIssued { employee_id, .. } => *employee_id,
        }
    }

    pub fn category(&self) -> NotificationCategory {
        match self {
            NotificationEvent::AssessmentResult { .. } => NotificationCategory::Assessment,
            NotificationEvent::CertificationIssued { .. } => NotificationCategory::Certification,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationEvent::AssessmentResult { .. } => "assessment_result",
            NotificationEvent::CertificationIssued { .. } => "certification_issued",
        }
    }
}

pub fn assessment_result_message(assessment_title: &str, score: f64, passed: bool) -> String {
    if passed {
        format!("Congratulations! You passed \"{assessment_title}\" with {score}%")
    } else {
        format!("You scored {score}% on \"{assessment_title}\". Keep trying!")
    }
}

pub fn certification_message(course_title: &str, certificate_number: &str) -> String {
    format!(
        "Congratulations! You earned a certificate for \"{course_title}\" ({certificate_number})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_messages_distinguish_outcome() {
        assert_eq!(
            assessment_result_message("Rust Basics Quiz", 72.0, true),
            "Congratulations! You passed \"Rust Basics Quiz\" with 72%"
        );
        assert_eq!(
            assessment_result_message("Rust Basics Quiz", 41.5, false),
            "You scored 41.5% on \"Rust Basics Quiz\". Keep trying!"
        );
    }

    #[test]
    fn certification_message_names_course_and_number() {
        assert_eq!(
            certification_message("Secure Coding", "CERT-1-ABCDEFGHI"),
            "Congratulations! You earned a certificate for \"Secure Coding\" (CERT-1-ABCDEFGHI)"
        );
    }

    #[test]
    fn category_serializes_lowercase_under_type_key() {
        let notification = NewNotification::new(
            UserId::new(),
            "hello".to_string(),
            NotificationCategory::Certification,
        )
        .into_notification();
        let value = serde_json::to_value(&notification).expect("serializes");
        assert_eq!(value["type"], "certification");
        assert_eq!(value["read"], false);
    }
}
