use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::domain::{
    AssessmentId, Course, CourseId, CourseStatus, Employee, EmployeeId, Enrollment, EnrollmentId,
    EnrollmentStatus, UserId,
};
use crate::store::MemoryStore;
use crate::workflows::assessments::{Assessment, AttemptService};
use crate::workflows::certifications::CertificateGenerator;
use crate::workflows::notifications::{
    Notification, NotificationError, NotificationEvent, Notifier,
};

pub(super) const PASSING_SCORE: f64 = 70.0;

pub(super) struct Fixture {
    pub(super) store: MemoryStore,
    pub(super) employee: Employee,
    pub(super) course: Course,
    pub(super) assessment: Assessment,
}

pub(super) fn seeded() -> Fixture {
    let store = MemoryStore::new();
    let employee = Employee {
        id: EmployeeId::new(),
        employee_name: "Priya Nair".to_string(),
        department: "Engineering".to_string(),
        designation: "Backend Engineer".to_string(),
        user_id: Some(UserId::new()),
    };
    let course = Course {
        id: CourseId::new(),
        title: "Secure Coding".to_string(),
        description: Some("Threat modelling for Backend Engineer teams".to_string()),
        duration_hours: Some(12),
        status: CourseStatus::Active,
    };
    let assessment = Assessment {
        id: AssessmentId::new(),
        course_id: course.id,
        title: "Secure Coding Final".to_string(),
        passing_score: PASSING_SCORE,
        total_points: Some(100),
        duration_minutes: Some(45),
    };

    store.insert_employee(employee.clone()).expect("seed employee");
    store.insert_course(course.clone()).expect("seed course");
    store
        .insert_assessment(assessment.clone())
        .expect("seed assessment");

    Fixture {
        store,
        employee,
        course,
        assessment,
    }
}

pub(super) fn enroll(fixture: &Fixture, status: EnrollmentStatus) -> Enrollment {
    let enrollment = Enrollment {
        id: EnrollmentId::new(),
        employee_id: fixture.employee.id,
        course_id: fixture.course.id,
        status,
        completion_percentage: 40.0,
        enrollment_date: Utc::now() - Duration::days(3),
    };
    fixture
        .store
        .insert_enrollment(enrollment.clone())
        .expect("seed enrollment");
    enrollment
}

pub(super) fn build_service<N: Notifier>(
    store: &MemoryStore,
    notifier: Arc<N>,
) -> Arc<AttemptService<MemoryStore, N>> {
    Arc::new(AttemptService::new(
        Arc::new(store.clone()),
        notifier,
        CertificateGenerator::default(),
    ))
}

/// Captures delivered events without persisting anything.
#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        event: NotificationEvent,
    ) -> Result<Option<Notification>, NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(None)
    }
}

/// Every delivery fails.
pub(super) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(
        &self,
        _event: NotificationEvent,
    ) -> Result<Option<Notification>, NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
