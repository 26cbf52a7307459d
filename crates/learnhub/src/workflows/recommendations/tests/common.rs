use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::domain::{
    Course, CourseId, CourseStatus, Employee, EmployeeId, Enrollment, EnrollmentId,
    EnrollmentStatus,
};
use crate::store::MemoryStore;
use crate::workflows::recommendations::RecommendationService;

pub(super) fn employee(store: &MemoryStore, department: &str, designation: &str) -> Employee {
    let employee = Employee {
        id: EmployeeId::new(),
        employee_name: format!("{designation} in {department}"),
        department: department.to_string(),
        designation: designation.to_string(),
        user_id: None,
    };
    store.insert_employee(employee.clone()).expect("seed employee");
    employee
}

pub(super) fn course(store: &MemoryStore, title: &str, description: &str) -> Course {
    let course = Course {
        id: CourseId::new(),
        title: title.to_string(),
        description: Some(description.to_string()),
        duration_hours: Some(8),
        status: CourseStatus::Active,
    };
    store.insert_course(course.clone()).expect("seed course");
    course
}

pub(super) fn enroll_at(
    store: &MemoryStore,
    employee: &Employee,
    course: &Course,
    status: EnrollmentStatus,
    enrolled_at: DateTime<Utc>,
) -> Enrollment {
    let enrollment = Enrollment {
        id: EnrollmentId::new(),
        employee_id: employee.id,
        course_id: course.id,
        status,
        completion_percentage: if status == EnrollmentStatus::Completed {
            100.0
        } else {
            0.0
        },
        enrollment_date: enrolled_at,
    };
    store
        .insert_enrollment(enrollment.clone())
        .expect("seed enrollment");
    enrollment
}

pub(super) fn long_ago() -> DateTime<Utc> {
    Utc::now() - Duration::days(120)
}

pub(super) fn recently() -> DateTime<Utc> {
    Utc::now() - Duration::days(2)
}

/// Catalog shaped so an Engineering backend engineer sees department
/// courses A and B, role course C and trending course D, in that order.
pub(super) struct Catalog {
    pub(super) store: MemoryStore,
    pub(super) learner: Employee,
    pub(super) a: Course,
    pub(super) b: Course,
    pub(super) c: Course,
    pub(super) d: Course,
    pub(super) completed: Course,
}

pub(super) fn catalog() -> Catalog {
    let store = MemoryStore::new();
    let learner = employee(&store, "Engineering", "Backend Engineer");
    let colleagues: Vec<Employee> = (0..4)
        .map(|_| employee(&store, "Engineering", "Platform Engineer"))
        .collect();
    let seller = employee(&store, "Sales", "Account Executive");

    let completed = course(&store, "Onboarding", "Company basics");
    let a = course(&store, "Rust Fundamentals", "Ownership and borrowing");
    let b = course(&store, "Observability", "Tracing and metrics");
    let c = course(&store, "API Design", "Patterns every backend engineer should know");
    let d = course(&store, "Negotiation", "Closing techniques");

    enroll_at(&store, &learner, &completed, EnrollmentStatus::Completed, long_ago());
    for colleague in &colleagues {
        enroll_at(&store, colleague, &completed, EnrollmentStatus::Completed, long_ago());
    }
    for colleague in &colleagues[..3] {
        enroll_at(&store, colleague, &a, EnrollmentStatus::Active, long_ago());
    }
    for colleague in &colleagues[..2] {
        enroll_at(&store, colleague, &b, EnrollmentStatus::Active, long_ago());
    }
    enroll_at(&store, &seller, &d, EnrollmentStatus::Active, recently());

    Catalog {
        store,
        learner,
        a,
        b,
        c,
        d,
        completed,
    }
}

pub(super) fn build_service(store: &MemoryStore) -> Arc<RecommendationService<MemoryStore>> {
    Arc::new(RecommendationService::new(Arc::new(store.clone())))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
