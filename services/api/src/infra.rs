use chrono::{Duration, Utc};
use learnhub::domain::{
    AssessmentId, Course, CourseId, CourseStatus, Employee, EmployeeId, Enrollment, EnrollmentId,
    EnrollmentStatus, UserId,
};
use learnhub::store::{MemoryStore, StoreError};
use learnhub::workflows::assessments::Assessment;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Handles into the catalog written by [`seed_demo_catalog`].
#[derive(Debug, Clone)]
pub(crate) struct DemoCatalog {
    pub(crate) learner: Employee,
    pub(crate) learner_user: UserId,
    pub(crate) assessment: Assessment,
}

const COLLEAGUES: usize = 3;

/// Seeds a small Engineering catalog: the learner is enrolled in "Secure
/// Coding" with an open final assessment, colleagues drive department
/// popularity, and a Sales hire makes one course trend.
pub(crate) fn seed_demo_catalog(store: &MemoryStore) -> Result<DemoCatalog, StoreError> {
    let learner_user = UserId::new();
    let learner = employee("Ada Park", "Engineering", "Backend Engineer", Some(learner_user));
    store.insert_employee(learner.clone())?;

    let colleagues = (0..COLLEAGUES)
        .map(|index| {
            let colleague = employee(
                &format!("Engineer {}", index + 1),
                "Engineering",
                "Platform Engineer",
                None,
            );
            store.insert_employee(colleague.clone())?;
            Ok(colleague)
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    let seller = employee("Sam Ortiz", "Sales", "Account Executive", None);
    store.insert_employee(seller.clone())?;

    let secure_coding = course(store, "Secure Coding", "Threat modelling and safe defaults", 12)?;
    let rust = course(store, "Rust Fundamentals", "Ownership, borrowing and traits", 16)?;
    let observability = course(store, "Observability", "Tracing, metrics and alerting", 8)?;
    course(
        store,
        "API Design",
        "Patterns every backend engineer should know",
        6,
    )?;
    let negotiation = course(store, "Negotiation", "Closing techniques for complex deals", 4)?;

    let long_ago = Utc::now() - Duration::days(90);
    enroll(store, &learner, &secure_coding, Utc::now() - Duration::days(7))?;
    for colleague in &colleagues {
        enroll(store, colleague, &rust, long_ago)?;
    }
    for colleague in colleagues.iter().take(2) {
        enroll(store, colleague, &observability, long_ago)?;
    }
    enroll(store, &seller, &negotiation, Utc::now() - Duration::days(3))?;

    let assessment = Assessment {
        id: AssessmentId::new(),
        course_id: secure_coding.id,
        title: "Secure Coding Final".to_string(),
        passing_score: 70.0,
        total_points: Some(100),
        duration_minutes: Some(45),
    };
    store.insert_assessment(assessment.clone())?;

    Ok(DemoCatalog {
        learner,
        learner_user,
        assessment,
    })
}

fn employee(
    name: &str,
    department: &str,
    designation: &str,
    user_id: Option<UserId>,
) -> Employee {
    Employee {
        id: EmployeeId::new(),
        employee_name: name.to_string(),
        department: department.to_string(),
        designation: designation.to_string(),
        user_id,
    }
}

fn course(
    store: &MemoryStore,
    title: &str,
    description: &str,
    duration_hours: i32,
) -> Result<Course, StoreError> {
    let course = Course {
        id: CourseId::new(),
        title: title.to_string(),
        description: Some(description.to_string()),
        duration_hours: Some(duration_hours),
        status: CourseStatus::Active,
    };
    store.insert_course(course.clone())?;
    Ok(course)
}

fn enroll(
    store: &MemoryStore,
    employee: &Employee,
    course: &Course,
    enrolled_at: chrono::DateTime<Utc>,
) -> Result<(), StoreError> {
    store.insert_enrollment(Enrollment {
        id: EnrollmentId::new(),
        employee_id: employee.id,
        course_id: course.id,
        status: EnrollmentStatus::Active,
        completion_percentage: 0.0,
        enrollment_date: enrolled_at,
    })
}
