use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::StoreError;
use crate::config::DatabaseConfig;
use crate::domain::{
    AssessmentId, CertificationId, Course, CourseId, Employee, EmployeeId, Enrollment,
    EnrollmentId, NotificationId, UserId,
};
use crate::workflows::assessments::{
    Assessment, AssessmentAttempt, AssessmentStore, AttemptTransaction, NewAttempt,
};
use crate::workflows::certifications::{
    Certification, CertificationFilter, CertificationStore, NewCertification,
};
use crate::workflows::notifications::{NewNotification, Notification, NotificationStore};
use crate::workflows::recommendations::{
    CourseCandidate, EnrollmentProgress, RecommendationSource,
};

const COURSE_COLUMNS: &str = "c.id, c.title, c.description, c.duration_hours, c.status";
const ENROLLMENT_COLUMNS: &str =
    "id, employee_id, course_id, status, completion_percentage, enrollment_date";
const ATTEMPT_COLUMNS: &str =
    "id, assessment_id, employee_id, score, status, attempted_at, completed_at";
const CERTIFICATION_COLUMNS: &str = "id, employee_id, course_id, certificate_number, issue_date, \
     expiry_date, status, created_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, message, type, is_read, created_at";

/// Postgres-backed persistence gateway.
///
/// The pool is constructed explicitly and handed to whoever needs it; each
/// attempt transaction holds one pooled connection until commit, rollback,
/// or drop.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        info!(max_connections = config.max_connections, "postgres pool ready");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    employee_name: String,
    department: String,
    designation: String,
    user_id: Option<Uuid>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id.into(),
            employee_name: row.employee_name,
            department: row.department,
            designation: row.designation,
            user_id: row.user_id.map(UserId::from),
        }
    }
}

#[derive(Debug, FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    duration_hours: Option<i32>,
    status: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = StoreError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            duration_hours: row.duration_hours,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    course: CourseRow,
    enrollment_count: i64,
}

impl TryFrom<CandidateRow> for CourseCandidate {
    type Error = StoreError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(CourseCandidate::new(row.course.try_into()?, row.enrollment_count))
    }
}

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    id: Uuid,
    employee_id: Uuid,
    course_id: Uuid,
    status: String,
    completion_percentage: f64,
    enrollment_date: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = StoreError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        Ok(Enrollment {
            id: row.id.into(),
            employee_id: row.employee_id.into(),
            course_id: row.course_id.into(),
            status: row.status.parse()?,
            completion_percentage: row.completion_percentage,
            enrollment_date: row.enrollment_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProgressRow {
    id: Uuid,
    course_id: Uuid,
    title: String,
    duration_hours: Option<i32>,
    completion_percentage: f64,
    status: String,
    enrollment_date: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for EnrollmentProgress {
    type Error = StoreError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        Ok(EnrollmentProgress {
            enrollment_id: row.id.into(),
            course_id: row.course_id.into(),
            title: row.title,
            duration_hours: row.duration_hours,
            progress_percentage: row.completion_percentage,
            status: row.status.parse()?,
            enrollment_date: row.enrollment_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssessmentRow {
    id: Uuid,
    course_id: Uuid,
    title: String,
    passing_score: f64,
    total_points: Option<i32>,
    duration_minutes: Option<i32>,
}

impl From<AssessmentRow> for Assessment {
    fn from(row: AssessmentRow) -> Self {
        Assessment {
            id: row.id.into(),
            course_id: row.course_id.into(),
            title: row.title,
            passing_score: row.passing_score,
            total_points: row.total_points,
            duration_minutes: row.duration_minutes,
        }
    }
}

#[derive(Debug, FromRow)]
struct AttemptRow {
    id: Uuid,
    assessment_id: Uuid,
    employee_id: Uuid,
    score: f64,
    status: String,
    attempted_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for AssessmentAttempt {
    type Error = StoreError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(AssessmentAttempt {
            id: row.id.into(),
            assessment_id: row.assessment_id.into(),
            employee_id: row.employee_id.into(),
            score: row.score,
            status: row.status.parse()?,
            attempted_at: row.attempted_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CertificationRow {
    id: Uuid,
    employee_id: Uuid,
    course_id: Uuid,
    certificate_number: String,
    issue_date: NaiveDate,
    expiry_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CertificationRow> for Certification {
    type Error = StoreError;

    fn try_from(row: CertificationRow) -> Result<Self, Self::Error> {
        Ok(Certification {
            id: row.id.into(),
            employee_id: row.employee_id.into(),
            course_id: row.course_id.into(),
            certificate_number: row.certificate_number,
            issue_date: row.issue_date,
            expiry_date: row.expiry_date,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    message: String,
    #[sqlx(rename = "type")]
    category: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id.into(),
            user_id: row.user_id.into(),
            message: row.message,
            category: row.category.parse()?,
            read: row.is_read,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Attempt unit of work holding one pooled connection.
pub struct PgAttemptTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AssessmentStore for PgStore {
    type Transaction = PgAttemptTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        Ok(PgAttemptTransaction {
            tx: self.pool.begin().await?,
        })
    }

    async fn attempts_for_assessment(
        &self,
        assessment: &AssessmentId,
    ) -> Result<Vec<AssessmentAttempt>, StoreError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM assessment_attempts \
             WHERE assessment_id = $1 ORDER BY attempted_at DESC"
        ))
        .bind(assessment.0)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

#[async_trait]
impl AttemptTransaction for PgAttemptTransaction {
    async fn assessment(&mut self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
        let row: Option<AssessmentRow> = sqlx::query_as(
            "SELECT id, course_id, title, passing_score, total_points, duration_minutes \
             FROM assessments WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Assessment::from))
    }

    async fn insert_attempt(
        &mut self,
        attempt: NewAttempt,
    ) -> Result<AssessmentAttempt, StoreError> {
        let row: AttemptRow = sqlx::query_as(&format!(
            "INSERT INTO assessment_attempts \
             (id, assessment_id, employee_id, score, status, attempted_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(attempt.id.0)
        .bind(attempt.assessment_id.0)
        .bind(attempt.employee_id.0)
        .bind(attempt.score)
        .bind(attempt.status.label())
        .bind(attempt.recorded_at)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn active_enrollment(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
    ) -> Result<Option<Enrollment>, StoreError> {
        let row: Option<EnrollmentRow> = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE employee_id = $1 AND course_id = $2 AND status = 'Active' \
             LIMIT 1 FOR UPDATE"
        ))
        .bind(employee.0)
        .bind(course.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Enrollment::try_from).transpose()
    }

    async fn complete_enrollment(&mut self, id: &EnrollmentId) -> Result<Enrollment, StoreError> {
        let row: EnrollmentRow = sqlx::query_as(&format!(
            "UPDATE enrollments SET status = 'Completed', completion_percentage = 100, \
             updated_at = NOW() WHERE id = $1 RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(id.0)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn active_certification(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
        today: NaiveDate,
    ) -> Result<Option<Certification>, StoreError> {
        let row: Option<CertificationRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATION_COLUMNS} FROM certifications \
             WHERE employee_id = $1 AND course_id = $2 AND status = 'Active' \
             AND expiry_date >= $3 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(employee.0)
        .bind(course.0)
        .bind(today)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Certification::try_from).transpose()
    }

    async fn insert_certification(
        &mut self,
        certification: NewCertification,
    ) -> Result<Option<Certification>, StoreError> {
        let row: Option<CertificationRow> = sqlx::query_as(&format!(
            "INSERT INTO certifications \
             (id, employee_id, course_id, certificate_number, issue_date, expiry_date, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'Active', $7) \
             ON CONFLICT (certificate_number) DO NOTHING RETURNING {CERTIFICATION_COLUMNS}"
        ))
        .bind(certification.id.0)
        .bind(certification.employee_id.0)
        .bind(certification.course_id.0)
        .bind(&certification.grant.number)
        .bind(certification.grant.issue_date)
        .bind(certification.grant.expiry_date)
        .bind(certification.created_at)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Certification::try_from).transpose()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl RecommendationSource for PgStore {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError> {
        let row: Option<EmployeeRow> = sqlx::query_as(
            "SELECT id, employee_name, department, designation, user_id \
             FROM employees WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    async fn completed_course_ids(
        &self,
        employee: &EmployeeId,
    ) -> Result<HashSet<CourseId>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT course_id FROM enrollments \
             WHERE employee_id = $1 AND status = 'Completed'",
        )
        .bind(employee.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(CourseId::from).collect())
    }

    async fn department_popular_courses(
        &self,
        department: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS}, COUNT(e.id) AS enrollment_count \
             FROM courses c \
             JOIN enrollments e ON e.course_id = c.id \
             JOIN employees emp ON emp.id = e.employee_id \
             WHERE emp.department = $1 AND c.status = 'Active' \
             GROUP BY c.id ORDER BY enrollment_count DESC LIMIT $2"
        ))
        .bind(department)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn role_matching_courses(
        &self,
        designation: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS}, \
             (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count \
             FROM courses c \
             WHERE c.status = 'Active' AND c.description ILIKE $1 \
             ORDER BY c.created_at LIMIT $2"
        ))
        .bind(contains_pattern(designation))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn trending_courses(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS}, COUNT(e.id) AS enrollment_count \
             FROM courses c \
             JOIN enrollments e ON e.course_id = c.id \
             WHERE c.status = 'Active' AND e.enrollment_date >= $1 \
             GROUP BY c.id ORDER BY enrollment_count DESC LIMIT $2"
        ))
        .bind(since)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn in_progress_enrollments(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<EnrollmentProgress>, StoreError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(
            "SELECT e.id, e.course_id, c.title, c.duration_hours, e.completion_percentage, \
             e.status, e.enrollment_date \
             FROM enrollments e JOIN courses c ON c.id = e.course_id \
             WHERE e.employee_id = $1 AND e.status IN ('Pending', 'Active') \
             ORDER BY e.enrollment_date DESC",
        )
        .bind(employee.0)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

#[async_trait]
impl CertificationStore for PgStore {
    async fn certifications(
        &self,
        filter: CertificationFilter,
    ) -> Result<Vec<Certification>, StoreError> {
        let rows: Vec<CertificationRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATION_COLUMNS} FROM certifications \
             WHERE ($1::uuid IS NULL OR employee_id = $1) \
             AND ($2::uuid IS NULL OR course_id = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(filter.employee_id.map(|id| id.0))
        .bind(filter.course_id.map(|id| id.0))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, StoreError> {
        let row: Option<CertificationRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATION_COLUMNS} FROM certifications WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Certification::try_from).transpose()
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn employee_user(&self, employee: &EmployeeId) -> Result<Option<UserId>, StoreError> {
        let user: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT user_id FROM employees WHERE id = $1")
                .bind(employee.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user.flatten().map(UserId::from))
    }

    async fn course_title(&self, course: &CourseId) -> Result<Option<String>, StoreError> {
        Ok(sqlx::query_scalar("SELECT title FROM courses WHERE id = $1")
            .bind(course.0)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let row: NotificationRow = sqlx::query_as(&format!(
            "INSERT INTO notifications (id, user_id, message, type, is_read, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification.id.0)
        .bind(notification.user_id.0)
        .bind(&notification.message)
        .bind(notification.category.label())
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn notifications(
        &self,
        user: &UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE) \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(user.0)
        .bind(unread_only)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user: &UserId,
    ) -> Result<Option<Notification>, StoreError> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            "UPDATE notifications SET is_read = TRUE \
             WHERE id = $1 AND user_id = $2 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
