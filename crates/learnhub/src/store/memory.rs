use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::StoreError;
use crate::domain::{
    AssessmentId, CertificationId, Course, CourseId, CourseStatus, Employee, EmployeeId,
    Enrollment, EnrollmentId, EnrollmentStatus, NotificationId, UserId,
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

/// Transactional step at which an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Begin,
    LoadAssessment,
    InsertAttempt,
    CompleteEnrollment,
    InsertCertification,
    Commit,
}

#[derive(Debug, Default)]
struct Tables {
    employees: Vec<Employee>,
    courses: Vec<Course>,
    assessments: Vec<Assessment>,
    enrollments: Vec<Enrollment>,
    attempts: Vec<AssessmentAttempt>,
    certifications: Vec<Certification>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == *id)
    }

    fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == *id)
    }

    fn active_courses(&self) -> impl Iterator<Item = &Course> {
        self.courses
            .iter()
            .filter(|course| course.status == CourseStatus::Active)
    }

    fn certificate_number_taken(&self, number: &str) -> bool {
        self.certifications
            .iter()
            .any(|certification| certification.certificate_number == number)
    }

    /// Active courses with at least one enrollment accepted by `counts`,
    /// ordered by that count (descending) then catalog order.
    fn ranked_by_enrollments<F>(&self, counts: F, limit: usize) -> Vec<CourseCandidate>
    where
        F: Fn(&Enrollment) -> bool,
    {
        let mut tally: HashMap<CourseId, i64> = HashMap::new();
        for enrollment in self.enrollments.iter().filter(|e| counts(*e)) {
            *tally.entry(enrollment.course_id).or_default() += 1;
        }

        let mut candidates: Vec<CourseCandidate> = self
            .active_courses()
            .filter_map(|course| {
                tally
                    .get(&course.id)
                    .map(|count| CourseCandidate::new(course.clone(), *count))
            })
            .collect();
        candidates.sort_by_key(|candidate| Reverse(candidate.enrollment_count));
        candidates.truncate(limit);
        candidates
    }
}

#[derive(Debug, Default)]
struct Faults {
    failure: Option<FailurePoint>,
    certificate_collisions: usize,
}

/// Mutex-guarded in-process store.
///
/// Transactions stage their writes and apply them under the lock on commit,
/// so an uncommitted or rolled-back transaction leaves nothing behind.
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<Faults>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(poisoned)
    }

    fn faults(&self) -> Result<MutexGuard<'_, Faults>, StoreError> {
        self.faults.lock().map_err(poisoned)
    }

    fn trip(&self, point: FailurePoint) -> Result<(), StoreError> {
        match self.faults()?.failure {
            Some(armed) if armed == point => Err(StoreError::Unavailable(format!(
                "injected failure at {point:?}"
            ))),
            _ => Ok(()),
        }
    }

    /// Makes every subsequent transaction fail at `point` until cleared.
    pub fn fail_at(&self, point: FailurePoint) -> Result<(), StoreError> {
        self.faults()?.failure = Some(point);
        Ok(())
    }

    pub fn clear_failure(&self) -> Result<(), StoreError> {
        self.faults()?.failure = None;
        Ok(())
    }

    /// Reports the next `count` certificate inserts as number collisions.
    pub fn force_certificate_collisions(&self, count: usize) -> Result<(), StoreError> {
        self.faults()?.certificate_collisions = count;
        Ok(())
    }

    fn take_certificate_collision(&self) -> Result<bool, StoreError> {
        let mut faults = self.faults()?;
        if faults.certificate_collisions > 0 {
            faults.certificate_collisions -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn insert_employee(&self, employee: Employee) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.employee(&employee.id).is_some() {
            return Err(StoreError::Conflict(format!("employee {}", employee.id)));
        }
        tables.employees.push(employee);
        Ok(())
    }

    pub fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.course(&course.id).is_some() {
            return Err(StoreError::Conflict(format!("course {}", course.id)));
        }
        tables.courses.push(course);
        Ok(())
    }

    pub fn insert_assessment(&self, assessment: Assessment) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.course(&assessment.course_id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.assessments.push(assessment);
        Ok(())
    }

    /// At most one `Pending`/`Active` enrollment may exist per employee and course.
    pub fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if enrollment.status.is_open()
            && tables.enrollments.iter().any(|existing| {
                existing.employee_id == enrollment.employee_id
                    && existing.course_id == enrollment.course_id
                    && existing.status.is_open()
            })
        {
            return Err(StoreError::Conflict(format!(
                "open enrollment for employee {} in course {}",
                enrollment.employee_id, enrollment.course_id
            )));
        }
        tables.enrollments.push(enrollment);
        Ok(())
    }

    pub fn insert_certification(&self, certification: Certification) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.certificate_number_taken(&certification.certificate_number) {
            return Err(StoreError::Conflict(certification.certificate_number));
        }
        tables.certifications.push(certification);
        Ok(())
    }

    pub fn attempts(&self) -> Result<Vec<AssessmentAttempt>, StoreError> {
        Ok(self.tables()?.attempts.clone())
    }

    pub fn enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables()?
            .enrollments
            .iter()
            .find(|enrollment| enrollment.id == *id)
            .cloned())
    }

    pub fn all_certifications(&self) -> Result<Vec<Certification>, StoreError> {
        Ok(self.tables()?.certifications.clone())
    }

    pub fn all_notifications(&self) -> Result<Vec<Notification>, StoreError> {
        Ok(self.tables()?.notifications.clone())
    }
}

#[derive(Debug)]
enum StagedWrite {
    Attempt(AssessmentAttempt),
    CompleteEnrollment(EnrollmentId),
    Certification(Certification),
}

/// Unit of work against a [`MemoryStore`]; writes land only on commit.
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    staged: Vec<StagedWrite>,
}

impl MemoryTransaction {
    fn completed_here(&self, id: &EnrollmentId) -> bool {
        self.staged
            .iter()
            .any(|write| matches!(write, StagedWrite::CompleteEnrollment(staged) if staged == id))
    }

    fn staged_certifications(&self) -> impl Iterator<Item = &Certification> {
        self.staged.iter().filter_map(|write| match write {
            StagedWrite::Certification(certification) => Some(certification),
            _ => None,
        })
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        self.trip(FailurePoint::Begin)?;
        Ok(MemoryTransaction {
            store: self.clone(),
            staged: Vec::new(),
        })
    }

    async fn attempts_for_assessment(
        &self,
        assessment: &AssessmentId,
    ) -> Result<Vec<AssessmentAttempt>, StoreError> {
        let tables = self.tables()?;
        let mut attempts: Vec<AssessmentAttempt> = tables
            .attempts
            .iter()
            .rev()
            .filter(|attempt| attempt.assessment_id == *assessment)
            .cloned()
            .collect();
        attempts.sort_by_key(|attempt| Reverse(attempt.attempted_at));
        Ok(attempts)
    }
}

#[async_trait]
impl AttemptTransaction for MemoryTransaction {
    async fn assessment(&mut self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
        self.store.trip(FailurePoint::LoadAssessment)?;
        Ok(self
            .store
            .tables()?
            .assessments
            .iter()
            .find(|assessment| assessment.id == *id)
            .cloned())
    }

    async fn insert_attempt(
        &mut self,
        attempt: NewAttempt,
    ) -> Result<AssessmentAttempt, StoreError> {
        self.store.trip(FailurePoint::InsertAttempt)?;
        let attempt = attempt.into_attempt();
        self.staged.push(StagedWrite::Attempt(attempt.clone()));
        Ok(attempt)
    }

    async fn active_enrollment(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
    ) -> Result<Option<Enrollment>, StoreError> {
        let candidate = self
            .store
            .tables()?
            .enrollments
            .iter()
            .find(|enrollment| {
                enrollment.employee_id == *employee
                    && enrollment.course_id == *course
                    && enrollment.status == EnrollmentStatus::Active
            })
            .cloned();
        Ok(candidate.filter(|enrollment| !self.completed_here(&enrollment.id)))
    }

    async fn complete_enrollment(&mut self, id: &EnrollmentId) -> Result<Enrollment, StoreError> {
        self.store.trip(FailurePoint::CompleteEnrollment)?;
        let mut enrollment = self
            .store
            .enrollment(id)?
            .ok_or(StoreError::NotFound)?;
        enrollment.status = EnrollmentStatus::Completed;
        enrollment.completion_percentage = 100.0;
        self.staged.push(StagedWrite::CompleteEnrollment(*id));
        Ok(enrollment)
    }

    async fn active_certification(
        &mut self,
        employee: &EmployeeId,
        course: &CourseId,
        today: NaiveDate,
    ) -> Result<Option<Certification>, StoreError> {
        let matches = |certification: &&Certification| {
            certification.employee_id == *employee
                && certification.course_id == *course
                && certification.is_valid_on(today)
        };
        if let Some(staged) = self.staged_certifications().find(matches) {
            return Ok(Some(staged.clone()));
        }
        Ok(self
            .store
            .tables()?
            .certifications
            .iter()
            .find(matches)
            .cloned())
    }

    async fn insert_certification(
        &mut self,
        certification: NewCertification,
    ) -> Result<Option<Certification>, StoreError> {
        self.store.trip(FailurePoint::InsertCertification)?;
        if self.store.take_certificate_collision()? {
            return Ok(None);
        }

        let certification = certification.into_certification();
        let number = certification.certificate_number.as_str();
        let taken = self.store.tables()?.certificate_number_taken(number)
            || self
                .staged_certifications()
                .any(|staged| staged.certificate_number == number);
        if taken {
            return Ok(None);
        }

        self.staged
            .push(StagedWrite::Certification(certification.clone()));
        Ok(Some(certification))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.store.trip(FailurePoint::Commit)?;
        let mut tables = self.store.tables()?;

        for write in &self.staged {
            if let StagedWrite::Certification(certification) = write {
                if tables.certificate_number_taken(&certification.certificate_number) {
                    return Err(StoreError::Conflict(
                        certification.certificate_number.clone(),
                    ));
                }
            }
        }

        for write in self.staged {
            match write {
                StagedWrite::Attempt(attempt) => tables.attempts.push(attempt),
                StagedWrite::CompleteEnrollment(id) => {
                    let enrollment = tables
                        .enrollments
                        .iter_mut()
                        .find(|enrollment| enrollment.id == id)
                        .ok_or(StoreError::NotFound)?;
                    enrollment.status = EnrollmentStatus::Completed;
                    enrollment.completion_percentage = 100.0;
                }
                StagedWrite::Certification(certification) => {
                    tables.certifications.push(certification)
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RecommendationSource for MemoryStore {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.tables()?.employee(id).cloned())
    }

    async fn completed_course_ids(
        &self,
        employee: &EmployeeId,
    ) -> Result<HashSet<CourseId>, StoreError> {
        Ok(self
            .tables()?
            .enrollments
            .iter()
            .filter(|enrollment| {
                enrollment.employee_id == *employee
                    && enrollment.status == EnrollmentStatus::Completed
            })
            .map(|enrollment| enrollment.course_id)
            .collect())
    }

    async fn department_popular_courses(
        &self,
        department: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        let tables = self.tables()?;
        let members: HashSet<EmployeeId> = tables
            .employees
            .iter()
            .filter(|employee| employee.department == department)
            .map(|employee| employee.id)
            .collect();
        Ok(tables.ranked_by_enrollments(
            |enrollment| members.contains(&enrollment.employee_id),
            limit,
        ))
    }

    async fn role_matching_courses(
        &self,
        designation: &str,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        let needle = designation.to_lowercase();
        let tables = self.tables()?;
        Ok(tables
            .active_courses()
            .filter(|course| {
                course
                    .description
                    .as_deref()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
            .take(limit)
            .map(|course| {
                let count = tables
                    .enrollments
                    .iter()
                    .filter(|enrollment| enrollment.course_id == course.id)
                    .count() as i64;
                CourseCandidate::new(course.clone(), count)
            })
            .collect())
    }

    async fn trending_courses(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CourseCandidate>, StoreError> {
        Ok(self
            .tables()?
            .ranked_by_enrollments(|enrollment| enrollment.enrollment_date >= since, limit))
    }

    async fn in_progress_enrollments(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<EnrollmentProgress>, StoreError> {
        let tables = self.tables()?;
        let mut progress: Vec<EnrollmentProgress> = tables
            .enrollments
            .iter()
            .rev()
            .filter(|enrollment| enrollment.employee_id == *employee && enrollment.status.is_open())
            .filter_map(|enrollment| {
                tables.course(&enrollment.course_id).map(|course| EnrollmentProgress {
                    enrollment_id: enrollment.id,
                    course_id: course.id,
                    title: course.title.clone(),
                    duration_hours: course.duration_hours,
                    progress_percentage: enrollment.completion_percentage,
                    status: enrollment.status,
                    enrollment_date: enrollment.enrollment_date,
                })
            })
            .collect();
        progress.sort_by_key(|entry| Reverse(entry.enrollment_date));
        Ok(progress)
    }
}

#[async_trait]
impl CertificationStore for MemoryStore {
    async fn certifications(
        &self,
        filter: CertificationFilter,
    ) -> Result<Vec<Certification>, StoreError> {
        let mut certifications: Vec<Certification> = self
            .tables()?
            .certifications
            .iter()
            .rev()
            .filter(|certification| filter.matches(certification))
            .cloned()
            .collect();
        certifications.sort_by_key(|certification| Reverse(certification.created_at));
        Ok(certifications)
    }

    async fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, StoreError> {
        Ok(self
            .tables()?
            .certifications
            .iter()
            .find(|certification| certification.id == *id)
            .cloned())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn employee_user(&self, employee: &EmployeeId) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .tables()?
            .employee(employee)
            .and_then(|employee| employee.user_id))
    }

    async fn course_title(&self, course: &CourseId) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables()?
            .course(course)
            .map(|course| course.title.clone()))
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let notification = notification.into_notification();
        self.tables()?.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications(
        &self,
        user: &UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut notifications: Vec<Notification> = self
            .tables()?
            .notifications
            .iter()
            .rev()
            .filter(|notification| {
                notification.user_id == *user && (!unread_only || !notification.read)
            })
            .cloned()
            .collect();
        notifications.sort_by_key(|notification| Reverse(notification.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user: &UserId,
    ) -> Result<Option<Notification>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .notifications
            .iter_mut()
            .find(|notification| notification.id == *id && notification.user_id == *user)
            .map(|notification| {
                notification.read = true;
                notification.clone()
            }))
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<u64, StoreError> {
        let mut tables = self.tables()?;
        let mut updated = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|notification| notification.user_id == *user && !notification.read)
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64, StoreError> {
        Ok(self
            .tables()?
            .notifications
            .iter()
            .filter(|notification| notification.user_id == *user && !notification.read)
            .count() as u64)
    }
}
