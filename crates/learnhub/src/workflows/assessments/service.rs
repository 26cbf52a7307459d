use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    AssessmentAttempt, AttemptStatus, AttemptSubmission, NewAttempt, SubmissionRejection,
};
use super::repository::{AssessmentStore, AttemptTransaction};
use super::scoring::decide_outcome;
use crate::domain::{AssessmentId, AttemptId, CertificationId, CourseId, EmployeeId, Enrollment};
use crate::store::StoreError;
use crate::workflows::certifications::{CertificateGenerator, Certification, NewCertification};
use crate::workflows::notifications::{dispatch, NotificationEvent, Notifier};

/// Number of certificate numbers tried before the submission is abandoned.
pub const CERTIFICATE_NUMBER_ATTEMPTS: usize = 5;

const PASSED_MESSAGE: &str = "Congratulations! You passed!";
const COMPLETED_MESSAGE: &str = "Assessment completed";

/// Everything the orchestrator committed for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub attempt: AssessmentAttempt,
    /// Enrollment moved to `Completed` by this attempt, if any.
    pub enrollment: Option<Enrollment>,
    /// Certificate minted by this attempt, if any.
    pub certification: Option<Certification>,
    pub message: &'static str,
}

/// Records attempts and cascades a pass into enrollment completion and
/// certification inside one transaction, then notifies after commit.
pub struct AttemptService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    generator: CertificateGenerator,
}

impl<S, N> AttemptService<S, N>
where
    S: AssessmentStore,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, generator: CertificateGenerator) -> Self {
        Self {
            store,
            notifier,
            generator,
        }
    }

    /// Submit an attempt. Notifications are detached; see [`Self::submit_and_notify`]
    /// when the caller needs to await delivery.
    pub async fn submit(
        &self,
        assessment_id: AssessmentId,
        submission: AttemptSubmission,
    ) -> Result<SubmissionOutcome, AttemptServiceError> {
        self.submit_and_notify(assessment_id, submission)
            .await
            .map(|(outcome, _delivery)| outcome)
    }

    /// Like [`Self::submit`], also returning the handle of the detached
    /// notification task.
    pub async fn submit_and_notify(
        &self,
        assessment_id: AssessmentId,
        submission: AttemptSubmission,
    ) -> Result<(SubmissionOutcome, tokio::task::JoinHandle<()>), AttemptServiceError> {
        let input = submission.validate()?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(AttemptServiceError::Transaction)?;

        let staged = match self
            .record(&mut tx, assessment_id, input.employee_id, input.score)
            .await
        {
            Ok(staged) => staged,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(%assessment_id, error = %rollback_err, "rollback failed");
                }
                match &err {
                    AttemptServiceError::AssessmentNotFound(_) => {}
                    other => {
                        error!(%assessment_id, error = %other, "attempt submission rolled back")
                    }
                }
                return Err(err);
            }
        };

        if let Err(err) = tx.commit().await {
            error!(%assessment_id, error = %err, "attempt commit failed");
            return Err(AttemptServiceError::Transaction(err));
        }

        let Staged {
            outcome,
            assessment_title,
        } = staged;

        info!(
            %assessment_id,
            attempt_id = %outcome.attempt.id,
            employee_id = %outcome.attempt.employee_id,
            status = outcome.attempt.status.label(),
            enrollment_completed = outcome.enrollment.is_some(),
            certificate_issued = outcome.certification.is_some(),
            "assessment attempt recorded"
        );

        let delivery = dispatch(
            Arc::clone(&self.notifier),
            notification_events(&outcome, assessment_title),
        );
        Ok((outcome, delivery))
    }

    /// Attempts for an assessment, most recent first.
    pub async fn attempts(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<AssessmentAttempt>, AttemptServiceError> {
        self.store
            .attempts_for_assessment(assessment_id)
            .await
            .map_err(AttemptServiceError::Transaction)
    }

    async fn record(
        &self,
        tx: &mut S::Transaction,
        assessment_id: AssessmentId,
        employee_id: EmployeeId,
        score: f64,
    ) -> Result<Staged, AttemptServiceError> {
        let assessment = tx
            .assessment(&assessment_id)
            .await?
            .ok_or(AttemptServiceError::AssessmentNotFound(assessment_id))?;

        let status = decide_outcome(score, assessment.passing_score);
        let now = Utc::now();
        let attempt = tx
            .insert_attempt(NewAttempt {
                id: AttemptId::new(),
                assessment_id,
                employee_id,
                score,
                status,
                recorded_at: now,
            })
            .await?;

        let mut enrollment = None;
        let mut certification = None;

        if status.is_passed() {
            if let Some(active) = tx
                .active_enrollment(&employee_id, &assessment.course_id)
                .await?
            {
                enrollment = Some(tx.complete_enrollment(&active.id).await?);

                let today = now.date_naive();
                let existing = tx
                    .active_certification(&employee_id, &assessment.course_id, today)
                    .await?;
                certification = match existing {
                    Some(held) => {
                        info!(
                            %employee_id,
                            course_id = %assessment.course_id,
                            certificate_number = %held.certificate_number,
                            "valid certificate already held; not minting another"
                        );
                        None
                    }
                    None => Some(self.mint(tx, &attempt, &assessment.course_id).await?),
                };
            }
        }

        let message = match status {
            AttemptStatus::Passed => PASSED_MESSAGE,
            AttemptStatus::Failed => COMPLETED_MESSAGE,
        };

        Ok(Staged {
            outcome: SubmissionOutcome {
                attempt,
                enrollment,
                certification,
                message,
            },
            assessment_title: assessment.title,
        })
    }

    async fn mint(
        &self,
        tx: &mut S::Transaction,
        attempt: &AssessmentAttempt,
        course_id: &CourseId,
    ) -> Result<Certification, AttemptServiceError> {
        for _ in 0..CERTIFICATE_NUMBER_ATTEMPTS {
            let grant = self.generator.generate();
            let number = grant.number.clone();
            let inserted = tx
                .insert_certification(NewCertification {
                    id: CertificationId::new(),
                    employee_id: attempt.employee_id,
                    course_id: *course_id,
                    grant,
                    created_at: Utc::now(),
                })
                .await?;

            match inserted {
                Some(certification) => return Ok(certification),
                None => {
                    warn!(certificate_number = %number, "certificate number collision; regenerating")
                }
            }
        }

        Err(AttemptServiceError::CertificateNumberExhausted)
    }
}

struct Staged {
    outcome: SubmissionOutcome,
    assessment_title: String,
}

fn notification_events(
    outcome: &SubmissionOutcome,
    assessment_title: String,
) -> Vec<NotificationEvent> {
    let attempt = &outcome.attempt;
    let mut events = vec![NotificationEvent::AssessmentResult {
        employee_id: attempt.employee_id,
        assessment_title,
        score: attempt.score,
        passed: attempt.status.is_passed(),
    }];

    if let Some(certification) = &outcome.certification {
        events.push(NotificationEvent::CertificationIssued {
            employee_id: certification.employee_id,
            course_id: certification.course_id,
            certificate_number: certification.certificate_number.clone(),
        });
    }

    events
}

/// Error raised by the attempt orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum AttemptServiceError {
    #[error(transparent)]
    InvalidInput(#[from] SubmissionRejection),
    #[error("assessment {0} not found")]
    AssessmentNotFound(AssessmentId),
    #[error("attempt transaction failed: {0}")]
    Transaction(#[from] StoreError),
    #[error("no unique certificate number after {CERTIFICATE_NUMBER_ATTEMPTS} tries")]
    CertificateNumberExhausted,
}
