use crate::infra::seed_demo_catalog;
use clap::Args;
use learnhub::error::AppError;
use learnhub::store::MemoryStore;
use learnhub::workflows::assessments::{AttemptService, AttemptSubmission};
use learnhub::workflows::certifications::CertificateGenerator;
use learnhub::workflows::notifications::{NotificationInbox, StoreNotifier};
use learnhub::workflows::recommendations::RecommendationService;
use serde_json::json;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Score submitted for the seeded assessment (passing mark is 70).
    #[arg(long, default_value_t = 85.0)]
    pub(crate) score: f64,
    /// Certificate validity in years.
    #[arg(long, default_value_t = 2)]
    pub(crate) expiry_years: u32,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(MemoryStore::new());
    let catalog = seed_demo_catalog(&store)?;
    let notifier = Arc::new(StoreNotifier::new(Arc::clone(&store)));
    let attempts = AttemptService::new(
        Arc::clone(&store),
        notifier,
        CertificateGenerator::new(args.expiry_years.max(1)),
    );

    println!("== LearnHub demo ==");
    println!(
        "{} ({}, {}) sits \"{}\" with score {}",
        catalog.learner.employee_name,
        catalog.learner.department,
        catalog.learner.designation,
        catalog.assessment.title,
        args.score
    );

    let submission = AttemptSubmission {
        employee_id: Some(catalog.learner.id.to_string()),
        score: Some(json!(args.score)),
    };
    let (outcome, delivery) = attempts
        .submit_and_notify(catalog.assessment.id, submission)
        .await?;
    if let Err(err) = delivery.await {
        eprintln!("notification delivery task failed: {err}");
    }

    println!();
    println!("-- Attempt --");
    println!(
        "{} | score {:.1} | {}",
        outcome.attempt.status.label(),
        outcome.attempt.score,
        outcome.message
    );
    match &outcome.enrollment {
        Some(enrollment) => println!(
            "Enrollment {} is now {}",
            enrollment.id,
            enrollment.status.label()
        ),
        None => println!("No enrollment changed"),
    }
    match &outcome.certification {
        Some(certificate) => println!(
            "Certificate {} valid {} to {}",
            certificate.certificate_number, certificate.issue_date, certificate.expiry_date
        ),
        None => println!("No certificate issued"),
    }

    println!();
    println!("-- Inbox --");
    let inbox = NotificationInbox::new(Arc::clone(&store));
    let notifications = inbox.list(&catalog.learner_user, false).await?;
    if notifications.is_empty() {
        println!("(empty)");
    }
    for notification in notifications {
        println!("[{}] {}", notification.category.label(), notification.message);
    }

    println!();
    println!("-- Learning path --");
    let recommendations = RecommendationService::new(store);
    let path = recommendations.learning_path(&catalog.learner.id).await?;
    for entry in &path.learning_path {
        let detail = match (&entry.estimated_completion, &entry.reason) {
            (Some(date), _) => format!("finish by {date}"),
            (None, Some(reason)) => reason.clone(),
            (None, None) => String::new(),
        };
        println!(
            "{:<20} {:?}/{:?} {}",
            entry.title, entry.priority, entry.status, detail
        );
    }

    Ok(())
}
