use std::collections::HashSet;

use chrono::{Days, NaiveDate};

use super::domain::{
    CourseCandidate, CourseRecommendation, EnrollmentProgress, LearningPathEntry, PathEntryStatus,
    PathPriority, RecommendationType,
};
use crate::domain::{CourseId, Employee};

pub const MAX_RECOMMENDATIONS: usize = 10;
pub const DEPARTMENT_POOL_LIMIT: usize = 10;
pub const ROLE_POOL_LIMIT: usize = 5;
pub const TRENDING_POOL_LIMIT: usize = 5;
pub const TRENDING_WINDOW_DAYS: u64 = 30;

const RANK_STEP: i32 = 5;
const PATH_RECOMMENDATIONS: usize = 5;
const HIGH_PRIORITY_RECOMMENDATIONS: usize = 2;
const DEFAULT_DURATION_HOURS: i32 = 10;
const STUDY_HOURS_PER_DAY: f64 = 2.0;

/// Raw candidate lists, each already ordered by its own signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePools {
    pub department: Vec<CourseCandidate>,
    pub role: Vec<CourseCandidate>,
    pub trending: Vec<CourseCandidate>,
}

/// Blends the three pools into one list.
///
/// Completed courses are dropped everywhere. A course keeps the first pool
/// it appears in (department, then role, then trending). Rank positions are
/// counted per pool:
///
/// - department: over the courses left after removing completed ones;
/// - role: over the courses left after removing completed ones, so a course
///   already taken by the department pool still occupies its position;
/// - trending: over every fetched row, completed or duplicate.
///
/// The merged list is stably sorted by descending score and truncated.
pub fn rank(
    employee: &Employee,
    completed: &HashSet<CourseId>,
    pools: CandidatePools,
) -> Vec<CourseRecommendation> {
    let mut seen: HashSet<CourseId> = HashSet::new();
    let mut ranked = Vec::new();

    let sources = [
        (RecommendationType::Department, pools.department),
        (RecommendationType::Role, pools.role),
        (RecommendationType::Trending, pools.trending),
    ];

    for (kind, candidates) in sources {
        let reason = reason_for(kind, employee);
        let ranked_rows = candidates
            .into_iter()
            .filter(|candidate| {
                kind == RecommendationType::Trending || !completed.contains(&candidate.course.id)
            })
            .enumerate();

        for (position, candidate) in ranked_rows {
            let id = candidate.course.id;
            if completed.contains(&id) || !seen.insert(id) {
                continue;
            }
            ranked.push(CourseRecommendation {
                course: candidate.course,
                recommendation_score: score_at(kind, position),
                recommendation_reason: reason.clone(),
                recommendation_type: kind,
            });
        }
    }

    ranked.sort_by(|a, b| b.recommendation_score.cmp(&a.recommendation_score));
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

fn score_at(kind: RecommendationType, position: usize) -> i32 {
    let step = i32::try_from(position)
        .unwrap_or(i32::MAX)
        .saturating_mul(RANK_STEP);
    kind.base_score().saturating_sub(step)
}

fn reason_for(kind: RecommendationType, employee: &Employee) -> String {
    match kind {
        RecommendationType::Department => {
            format!("Popular in {} department", employee.department)
        }
        RecommendationType::Role => format!("Relevant for {} role", employee.designation),
        RecommendationType::Trending => "Trending course this month".to_string(),
    }
}

/// Open courses first, then the leading recommendations.
pub fn learning_path(
    current: &[EnrollmentProgress],
    recommendations: &[CourseRecommendation],
    today: NaiveDate,
) -> Vec<LearningPathEntry> {
    let in_progress = current.iter().map(|enrollment| LearningPathEntry {
        course_id: enrollment.course_id,
        title: enrollment.title.clone(),
        priority: PathPriority::High,
        status: PathEntryStatus::InProgress,
        progress: enrollment.progress_percentage,
        estimated_completion: Some(estimated_completion(
            enrollment.duration_hours,
            enrollment.progress_percentage,
            today,
        )),
        reason: None,
    });

    let recommended = recommendations
        .iter()
        .take(PATH_RECOMMENDATIONS)
        .enumerate()
        .map(|(index, recommendation)| LearningPathEntry {
            course_id: recommendation.course.id,
            title: recommendation.course.title.clone(),
            priority: if index < HIGH_PRIORITY_RECOMMENDATIONS {
                PathPriority::High
            } else {
                PathPriority::Medium
            },
            status: PathEntryStatus::Recommended,
            progress: 0.0,
            estimated_completion: None,
            reason: Some(recommendation.recommendation_reason.clone()),
        });

    in_progress.chain(recommended).collect()
}

/// Remaining hours at two study hours a day, rounded up to whole days.
pub fn estimated_completion(
    duration_hours: Option<i32>,
    progress_percentage: f64,
    today: NaiveDate,
) -> NaiveDate {
    let duration = match duration_hours {
        Some(hours) if hours > 0 => hours,
        _ => DEFAULT_DURATION_HOURS,
    };
    let progress = if progress_percentage.is_finite() {
        progress_percentage.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let remaining_hours = f64::from(duration) * (100.0 - progress) / 100.0;
    let days = (remaining_hours / STUDY_HOURS_PER_DAY).ceil() as u64;

    today.checked_add_days(Days::new(days)).unwrap_or(today)
}
