use super::domain::AttemptStatus;

/// Maps a raw score onto a verdict; a score equal to the threshold passes.
///
/// Inputs are not clamped or range-checked. A NaN on either side fails.
pub fn decide_outcome(raw_score: f64, passing_score: f64) -> AttemptStatus {
    if raw_score >= passing_score {
        AttemptStatus::Passed
    } else {
        AttemptStatus::Failed
    }
}
