use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParticipationId, ProblemId, ResultCode};

/// One graded problem attempt, as pushed by the grading subsystem.
///
/// Several results may share a `submission_id` when a single submission
/// answers more than one problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemAttemptResult {
    pub participation_id: ParticipationId,
    pub submission_id: i32,
    pub problem_id: ProblemId,
    pub points: f64,
    pub result: ResultCode,
    pub submitted_at: DateTime<Utc>,
}

impl ProblemAttemptResult {
    /// Whole seconds from `start` to submission, floored at zero.
    pub fn offset_from(&self, start: DateTime<Utc>) -> u64 {
        let offset: TimeDelta = self.submitted_at - start;
        u64::try_from(offset.num_seconds()).unwrap_or(0)
    }
}
