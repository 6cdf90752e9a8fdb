//! Pluggable per-event scoring strategies.
//!
//! A format folds the attempt history of one participation into its `score`,
//! `cumulative_time`, `tiebreaker` and `format_data`. Rendering reads
//! `format_data` only and never re-derives from attempts.

mod default;
mod icpc;
mod ioi;
pub mod labels;
mod registry;

use chrono::{DateTime, Utc};
use common::{Event, EventProblem, Participation, ProblemAttemptResult, ProblemId};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use default::DefaultFormat;
pub use icpc::IcpcFormat;
pub use ioi::IoiFormat;
pub use labels::ProblemLabeler;
pub use registry::FormatRegistry;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Invalid format config: {0}")]
    Config(String),

    #[error("Format '{0}' is already registered")]
    AlreadyRegistered(&'static str),

    #[error("Scoring failed: {0}")]
    Scoring(String),
}

/// Inputs a format needs besides the participation itself.
pub struct ScoringContext<'a> {
    pub event: &'a Event,
    pub problems: &'a [EventProblem],
    /// Effective start of the participation's window.
    pub window_start: DateTime<Utc>,
}

impl ScoringContext<'_> {
    /// Attempts on problems attached to the event, oldest first.
    pub fn event_attempts<'b>(
        &self,
        attempts: &'b [ProblemAttemptResult],
    ) -> Vec<&'b ProblemAttemptResult> {
        let mut kept: Vec<&ProblemAttemptResult> = attempts
            .iter()
            .filter(|a| self.problems.iter().any(|p| p.problem_id == a.problem_id))
            .collect();
        kept.sort_by_key(|a| (a.submitted_at, a.submission_id));
        kept
    }
}

/// The key on which two participants count as tied for ranking purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieRule {
    Score,
    ScoreAndTime,
    /// Score, cumulative time and tiebreaker.
    Full,
}

impl TieRule {
    pub fn tied(self, a: &Participation, b: &Participation) -> bool {
        if a.is_disqualified != b.is_disqualified || a.score != b.score {
            return false;
        }
        match self {
            Self::Score => true,
            Self::ScoreAndTime => a.cumulative_time == b.cumulative_time,
            Self::Full => a.cumulative_time == b.cumulative_time && a.tiebreaker == b.tiebreaker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellState {
    Empty,
    Accepted,
    Rejected,
    FullScore,
    PartialScore,
    FailedScore,
    /// `format_data` could not be read.
    Unknown,
}

/// One rendered scoreboard cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub state: CellState,
    pub text: String,
    /// Secondary line, usually a time.
    pub detail: Option<String>,
}

impl Cell {
    pub fn new(state: CellState, text: impl Into<String>) -> Self {
        Self {
            state,
            text: text.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn empty() -> Self {
        Self::new(CellState::Empty, "")
    }

    pub fn unknown() -> Self {
        Self::new(CellState::Unknown, "???")
    }
}

pub trait ScoringFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check an event's `format_config` once, when it is attached.
    fn validate_config(&self, config: Option<&Value>) -> Result<(), FormatError> {
        match config {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Object(map)) if map.is_empty() => Ok(()),
            Some(_) => Err(FormatError::Config(format!(
                "format '{}' takes no configuration",
                self.name()
            ))),
        }
    }

    /// Recompute the scoring fields from the full attempt history.
    /// Must be deterministic in its inputs.
    fn update_participation(
        &self,
        ctx: &ScoringContext<'_>,
        participation: &mut Participation,
        attempts: &[ProblemAttemptResult],
    ) -> Result<(), FormatError>;

    fn display_user_problem(
        &self,
        event: &Event,
        participation: &Participation,
        problem: &EventProblem,
    ) -> Cell;

    fn display_participation_result(&self, event: &Event, participation: &Participation) -> Cell;

    /// Machine-readable per-problem slice of `format_data`, in the order given.
    fn problem_breakdown(
        &self,
        participation: &Participation,
        problems: &[EventProblem],
    ) -> Vec<Option<Value>> {
        problems
            .iter()
            .map(|p| problem_data(participation, p.problem_id).cloned())
            .collect()
    }

    /// Zero-based index to display label. Must be injective.
    fn label_for_problem(&self, index: usize) -> String {
        labels::numeric(index)
    }

    fn tie_rule(&self) -> TieRule {
        TieRule::Score
    }
}

pub(crate) fn problem_data(participation: &Participation, problem_id: ProblemId) -> Option<&Value> {
    participation
        .format_data
        .as_ref()?
        .get(problem_id.to_string())
}

pub fn best_solution_state(points: f64, total: f64) -> CellState {
    if points == 0.0 {
        CellState::FailedScore
    } else if points >= total {
        CellState::FullScore
    } else {
        CellState::PartialScore
    }
}

pub fn round_points(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

/// Whole numbers print without decimals; others with `precision` digits.
pub fn format_points(value: f64, precision: u32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{:.*}", precision as usize, value)
    }
}

/// `H:MM:SS`, hours unbounded.
pub fn format_hms(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
