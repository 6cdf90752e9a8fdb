use std::collections::BTreeMap;

use common::{Event, EventProblem, Participation, ProblemAttemptResult, ProblemId};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{
    Cell, CellState, FormatError, ScoringContext, ScoringFormat, TieRule, format_hms,
    format_points, labels, problem_data, round_points,
};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct IcpcConfig {
    /// Minutes charged per rejected attempt before the solve.
    #[serde(default = "default_penalty")]
    penalty: u64,
}

fn default_penalty() -> u64 {
    20
}

/// One day, in minutes.
const MAX_PENALTY: u64 = 24 * 60;

impl IcpcConfig {
    fn parse(config: Option<&Value>) -> Result<Self, FormatError> {
        match config {
            None | Some(Value::Null) => Ok(Self {
                penalty: default_penalty(),
            }),
            Some(value) => {
                let config: Self = serde_json::from_value(value.clone())
                    .map_err(|e| FormatError::Config(e.to_string()))?;
                if config.penalty > MAX_PENALTY {
                    return Err(FormatError::Config(format!(
                        "penalty must be at most {MAX_PENALTY} minutes"
                    )));
                }
                Ok(config)
            }
        }
    }
}

/// Solved problems count once; rejected tries before the solve cost penalty time.
pub struct IcpcFormat;

#[derive(Default)]
struct ProblemState {
    solved_at: Option<u64>,
    points: f64,
    rejected: u64,
}

impl ScoringFormat for IcpcFormat {
    fn name(&self) -> &'static str {
        "icpc"
    }

    fn validate_config(&self, config: Option<&Value>) -> Result<(), FormatError> {
        IcpcConfig::parse(config).map(|_| ())
    }

    fn update_participation(
        &self,
        ctx: &ScoringContext<'_>,
        participation: &mut Participation,
        attempts: &[ProblemAttemptResult],
    ) -> Result<(), FormatError> {
        let config = IcpcConfig::parse(ctx.event.format_config.as_ref())?;

        let mut problems: BTreeMap<ProblemId, ProblemState> = BTreeMap::new();
        for attempt in ctx.event_attempts(attempts) {
            let state = problems.entry(attempt.problem_id).or_default();
            if state.solved_at.is_some() {
                continue;
            }
            if attempt.result.is_accepted() {
                state.solved_at = Some(attempt.offset_from(ctx.window_start));
                state.points = attempt.points;
            } else if attempt.result.is_penalized() {
                state.rejected += 1;
            }
        }

        let mut score = 0.0;
        let mut cumtime = 0;
        let mut last_solve = 0;
        let mut format_data = Map::new();
        for (problem_id, state) in problems {
            if let Some(time) = state.solved_at {
                score += state.points;
                cumtime = state
                    .rejected
                    .checked_mul(config.penalty * 60)
                    .and_then(|penalty| penalty.checked_add(time))
                    .and_then(|charged| charged.checked_add(cumtime))
                    .ok_or_else(|| {
                        FormatError::Scoring(format!(
                            "cumulative time overflows on problem {problem_id}"
                        ))
                    })?;
                last_solve = last_solve.max(time);
            }
            format_data.insert(
                problem_id.to_string(),
                json!({
                    "solved": state.solved_at.is_some(),
                    "time": state.solved_at.unwrap_or(0),
                    "points": state.points,
                    "penalty": state.rejected,
                }),
            );
        }

        participation.score = round_points(score, ctx.event.points_precision);
        participation.cumulative_time = cumtime;
        participation.tiebreaker = last_solve as f64;
        participation.format_data = Some(Value::Object(format_data));
        Ok(())
    }

    fn display_user_problem(
        &self,
        _event: &Event,
        participation: &Participation,
        problem: &EventProblem,
    ) -> Cell {
        let Some(data) = problem_data(participation, problem.problem_id) else {
            return Cell::empty();
        };
        let (Some(solved), Some(time), Some(penalty)) = (
            data.get("solved").and_then(Value::as_bool),
            data.get("time").and_then(Value::as_u64),
            data.get("penalty").and_then(Value::as_u64),
        ) else {
            return Cell::unknown();
        };

        match (solved, penalty) {
            (true, 0) => Cell::new(CellState::Accepted, "+").with_detail(format_hms(time)),
            (true, n) => {
                Cell::new(CellState::Accepted, format!("+{n}")).with_detail(format_hms(time))
            }
            (false, 0) => Cell::empty(),
            (false, n) => Cell::new(CellState::Rejected, format!("-{n}")),
        }
    }

    fn display_participation_result(&self, event: &Event, participation: &Participation) -> Cell {
        Cell::new(
            CellState::Empty,
            format_points(participation.score, event.points_precision),
        )
        .with_detail(format_hms(participation.cumulative_time))
    }

    fn label_for_problem(&self, index: usize) -> String {
        labels::alphabetic(index)
    }

    fn tie_rule(&self) -> TieRule {
        TieRule::ScoreAndTime
    }
}
