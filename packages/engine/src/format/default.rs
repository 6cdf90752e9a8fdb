use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{Event, EventProblem, Participation, ProblemAttemptResult};
use serde_json::{Map, Value, json};

use super::{
    Cell, CellState, FormatError, ScoringContext, ScoringFormat, format_hms, format_points,
    problem_data, round_points,
};

/// Scores a participation by its single best submission.
///
/// The best submission is the one with the most points summed over the
/// problems it answers; among equals the latest wins. Its offset from the
/// window start becomes the cumulative time.
pub struct DefaultFormat;

struct Submission<'a> {
    id: i32,
    points: f64,
    submitted_at: DateTime<Utc>,
    results: Vec<&'a ProblemAttemptResult>,
}

fn group_by_submission<'a>(attempts: Vec<&'a ProblemAttemptResult>) -> Vec<Submission<'a>> {
    let mut grouped: BTreeMap<i32, Submission<'a>> = BTreeMap::new();
    for attempt in attempts {
        let entry = grouped
            .entry(attempt.submission_id)
            .or_insert_with(|| Submission {
                id: attempt.submission_id,
                points: 0.0,
                submitted_at: attempt.submitted_at,
                results: Vec::new(),
            });
        entry.points += attempt.points;
        entry.submitted_at = entry.submitted_at.max(attempt.submitted_at);
        entry.results.push(attempt);
    }
    grouped.into_values().collect()
}

impl ScoringFormat for DefaultFormat {
    fn name(&self) -> &'static str {
        "default"
    }

    fn update_participation(
        &self,
        ctx: &ScoringContext<'_>,
        participation: &mut Participation,
        attempts: &[ProblemAttemptResult],
    ) -> Result<(), FormatError> {
        let submissions = group_by_submission(ctx.event_attempts(attempts));
        let best = submissions.iter().max_by(|a, b| {
            a.points
                .total_cmp(&b.points)
                .then(a.submitted_at.cmp(&b.submitted_at))
                .then(a.id.cmp(&b.id))
        });

        let mut format_data = Map::new();
        let (points, cumtime) = match best {
            Some(best) => {
                for result in &best.results {
                    format_data.insert(
                        result.problem_id.to_string(),
                        json!({
                            "status": result.result.is_accepted(),
                            "points": result.points,
                        }),
                    );
                }
                let offset = best.submitted_at - ctx.window_start;
                (best.points, u64::try_from(offset.num_seconds()).unwrap_or(0))
            }
            None => (0.0, 0),
        };

        participation.score = round_points(points, ctx.event.points_precision);
        participation.cumulative_time = cumtime;
        participation.tiebreaker = 0.0;
        participation.format_data = Some(Value::Object(format_data));
        Ok(())
    }

    fn display_user_problem(
        &self,
        event: &Event,
        participation: &Participation,
        problem: &EventProblem,
    ) -> Cell {
        let Some(data) = problem_data(participation, problem.problem_id) else {
            return Cell::empty();
        };
        let (Some(status), Some(points)) = (
            data.get("status").and_then(Value::as_bool),
            data.get("points").and_then(Value::as_f64),
        ) else {
            return Cell::unknown();
        };

        let state = if status {
            CellState::Accepted
        } else {
            CellState::Rejected
        };
        Cell::new(state, format_points(points, event.points_precision))
    }

    fn display_participation_result(&self, event: &Event, participation: &Participation) -> Cell {
        Cell::new(
            CellState::Empty,
            format_points(participation.score, event.points_precision),
        )
        .with_detail(format_hms(participation.cumulative_time))
    }
}
