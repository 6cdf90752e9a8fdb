use std::collections::BTreeMap;

use common::{Event, EventProblem, Participation, ProblemAttemptResult, ProblemId};
use serde_json::{Map, Value, json};

use super::{
    Cell, CellState, FormatError, ScoringContext, ScoringFormat, best_solution_state, format_hms,
    format_points, problem_data, round_points,
};

/// Best points per problem, summed. Time is the sum of the moments each
/// scored problem first reached its best.
pub struct IoiFormat;

impl ScoringFormat for IoiFormat {
    fn name(&self) -> &'static str {
        "ioi"
    }

    fn update_participation(
        &self,
        ctx: &ScoringContext<'_>,
        participation: &mut Participation,
        attempts: &[ProblemAttemptResult],
    ) -> Result<(), FormatError> {
        // problem -> (best points, offset when first reached)
        let mut best: BTreeMap<ProblemId, (f64, u64)> = BTreeMap::new();
        for attempt in ctx.event_attempts(attempts) {
            let offset = attempt.offset_from(ctx.window_start);
            best.entry(attempt.problem_id)
                .and_modify(|(points, time)| {
                    if attempt.points > *points {
                        *points = attempt.points;
                        *time = offset;
                    }
                })
                .or_insert((attempt.points, offset));
        }

        let mut score = 0.0;
        let mut cumtime = 0;
        let mut format_data = Map::new();
        for (problem_id, (points, time)) in best {
            if points > 0.0 {
                cumtime += time;
            }
            score += points;
            format_data.insert(
                problem_id.to_string(),
                json!({ "points": points, "time": time }),
            );
        }

        participation.score = round_points(score, ctx.event.points_precision);
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
        let (Some(points), Some(time)) = (
            data.get("points").and_then(Value::as_f64),
            data.get("time").and_then(Value::as_u64),
        ) else {
            return Cell::unknown();
        };

        Cell::new(
            best_solution_state(points, problem.points),
            format_points(points, event.points_precision),
        )
        .with_detail(format_hms(time))
    }

    fn display_participation_result(&self, event: &Event, participation: &Participation) -> Cell {
        Cell::new(
            CellState::Empty,
            format_points(participation.score, event.points_precision),
        )
        .with_detail(format_hms(participation.cumulative_time))
    }
}
