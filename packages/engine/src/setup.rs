use std::collections::HashSet;

use common::{Event, EventId, EventProblem};
use tracing::{info, instrument};

use crate::error::EngineError;
use crate::format::{ProblemLabeler, labels};
use crate::state::EngineState;

const MAX_KEY_LEN: usize = 20;
const MAX_POINTS_PRECISION: u32 = 10;

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

fn invalid(detail: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(detail.into())
}

/// Event configuration boundary. Everything a later recompute or render
/// relies on is checked here, once.
pub struct EventSetup {
    state: EngineState,
}

impl EventSetup {
    pub fn new(state: EngineState) -> Self {
        Self { state }
    }

    #[instrument(
        skip(self, event, problems, labeler),
        fields(event_id = event.id, key = %event.key)
    )]
    pub async fn configure(
        &self,
        mut event: Event,
        problems: Vec<EventProblem>,
        labeler: Option<ProblemLabeler>,
    ) -> Result<Event, EngineError> {
        if !valid_key(&event.key) {
            return Err(invalid(format!(
                "key must be 1-{MAX_KEY_LEN} lowercase letters or digits"
            )));
        }
        if event.start_time >= event.end_time {
            return Err(invalid("start time must be before end time"));
        }
        if matches!(event.time_limit_secs, Some(secs) if secs <= 0) {
            return Err(invalid("time limit must be positive"));
        }
        if event.points_precision > MAX_POINTS_PRECISION {
            return Err(invalid(format!(
                "points precision must be between 0 and {MAX_POINTS_PRECISION}"
            )));
        }

        if let Some(other) = self.state.store.event_by_key(&event.key).await? {
            if other.id != event.id {
                return Err(invalid(format!("key '{}' is already in use", event.key)));
            }
        }

        let format_name = self.state.format_name(&event).to_string();
        let format = self
            .state
            .formats
            .get(&format_name)
            .ok_or_else(|| invalid(format!("unknown format '{format_name}'")))?;
        format
            .validate_config(event.format_config.as_ref())
            .map_err(|e| invalid(e.to_string()))?;

        let mut seen = HashSet::with_capacity(problems.len());
        for problem in &problems {
            if !seen.insert(problem.problem_id) {
                return Err(invalid(format!(
                    "problem {} is attached twice",
                    problem.problem_id
                )));
            }
            if problem.points.is_nan() || problem.points <= 0.0 {
                return Err(invalid(format!(
                    "problem {} must be worth positive points",
                    problem.problem_id
                )));
            }
        }

        if let Some(labeler) = &labeler {
            labels::validate(labeler, problems.len()).map_err(invalid)?;
        }

        // Reconfiguring keeps engine-maintained fields.
        if let Ok(stored) = self.state.store.event(event.id).await {
            event.user_count = stored.user_count;
            event.banned_actor_ids = stored.banned_actor_ids;
        }

        self.state.store.save_event(event.clone()).await?;
        self.state.store.save_problems(event.id, problems).await?;
        match labeler {
            Some(labeler) => {
                self.state.labelers.insert(event.id, labeler);
            }
            None => {
                self.state.labelers.remove(&event.id);
            }
        }

        info!(format = %format_name, "Event configured");
        Ok(event)
    }

    pub async fn label_for_problem(
        &self,
        event_id: EventId,
        index: usize,
    ) -> Result<String, EngineError> {
        let event = self.state.load_event(event_id).await?;
        let format = self.state.format_for(&event)?;
        self.state.problem_label(&event, format.as_ref(), index)
    }
}
