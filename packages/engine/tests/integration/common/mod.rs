use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use common::{
    Actor, Event, EventId, EventProblem, Participation, ParticipationId, ProblemAttemptResult,
    ResultCode,
};
use engine::{
    Clock, EngineConfig, EngineState, EventSetup, ManualClock, MemoryStore, ParticipationLifecycle,
    RankingEngine,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Start of every test event.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap()
}

pub fn minutes(n: i64) -> DateTime<Utc> {
    t0() + TimeDelta::minutes(n)
}

/// An engine over an in-memory store and a clock that only moves when told.
pub struct TestEngine {
    pub state: EngineState,
    pub clock: ManualClock,
    pub setup: EventSetup,
    pub lifecycle: ParticipationLifecycle,
    pub ranking: RankingEngine,
    next_submission: AtomicI32,
}

impl TestEngine {
    pub fn spawn() -> Self {
        init_tracing();

        let config = EngineConfig {
            virtual_join_max_attempts: 64,
            virtual_join_backoff_base_ms: 1,
            virtual_join_backoff_max_ms: 5,
            ..EngineConfig::default()
        };
        let clock = ManualClock::new(t0());
        let state = EngineState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            config,
        );

        Self {
            setup: EventSetup::new(state.clone()),
            lifecycle: ParticipationLifecycle::new(state.clone()),
            ranking: RankingEngine::new(state.clone()),
            state,
            clock,
            next_submission: AtomicI32::new(1),
        }
    }

    /// A visible public event running `t0 .. t0 + 2h` with two 100-point problems.
    pub async fn create_event(&self, id: EventId, customize: impl FnOnce(&mut Event)) -> Event {
        let mut event = Event::new(id, format!("round{id}"), t0(), t0() + TimeDelta::hours(2));
        event.is_visible = true;
        customize(&mut event);
        self.setup
            .configure(
                event,
                vec![EventProblem::new(1, 100.0, 0), EventProblem::new(2, 100.0, 1)],
                None,
            )
            .await
            .expect("Failed to configure event")
    }

    pub fn at(&self, minute: i64) {
        self.clock.set(minutes(minute));
    }

    pub async fn join(&self, actor: &Actor, event_id: EventId) -> Participation {
        self.lifecycle
            .join(actor, event_id, None)
            .await
            .expect("Failed to join event")
    }

    /// Grade one problem of a fresh submission at the current clock time.
    pub async fn submit(
        &self,
        participation_id: ParticipationId,
        problem_id: i32,
        points: f64,
        result: ResultCode,
    ) -> Participation {
        let submission_id = self.next_submission.fetch_add(1, Ordering::SeqCst);
        self.lifecycle
            .record_attempt(ProblemAttemptResult {
                participation_id,
                submission_id,
                problem_id,
                points,
                result,
                submitted_at: self.clock.now(),
            })
            .await
            .expect("Failed to record attempt")
    }
}

pub fn admin(id: i32) -> Actor {
    Actor::user(id).with_permission(common::actor::EDIT_ALL)
}
