use ::common::{Actor, EventProblem, ProblemAttemptResult, ResultCode};
use chrono::TimeDelta;
use engine::{CellState, EngineError, RankLabel};

use crate::common::{TestEngine, minutes};

fn attempt(
    participation_id: i32,
    submission_id: i32,
    points: f64,
    minute: i64,
) -> ProblemAttemptResult {
    ProblemAttemptResult {
        participation_id,
        submission_id,
        problem_id: 1,
        points,
        result: if points > 0.0 {
            ResultCode::Accepted
        } else {
            ResultCode::WrongAnswer
        },
        submitted_at: minutes(minute),
    }
}

mod default_format {
    use super::*;

    #[tokio::test]
    async fn latest_of_equal_best_submissions_sets_time() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(5);
        let live = engine.join(&Actor::user(7), 1).await;

        engine.at(10);
        engine.submit(live.id, 1, 30.0, ResultCode::WrongAnswer).await;
        engine.at(20);
        engine.submit(live.id, 1, 60.0, ResultCode::Accepted).await;
        engine.at(40);
        let scored = engine.submit(live.id, 1, 60.0, ResultCode::Accepted).await;

        assert_eq!(scored.score, 60.0);
        assert_eq!(scored.cumulative_time, 40 * 60);

        let rows = engine.ranking.rank(1, &Actor::user(7), false).await.unwrap();
        let cell = &rows[0].entry.problems[0].cell;
        assert_eq!(cell.state, CellState::Accepted);
        assert_eq!(cell.text, "60");
        assert_eq!(rows[0].entry.problems[1].cell.state, CellState::Empty);
        assert_eq!(rows[0].entry.result.detail.as_deref(), Some("0:40:00"));
    }

    #[tokio::test]
    async fn time_limited_live_counts_from_own_start() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |e| e.time_limit_secs = Some(3600)).await;
        engine.at(30);
        let live = engine.join(&Actor::user(7), 1).await;

        engine.at(45);
        let scored = engine.submit(live.id, 2, 100.0, ResultCode::Accepted).await;
        assert_eq!(scored.cumulative_time, 15 * 60);
    }

    #[tokio::test]
    async fn virtual_counts_from_own_start() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(60 * 24);
        let virtual_run = engine.join(&Actor::user(7), 1).await;

        engine.clock.advance(TimeDelta::minutes(10));
        let scored = engine.submit(virtual_run.id, 1, 25.5, ResultCode::Accepted).await;
        assert_eq!(scored.score, 25.5);
        assert_eq!(scored.cumulative_time, 600);
    }

    #[tokio::test]
    async fn redelivered_result_replaces_earlier_one() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(5);
        let live = engine.join(&Actor::user(7), 1).await;

        engine.lifecycle.record_attempt(attempt(live.id, 11, 20.0, 10)).await.unwrap();
        let regraded = engine
            .lifecycle
            .record_attempt(attempt(live.id, 11, 80.0, 10))
            .await
            .unwrap();

        assert_eq!(regraded.score, 80.0);
        assert_eq!(engine.state.store.attempts(live.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(5);
        let live = engine.join(&Actor::user(7), 1).await;
        engine.at(15);
        let scored = engine.submit(live.id, 1, 45.0, ResultCode::Accepted).await;

        let once = engine.lifecycle.recompute(live.id).await.unwrap();
        let twice = engine.lifecycle.recompute(live.id).await.unwrap();

        assert_eq!(once, scored);
        assert_eq!(twice, scored);
    }
}

mod icpc {
    use super::*;

    #[tokio::test]
    async fn penalty_breaks_equal_scores() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |e| e.format_name = "icpc".into()).await;
        engine.at(0);
        let slow = engine.join(&Actor::user(1), 1).await;
        let clean = engine.join(&Actor::user(2), 1).await;

        engine.at(5);
        engine.submit(slow.id, 1, 0.0, ResultCode::WrongAnswer).await;
        engine.at(10);
        let slow = engine.submit(slow.id, 1, 100.0, ResultCode::Accepted).await;
        engine.at(25);
        let clean = engine.submit(clean.id, 1, 100.0, ResultCode::Accepted).await;

        assert_eq!(slow.cumulative_time, 10 * 60 + 20 * 60);
        assert_eq!(clean.cumulative_time, 25 * 60);

        let rows = engine.ranking.rank(1, &Actor::user(1), false).await.unwrap();
        let ranks: Vec<_> = rows
            .iter()
            .map(|row| (row.entry.participation.actor_id, row.rank))
            .collect();
        assert_eq!(ranks, vec![(2, RankLabel::Ranked(1)), (1, RankLabel::Ranked(2))]);

        let slow_row = &rows[1].entry;
        assert_eq!(slow_row.problems[0].label, "A");
        assert_eq!(slow_row.problems[1].label, "B");
        assert_eq!(slow_row.problems[0].cell.text, "+1");
        assert_eq!(slow_row.problems[0].cell.detail.as_deref(), Some("0:10:00"));
    }

    #[tokio::test]
    async fn unknown_config_keys_are_rejected() {
        let engine = TestEngine::spawn();
        let mut event = ::common::Event::new(1, "icpc1", minutes(0), minutes(120));
        event.format_name = "icpc".into();
        event.format_config = Some(serde_json::json!({ "bonus": 1 }));

        let err = engine
            .setup
            .configure(event, vec![EventProblem::new(1, 1.0, 0)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}

mod reformat {
    use super::*;

    #[tokio::test]
    async fn switching_format_rescores_the_event() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(0);
        let live = engine.join(&Actor::user(7), 1).await;

        engine.at(10);
        engine.submit(live.id, 1, 40.0, ResultCode::WrongAnswer).await;
        engine.at(20);
        let default_scored = engine.submit(live.id, 2, 70.0, ResultCode::WrongAnswer).await;
        assert_eq!(default_scored.score, 70.0);

        let mut event = engine.state.store.event(1).await.unwrap();
        let problems = engine.state.store.problems(1).await.unwrap();
        event.format_name = "ioi".into();
        engine.setup.configure(event, problems, None).await.unwrap();

        let updated = engine.lifecycle.recompute_event(1).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].score, 110.0);
        assert_eq!(updated[0].cumulative_time, 10 * 60 + 20 * 60);
    }
}
