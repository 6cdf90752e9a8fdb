use ::common::{Actor, ActorId, ParticipationKind, ResultCode, ScoreboardVisibility};
use chrono::TimeDelta;
use engine::{EngineError, RankLabel, RankedRow};

use crate::common::{TestEngine, t0};

fn summary(rows: &[RankedRow]) -> Vec<(ActorId, RankLabel)> {
    rows.iter()
        .map(|row| (row.entry.participation.actor_id, row.rank))
        .collect()
}

/// Three live contestants: 50 points at 100s, 50 points at 80s, 30 points at 200s.
async fn scenario(engine: &TestEngine, customize: impl FnOnce(&mut ::common::Event)) {
    engine.create_event(1, customize).await;
    engine.at(0);
    let mut ids = Vec::new();
    for actor in 1..=3 {
        ids.push(engine.join(&Actor::user(actor), 1).await.id);
    }

    for (pid, seconds, points) in [(ids[1], 80, 50.0), (ids[0], 100, 50.0), (ids[2], 200, 30.0)] {
        engine.clock.set(t0() + TimeDelta::seconds(seconds));
        engine.submit(pid, 1, points, ResultCode::Accepted).await;
    }
}

mod scoreboard {
    use super::*;

    #[tokio::test]
    async fn equal_scores_share_rank() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        engine.at(30);

        let rows = engine.ranking.rank(1, &Actor::user(1), false).await.unwrap();

        assert_eq!(
            summary(&rows),
            vec![
                (2, RankLabel::Ranked(1)),
                (1, RankLabel::Ranked(1)),
                (3, RankLabel::Ranked(3)),
            ]
        );
        let first = &rows[0].entry;
        assert_eq!(first.participation.cumulative_time, 80);
        assert_eq!(first.result.text, "50");
        assert_eq!(first.result.detail.as_deref(), Some("0:01:20"));
        assert_eq!(first.problems[0].label, "1");
        assert_eq!(first.problems[1].label, "2");
    }

    #[tokio::test]
    async fn repeated_calls_are_stable() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        engine.at(30);

        let first = engine.ranking.rank(1, &Actor::user(1), false).await.unwrap();
        let second = engine.ranking.rank(1, &Actor::user(1), false).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn disqualified_sink_to_the_bottom() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        let top = engine
            .state
            .store
            .find_participation(1, 2, ParticipationKind::Live)
            .await
            .unwrap()
            .unwrap();
        engine
            .lifecycle
            .set_disqualified(&crate::common::admin(100), top.id, true)
            .await
            .unwrap();
        engine.at(30);

        let rows = engine.ranking.rank(1, &Actor::user(1), false).await.unwrap();
        assert_eq!(
            summary(&rows),
            vec![
                (1, RankLabel::Ranked(1)),
                (3, RankLabel::Ranked(2)),
                (2, RankLabel::Ranked(3)),
            ]
        );
    }

    #[tokio::test]
    async fn event_without_participants_ranks_nobody() {
        let engine = TestEngine::spawn();
        engine.create_event(1, |_| {}).await;
        engine.at(30);

        let rows = engine.ranking.rank(1, &Actor::user(1), true).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let engine = TestEngine::spawn();
        let err = engine.ranking.rank(42, &Actor::user(1), false).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}

mod hidden {
    use super::*;

    fn hidden_during_event(event: &mut ::common::Event) {
        event.scoreboard_visibility = ScoreboardVisibility::HiddenDuringEvent;
        event.authors.insert(50);
    }

    #[tokio::test]
    async fn contestant_sees_only_own_row() {
        let engine = TestEngine::spawn();
        scenario(&engine, hidden_during_event).await;
        engine.at(30);

        let rows = engine.ranking.rank(1, &Actor::user(3), false).await.unwrap();
        assert_eq!(summary(&rows), vec![(3, RankLabel::Hidden)]);
        assert_eq!(rows[0].rank.to_string(), "???");
    }

    #[tokio::test]
    async fn outsider_is_refused_until_the_end() {
        let engine = TestEngine::spawn();
        scenario(&engine, hidden_during_event).await;
        engine.at(30);

        let err = engine.ranking.rank(1, &Actor::user(9), false).await.unwrap_err();
        assert!(matches!(err, EngineError::ScoreboardHidden));

        engine.at(180);
        let rows = engine.ranking.rank(1, &Actor::user(9), false).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn editors_see_everything() {
        let engine = TestEngine::spawn();
        scenario(&engine, hidden_during_event).await;
        engine.at(30);

        let rows = engine.ranking.rank(1, &Actor::user(50), false).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| matches!(row.rank, RankLabel::Ranked(_))));
    }
}

mod virtual_rows {
    use super::*;

    #[tokio::test]
    async fn running_virtual_is_prepended_unranked() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        engine.at(60 * 24);
        let virtual_run = engine.join(&Actor::user(4), 1).await;

        let rows = engine.ranking.rank(1, &Actor::user(4), true).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].rank, RankLabel::Unranked);
        assert_eq!(rows[0].entry.participation.id, virtual_run.id);
        assert_eq!(rows[0].rank.to_string(), "-");

        let without = engine.ranking.rank(1, &Actor::user(4), false).await.unwrap();
        assert_eq!(without.len(), 3);
    }

    #[tokio::test]
    async fn finished_virtual_is_not_shown() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        engine.at(60 * 24);
        engine.join(&Actor::user(4), 1).await;
        engine.at(60 * 24 + 180);

        let rows = engine.ranking.rank(1, &Actor::user(4), true).await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}

mod history {
    use super::*;

    #[tokio::test]
    async fn newest_virtual_first_then_live() {
        let engine = TestEngine::spawn();
        scenario(&engine, |_| {}).await;
        engine.at(60 * 24);
        engine.join(&Actor::user(1), 1).await;
        engine.join(&Actor::user(1), 1).await;

        let rows = engine
            .ranking
            .participation_history(1, 1, &Actor::user(1))
            .await
            .unwrap();
        let labels: Vec<String> = rows.iter().map(|row| row.rank.to_string()).collect();
        assert_eq!(labels, vec!["v2", "v1", "Live"]);
        assert_eq!(rows[2].entry.participation.score, 50.0);
    }

    #[tokio::test]
    async fn spectating_leaves_no_history() {
        let engine = TestEngine::spawn();
        engine
            .create_event(1, |e| {
                e.testers.insert(3);
            })
            .await;
        engine.at(10);
        engine.join(&Actor::user(3), 1).await;

        let rows = engine
            .ranking
            .participation_history(1, 3, &Actor::user(3))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn others_need_full_scoreboard() {
        let engine = TestEngine::spawn();
        scenario(&engine, |e| {
            e.scoreboard_visibility = ScoreboardVisibility::HiddenDuringEvent;
        })
        .await;
        engine.at(30);

        let err = engine
            .ranking
            .participation_history(1, 1, &Actor::user(2))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ScoreboardHidden));

        let own = engine
            .ranking
            .participation_history(1, 1, &Actor::user(1))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
    }
}
