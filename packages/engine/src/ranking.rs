use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use common::{Actor, ActorId, Event, EventId, EventProblem, Participation, ParticipationKind};
use serde::Serialize;

use crate::access::{AccessPolicy, ViewerStanding};
use crate::error::EngineError;
use crate::format::{Cell, ScoringFormat, TieRule};
use crate::state::EngineState;
use crate::window::ParticipationWindow;

/// What the rank column shows for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankLabel {
    Ranked(u32),
    /// The viewer may not see where they stand.
    Hidden,
    /// Shown for orientation only, outside the ranking.
    Unranked,
    /// A history row labelled by its participation kind.
    Attempt(ParticipationKind),
}

impl fmt::Display for RankLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranked(rank) => write!(f, "{rank}"),
            Self::Hidden => f.write_str("???"),
            Self::Unranked => f.write_str("-"),
            Self::Attempt(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemCell {
    pub label: String,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub participation: Participation,
    pub problems: Vec<ProblemCell>,
    pub result: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub rank: RankLabel,
    pub entry: RankedEntry,
}

/// Disqualified last, then score descending, cumulative time ascending,
/// tiebreaker ascending. Ids make the order total.
pub fn ranking_order(a: &Participation, b: &Participation) -> Ordering {
    a.is_disqualified
        .cmp(&b.is_disqualified)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.cumulative_time.cmp(&b.cumulative_time))
        .then_with(|| a.tiebreaker.total_cmp(&b.tiebreaker))
        .then_with(|| a.id.cmp(&b.id))
}

/// Competition ranks ("1224") for rows already sorted by [`ranking_order`].
pub fn ranker(sorted: &[&Participation], tie: TieRule) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut rank = 0;
    for (position, participation) in sorted.iter().enumerate() {
        let tied = position > 0 && tie.tied(sorted[position - 1], participation);
        if !tied {
            rank = position as u32 + 1;
        }
        ranks.push(rank);
    }
    ranks
}

/// Builds scoreboards from committed participation snapshots. Never takes
/// row locks.
pub struct RankingEngine {
    state: EngineState,
}

impl RankingEngine {
    pub fn new(state: EngineState) -> Self {
        Self { state }
    }

    pub async fn rank(
        &self,
        event_id: EventId,
        viewer: &Actor,
        include_viewer_virtual: bool,
    ) -> Result<Vec<RankedRow>, EngineError> {
        let now = self.state.clock.now();
        let event = self.state.load_event(event_id).await?;
        AccessPolicy::access_check(viewer, &event).into_result()?;

        let standing = self.viewer_standing(&event, viewer, now).await?;
        let full = AccessPolicy::can_see_full_scoreboard(viewer, &event, standing, now);
        if !full && !AccessPolicy::can_see_own_scoreboard(viewer, &event, standing, now) {
            return Err(EngineError::ScoreboardHidden);
        }

        let format = self.state.format_for(&event)?;
        let problems = self.state.store.problems(event.id).await?;
        let labels = self.labels(&event, format.as_ref(), &problems)?;
        let participations = self.state.store.event_participations(event.id).await?;

        let mut live: Vec<&Participation> = participations
            .iter()
            .filter(|p| p.kind.is_live())
            .collect();
        let mut actors = HashSet::with_capacity(live.len());
        for participation in &live {
            if !actors.insert(participation.actor_id) {
                return Err(EngineError::invariant(format!(
                    "actor {} holds two live participations in event {}",
                    participation.actor_id, event.id
                )));
            }
        }

        let entry = |p: &Participation| self.entry(&event, format.as_ref(), &problems, &labels, p);
        let mut rows = Vec::new();

        if include_viewer_virtual && viewer.is_authenticated {
            if let Some(current) = self.state.store.current_participation(viewer.id).await? {
                if let Some(own) = participations.iter().find(|p| p.id == current) {
                    let running = !ParticipationWindow::of(&event, own).has_ended(now);
                    if !own.kind.is_live() && running {
                        rows.push(RankedRow {
                            rank: RankLabel::Unranked,
                            entry: entry(own),
                        });
                    }
                }
            }
        }

        if full {
            live.sort_by(|a, b| ranking_order(a, b));
            let ranks = ranker(&live, format.tie_rule());
            rows.extend(live.into_iter().zip(ranks).map(|(p, rank)| RankedRow {
                rank: RankLabel::Ranked(rank),
                entry: entry(p),
            }));
        } else if let Some(own) = live.into_iter().find(|p| p.actor_id == viewer.id) {
            rows.push(RankedRow {
                rank: RankLabel::Hidden,
                entry: entry(own),
            });
        }

        Ok(rows)
    }

    /// The subject's live and virtual participations, newest virtual first.
    pub async fn participation_history(
        &self,
        event_id: EventId,
        subject: ActorId,
        viewer: &Actor,
    ) -> Result<Vec<RankedRow>, EngineError> {
        let now = self.state.clock.now();
        let event = self.state.load_event(event_id).await?;
        AccessPolicy::access_check(viewer, &event).into_result()?;

        let is_subject = viewer.is_authenticated && viewer.id == subject;
        if !is_subject {
            let standing = self.viewer_standing(&event, viewer, now).await?;
            if !AccessPolicy::can_see_full_scoreboard(viewer, &event, standing, now) {
                return Err(EngineError::ScoreboardHidden);
            }
        }

        let format = self.state.format_for(&event)?;
        let problems = self.state.store.problems(event.id).await?;
        let labels = self.labels(&event, format.as_ref(), &problems)?;

        let mut history: Vec<Participation> = self
            .state
            .store
            .actor_participations(event.id, subject)
            .await?
            .into_iter()
            .filter(|p| !p.kind.is_spectate())
            .collect();
        history.sort_by(|a, b| b.kind.cmp(&a.kind));

        Ok(history
            .iter()
            .map(|p| RankedRow {
                rank: RankLabel::Attempt(p.kind),
                entry: self.entry(&event, format.as_ref(), &problems, &labels, p),
            })
            .collect())
    }

    /// The viewer's own standing in the event, for the scoreboard predicates.
    pub async fn viewer_standing(
        &self,
        event: &Event,
        viewer: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ViewerStanding, EngineError> {
        if !viewer.is_authenticated {
            return Ok(ViewerStanding::default());
        }

        let completed_live = self
            .state
            .store
            .find_participation(event.id, viewer.id, ParticipationKind::Live)
            .await?
            .is_some_and(|live| ParticipationWindow::of(event, &live).has_ended(now));

        let in_event = match self.state.store.current_participation(viewer.id).await? {
            Some(current) => {
                let active = self.state.store.participation(current).await?;
                active.event_id == event.id
                    && !ParticipationWindow::of(event, &active).has_ended(now)
            }
            None => false,
        };

        Ok(ViewerStanding {
            completed_live,
            in_event,
        })
    }

    fn labels(
        &self,
        event: &Event,
        format: &dyn ScoringFormat,
        problems: &[EventProblem],
    ) -> Result<Vec<String>, EngineError> {
        (0..problems.len())
            .map(|index| self.state.problem_label(event, format, index))
            .collect()
    }

    fn entry(
        &self,
        event: &Event,
        format: &dyn ScoringFormat,
        problems: &[EventProblem],
        labels: &[String],
        participation: &Participation,
    ) -> RankedEntry {
        RankedEntry {
            participation: participation.clone(),
            problems: problems
                .iter()
                .zip(labels)
                .map(|(problem, label)| ProblemCell {
                    label: label.clone(),
                    cell: format.display_user_problem(event, participation, problem),
                })
                .collect(),
            result: format.display_participation_result(event, participation),
        }
    }
}
