#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, EventId, OrganizationId, ProblemId};

/// Who may see the full scoreboard while the event is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum ScoreboardVisibility {
    /// Everyone who can see the event sees the scoreboard.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "V"))]
    Visible,
    /// Hidden until the event ends.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "C"))]
    HiddenDuringEvent,
    /// Hidden from a contestant until their own live participation ends.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "P"))]
    HiddenDuringParticipation,
}

impl Default for ScoreboardVisibility {
    fn default() -> Self {
        Self::Visible
    }
}

/// A timed contest or exam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Unique slug (`^[a-z0-9]+$`).
    pub key: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Per-participation window length in seconds. `None` means the event window governs.
    #[serde(default)]
    pub time_limit_secs: Option<i64>,
    #[serde(default)]
    pub is_visible: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_organization_private: bool,
    /// Empty or absent disables the access code prompt.
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub scoreboard_visibility: ScoreboardVisibility,
    #[serde(default)]
    pub authors: BTreeSet<ActorId>,
    /// Editors that are not listed as authors.
    #[serde(default)]
    pub curators: BTreeSet<ActorId>,
    /// May view and spectate the event but not edit it.
    #[serde(default)]
    pub testers: BTreeSet<ActorId>,
    #[serde(default)]
    pub organizations: BTreeSet<OrganizationId>,
    #[serde(default)]
    pub private_contestants: BTreeSet<ActorId>,
    /// Actors explicitly granted the full scoreboard.
    #[serde(default)]
    pub scoreboard_viewers: BTreeSet<ActorId>,
    #[serde(default)]
    pub banned_actor_ids: BTreeSet<ActorId>,
    #[serde(default = "default_format_name")]
    pub format_name: String,
    #[serde(default)]
    pub format_config: Option<serde_json::Value>,
    #[serde(default = "default_points_precision")]
    pub points_precision: u32,
    /// Number of live participations.
    #[serde(default)]
    pub user_count: u32,
}

fn default_format_name() -> String {
    "default".into()
}
fn default_points_precision() -> u32 {
    3
}

impl Event {
    /// Create a hidden, public, code-less event using the default format.
    pub fn new(
        id: EventId,
        key: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let key = key.into();
        Self {
            id,
            name: key.clone(),
            key,
            start_time,
            end_time,
            time_limit_secs: None,
            is_visible: false,
            is_private: false,
            is_organization_private: false,
            access_code: None,
            scoreboard_visibility: ScoreboardVisibility::default(),
            authors: BTreeSet::new(),
            curators: BTreeSet::new(),
            testers: BTreeSet::new(),
            organizations: BTreeSet::new(),
            private_contestants: BTreeSet::new(),
            scoreboard_viewers: BTreeSet::new(),
            banned_actor_ids: BTreeSet::new(),
            format_name: default_format_name(),
            format_config: None,
            points_precision: default_points_precision(),
            user_count: 0,
        }
    }

    pub fn time_limit(&self) -> Option<TimeDelta> {
        self.time_limit_secs.and_then(TimeDelta::try_seconds)
    }

    /// Length of the original event window.
    pub fn window_length(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// Whether the event has started, i.e. whether non-staff may join.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }

    pub fn time_before_start(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        (self.start_time >= now).then(|| self.start_time - now)
    }

    pub fn time_before_end(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        (self.end_time >= now).then(|| self.end_time - now)
    }

    /// Authors and curators.
    pub fn editor_ids(&self) -> BTreeSet<ActorId> {
        self.authors.union(&self.curators).copied().collect()
    }

    pub fn is_editor(&self, actor_id: ActorId) -> bool {
        self.authors.contains(&actor_id) || self.curators.contains(&actor_id)
    }

    pub fn is_tester(&self, actor_id: ActorId) -> bool {
        self.testers.contains(&actor_id)
    }

    /// Editors and testers participate as spectators.
    pub fn is_staff(&self, actor_id: ActorId) -> bool {
        self.is_editor(actor_id) || self.is_tester(actor_id)
    }

    pub fn is_banned(&self, actor_id: ActorId) -> bool {
        self.banned_actor_ids.contains(&actor_id)
    }

    /// The access code, if one is actually required.
    pub fn required_access_code(&self) -> Option<&str> {
        self.access_code.as_deref().filter(|code| !code.is_empty())
    }
}

/// A problem attached to an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventProblem {
    pub problem_id: ProblemId,
    /// Maximum points available for the problem.
    pub points: f64,
    /// Display position, ascending.
    pub order: u32,
}

impl EventProblem {
    pub fn new(problem_id: ProblemId, points: f64, order: u32) -> Self {
        Self {
            problem_id,
            points,
            order,
        }
    }
}
