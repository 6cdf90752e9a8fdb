use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, EventId, ParticipationId};

/// Stored code of a live participation.
pub const LIVE: i32 = 0;
/// Stored code of a spectating participation.
pub const SPECTATE: i32 = -1;
/// Score forced onto disqualified participations; sorts below any real score.
pub const DISQUALIFIED_SCORE: f64 = -9999.0;

/// Kind of a participation, stored as a single integer:
/// `0` live, `-1` spectate, `n > 0` the n-th virtual replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ParticipationKind {
    Spectate,
    Live,
    Virtual(u32),
}

impl ParticipationKind {
    pub fn code(&self) -> i32 {
        match self {
            Self::Live => LIVE,
            Self::Spectate => SPECTATE,
            Self::Virtual(n) => i32::try_from(*n).unwrap_or(i32::MAX),
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            LIVE => Some(Self::Live),
            SPECTATE => Some(Self::Spectate),
            n if n > 0 => Some(Self::Virtual(n as u32)),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn is_spectate(&self) -> bool {
        matches!(self, Self::Spectate)
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }
}

impl From<ParticipationKind> for i32 {
    fn from(kind: ParticipationKind) -> Self {
        kind.code()
    }
}

impl TryFrom<i32> for ParticipationKind {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("invalid participation kind {code}"))
    }
}

impl fmt::Display for ParticipationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("Live"),
            Self::Spectate => f.write_str("Spectate"),
            Self::Virtual(n) => write!(f, "v{n}"),
        }
    }
}

/// One actor's attempt within an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: ParticipationId,
    pub event_id: EventId,
    pub actor_id: ActorId,
    pub kind: ParticipationKind,
    /// When the attempt actually began.
    pub real_start: DateTime<Utc>,
    pub score: f64,
    /// Seconds; format-defined secondary sort key.
    pub cumulative_time: u64,
    pub tiebreaker: f64,
    pub is_disqualified: bool,
    /// Opaque per-format state, read back by the format's display functions.
    pub format_data: Option<serde_json::Value>,
}

/// Fields supplied when inserting a participation; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewParticipation {
    pub event_id: EventId,
    pub actor_id: ActorId,
    pub kind: ParticipationKind,
    pub real_start: DateTime<Utc>,
}

impl NewParticipation {
    pub fn into_participation(self, id: ParticipationId) -> Participation {
        Participation {
            id,
            event_id: self.event_id,
            actor_id: self.actor_id,
            kind: self.kind,
            real_start: self.real_start,
            score: 0.0,
            cumulative_time: 0,
            tiebreaker: 0.0,
            is_disqualified: false,
            format_data: None,
        }
    }
}
