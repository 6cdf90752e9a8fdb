use chrono::{DateTime, TimeDelta, Utc};
use common::{Event, Participation, ParticipationKind};

/// The time range during which a participation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ParticipationWindow {
    pub fn of(event: &Event, participation: &Participation) -> Self {
        Self::for_kind(event, participation.kind, participation.real_start)
    }

    /// Live attempts are clipped by both their own time limit and the event end.
    /// Virtual attempts replay the event's duration (or the time limit) from
    /// their own start. Spectators follow the event.
    pub fn for_kind(event: &Event, kind: ParticipationKind, real_start: DateTime<Utc>) -> Self {
        let time_limit = event.time_limit();

        let start = match (kind, time_limit) {
            (ParticipationKind::Live | ParticipationKind::Spectate, None) => event.start_time,
            _ => real_start,
        };

        let end = match kind {
            ParticipationKind::Spectate => event.end_time,
            ParticipationKind::Virtual(_) => {
                real_start + time_limit.unwrap_or_else(|| event.window_length())
            }
            ParticipationKind::Live => match time_limit {
                Some(limit) => (real_start + limit).min(event.end_time),
                None => event.end_time,
            },
        };

        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }

    /// Countdown to the end, or `None` once it has passed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        (self.end > now).then(|| self.end - now)
    }
}
