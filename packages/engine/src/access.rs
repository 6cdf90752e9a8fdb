use chrono::{DateTime, Utc};
use common::actor::{EDIT_ALL, EDIT_OWN};
use common::{Actor, Event, ScoreboardVisibility};

use crate::error::EngineError;

/// Result of [`AccessPolicy::access_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Allowed,
    /// Reported as "not found" so hidden events do not leak.
    Inaccessible,
    /// The event is visible but the actor lacks the private grant.
    RequiresPrivateGrant,
}

impl AccessOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Inaccessible => Err(EngineError::Inaccessible),
            Self::RequiresPrivateGrant => Err(EngineError::PrivateGrantRequired),
        }
    }
}

/// What the engine knows about the viewer's own participation in an event,
/// needed by the scoreboard predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerStanding {
    /// The viewer holds a live participation whose window has closed.
    pub completed_live: bool,
    /// The viewer's active participation belongs to this event and is still running.
    pub in_event: bool,
}

/// Visibility and joinability rules for events.
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn access_check(actor: &Actor, event: &Event) -> AccessOutcome {
        if !actor.is_authenticated {
            return if !event.is_visible {
                AccessOutcome::Inaccessible
            } else if event.is_private || event.is_organization_private {
                AccessOutcome::RequiresPrivateGrant
            } else {
                AccessOutcome::Allowed
            };
        }

        if actor.has_global_event_access() || event.is_staff(actor.id) {
            return AccessOutcome::Allowed;
        }

        if !event.is_visible {
            return AccessOutcome::Inaccessible;
        }

        if !event.is_private && !event.is_organization_private {
            return AccessOutcome::Allowed;
        }

        if event.scoreboard_viewers.contains(&actor.id) {
            return AccessOutcome::Allowed;
        }

        let in_org = actor
            .organization_ids
            .iter()
            .any(|org| event.organizations.contains(org));
        let in_users = event.private_contestants.contains(&actor.id);

        let allowed = match (event.is_private, event.is_organization_private) {
            (true, true) => in_org && in_users,
            (true, false) => in_users,
            _ => in_org,
        };

        if allowed {
            AccessOutcome::Allowed
        } else {
            AccessOutcome::RequiresPrivateGrant
        }
    }

    pub fn is_accessible_by(actor: &Actor, event: &Event) -> bool {
        Self::access_check(actor, event).is_allowed()
    }

    pub fn can_view(actor: &Actor, event: &Event) -> bool {
        Self::is_accessible_by(actor, event)
    }

    /// Accessible, and either started or the actor is staff.
    pub fn can_join(actor: &Actor, event: &Event, now: DateTime<Utc>) -> bool {
        Self::is_accessible_by(actor, event) && (event.has_started(now) || event.is_staff(actor.id))
    }

    pub fn is_editable_by(actor: &Actor, event: &Event) -> bool {
        if actor.has_permission(EDIT_ALL) {
            return true;
        }
        actor.has_permission(EDIT_OWN) && event.is_editor(actor.id)
    }

    /// Editors never need the access code.
    pub fn bypasses_access_code(actor: &Actor, event: &Event) -> bool {
        Self::is_editable_by(actor, event) || event.is_editor(actor.id)
    }

    pub fn visible_events<'a, I>(actor: &Actor, events: I) -> Vec<&'a Event>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        events
            .into_iter()
            .filter(|event| Self::is_accessible_by(actor, event))
            .collect()
    }

    /// Whether the scoreboard is public right now.
    pub fn show_scoreboard(event: &Event, now: DateTime<Utc>) -> bool {
        if !event.has_started(now) {
            return false;
        }
        match event.scoreboard_visibility {
            ScoreboardVisibility::Visible => true,
            ScoreboardVisibility::HiddenDuringEvent
            | ScoreboardVisibility::HiddenDuringParticipation => event.has_ended(now),
        }
    }

    pub fn can_see_full_scoreboard(
        actor: &Actor,
        event: &Event,
        standing: ViewerStanding,
        now: DateTime<Utc>,
    ) -> bool {
        if Self::show_scoreboard(event, now) {
            return true;
        }
        if !actor.is_authenticated {
            return false;
        }
        if actor.has_global_event_access() || event.is_editor(actor.id) {
            return true;
        }
        if event.scoreboard_viewers.contains(&actor.id) {
            return true;
        }
        event.scoreboard_visibility == ScoreboardVisibility::HiddenDuringParticipation
            && standing.completed_live
    }

    pub fn can_see_own_scoreboard(
        actor: &Actor,
        event: &Event,
        standing: ViewerStanding,
        now: DateTime<Utc>,
    ) -> bool {
        if Self::can_see_full_scoreboard(actor, event, standing, now) {
            return true;
        }
        event.has_started(now) && (Self::show_scoreboard(event, now) || standing.in_event)
    }
}
