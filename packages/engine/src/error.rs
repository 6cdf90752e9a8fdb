use common::{EventId, ParticipationId};
use thiserror::Error;

use crate::store::StoreError;

/// Coarse classification of engine failures, used by callers to decide how
/// to surface an error (404-style denial, form error, conflict message, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The actor may not see or join the event.
    AccessDenied,
    /// Bad input or malformed event configuration.
    Validation,
    NotFound,
    /// The request conflicts with the actor's current state. Not retried.
    Conflict,
    /// A benign race that is retried internally.
    TransientRace,
    /// Stored data broke an engine invariant. Fatal for the operation.
    InvariantViolation,
    Internal,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Event not found")]
    Inaccessible,

    #[error("Event is private")]
    PrivateGrantRequired,

    #[error("Scoreboard is hidden")]
    ScoreboardHidden,

    #[error("Wrong access code")]
    WrongAccessCode,

    #[error("Invalid event configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Event is not currently ongoing")]
    EventNotJoinable,

    #[error("Already in event {event_id}")]
    AlreadyInEvent { event_id: EventId },

    #[error("Banned from joining this event")]
    AlreadyBanned,

    #[error("Not in this event")]
    NotInEvent,

    #[error("Participation {0} has ended")]
    ParticipationEnded(ParticipationId),

    #[error("Concurrent update lost: {0}")]
    TransientRace(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationRequired
            | Self::Inaccessible
            | Self::PrivateGrantRequired
            | Self::ScoreboardHidden => ErrorKind::AccessDenied,
            Self::WrongAccessCode | Self::InvalidConfig(_) | Self::ParticipationEnded(_) => {
                ErrorKind::Validation
            }
            Self::NotFound(_) | Self::Storage(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::EventNotJoinable
            | Self::AlreadyInEvent { .. }
            | Self::AlreadyBanned
            | Self::NotInEvent => ErrorKind::Conflict,
            Self::TransientRace(_) | Self::Storage(StoreError::UniqueViolation(_)) => {
                ErrorKind::TransientRace
            }
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Storage(StoreError::Backend(_)) => ErrorKind::Internal,
        }
    }

    /// Machine-readable error code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            Self::Inaccessible => "NOT_FOUND",
            Self::PrivateGrantRequired => "PRIVATE_GRANT_REQUIRED",
            Self::ScoreboardHidden => "SCOREBOARD_HIDDEN",
            Self::WrongAccessCode => "WRONG_ACCESS_CODE",
            Self::InvalidConfig(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::EventNotJoinable => "EVENT_NOT_JOINABLE",
            Self::AlreadyInEvent { .. } => "ALREADY_IN_EVENT",
            Self::AlreadyBanned => "ALREADY_BANNED",
            Self::NotInEvent => "NOT_IN_EVENT",
            Self::ParticipationEnded(_) => "PARTICIPATION_ENDED",
            Self::TransientRace(_) => "CONFLICT",
            Self::InvariantViolation(_) | Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Log an invariant violation and return it.
    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(detail = %detail, "Invariant violation");
        Self::InvariantViolation(detail)
    }
}
