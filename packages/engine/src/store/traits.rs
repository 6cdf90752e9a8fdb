use async_trait::async_trait;
use common::{
    ActorId, Event, EventId, EventProblem, NewParticipation, Participation, ParticipationId,
    ParticipationKind, ProblemAttemptResult,
};

use super::error::StoreError;

/// Exclusive hold on one participation row. Released on drop.
pub struct RowGuard {
    _lock: Box<dyn Send + Sync>,
}

impl RowGuard {
    pub fn new(lock: impl Send + Sync + 'static) -> Self {
        Self {
            _lock: Box::new(lock),
        }
    }
}

/// Durable state of events, participations, attempts and the per-actor
/// active participation pointer.
///
/// Reads return committed snapshots and never wait on row locks.
#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn event(&self, id: EventId) -> Result<Event, StoreError>;

    async fn event_by_key(&self, key: &str) -> Result<Option<Event>, StoreError>;

    /// Insert or replace an event.
    async fn save_event(&self, event: Event) -> Result<(), StoreError>;

    /// Add the actor to, or remove it from, the event's ban list.
    async fn update_bans(
        &self,
        event_id: EventId,
        actor_id: ActorId,
        banned: bool,
    ) -> Result<(), StoreError>;

    /// Recount live participations and store the result on the event, atomically.
    async fn refresh_user_count(&self, event_id: EventId) -> Result<u32, StoreError>;

    /// Problems of the event in display order.
    async fn problems(&self, event_id: EventId) -> Result<Vec<EventProblem>, StoreError>;

    async fn save_problems(
        &self,
        event_id: EventId,
        problems: Vec<EventProblem>,
    ) -> Result<(), StoreError>;

    async fn participation(&self, id: ParticipationId) -> Result<Participation, StoreError>;

    async fn find_participation(
        &self,
        event_id: EventId,
        actor_id: ActorId,
        kind: ParticipationKind,
    ) -> Result<Option<Participation>, StoreError>;

    async fn event_participations(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participation>, StoreError>;

    async fn actor_participations(
        &self,
        event_id: EventId,
        actor_id: ActorId,
    ) -> Result<Vec<Participation>, StoreError>;

    /// Highest virtual number the actor holds in the event, or 0.
    async fn max_virtual(&self, event_id: EventId, actor_id: ActorId) -> Result<u32, StoreError> {
        let max = self
            .actor_participations(event_id, actor_id)
            .await?
            .into_iter()
            .filter_map(|p| match p.kind {
                ParticipationKind::Virtual(n) => Some(n),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        Ok(max)
    }

    /// Insert a participation.
    ///
    /// Fails with [`StoreError::UniqueViolation`] when `(event, actor, kind)` already exists.
    async fn insert_participation(
        &self,
        new: NewParticipation,
    ) -> Result<Participation, StoreError>;

    /// Persist the mutable fields of an existing participation.
    async fn save_participation(&self, participation: &Participation) -> Result<(), StoreError>;

    /// Acquire the row lock of a participation. Concurrent holders of the same
    /// row serialize; different rows never contend.
    async fn lock_participation(&self, id: ParticipationId) -> Result<RowGuard, StoreError>;

    /// Store a grading result. A redelivered `(submission, problem)` pair
    /// replaces the earlier one. Returns `true` if the pair was new.
    async fn append_attempt(&self, attempt: ProblemAttemptResult) -> Result<bool, StoreError>;

    async fn attempts(
        &self,
        participation_id: ParticipationId,
    ) -> Result<Vec<ProblemAttemptResult>, StoreError>;

    async fn current_participation(
        &self,
        actor_id: ActorId,
    ) -> Result<Option<ParticipationId>, StoreError>;

    /// Set the actor's active participation to `new` only if it is currently `expected`.
    /// Returns `false` without writing when the pointer moved.
    async fn swap_current_participation(
        &self,
        actor_id: ActorId,
        expected: Option<ParticipationId>,
        new: Option<ParticipationId>,
    ) -> Result<bool, StoreError>;
}
