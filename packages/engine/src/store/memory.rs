use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use common::{
    ActorId, Event, EventId, EventProblem, NewParticipation, Participation, ParticipationId,
    ParticipationKind, ProblemAttemptResult,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::traits::{ContestStore, RowGuard};

type UniqueKey = (EventId, ActorId, i32);

/// In-process [`ContestStore`].
///
/// Committed rows live in `DashMap`s; each participation additionally owns a
/// `tokio` mutex that serializes read-modify-write cycles on that row only.
#[derive(Default)]
pub struct MemoryStore {
    events: DashMap<EventId, Event>,
    problems: DashMap<EventId, Vec<EventProblem>>,
    participations: DashMap<ParticipationId, Participation>,
    unique: DashMap<UniqueKey, ParticipationId>,
    row_locks: DashMap<ParticipationId, Arc<Mutex<()>>>,
    attempts: DashMap<ParticipationId, Vec<ProblemAttemptResult>>,
    current: DashMap<ActorId, ParticipationId>,
    next_id: AtomicI32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found_event(id: EventId) -> StoreError {
        StoreError::NotFound(format!("Event {id}"))
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn event(&self, id: EventId) -> Result<Event, StoreError> {
        self.events
            .get(&id)
            .map(|e| e.clone())
            .ok_or_else(|| Self::not_found_event(id))
    }

    async fn event_by_key(&self, key: &str) -> Result<Option<Event>, StoreError> {
        Ok(self
            .events
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value().clone()))
    }

    async fn save_event(&self, event: Event) -> Result<(), StoreError> {
        self.events.insert(event.id, event);
        Ok(())
    }

    async fn update_bans(
        &self,
        event_id: EventId,
        actor_id: ActorId,
        banned: bool,
    ) -> Result<(), StoreError> {
        let mut event = self
            .events
            .get_mut(&event_id)
            .ok_or_else(|| Self::not_found_event(event_id))?;
        if banned {
            event.banned_actor_ids.insert(actor_id);
        } else {
            event.banned_actor_ids.remove(&actor_id);
        }
        Ok(())
    }

    async fn refresh_user_count(&self, event_id: EventId) -> Result<u32, StoreError> {
        // Holding the event entry serializes concurrent recounts.
        let mut event = self
            .events
            .get_mut(&event_id)
            .ok_or_else(|| Self::not_found_event(event_id))?;
        let count = self
            .participations
            .iter()
            .filter(|p| p.event_id == event_id && p.kind.is_live())
            .count();
        event.user_count = u32::try_from(count).unwrap_or(u32::MAX);
        Ok(event.user_count)
    }

    async fn problems(&self, event_id: EventId) -> Result<Vec<EventProblem>, StoreError> {
        let mut problems = self
            .problems
            .get(&event_id)
            .map(|p| p.clone())
            .unwrap_or_default();
        problems.sort_by_key(|p| p.order);
        Ok(problems)
    }

    async fn save_problems(
        &self,
        event_id: EventId,
        problems: Vec<EventProblem>,
    ) -> Result<(), StoreError> {
        self.problems.insert(event_id, problems);
        Ok(())
    }

    async fn participation(&self, id: ParticipationId) -> Result<Participation, StoreError> {
        self.participations
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| StoreError::NotFound(format!("Participation {id}")))
    }

    async fn find_participation(
        &self,
        event_id: EventId,
        actor_id: ActorId,
        kind: ParticipationKind,
    ) -> Result<Option<Participation>, StoreError> {
        let id = match self.unique.get(&(event_id, actor_id, kind.code())) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.participations.get(&id).map(|p| p.clone()))
    }

    async fn event_participations(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participation>, StoreError> {
        let mut rows: Vec<Participation> = self
            .participations
            .iter()
            .filter(|p| p.event_id == event_id)
            .map(|p| p.value().clone())
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows)
    }

    async fn actor_participations(
        &self,
        event_id: EventId,
        actor_id: ActorId,
    ) -> Result<Vec<Participation>, StoreError> {
        let mut rows: Vec<Participation> = self
            .participations
            .iter()
            .filter(|p| p.event_id == event_id && p.actor_id == actor_id)
            .map(|p| p.value().clone())
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows)
    }

    async fn insert_participation(
        &self,
        new: NewParticipation,
    ) -> Result<Participation, StoreError> {
        if !self.events.contains_key(&new.event_id) {
            return Err(Self::not_found_event(new.event_id));
        }

        let key = (new.event_id, new.actor_id, new.kind.code());
        match self.unique.entry(key) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation(format!(
                "participation (event {}, actor {}, kind {})",
                key.0, key.1, key.2
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let participation = new.into_participation(id);
                self.row_locks.insert(id, Arc::new(Mutex::new(())));
                self.participations.insert(id, participation.clone());
                slot.insert(id);
                Ok(participation)
            }
        }
    }

    async fn save_participation(&self, participation: &Participation) -> Result<(), StoreError> {
        let mut row = self
            .participations
            .get_mut(&participation.id)
            .ok_or_else(|| StoreError::NotFound(format!("Participation {}", participation.id)))?;
        *row = participation.clone();
        Ok(())
    }

    async fn lock_participation(&self, id: ParticipationId) -> Result<RowGuard, StoreError> {
        let lock = self
            .row_locks
            .get(&id)
            .map(|l| Arc::clone(l.value()))
            .ok_or_else(|| StoreError::NotFound(format!("Participation {id}")))?;
        let guard = lock.lock_owned().await;
        Ok(RowGuard::new(guard))
    }

    async fn append_attempt(&self, attempt: ProblemAttemptResult) -> Result<bool, StoreError> {
        let mut rows = self.attempts.entry(attempt.participation_id).or_default();
        let key = (attempt.submission_id, attempt.problem_id);
        match rows.iter_mut().find(|a| (a.submission_id, a.problem_id) == key) {
            Some(existing) => {
                *existing = attempt;
                Ok(false)
            }
            None => {
                rows.push(attempt);
                Ok(true)
            }
        }
    }

    async fn attempts(
        &self,
        participation_id: ParticipationId,
    ) -> Result<Vec<ProblemAttemptResult>, StoreError> {
        Ok(self
            .attempts
            .get(&participation_id)
            .map(|a| a.clone())
            .unwrap_or_default())
    }

    async fn current_participation(
        &self,
        actor_id: ActorId,
    ) -> Result<Option<ParticipationId>, StoreError> {
        Ok(self.current.get(&actor_id).map(|id| *id))
    }

    async fn swap_current_participation(
        &self,
        actor_id: ActorId,
        expected: Option<ParticipationId>,
        new: Option<ParticipationId>,
    ) -> Result<bool, StoreError> {
        match self.current.entry(actor_id) {
            Entry::Occupied(mut slot) => {
                if expected != Some(*slot.get()) {
                    return Ok(false);
                }
                match new {
                    Some(id) => {
                        slot.insert(id);
                    }
                    None => {
                        slot.remove();
                    }
                }
                Ok(true)
            }
            Entry::Vacant(slot) => {
                if expected.is_some() {
                    return Ok(false);
                }
                if let Some(id) = new {
                    slot.insert(id);
                }
                Ok(true)
            }
        }
    }
}
