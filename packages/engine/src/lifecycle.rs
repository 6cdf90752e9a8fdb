use chrono::{DateTime, Utc};
use common::participation::DISQUALIFIED_SCORE;
use common::{
    Actor, ActorId, Event, EventId, NewParticipation, Participation, ParticipationId,
    ParticipationKind, ProblemAttemptResult,
};
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use crate::access::AccessPolicy;
use crate::error::EngineError;
use crate::format::ScoringContext;
use crate::state::EngineState;
use crate::store::StoreError;
use crate::window::ParticipationWindow;

/// Creates, reuses, ends and disqualifies participations.
///
/// Score-affecting writes hold the participation's row lock. The per-actor
/// active pointer only moves through compare-and-swap.
pub struct ParticipationLifecycle {
    state: EngineState,
}

impl ParticipationLifecycle {
    pub fn new(state: EngineState) -> Self {
        Self { state }
    }

    #[instrument(skip(self, actor, access_code), fields(actor_id = actor.id))]
    pub async fn join(
        &self,
        actor: &Actor,
        event_id: EventId,
        access_code: Option<&str>,
    ) -> Result<Participation, EngineError> {
        if !actor.is_authenticated {
            return Err(EngineError::AuthenticationRequired);
        }

        let now = self.state.clock.now();
        let event = self.state.load_event(event_id).await?;

        AccessPolicy::access_check(actor, &event).into_result()?;
        let is_staff = event.is_staff(actor.id);
        if !event.has_started(now) && !is_staff {
            return Err(EngineError::EventNotJoinable);
        }
        if event.is_banned(actor.id) && !actor.is_superuser {
            return Err(EngineError::AlreadyBanned);
        }

        if let Some(current) = self.state.store.current_participation(actor.id).await? {
            self.ensure_not_elsewhere(&event, current, now).await?;
        }

        let check_code = || match event.required_access_code() {
            Some(code)
                if !AccessPolicy::bypasses_access_code(actor, &event)
                    && access_code != Some(code) =>
            {
                Err(EngineError::WrongAccessCode)
            }
            _ => Ok(()),
        };

        let participation = if event.has_ended(now) {
            check_code()?;
            self.allocate_virtual(&event, actor.id, now).await?
        } else {
            let kind = if is_staff {
                ParticipationKind::Spectate
            } else {
                ParticipationKind::Live
            };
            match self
                .state
                .store
                .find_participation(event.id, actor.id, kind)
                .await?
            {
                Some(existing) if !ParticipationWindow::of(&event, &existing).has_ended(now) => {
                    existing
                }
                Some(_) => {
                    self.get_or_create(&event, actor.id, ParticipationKind::Spectate, now)
                        .await?
                }
                None => {
                    check_code()?;
                    self.get_or_create(&event, actor.id, kind, now).await?
                }
            }
        };

        self.activate(&event, actor.id, participation.id, now).await?;

        if participation.kind.is_live() {
            self.state.store.refresh_user_count(event.id).await?;
        }

        info!(
            participation_id = participation.id,
            kind = %participation.kind,
            "Joined event"
        );
        Ok(participation)
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn leave(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> Result<Participation, EngineError> {
        for _ in 0..self.state.config.pointer_swap_max_attempts {
            let Some(current) = self.state.store.current_participation(actor.id).await? else {
                return Err(EngineError::NotInEvent);
            };
            let participation = self.state.store.participation(current).await?;
            if participation.event_id != event_id {
                return Err(EngineError::NotInEvent);
            }
            if self
                .state
                .store
                .swap_current_participation(actor.id, Some(current), None)
                .await?
            {
                info!(participation_id = current, "Left event");
                return Ok(participation);
            }
            debug!("Active participation moved during leave, retrying");
        }
        warn!("Gave up clearing active participation");
        Err(EngineError::TransientRace(
            "active participation kept changing".into(),
        ))
    }

    #[instrument(skip(self, editor), fields(editor_id = editor.id))]
    pub async fn set_disqualified(
        &self,
        editor: &Actor,
        participation_id: ParticipationId,
        disqualified: bool,
    ) -> Result<Participation, EngineError> {
        let participation = {
            let _guard = self.state.store.lock_participation(participation_id).await?;
            let mut participation = self.state.store.participation(participation_id).await?;
            let event = self.state.load_event(participation.event_id).await?;
            if !AccessPolicy::is_editable_by(editor, &event) {
                return Err(EngineError::Inaccessible);
            }

            participation.is_disqualified = disqualified;
            self.rescore(&event, &mut participation).await?;
            self.state.store.save_participation(&participation).await?;
            participation
        };

        if disqualified {
            self.deactivate(participation.actor_id, participation.id)
                .await?;
        }
        self.state
            .store
            .update_bans(participation.event_id, participation.actor_id, disqualified)
            .await?;

        info!(
            event_id = participation.event_id,
            actor_id = participation.actor_id,
            score = participation.score,
            "Disqualification updated"
        );
        Ok(participation)
    }

    /// Store a grading result and rescore its participation.
    #[instrument(
        skip(self, result),
        fields(
            participation_id = result.participation_id,
            submission_id = result.submission_id
        )
    )]
    pub async fn record_attempt(
        &self,
        result: ProblemAttemptResult,
    ) -> Result<Participation, EngineError> {
        let _guard = self
            .state
            .store
            .lock_participation(result.participation_id)
            .await?;
        let mut participation = self
            .state
            .store
            .participation(result.participation_id)
            .await?;
        let event = self.state.load_event(participation.event_id).await?;

        if participation.kind.is_spectate() {
            debug!("Ignoring attempt from spectator");
            return Ok(participation);
        }
        if ParticipationWindow::of(&event, &participation).end < result.submitted_at {
            return Err(EngineError::ParticipationEnded(participation.id));
        }

        let fresh = self.state.store.append_attempt(result).await?;
        self.rescore(&event, &mut participation).await?;
        self.state.store.save_participation(&participation).await?;

        info!(
            score = participation.score,
            cumulative_time = participation.cumulative_time,
            redelivered = !fresh,
            "Attempt recorded"
        );
        Ok(participation)
    }

    #[instrument(skip(self))]
    pub async fn recompute(
        &self,
        participation_id: ParticipationId,
    ) -> Result<Participation, EngineError> {
        let _guard = self.state.store.lock_participation(participation_id).await?;
        let mut participation = self.state.store.participation(participation_id).await?;
        let event = self.state.load_event(participation.event_id).await?;

        self.rescore(&event, &mut participation).await?;
        self.state.store.save_participation(&participation).await?;
        debug!(score = participation.score, "Participation recomputed");
        Ok(participation)
    }

    /// Recompute every participation of the event, each under its own row lock.
    #[instrument(skip(self))]
    pub async fn recompute_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participation>, EngineError> {
        self.state.load_event(event_id).await?;
        let ids: Vec<ParticipationId> = self
            .state
            .store
            .event_participations(event_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let updated = try_join_all(ids.into_iter().map(|id| self.recompute(id))).await?;
        info!(count = updated.len(), "Event recomputed");
        Ok(updated)
    }

    /// Fold the stored attempts into the participation, then apply the
    /// disqualification sentinel.
    async fn rescore(
        &self,
        event: &Event,
        participation: &mut Participation,
    ) -> Result<(), EngineError> {
        let format = self.state.format_for(event)?;
        let problems = self.state.store.problems(event.id).await?;
        let attempts = self.state.store.attempts(participation.id).await?;
        let ctx = ScoringContext {
            event,
            problems: &problems,
            window_start: ParticipationWindow::of(event, participation).start,
        };

        format
            .update_participation(&ctx, participation, &attempts)
            .map_err(|e| {
                EngineError::invariant(format!(
                    "format '{}' failed on participation {}: {e}",
                    format.name(),
                    participation.id
                ))
            })?;

        if participation.is_disqualified {
            participation.score = DISQUALIFIED_SCORE;
        }
        Ok(())
    }

    /// Fail if the actor's active participation is a running one in another event.
    async fn ensure_not_elsewhere(
        &self,
        event: &Event,
        current: ParticipationId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let active = match self.state.store.participation(current).await {
            Ok(active) => active,
            Err(StoreError::NotFound(_)) => {
                return Err(EngineError::invariant(format!(
                    "active pointer references missing participation {current}"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if active.event_id == event.id {
            return Ok(());
        }

        let other = self.state.load_event(active.event_id).await?;
        if ParticipationWindow::of(&other, &active).has_ended(now) {
            return Ok(());
        }
        Err(EngineError::AlreadyInEvent {
            event_id: active.event_id,
        })
    }

    /// Insert a participation, or return the one a concurrent join just created.
    async fn get_or_create(
        &self,
        event: &Event,
        actor_id: ActorId,
        kind: ParticipationKind,
        now: DateTime<Utc>,
    ) -> Result<Participation, EngineError> {
        let new = NewParticipation {
            event_id: event.id,
            actor_id,
            kind,
            real_start: now,
        };
        match self.state.store.insert_participation(new).await {
            Ok(participation) => Ok(participation),
            Err(StoreError::UniqueViolation(_)) => self
                .state
                .store
                .find_participation(event.id, actor_id, kind)
                .await?
                .ok_or_else(|| {
                    EngineError::invariant(format!(
                        "{kind} participation of actor {actor_id} in event {} vanished",
                        event.id
                    ))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the next virtual number. The read of the current maximum and the
    /// insert are not atomic, so collisions are retried with a fresh maximum.
    async fn allocate_virtual(
        &self,
        event: &Event,
        actor_id: ActorId,
        now: DateTime<Utc>,
    ) -> Result<Participation, EngineError> {
        let backoff = self.state.config.virtual_join_backoff();
        let max_attempts = self.state.config.virtual_join_max_attempts;

        for attempt in 1..=max_attempts {
            let next = self.state.store.max_virtual(event.id, actor_id).await? + 1;
            let new = NewParticipation {
                event_id: event.id,
                actor_id,
                kind: ParticipationKind::Virtual(next),
                real_start: now,
            };
            match self.state.store.insert_participation(new).await {
                Ok(participation) => return Ok(participation),
                Err(StoreError::UniqueViolation(_)) => {
                    debug!(attempt, virtual_number = next, "Virtual number taken, retrying");
                    tokio::time::sleep(backoff.delay(attempt)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(max_attempts, "Gave up allocating a virtual participation");
        Err(EngineError::TransientRace(format!(
            "no free virtual participation number after {max_attempts} attempts"
        )))
    }

    /// Point the actor at `participation_id`, re-checking the other-event rule
    /// on every round so two concurrent joins cannot both win.
    async fn activate(
        &self,
        event: &Event,
        actor_id: ActorId,
        participation_id: ParticipationId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        for _ in 0..self.state.config.pointer_swap_max_attempts {
            let current = self.state.store.current_participation(actor_id).await?;
            if let Some(current) = current {
                if current == participation_id {
                    return Ok(());
                }
                self.ensure_not_elsewhere(event, current, now).await?;
            }
            if self
                .state
                .store
                .swap_current_participation(actor_id, current, Some(participation_id))
                .await?
            {
                return Ok(());
            }
            debug!("Active participation moved during join, retrying");
        }
        warn!("Gave up moving active participation");
        Err(EngineError::TransientRace(
            "active participation kept changing".into(),
        ))
    }

    /// Clear the actor's pointer if it still references `participation_id`.
    async fn deactivate(
        &self,
        actor_id: ActorId,
        participation_id: ParticipationId,
    ) -> Result<(), EngineError> {
        for _ in 0..self.state.config.pointer_swap_max_attempts {
            let current = self.state.store.current_participation(actor_id).await?;
            if current != Some(participation_id) {
                return Ok(());
            }
            if self
                .state
                .store
                .swap_current_participation(actor_id, current, None)
                .await?
            {
                return Ok(());
            }
        }
        Err(EngineError::TransientRace(
            "active participation kept changing".into(),
        ))
    }
}
