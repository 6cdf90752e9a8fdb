use std::sync::Arc;

use common::{Event, EventId};
use dashmap::DashMap;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::format::{FormatRegistry, ProblemLabeler, ScoringFormat};
use crate::store::{ContestStore, StoreError};

/// Shared handle passed to every engine component.
#[derive(Clone)]
pub struct EngineState {
    pub store: Arc<dyn ContestStore>,
    pub clock: Arc<dyn Clock>,
    pub formats: Arc<FormatRegistry>,
    /// Custom problem labelers, bound per event once validated.
    pub labelers: Arc<DashMap<EventId, ProblemLabeler>>,
    pub config: EngineConfig,
}

impl EngineState {
    pub fn new(store: Arc<dyn ContestStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            formats: Arc::new(FormatRegistry::with_builtin()),
            labelers: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    pub fn format_name<'a>(&'a self, event: &'a Event) -> &'a str {
        if event.format_name.is_empty() {
            self.config.default_format.as_str()
        } else {
            event.format_name.as_str()
        }
    }

    /// The format of a stored event. Formats are checked when the event is
    /// configured, so a missing one here is an invariant violation.
    pub fn format_for(&self, event: &Event) -> Result<Arc<dyn ScoringFormat>, EngineError> {
        let name = self.format_name(event);
        self.formats.get(name).ok_or_else(|| {
            EngineError::invariant(format!(
                "event {} uses unregistered format '{name}'",
                event.id
            ))
        })
    }

    pub fn problem_label(
        &self,
        event: &Event,
        format: &dyn ScoringFormat,
        index: usize,
    ) -> Result<String, EngineError> {
        let labeler = self.labelers.get(&event.id).map(|l| Arc::clone(l.value()));
        match labeler {
            Some(labeler) => labeler(index).map_err(|e| {
                EngineError::invariant(format!(
                    "labeler of event {} failed for index {index}: {e}",
                    event.id
                ))
            }),
            None => Ok(format.label_for_problem(index)),
        }
    }

    pub(crate) async fn load_event(&self, event_id: EventId) -> Result<Event, EngineError> {
        match self.store.event(event_id).await {
            Ok(event) => Ok(event),
            Err(StoreError::NotFound(_)) => Err(EngineError::NotFound(format!("Event {event_id}"))),
            Err(e) => Err(e.into()),
        }
    }
}
