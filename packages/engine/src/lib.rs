pub mod access;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod ranking;
pub mod setup;
pub mod state;
pub mod store;
pub mod window;

pub use access::{AccessOutcome, AccessPolicy, ViewerStanding};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineAppConfig, EngineConfig};
pub use error::{EngineError, ErrorKind};
pub use format::{Cell, CellState, FormatRegistry, ScoringFormat, TieRule};
pub use lifecycle::ParticipationLifecycle;
pub use ranking::{RankLabel, RankedEntry, RankedRow, RankingEngine};
pub use setup::EventSetup;
pub use state::EngineState;
pub use store::{ContestStore, MemoryStore, StoreError};
pub use window::ParticipationWindow;
