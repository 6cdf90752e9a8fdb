pub mod actor;
pub mod attempt;
pub mod event;
pub mod participation;
pub mod result_code;
pub mod retry;

pub type ActorId = i32;
pub type EventId = i32;
pub type OrganizationId = i32;
pub type ParticipationId = i32;
pub type ProblemId = i32;

pub use actor::Actor;
pub use attempt::ProblemAttemptResult;
pub use event::{Event, EventProblem, ScoreboardVisibility};
pub use participation::{NewParticipation, Participation, ParticipationKind};
pub use result_code::ResultCode;
