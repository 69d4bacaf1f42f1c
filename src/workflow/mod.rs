//! Nomination lifecycle: the approval state machine, the audit trail and the
//! service that ties them to the entity store.

mod actor;
mod audit;
mod error;
mod service;
pub mod state_machine;

pub use actor::Actor;
pub use audit::{AuditClock, AuditLogger};
pub use error::{WorkflowError, WorkflowResult};
pub use service::{Dashboard, DecisionOutcome, NominationDetails, NominationService};
pub use state_machine::{Action, Position, Stage, Transition};
