//! Nomination approval pipeline.
//!
//! ```text
//! (pending, draft) ──approve──▶ (approved, draft) ──approve──▶ (approved, approved) ──approve──▶ (approved, submitted)
//!   manager/admin       │          hr                  │          entry                   │
//!                       └──────────reject──────────────┴──────────reject──────────────────┴──▶ (rejected, rejected)
//! ```
//!
//! Planning is pure: [`plan`] turns the current nomination, the actor and the
//! requested action into a [`Transition`], which the service then applies as
//! a conditional write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::{FinalStatus, LogStatus, Nomination, NominationStatus, StateChange, UserRole};

use super::actor::Actor;
use super::error::WorkflowError;

/// Stored as the rejection reason when the decider gives none.
pub const NO_REASON_GIVEN: &str = "no reason given";

pub const MANAGER_APPROVAL_NOTE: &str = "approved by direct manager";
pub const HR_APPROVAL_NOTE: &str = "approved by human resources";
pub const ENTRY_SUBMISSION_NOTE: &str =
    "final approval granted; nomination submitted to the training institute";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Approve,
    Reject,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Approve => "approve",
            Action::Reject => "reject",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(Action::Approve),
            "reject" => Ok(Action::Reject),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// One of the three sequential approval steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ManagerReview,
    HrReview,
    EntryReview,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[Stage::ManagerReview, Stage::HrReview, Stage::EntryReview]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ManagerReview => "manager_review",
            Stage::HrReview => "hr_review",
            Stage::EntryReview => "entry_review",
        }
    }

    /// `(status, final_status)` a nomination holds while waiting at this stage.
    pub fn source_state(&self) -> (NominationStatus, FinalStatus) {
        match self {
            Stage::ManagerReview => (NominationStatus::Pending, FinalStatus::Draft),
            Stage::HrReview => (NominationStatus::Approved, FinalStatus::Draft),
            Stage::EntryReview => (NominationStatus::Approved, FinalStatus::Approved),
        }
    }

    pub fn authorizes(&self, role: UserRole) -> bool {
        match self {
            Stage::ManagerReview => matches!(role, UserRole::Admin | UserRole::Manager),
            Stage::HrReview => role == UserRole::Hr,
            Stage::EntryReview => role == UserRole::Entry,
        }
    }

    /// The stage a role decides at, if any.
    pub fn for_role(role: UserRole) -> Option<Stage> {
        Stage::all().iter().copied().find(|stage| stage.authorizes(role))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a nomination sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "stage")]
pub enum Position {
    Awaiting(Stage),
    Submitted,
    Rejected,
    /// A status pair outside the pipeline table.
    Inconsistent,
}

impl Position {
    pub fn of(status: NominationStatus, final_status: FinalStatus) -> Self {
        match (status, final_status) {
            (NominationStatus::Rejected, _) | (_, FinalStatus::Rejected) => Position::Rejected,
            (NominationStatus::Approved, FinalStatus::Submitted) => Position::Submitted,
            (NominationStatus::Pending, FinalStatus::Draft) => {
                Position::Awaiting(Stage::ManagerReview)
            }
            (NominationStatus::Approved, FinalStatus::Draft) => Position::Awaiting(Stage::HrReview),
            (NominationStatus::Approved, FinalStatus::Approved) => {
                Position::Awaiting(Stage::EntryReview)
            }
            _ => Position::Inconsistent,
        }
    }

    pub fn of_nomination(nomination: &Nomination) -> Self {
        Self::of(nomination.status, nomination.final_status)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Position::Submitted | Position::Rejected)
    }
}

/// A validated decision, ready to be applied and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub stage: Stage,
    pub action: Action,
    pub change: StateChange,
    pub log_status: LogStatus,
    pub notes: String,
}

/// Validates `action` by `actor` against the nomination's current state.
///
/// Non-approver roles and approvers whose stage has not been reached get an
/// authorization error. Terminal nominations and approvers whose stage has
/// already been decided get a conflict.
pub fn plan(
    nomination: &Nomination,
    actor: &Actor,
    action: Action,
    reason: Option<&str>,
) -> Result<Transition, WorkflowError> {
    let Some(actor_stage) = Stage::for_role(actor.role) else {
        return Err(WorkflowError::Authorization(format!(
            "role {} cannot decide nominations",
            actor.role
        )));
    };

    let stage = match Position::of_nomination(nomination) {
        Position::Awaiting(stage) => stage,
        Position::Submitted | Position::Rejected => {
            return Err(WorkflowError::Conflict(format!(
                "nomination {} is already final ({}/{})",
                nomination.id, nomination.status, nomination.final_status
            )));
        }
        Position::Inconsistent => {
            return Err(WorkflowError::Conflict(format!(
                "nomination {} has an inconsistent state ({}/{})",
                nomination.id, nomination.status, nomination.final_status
            )));
        }
    };

    if actor_stage < stage {
        return Err(WorkflowError::Conflict(format!(
            "nomination {} has already passed {}",
            nomination.id, actor_stage
        )));
    }
    if !stage.authorizes(actor.role) {
        return Err(WorkflowError::Authorization(format!(
            "role {} cannot decide nomination {} at {}",
            actor.role, nomination.id, stage
        )));
    }

    let expected = stage.source_state();
    let transition = match action {
        Action::Approve => {
            let (status, final_status, log_status, note) = match stage {
                Stage::ManagerReview => (
                    NominationStatus::Approved,
                    FinalStatus::Draft,
                    LogStatus::Approved,
                    MANAGER_APPROVAL_NOTE,
                ),
                Stage::HrReview => (
                    NominationStatus::Approved,
                    FinalStatus::Approved,
                    LogStatus::Approved,
                    HR_APPROVAL_NOTE,
                ),
                Stage::EntryReview => (
                    NominationStatus::Approved,
                    FinalStatus::Submitted,
                    LogStatus::Submitted,
                    ENTRY_SUBMISSION_NOTE,
                ),
            };
            Transition {
                stage,
                action,
                change: StateChange {
                    expected,
                    status,
                    final_status,
                    rejection_reason: None,
                },
                log_status,
                notes: note.to_string(),
            }
        }
        Action::Reject => {
            let reason = resolve_reason(reason);
            Transition {
                stage,
                action,
                change: StateChange {
                    expected,
                    status: NominationStatus::Rejected,
                    final_status: FinalStatus::Rejected,
                    rejection_reason: Some(reason.clone()),
                },
                log_status: LogStatus::Rejected,
                notes: reason,
            }
        }
    };

    Ok(transition)
}

fn resolve_reason(reason: Option<&str>) -> String {
    match reason.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NO_REASON_GIVEN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn nomination(status: NominationStatus, final_status: FinalStatus) -> Nomination {
        Nomination {
            id: 1,
            user_id: 42,
            course_id: 7,
            status,
            final_status,
            rejection_reason: Some("earlier".to_string()),
            is_read: false,
            submission_date: OffsetDateTime::now_utc(),
        }
    }

    fn actor(role: UserRole) -> Actor {
        Actor::new(100, role)
    }

    /// Applies a planned transition to an in-memory nomination.
    fn apply(mut n: Nomination, t: &Transition) -> Nomination {
        assert_eq!(n.state(), t.change.expected);
        n.status = t.change.status;
        n.final_status = t.change.final_status;
        n.rejection_reason = t.change.rejection_reason.clone();
        n
    }

    #[test]
    fn test_full_approval_chain() {
        let n = nomination(NominationStatus::Pending, FinalStatus::Draft);

        let t = plan(&n, &actor(UserRole::Admin), Action::Approve, None).unwrap();
        assert_eq!(t.stage, Stage::ManagerReview);
        assert_eq!(t.log_status, LogStatus::Approved);
        let n = apply(n, &t);
        assert_eq!(n.state(), (NominationStatus::Approved, FinalStatus::Draft));
        assert_eq!(n.rejection_reason, None);

        let t = plan(&n, &actor(UserRole::Hr), Action::Approve, None).unwrap();
        assert_eq!(t.stage, Stage::HrReview);
        let n = apply(n, &t);
        assert_eq!(n.state(), (NominationStatus::Approved, FinalStatus::Approved));

        let t = plan(&n, &actor(UserRole::Entry), Action::Approve, None).unwrap();
        assert_eq!(t.stage, Stage::EntryReview);
        assert_eq!(t.log_status, LogStatus::Submitted);
        assert_eq!(t.notes, ENTRY_SUBMISSION_NOTE);
        let n = apply(n, &t);
        assert_eq!(n.state(), (NominationStatus::Approved, FinalStatus::Submitted));
    }

    #[test]
    fn test_manager_role_decides_first_stage() {
        let n = nomination(NominationStatus::Pending, FinalStatus::Draft);
        let t = plan(&n, &actor(UserRole::Manager), Action::Approve, None).unwrap();
        assert_eq!(t.stage, Stage::ManagerReview);
        assert_eq!(t.notes, MANAGER_APPROVAL_NOTE);
    }

    #[test]
    fn test_reject_at_every_stage_is_terminal() {
        let cases = [
            (NominationStatus::Pending, FinalStatus::Draft, UserRole::Admin),
            (NominationStatus::Approved, FinalStatus::Draft, UserRole::Hr),
            (NominationStatus::Approved, FinalStatus::Approved, UserRole::Entry),
        ];
        for (status, final_status, role) in cases {
            let n = nomination(status, final_status);
            let t = plan(&n, &actor(role), Action::Reject, Some("missing documents")).unwrap();
            let n = apply(n, &t);
            assert_eq!(n.state(), (NominationStatus::Rejected, FinalStatus::Rejected));
            assert_eq!(n.rejection_reason.as_deref(), Some("missing documents"));
            assert_eq!(t.notes, "missing documents");
            assert_eq!(t.log_status, LogStatus::Rejected);
            assert!(Position::of_nomination(&n).is_terminal());
        }
    }

    #[test]
    fn test_blank_reason_falls_back_to_sentinel() {
        let n = nomination(NominationStatus::Approved, FinalStatus::Draft);
        for reason in [None, Some(""), Some("   ")] {
            let t = plan(&n, &actor(UserRole::Hr), Action::Reject, reason).unwrap();
            assert_eq!(t.change.rejection_reason.as_deref(), Some(NO_REASON_GIVEN));
            assert_eq!(t.notes, NO_REASON_GIVEN);
        }
    }

    #[test]
    fn test_employee_is_never_authorized() {
        for (status, final_status) in [
            (NominationStatus::Pending, FinalStatus::Draft),
            (NominationStatus::Rejected, FinalStatus::Rejected),
        ] {
            let n = nomination(status, final_status);
            let err = plan(&n, &actor(UserRole::Employee), Action::Approve, None).unwrap_err();
            assert!(matches!(err, WorkflowError::Authorization(_)));
        }
    }

    #[test]
    fn test_later_stage_role_cannot_skip_ahead() {
        let n = nomination(NominationStatus::Pending, FinalStatus::Draft);
        let err = plan(&n, &actor(UserRole::Hr), Action::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
        let err = plan(&n, &actor(UserRole::Entry), Action::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));

        let n = nomination(NominationStatus::Approved, FinalStatus::Draft);
        let err = plan(&n, &actor(UserRole::Entry), Action::Reject, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    #[test]
    fn test_decided_stage_is_a_conflict() {
        let n = nomination(NominationStatus::Approved, FinalStatus::Draft);
        let err = plan(&n, &actor(UserRole::Admin), Action::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[test]
    fn test_terminal_states_are_conflicts() {
        for (status, final_status) in [
            (NominationStatus::Approved, FinalStatus::Submitted),
            (NominationStatus::Rejected, FinalStatus::Rejected),
        ] {
            let n = nomination(status, final_status);
            for role in [UserRole::Admin, UserRole::Hr, UserRole::Entry] {
                for action in [Action::Approve, Action::Reject] {
                    let err = plan(&n, &actor(role), action, None).unwrap_err();
                    assert!(matches!(err, WorkflowError::Conflict(_)));
                }
            }
        }
    }

    #[test]
    fn test_inconsistent_pairs_are_refused() {
        let n = nomination(NominationStatus::Pending, FinalStatus::Approved);
        assert_eq!(Position::of_nomination(&n), Position::Inconsistent);
        let err = plan(&n, &actor(UserRole::Admin), Action::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("Approve".parse::<Action>(), Ok(Action::Approve));
        assert_eq!(" reject ".parse::<Action>(), Ok(Action::Reject));
        assert!("submit".parse::<Action>().is_err());
    }
}
