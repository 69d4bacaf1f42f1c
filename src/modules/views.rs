//! Response shapes shared by the feature modules. Enumerated values are sent
//! both as their stable code and as a label in the request language.

use serde::Serialize;

use crate::db::{ApprovalLog, Nomination, User};
use crate::i18n::I18n;
use crate::workflow::{DecisionOutcome, Position};

#[derive(Debug, Serialize)]
pub struct NominationView {
    #[serde(flatten)]
    pub nomination: Nomination,
    pub status_label: String,
    pub final_status_label: String,
    pub stage_label: Option<String>,
}

impl NominationView {
    pub fn new(nomination: Nomination, i18n: &I18n) -> Self {
        let stage_label = match Position::of_nomination(&nomination) {
            Position::Awaiting(stage) => Some(i18n.stage(stage)),
            _ => None,
        };
        Self {
            status_label: i18n.status(nomination.status),
            final_status_label: i18n.final_status(nomination.final_status),
            stage_label,
            nomination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApprovalLogView {
    #[serde(flatten)]
    pub log: ApprovalLog,
    pub role_label: String,
    pub status_label: String,
}

impl ApprovalLogView {
    pub fn new(log: ApprovalLog, i18n: &I18n) -> Self {
        Self {
            role_label: i18n.role(log.role),
            status_label: i18n.log_status(log.status),
            log,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub role_label: String,
}

impl UserView {
    pub fn new(user: User, i18n: &I18n) -> Self {
        Self {
            role_label: i18n.role(user.role),
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecisionView {
    pub nomination: NominationView,
    pub log: ApprovalLogView,
}

impl DecisionView {
    pub fn new(outcome: DecisionOutcome, i18n: &I18n) -> Self {
        Self {
            nomination: NominationView::new(outcome.nomination, i18n),
            log: ApprovalLogView::new(outcome.log, i18n),
        }
    }
}
