use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use super::{NominationStatus, UserRole};

/// Outcome recorded by an approval log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "log_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Approved,
    Rejected,
    Submitted,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Approved => "approved",
            LogStatus::Rejected => "rejected",
            LogStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApprovalLog {
    pub id: i64,
    pub nomination_id: i64,
    pub approved_by: Option<i64>,
    pub role: UserRole,
    pub status: LogStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NewApprovalLog {
    pub nomination_id: i64,
    pub approved_by: i64,
    pub role: UserRole,
    pub status: LogStatus,
    pub notes: String,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalLogFilter {
    pub nomination_id: Option<i64>,
    pub role: Option<UserRole>,
    pub is_read: Option<bool>,
    /// Restricts to logs on nominations owned by this user.
    pub owner_id: Option<i64>,
    /// Restricts to logs whose nomination currently has one of these statuses.
    pub nomination_statuses: Vec<NominationStatus>,
}
