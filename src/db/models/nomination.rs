use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Coarse pipeline state set by the current decider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "nomination_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NominationStatus {
    Pending,
    Approved,
    Rejected,
}

impl NominationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NominationStatus::Pending => "pending",
            NominationStatus::Approved => "approved",
            NominationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for NominationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NominationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(NominationStatus::Pending),
            "approved" => Ok(NominationStatus::Approved),
            "rejected" => Ok(NominationStatus::Rejected),
            _ => Err(format!("Unknown nomination status: {}", s)),
        }
    }
}

/// Fine-grained stage marker distinguishing HR and entry progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "final_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Draft,
    Approved,
    Rejected,
    Submitted,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Draft => "draft",
            FinalStatus::Approved => "approved",
            FinalStatus::Rejected => "rejected",
            FinalStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(FinalStatus::Draft),
            "approved" => Ok(FinalStatus::Approved),
            "rejected" => Ok(FinalStatus::Rejected),
            "submitted" => Ok(FinalStatus::Submitted),
            _ => Err(format!("Unknown final status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Nomination {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub status: NominationStatus,
    pub final_status: FinalStatus,
    pub rejection_reason: Option<String>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub submission_date: OffsetDateTime,
}

impl Nomination {
    pub fn state(&self) -> (NominationStatus, FinalStatus) {
        (self.status, self.final_status)
    }
}

/// Conditional write applied by a decision: the row is only updated while it
/// still holds `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub expected: (NominationStatus, FinalStatus),
    pub status: NominationStatus,
    pub final_status: FinalStatus,
    pub rejection_reason: Option<String>,
}

/// Any-of filters; an empty list matches every value.
#[derive(Debug, Clone, Default)]
pub struct NominationFilter {
    pub statuses: Vec<NominationStatus>,
    pub final_statuses: Vec<FinalStatus>,
    pub is_read: Option<bool>,
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
}

impl NominationFilter {
    pub fn in_state(status: NominationStatus, final_status: FinalStatus) -> Self {
        Self {
            statuses: vec![status],
            final_statuses: vec![final_status],
            ..Default::default()
        }
    }

    pub fn matches(&self, nomination: &Nomination) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&nomination.status))
            && (self.final_statuses.is_empty()
                || self.final_statuses.contains(&nomination.final_status))
            && self.is_read.map_or(true, |v| v == nomination.is_read)
            && self.user_id.map_or(true, |v| v == nomination.user_id)
            && self.course_id.map_or(true, |v| v == nomination.course_id)
    }
}
