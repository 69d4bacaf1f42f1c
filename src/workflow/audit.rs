//! Append-only approval history.
//!
//! Entries are built here and persisted by the store together with the state
//! change they describe. After that only their `is_read` flag may change.

use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};

use crate::db::{ApprovalLog, ApprovalLogFilter, NewApprovalLog, Page, PageRequest, Store};

use super::actor::Actor;
use super::error::{WorkflowError, WorkflowResult};
use super::state_machine::Transition;

/// Issues strictly increasing timestamps at the storage precision
/// (microseconds), even when the wall clock stalls or steps back.
#[derive(Debug)]
pub struct AuditClock {
    last: Mutex<OffsetDateTime>,
}

impl AuditClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(OffsetDateTime::UNIX_EPOCH),
        }
    }

    /// Never issue a timestamp at or before `ts` from now on.
    pub fn observe(&self, ts: OffsetDateTime) {
        let ts = truncate_to_micros(ts);
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ts > *last {
            *last = ts;
        }
    }

    pub fn next(&self) -> OffsetDateTime {
        let now = truncate_to_micros(OffsetDateTime::now_utc());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let issued = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = issued;
        issued
    }
}

impl Default for AuditClock {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_to_micros(ts: OffsetDateTime) -> OffsetDateTime {
    ts - Duration::nanoseconds(i64::from(ts.nanosecond() % 1_000))
}

pub struct AuditLogger {
    store: Arc<dyn Store>,
    clock: AuditClock,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: AuditClock::new(),
        }
    }

    /// Builds the single log entry recording `transition`.
    pub fn entry(&self, nomination_id: i64, actor: &Actor, transition: &Transition) -> NewApprovalLog {
        NewApprovalLog {
            nomination_id,
            approved_by: actor.user_id,
            role: actor.role,
            status: transition.log_status,
            notes: transition.notes.clone(),
            timestamp: self.clock.next(),
        }
    }

    /// Continues after the newest persisted entry, so history stays ordered
    /// across restarts and wall-clock steps back.
    pub async fn resume(&self) -> WorkflowResult<()> {
        if let Some(latest) = self.store.latest_log_timestamp().await? {
            self.clock.observe(latest);
            tracing::info!(%latest, "Audit clock resumed after newest approval log");
        }
        Ok(())
    }

    pub async fn history(&self, nomination_id: i64) -> WorkflowResult<Vec<ApprovalLog>> {
        Ok(self.store.nomination_history(nomination_id).await?)
    }

    pub async fn list(
        &self,
        filter: &ApprovalLogFilter,
        page: PageRequest,
    ) -> WorkflowResult<Page<ApprovalLog>> {
        Ok(self.store.list_approval_logs(filter, page).await?)
    }

    /// Marks one entry read on behalf of `viewer`: the nominee or any approver.
    pub async fn mark_read(&self, log_id: i64, viewer: &Actor) -> WorkflowResult<ApprovalLog> {
        let log = self
            .store
            .get_approval_log(log_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("approval log", log_id))?;

        if !viewer.is_approver() {
            let nomination = self
                .store
                .get_nomination(log.nomination_id)
                .await?
                .ok_or_else(|| WorkflowError::not_found("nomination", log.nomination_id))?;
            if nomination.user_id != viewer.user_id {
                return Err(WorkflowError::Authorization(format!(
                    "user {} cannot mark approval log {} as read",
                    viewer.user_id, log_id
                )));
            }
        }

        Ok(self.store.mark_approval_log_read(log_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = AuditClock::new();
        let mut previous = clock.next();
        for _ in 0..1_000 {
            let next = clock.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_clock_continues_after_observed_timestamp() {
        let clock = AuditClock::new();
        let future = OffsetDateTime::now_utc() + Duration::hours(1);
        clock.observe(future);
        assert!(clock.next() > future);

        // An older observation never moves the clock back.
        clock.observe(OffsetDateTime::UNIX_EPOCH);
        assert!(clock.next() > future);
    }

    #[test]
    fn test_clock_truncates_to_microseconds() {
        let clock = AuditClock::new();
        for _ in 0..10 {
            assert_eq!(clock.next().nanosecond() % 1_000, 0);
        }
    }
}
