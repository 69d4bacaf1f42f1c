use async_trait::async_trait;
use time::OffsetDateTime;

use super::error::DatabaseError;
use super::models::{
    ApprovalLog, ApprovalLogFilter, CourseFilter, NewApprovalLog, NewTrainingCourse, NewUser,
    Nomination, NominationFilter, Page, PageRequest, StateChange, TrainingCourse,
    UpdateUserProfile, User, UserRole,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Durable storage for users, courses, nominations and approval logs.
///
/// Implementations must make [`Store::apply_transition`] atomic: the
/// conditional nomination update and the log insert either both happen or
/// neither does.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn create_user(&self, new_user: &NewUser, role: UserRole) -> StoreResult<User>;
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>>;
    async fn update_user_profile(
        &self,
        user_id: i64,
        update: &UpdateUserProfile,
    ) -> StoreResult<User>;

    async fn create_course(&self, new_course: &NewTrainingCourse) -> StoreResult<TrainingCourse>;
    async fn get_course(&self, course_id: i64) -> StoreResult<Option<TrainingCourse>>;
    /// Ordered by start date ascending, undated courses last.
    async fn list_courses(&self, filter: &CourseFilter) -> StoreResult<Vec<TrainingCourse>>;

    /// Fails with [`DatabaseError::Duplicate`] when the (user, course) pair
    /// already has a nomination.
    async fn create_nomination(&self, user_id: i64, course_id: i64) -> StoreResult<Nomination>;
    async fn get_nomination(&self, nomination_id: i64) -> StoreResult<Option<Nomination>>;
    /// Ordered by submission date descending.
    async fn list_nominations(
        &self,
        filter: &NominationFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Nomination>>;
    async fn mark_nomination_read(&self, nomination_id: i64) -> StoreResult<Nomination>;
    /// Marks every unread nomination matching `filter` and returns them.
    async fn mark_nominations_read(&self, filter: &NominationFilter)
        -> StoreResult<Vec<Nomination>>;

    /// Applies `change` only while the nomination is still in
    /// `change.expected`, appending `log` in the same unit of work.
    /// Returns [`DatabaseError::Conflict`] when the state moved underneath.
    async fn apply_transition(
        &self,
        nomination_id: i64,
        change: &StateChange,
        log: &NewApprovalLog,
    ) -> StoreResult<(Nomination, ApprovalLog)>;

    async fn get_approval_log(&self, log_id: i64) -> StoreResult<Option<ApprovalLog>>;
    /// Ordered by timestamp descending.
    async fn list_approval_logs(
        &self,
        filter: &ApprovalLogFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ApprovalLog>>;
    /// Full history of one nomination, oldest first.
    async fn nomination_history(&self, nomination_id: i64) -> StoreResult<Vec<ApprovalLog>>;
    async fn mark_approval_log_read(&self, log_id: i64) -> StoreResult<ApprovalLog>;
    /// Timestamp of the newest approval log, if any.
    async fn latest_log_timestamp(&self) -> StoreResult<Option<OffsetDateTime>>;
}
