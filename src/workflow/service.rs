use opentelemetry::KeyValue;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::db::{
    ApprovalLog, ApprovalLogFilter, CourseFilter, DatabaseError, NewTrainingCourse, NewUser,
    Nomination, NominationFilter, NominationStatus, Page, PageRequest, Store, TrainingCourse,
    UpdateUserProfile, User, UserRole,
};
use crate::telemetry::{get_meter, Counter};

use super::actor::Actor;
use super::audit::AuditLogger;
use super::error::{WorkflowError, WorkflowResult};
use super::state_machine::{self, Action, Position, Stage};

const FEATURED_COURSES: i64 = 3;

/// A nomination together with everything a detail view needs.
#[derive(Debug, Clone, Serialize)]
pub struct NominationDetails {
    pub nomination: Nomination,
    pub position: Position,
    pub nominee: User,
    pub course: TrainingCourse,
    pub history: Vec<ApprovalLog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub nomination: Nomination,
    pub log: ApprovalLog,
}

/// Role-specific work queue and recent activity.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub role: UserRole,
    pub stage: Option<Stage>,
    /// Nominations awaiting the actor's stage, or the employee's own nominations.
    pub queue: Page<Nomination>,
    /// Unread queue items, or unread log entries for employees.
    pub new_requests_count: u64,
    /// Decisions taken by the actor's role, or unread decisions on the
    /// employee's nominations.
    pub recent_decisions: Page<ApprovalLog>,
}

fn not_found(entity: &'static str, id: i64) -> impl FnOnce(DatabaseError) -> WorkflowError {
    move |err| match err {
        DatabaseError::NotFound => WorkflowError::not_found(entity, id),
        other => other.into(),
    }
}

pub struct NominationService {
    store: Arc<dyn Store>,
    audit: AuditLogger,
    decisions: Counter,
}

impl NominationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let decisions = get_meter("nominations")
            .u64_counter("nomination_decisions_total")
            .with_description("Applied nomination decisions by stage and action")
            .build();
        Self {
            audit: AuditLogger::new(store.clone()),
            store,
            decisions,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Self-registration when `actor` is `None`; only admins may provision
    /// roles other than employee.
    pub async fn create_user(&self, actor: Option<&Actor>, new_user: NewUser) -> WorkflowResult<User> {
        new_user.validate()?;

        let role = match new_user.role {
            None | Some(UserRole::Employee) => UserRole::Employee,
            Some(role) => match actor {
                Some(actor) if actor.role == UserRole::Admin => role,
                _ => {
                    return Err(WorkflowError::Authorization(format!(
                        "only an admin can create {} accounts",
                        role
                    )))
                }
            },
        };

        let user = self
            .store
            .create_user(&new_user, role)
            .await
            .map_err(|err| match err {
                DatabaseError::Duplicate => WorkflowError::Duplicate(
                    "a user with this job number, email or national id already exists".to_string(),
                ),
                other => other.into(),
            })?;

        info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> WorkflowResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("user", user_id))
    }

    /// Approvers may look up anyone; other users only themselves.
    pub async fn view_user(&self, actor: &Actor, user_id: i64) -> WorkflowResult<User> {
        if !actor.is_approver() && actor.user_id != user_id {
            return Err(WorkflowError::Authorization(format!(
                "user {} cannot view user {}",
                actor.user_id, user_id
            )));
        }
        self.get_user(user_id).await
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        update: UpdateUserProfile,
    ) -> WorkflowResult<User> {
        update.validate()?;
        if update.full_name.is_none() && update.phone_number.is_none() {
            return Err(WorkflowError::Validation(
                "nothing to update: provide full_name or phone_number".to_string(),
            ));
        }
        self.store
            .update_user_profile(actor.user_id, &update)
            .await
            .map_err(not_found("user", actor.user_id))
    }

    // ── Courses ─────────────────────────────────────────────────────────

    pub async fn create_course(
        &self,
        actor: &Actor,
        new_course: NewTrainingCourse,
    ) -> WorkflowResult<TrainingCourse> {
        if !matches!(actor.role, UserRole::Hr | UserRole::Admin) {
            return Err(WorkflowError::Authorization(format!(
                "role {} cannot add training courses",
                actor.role
            )));
        }
        new_course.validate()?;

        let course = self.store.create_course(&new_course).await?;
        info!(course_id = course.id, title = %course.course_title, "Training course created");
        Ok(course)
    }

    pub async fn get_course(&self, course_id: i64) -> WorkflowResult<TrainingCourse> {
        self.store
            .get_course(course_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("course", course_id))
    }

    pub async fn list_courses(&self, filter: &CourseFilter) -> WorkflowResult<Vec<TrainingCourse>> {
        Ok(self.store.list_courses(filter).await?)
    }

    pub async fn featured_courses(&self) -> WorkflowResult<Vec<TrainingCourse>> {
        let filter = CourseFilter {
            limit: Some(FEATURED_COURSES),
            ..Default::default()
        };
        Ok(self.store.list_courses(&filter).await?)
    }

    // ── Submission ──────────────────────────────────────────────────────

    pub async fn submit_nomination(&self, user_id: i64, course_id: i64) -> WorkflowResult<Nomination> {
        self.get_user(user_id).await?;
        self.get_course(course_id).await?;

        let nomination = self
            .store
            .create_nomination(user_id, course_id)
            .await
            .map_err(|err| match err {
                DatabaseError::Duplicate => WorkflowError::Duplicate(format!(
                    "user {} is already nominated for course {}",
                    user_id, course_id
                )),
                other => other.into(),
            })?;

        info!(
            nomination_id = nomination.id,
            user_id, course_id, "Nomination submitted"
        );
        Ok(nomination)
    }

    // ── Decisions ───────────────────────────────────────────────────────

    pub async fn decide(
        &self,
        nomination_id: i64,
        actor: &Actor,
        action: Action,
        reason: Option<&str>,
    ) -> WorkflowResult<DecisionOutcome> {
        let nomination = self
            .store
            .get_nomination(nomination_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("nomination", nomination_id))?;

        let approver = self.get_user(actor.user_id).await?;
        if approver.role != actor.role {
            return Err(WorkflowError::Authorization(format!(
                "session role {} does not match role {} of user {}",
                actor.role, approver.role, approver.id
            )));
        }

        let transition = state_machine::plan(&nomination, actor, action, reason).map_err(|err| {
            warn!(
                nomination_id,
                user_id = actor.user_id,
                role = %actor.role,
                %action,
                error = %err,
                "Decision refused"
            );
            err
        })?;

        let entry = self.audit.entry(nomination_id, actor, &transition);
        let (nomination, log) = self
            .store
            .apply_transition(nomination_id, &transition.change, &entry)
            .await
            .map_err(|err| {
                if let DatabaseError::Conflict(ref message) = err {
                    warn!(nomination_id, %message, "Decision lost a concurrent race");
                }
                WorkflowError::from(err)
            })?;

        self.decisions.add(
            1,
            &[
                KeyValue::new("stage", transition.stage.as_str()),
                KeyValue::new("action", action.as_str()),
            ],
        );
        info!(
            nomination_id,
            stage = %transition.stage,
            %action,
            user_id = actor.user_id,
            role = %actor.role,
            status = %nomination.status,
            final_status = %nomination.final_status,
            "Nomination decided"
        );

        Ok(DecisionOutcome { nomination, log })
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub async fn get_nomination(
        &self,
        actor: &Actor,
        nomination_id: i64,
    ) -> WorkflowResult<NominationDetails> {
        let nomination = self
            .store
            .get_nomination(nomination_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("nomination", nomination_id))?;
        if !actor.is_approver() && nomination.user_id != actor.user_id {
            return Err(WorkflowError::Authorization(format!(
                "user {} cannot view nomination {}",
                actor.user_id, nomination_id
            )));
        }

        let nominee = self.get_user(nomination.user_id).await?;
        let course = self.get_course(nomination.course_id).await?;
        let history = self.audit.history(nomination_id).await?;

        Ok(NominationDetails {
            position: Position::of_nomination(&nomination),
            nomination,
            nominee,
            course,
            history,
        })
    }

    /// Employees only ever see their own nominations.
    pub async fn list_nominations(
        &self,
        actor: &Actor,
        mut filter: NominationFilter,
        page: PageRequest,
    ) -> WorkflowResult<Page<Nomination>> {
        page.validate()?;
        if !actor.is_approver() {
            filter.user_id = Some(actor.user_id);
        }
        Ok(self.store.list_nominations(&filter, page).await?)
    }

    pub async fn list_logs(
        &self,
        actor: &Actor,
        mut filter: ApprovalLogFilter,
        page: PageRequest,
    ) -> WorkflowResult<Page<ApprovalLog>> {
        page.validate()?;
        if !actor.is_approver() {
            filter.owner_id = Some(actor.user_id);
        }
        self.audit.list(&filter, page).await
    }

    pub async fn mark_nomination_read(
        &self,
        actor: &Actor,
        nomination_id: i64,
    ) -> WorkflowResult<Nomination> {
        if !actor.is_approver() {
            return Err(WorkflowError::Authorization(format!(
                "role {} cannot mark nominations as read",
                actor.role
            )));
        }
        self.store
            .mark_nomination_read(nomination_id)
            .await
            .map_err(not_found("nomination", nomination_id))
    }

    pub async fn mark_log_read(&self, actor: &Actor, log_id: i64) -> WorkflowResult<ApprovalLog> {
        self.audit.mark_read(log_id, actor).await
    }

    // ── Dashboards ──────────────────────────────────────────────────────

    pub async fn dashboard(&self, actor: &Actor, page: PageRequest) -> WorkflowResult<Dashboard> {
        page.validate()?;
        let stage = Stage::for_role(actor.role);
        let queue_filter = queue_filter(actor);
        let queue = self.store.list_nominations(&queue_filter, page).await?;

        let (new_requests_count, recent_decisions) = match stage {
            Some(stage) => {
                let unread = NominationFilter {
                    is_read: Some(false),
                    ..queue_filter
                };
                let unread = self
                    .store
                    .list_nominations(&unread, PageRequest::new(1, 1))
                    .await?;
                let history = ApprovalLogFilter {
                    role: Some(actor.role),
                    nomination_statuses: match stage {
                        Stage::EntryReview => Vec::new(),
                        _ => vec![NominationStatus::Approved, NominationStatus::Rejected],
                    },
                    ..Default::default()
                };
                (unread.total, self.audit.list(&history, PageRequest::default()).await?)
            }
            None => {
                let unread_logs = ApprovalLogFilter {
                    owner_id: Some(actor.user_id),
                    is_read: Some(false),
                    ..Default::default()
                };
                let logs = self.audit.list(&unread_logs, PageRequest::default()).await?;
                (logs.total, logs)
            }
        };

        Ok(Dashboard {
            role: actor.role,
            stage,
            queue,
            new_requests_count,
            recent_decisions,
        })
    }

    /// Marks every unread nomination in the actor's queue as read.
    pub async fn mark_queue_read(&self, actor: &Actor) -> WorkflowResult<Vec<Nomination>> {
        if !actor.is_approver() {
            return Err(WorkflowError::Authorization(format!(
                "role {} has no review queue",
                actor.role
            )));
        }
        let filter = NominationFilter {
            is_read: Some(false),
            ..queue_filter(actor)
        };
        let marked = self.store.mark_nominations_read(&filter).await?;
        info!(count = marked.len(), role = %actor.role, "Review queue marked as read");
        Ok(marked)
    }
}

fn queue_filter(actor: &Actor) -> NominationFilter {
    match Stage::for_role(actor.role) {
        Some(stage) => {
            let (status, final_status) = stage.source_state();
            NominationFilter::in_state(status, final_status)
        }
        None => NominationFilter {
            user_id: Some(actor.user_id),
            ..Default::default()
        },
    }
}
