use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use super::error::DatabaseError;
use super::models::{
    ApprovalLog, ApprovalLogFilter, CourseFilter, NewApprovalLog, NewTrainingCourse, NewUser,
    Nomination, NominationFilter, Page, PageRequest, StateChange, TrainingCourse,
    UpdateUserProfile, User, UserRole,
};
use super::store::{Store, StoreResult};

const USER_COLUMNS: &str = "id, full_name, national_id, email, phone_number, job_number, \
     qualification, specialization, role, created_at";
const COURSE_COLUMNS: &str =
    "id, course_title, region, delivery_mode, start_date, duration_days, created_at";
const NOMINATION_COLUMNS: &str = "id, user_id, course_id, status, final_status, \
     rejection_reason, is_read, submission_date";
const LOG_COLUMNS: &str = "l.id, l.nomination_id, l.approved_by, l.role, l.status, l.notes, \
     l.timestamp, l.is_read";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_nomination_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &NominationFilter) {
    builder.push(" WHERE TRUE");
    if !filter.statuses.is_empty() {
        builder.push(" AND status IN (");
        let mut values = builder.separated(", ");
        for status in &filter.statuses {
            values.push_bind(*status);
        }
        values.push_unseparated(")");
    }
    if !filter.final_statuses.is_empty() {
        builder.push(" AND final_status IN (");
        let mut values = builder.separated(", ");
        for final_status in &filter.final_statuses {
            values.push_bind(*final_status);
        }
        values.push_unseparated(")");
    }
    if let Some(is_read) = filter.is_read {
        builder.push(" AND is_read = ").push_bind(is_read);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(course_id) = filter.course_id {
        builder.push(" AND course_id = ").push_bind(course_id);
    }
}

fn push_log_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ApprovalLogFilter) {
    builder.push(" FROM approval_logs l JOIN nominations n ON n.id = l.nomination_id WHERE TRUE");
    if let Some(nomination_id) = filter.nomination_id {
        builder.push(" AND l.nomination_id = ").push_bind(nomination_id);
    }
    if let Some(role) = filter.role {
        builder.push(" AND l.role = ").push_bind(role);
    }
    if let Some(is_read) = filter.is_read {
        builder.push(" AND l.is_read = ").push_bind(is_read);
    }
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND n.user_id = ").push_bind(owner_id);
    }
    if !filter.nomination_statuses.is_empty() {
        builder.push(" AND n.status IN (");
        let mut values = builder.separated(", ");
        for status in &filter.nomination_statuses {
            values.push_bind(*status);
        }
        values.push_unseparated(")");
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new_user: &NewUser, role: UserRole) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (full_name, national_id, email, phone_number, job_number, \
             qualification, specialization, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.full_name)
            .bind(&new_user.national_id)
            .bind(new_user.email.to_lowercase())
            .bind(&new_user.phone_number)
            .bind(&new_user.job_number)
            .bind(&new_user.qualification)
            .bind(&new_user.specialization)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: i64,
        update: &UpdateUserProfile,
    ) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET \
                 full_name = COALESCE($1, full_name), \
                 phone_number = COALESCE($2, phone_number) \
             WHERE id = $3 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&update.full_name)
            .bind(&update.phone_number)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound)?;
        Ok(user)
    }

    async fn create_course(&self, new_course: &NewTrainingCourse) -> StoreResult<TrainingCourse> {
        let sql = format!(
            "INSERT INTO training_courses (course_title, region, delivery_mode, start_date, duration_days) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, TrainingCourse>(&sql)
            .bind(&new_course.course_title)
            .bind(&new_course.region)
            .bind(&new_course.delivery_mode)
            .bind(new_course.start_date)
            .bind(new_course.duration_days)
            .fetch_one(&self.pool)
            .await?;
        Ok(course)
    }

    async fn get_course(&self, course_id: i64) -> StoreResult<Option<TrainingCourse>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM training_courses WHERE id = $1");
        let course = sqlx::query_as::<_, TrainingCourse>(&sql)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn list_courses(&self, filter: &CourseFilter) -> StoreResult<Vec<TrainingCourse>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(COURSE_COLUMNS).push(" FROM training_courses WHERE TRUE");
        if let Some(mode) = &filter.delivery_mode {
            builder.push(" AND delivery_mode = ").push_bind(mode.clone());
        }
        if let Some(region) = &filter.region {
            builder.push(" AND region = ").push_bind(region.clone());
        }
        builder.push(" ORDER BY start_date ASC NULLS LAST, id ASC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        let courses = builder
            .build_query_as::<TrainingCourse>()
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn create_nomination(&self, user_id: i64, course_id: i64) -> StoreResult<Nomination> {
        let mut tx = self.pool.begin().await?;

        // Submission-time check; the unique index covers concurrent submitters.
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM nominations WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(DatabaseError::Duplicate);
        }

        let sql = format!(
            "INSERT INTO nominations (user_id, course_id, status, final_status) \
             VALUES ($1, $2, 'pending', 'draft') RETURNING {NOMINATION_COLUMNS}"
        );
        let nomination = sqlx::query_as::<_, Nomination>(&sql)
            .bind(user_id)
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(nomination)
    }

    async fn get_nomination(&self, nomination_id: i64) -> StoreResult<Option<Nomination>> {
        let sql = format!("SELECT {NOMINATION_COLUMNS} FROM nominations WHERE id = $1");
        let nomination = sqlx::query_as::<_, Nomination>(&sql)
            .bind(nomination_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(nomination)
    }

    async fn list_nominations(
        &self,
        filter: &NominationFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Nomination>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM nominations");
        push_nomination_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(NOMINATION_COLUMNS).push(" FROM nominations");
        push_nomination_filter(&mut select, filter);
        select
            .push(" ORDER BY submission_date DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = select
            .build_query_as::<Nomination>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn mark_nomination_read(&self, nomination_id: i64) -> StoreResult<Nomination> {
        let sql = format!(
            "UPDATE nominations SET is_read = TRUE WHERE id = $1 RETURNING {NOMINATION_COLUMNS}"
        );
        sqlx::query_as::<_, Nomination>(&sql)
            .bind(nomination_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    async fn mark_nominations_read(
        &self,
        filter: &NominationFilter,
    ) -> StoreResult<Vec<Nomination>> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE nominations SET is_read = TRUE");
        push_nomination_filter(&mut builder, filter);
        builder
            .push(" AND is_read = FALSE RETURNING ")
            .push(NOMINATION_COLUMNS);
        let mut marked = builder
            .build_query_as::<Nomination>()
            .fetch_all(&self.pool)
            .await?;
        marked.sort_by(|a, b| {
            b.submission_date
                .cmp(&a.submission_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(marked)
    }

    async fn apply_transition(
        &self,
        nomination_id: i64,
        change: &StateChange,
        log: &NewApprovalLog,
    ) -> StoreResult<(Nomination, ApprovalLog)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE nominations \
             SET status = $1, final_status = $2, rejection_reason = $3, is_read = FALSE \
             WHERE id = $4 AND status = $5 AND final_status = $6 \
             RETURNING {NOMINATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Nomination>(&sql)
            .bind(change.status)
            .bind(change.final_status)
            .bind(&change.rejection_reason)
            .bind(nomination_id)
            .bind(change.expected.0)
            .bind(change.expected.1)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(nomination) = updated else {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM nominations WHERE id = $1")
                    .bind(nomination_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => DatabaseError::Conflict(format!(
                    "nomination {} is no longer {}/{}",
                    nomination_id, change.expected.0, change.expected.1
                )),
                None => DatabaseError::NotFound,
            });
        };

        let entry = sqlx::query_as::<_, ApprovalLog>(
            "INSERT INTO approval_logs AS l (nomination_id, approved_by, role, status, notes, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING l.id, l.nomination_id, l.approved_by, l.role, l.status, l.notes, l.timestamp, l.is_read",
        )
        .bind(log.nomination_id)
        .bind(log.approved_by)
        .bind(log.role)
        .bind(log.status)
        .bind(&log.notes)
        .bind(log.timestamp)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((nomination, entry))
    }

    async fn get_approval_log(&self, log_id: i64) -> StoreResult<Option<ApprovalLog>> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM approval_logs l WHERE l.id = $1");
        let log = sqlx::query_as::<_, ApprovalLog>(&sql)
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(log)
    }

    async fn list_approval_logs(
        &self,
        filter: &ApprovalLogFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ApprovalLog>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_log_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(LOG_COLUMNS);
        push_log_filter(&mut select, filter);
        select
            .push(" ORDER BY l.timestamp DESC, l.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = select
            .build_query_as::<ApprovalLog>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn nomination_history(&self, nomination_id: i64) -> StoreResult<Vec<ApprovalLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM approval_logs l \
             WHERE l.nomination_id = $1 ORDER BY l.timestamp ASC, l.id ASC"
        );
        let history = sqlx::query_as::<_, ApprovalLog>(&sql)
            .bind(nomination_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(history)
    }

    async fn mark_approval_log_read(&self, log_id: i64) -> StoreResult<ApprovalLog> {
        let sql = format!(
            "UPDATE approval_logs AS l SET is_read = TRUE WHERE l.id = $1 RETURNING {LOG_COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalLog>(&sql)
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    async fn latest_log_timestamp(&self) -> StoreResult<Option<OffsetDateTime>> {
        let latest = sqlx::query_scalar::<_, Option<OffsetDateTime>>(
            "SELECT MAX(timestamp) FROM approval_logs",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }
}
