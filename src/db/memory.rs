use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

use super::error::DatabaseError;
use super::models::{
    ApprovalLog, ApprovalLogFilter, CourseFilter, FinalStatus, NewApprovalLog, NewTrainingCourse,
    NewUser, Nomination, NominationFilter, NominationStatus, Page, PageRequest, StateChange,
    TrainingCourse, UpdateUserProfile, User, UserRole,
};
use super::store::{Store, StoreResult};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    courses: BTreeMap<i64, TrainingCourse>,
    nominations: BTreeMap<i64, Nomination>,
    approval_logs: BTreeMap<i64, ApprovalLog>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn log_matches(&self, log: &ApprovalLog, filter: &ApprovalLogFilter) -> bool {
        if filter.nomination_id.is_some_and(|id| id != log.nomination_id)
            || filter.role.is_some_and(|role| role != log.role)
            || filter.is_read.is_some_and(|read| read != log.is_read)
        {
            return false;
        }
        if filter.owner_id.is_none() && filter.nomination_statuses.is_empty() {
            return true;
        }
        let Some(nomination) = self.nominations.get(&log.nomination_id) else {
            return false;
        };
        filter.owner_id.map_or(true, |owner| owner == nomination.user_id)
            && (filter.nomination_statuses.is_empty()
                || filter.nomination_statuses.contains(&nomination.status))
    }
}

/// In-process store guarded by a single mutex, so every operation is
/// serialisable. Used by tests and by `STORAGE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::TransactionError("memory store lock poisoned".to_string()))
    }
}

fn sort_newest_first(nominations: &mut [Nomination]) {
    nominations.sort_by(|a, b| {
        b.submission_date
            .cmp(&a.submission_date)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    async fn create_user(&self, new_user: &NewUser, role: UserRole) -> StoreResult<User> {
        let mut tables = self.lock()?;
        let email = new_user.email.to_lowercase();
        let taken = tables.users.values().any(|u| {
            u.email == email
                || u.national_id == new_user.national_id
                || (new_user.job_number.is_some() && u.job_number == new_user.job_number)
        });
        if taken {
            return Err(DatabaseError::Duplicate);
        }

        let user = User {
            id: tables.next_id(),
            full_name: new_user.full_name.clone(),
            national_id: new_user.national_id.clone(),
            email,
            phone_number: new_user.phone_number.clone(),
            job_number: new_user.job_number.clone(),
            qualification: new_user.qualification.clone(),
            specialization: new_user.specialization.clone(),
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn update_user_profile(
        &self,
        user_id: i64,
        update: &UpdateUserProfile,
    ) -> StoreResult<User> {
        let mut tables = self.lock()?;
        let user = tables.users.get_mut(&user_id).ok_or(DatabaseError::NotFound)?;
        if let Some(full_name) = &update.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(phone_number) = &update.phone_number {
            user.phone_number = Some(phone_number.clone());
        }
        Ok(user.clone())
    }

    async fn create_course(&self, new_course: &NewTrainingCourse) -> StoreResult<TrainingCourse> {
        let mut tables = self.lock()?;
        let course = TrainingCourse {
            id: tables.next_id(),
            course_title: new_course.course_title.clone(),
            region: new_course.region.clone(),
            delivery_mode: new_course.delivery_mode.clone(),
            start_date: new_course.start_date,
            duration_days: new_course.duration_days,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: i64) -> StoreResult<Option<TrainingCourse>> {
        Ok(self.lock()?.courses.get(&course_id).cloned())
    }

    async fn list_courses(&self, filter: &CourseFilter) -> StoreResult<Vec<TrainingCourse>> {
        let tables = self.lock()?;
        let mut courses: Vec<TrainingCourse> = tables
            .courses
            .values()
            .filter(|c| {
                filter
                    .delivery_mode
                    .as_ref()
                    .map_or(true, |mode| c.delivery_mode.as_ref() == Some(mode))
                    && filter
                        .region
                        .as_ref()
                        .map_or(true, |region| c.region.as_ref() == Some(region))
            })
            .cloned()
            .collect();
        // `None` sorts before `Some`, so undated courses are moved to the end.
        courses.sort_by(|a, b| {
            (a.start_date.is_none(), a.start_date, a.id).cmp(&(
                b.start_date.is_none(),
                b.start_date,
                b.id,
            ))
        });
        if let Some(limit) = filter.limit {
            courses.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(courses)
    }

    async fn create_nomination(&self, user_id: i64, course_id: i64) -> StoreResult<Nomination> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) || !tables.courses.contains_key(&course_id) {
            return Err(DatabaseError::InvalidInput(
                "nomination references a missing user or course".to_string(),
            ));
        }
        if tables
            .nominations
            .values()
            .any(|n| n.user_id == user_id && n.course_id == course_id)
        {
            return Err(DatabaseError::Duplicate);
        }

        let nomination = Nomination {
            id: tables.next_id(),
            user_id,
            course_id,
            status: NominationStatus::Pending,
            final_status: FinalStatus::Draft,
            rejection_reason: None,
            is_read: false,
            submission_date: OffsetDateTime::now_utc(),
        };
        tables.nominations.insert(nomination.id, nomination.clone());
        Ok(nomination)
    }

    async fn get_nomination(&self, nomination_id: i64) -> StoreResult<Option<Nomination>> {
        Ok(self.lock()?.nominations.get(&nomination_id).cloned())
    }

    async fn list_nominations(
        &self,
        filter: &NominationFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Nomination>> {
        let tables = self.lock()?;
        let mut matching: Vec<Nomination> = tables
            .nominations
            .values()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(Page::from_sorted(matching, page))
    }

    async fn mark_nomination_read(&self, nomination_id: i64) -> StoreResult<Nomination> {
        let mut tables = self.lock()?;
        let nomination = tables
            .nominations
            .get_mut(&nomination_id)
            .ok_or(DatabaseError::NotFound)?;
        nomination.is_read = true;
        Ok(nomination.clone())
    }

    async fn mark_nominations_read(
        &self,
        filter: &NominationFilter,
    ) -> StoreResult<Vec<Nomination>> {
        let mut tables = self.lock()?;
        let mut marked = Vec::new();
        for nomination in tables.nominations.values_mut() {
            if !nomination.is_read && filter.matches(nomination) {
                nomination.is_read = true;
                marked.push(nomination.clone());
            }
        }
        sort_newest_first(&mut marked);
        Ok(marked)
    }

    async fn apply_transition(
        &self,
        nomination_id: i64,
        change: &StateChange,
        log: &NewApprovalLog,
    ) -> StoreResult<(Nomination, ApprovalLog)> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&log.approved_by) {
            return Err(DatabaseError::InvalidInput(
                "approval log references a missing approver".to_string(),
            ));
        }
        let current = tables
            .nominations
            .get(&nomination_id)
            .ok_or(DatabaseError::NotFound)?;
        if current.state() != change.expected {
            return Err(DatabaseError::Conflict(format!(
                "nomination {} is {}/{}, expected {}/{}",
                nomination_id,
                current.status,
                current.final_status,
                change.expected.0,
                change.expected.1
            )));
        }

        let log_id = tables.next_id();
        let nomination = tables
            .nominations
            .get_mut(&nomination_id)
            .ok_or(DatabaseError::NotFound)?;
        nomination.status = change.status;
        nomination.final_status = change.final_status;
        nomination.rejection_reason = change.rejection_reason.clone();
        // Unread again for whichever queue it lands in.
        nomination.is_read = false;
        let nomination = nomination.clone();

        let entry = ApprovalLog {
            id: log_id,
            nomination_id,
            approved_by: Some(log.approved_by),
            role: log.role,
            status: log.status,
            notes: Some(log.notes.clone()),
            timestamp: log.timestamp,
            is_read: false,
        };
        tables.approval_logs.insert(entry.id, entry.clone());
        Ok((nomination, entry))
    }

    async fn get_approval_log(&self, log_id: i64) -> StoreResult<Option<ApprovalLog>> {
        Ok(self.lock()?.approval_logs.get(&log_id).cloned())
    }

    async fn list_approval_logs(
        &self,
        filter: &ApprovalLogFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ApprovalLog>> {
        let tables = self.lock()?;
        let mut matching: Vec<ApprovalLog> = tables
            .approval_logs
            .values()
            .filter(|log| tables.log_matches(log, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(Page::from_sorted(matching, page))
    }

    async fn nomination_history(&self, nomination_id: i64) -> StoreResult<Vec<ApprovalLog>> {
        let tables = self.lock()?;
        let mut history: Vec<ApprovalLog> = tables
            .approval_logs
            .values()
            .filter(|log| log.nomination_id == nomination_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(history)
    }

    async fn mark_approval_log_read(&self, log_id: i64) -> StoreResult<ApprovalLog> {
        let mut tables = self.lock()?;
        let log = tables
            .approval_logs
            .get_mut(&log_id)
            .ok_or(DatabaseError::NotFound)?;
        log.is_read = true;
        Ok(log.clone())
    }

    async fn latest_log_timestamp(&self) -> StoreResult<Option<OffsetDateTime>> {
        Ok(self
            .lock()?
            .approval_logs
            .values()
            .map(|log| log.timestamp)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn new_user(national_id: &str, email: &str) -> NewUser {
        NewUser {
            full_name: "Test User".to_string(),
            national_id: national_id.to_string(),
            email: email.to_string(),
            phone_number: None,
            job_number: Some(format!("J-{}", national_id)),
            qualification: None,
            specialization: None,
            role: None,
        }
    }

    fn new_course(title: &str, start_date: Option<time::Date>) -> NewTrainingCourse {
        NewTrainingCourse {
            course_title: title.to_string(),
            region: Some("Riyadh".to_string()),
            delivery_mode: Some("online".to_string()),
            start_date,
            duration_days: 3,
        }
    }

    #[tokio::test]
    async fn test_duplicate_user_fields_are_rejected() {
        let store = MemoryStore::new();
        store
            .create_user(&new_user("100", "a@example.com"), UserRole::Employee)
            .await
            .unwrap();

        let same_email = store
            .create_user(&new_user("101", "A@Example.com"), UserRole::Employee)
            .await;
        assert!(matches!(same_email, Err(DatabaseError::Duplicate)));

        let same_national_id = store
            .create_user(&new_user("100", "b@example.com"), UserRole::Employee)
            .await;
        assert!(matches!(same_national_id, Err(DatabaseError::Duplicate)));
    }

    #[tokio::test]
    async fn test_courses_sorted_by_start_date_with_undated_last() {
        let store = MemoryStore::new();
        store.create_course(&new_course("undated", None)).await.unwrap();
        store
            .create_course(&new_course("later", Some(date!(2025 - 06 - 01))))
            .await
            .unwrap();
        store
            .create_course(&new_course("sooner", Some(date!(2025 - 02 - 01))))
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_courses(&CourseFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.course_title)
            .collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);

        let limited = store
            .list_courses(&CourseFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_transition_is_a_conflict() {
        let store = MemoryStore::new();
        let user = store
            .create_user(&new_user("200", "c@example.com"), UserRole::Employee)
            .await
            .unwrap();
        let course = store.create_course(&new_course("c", None)).await.unwrap();
        let nomination = store.create_nomination(user.id, course.id).await.unwrap();

        let change = StateChange {
            expected: (NominationStatus::Approved, FinalStatus::Draft),
            status: NominationStatus::Approved,
            final_status: FinalStatus::Approved,
            rejection_reason: None,
        };
        let log = NewApprovalLog {
            nomination_id: nomination.id,
            approved_by: user.id,
            role: UserRole::Hr,
            status: crate::db::LogStatus::Approved,
            notes: "n".to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };

        let result = store.apply_transition(nomination.id, &change, &log).await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
        assert!(store.nomination_history(nomination.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pagination_and_read_filters() {
        let store = MemoryStore::new();
        let user = store
            .create_user(&new_user("300", "d@example.com"), UserRole::Employee)
            .await
            .unwrap();
        for i in 0..5 {
            let course = store
                .create_course(&new_course(&format!("c{}", i), None))
                .await
                .unwrap();
            store.create_nomination(user.id, course.id).await.unwrap();
        }

        let filter = NominationFilter::in_state(NominationStatus::Pending, FinalStatus::Draft);
        let page = store
            .list_nominations(&filter, PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);

        let beyond = store
            .list_nominations(&filter, PageRequest::new(9, 2))
            .await
            .unwrap();
        assert!(beyond.items.is_empty());

        let marked = store.mark_nominations_read(&filter).await.unwrap();
        assert_eq!(marked.len(), 5);
        let unread = NominationFilter {
            is_read: Some(false),
            ..Default::default()
        };
        let remaining = store
            .list_nominations(&unread, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(remaining.total, 0);
    }
}
