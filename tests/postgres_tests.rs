//! Runs against a real database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use nominations_backend::config::{DatabaseConfig, StorageBackend};
use nominations_backend::db::{
    init_pool, DatabaseError, FinalStatus, LogStatus, NewApprovalLog, NewTrainingCourse, NewUser,
    NominationStatus, PgStore, StateChange, Store, UserRole,
};
use time::OffsetDateTime;

async fn store() -> PgStore {
    let config = DatabaseConfig {
        backend: StorageBackend::Postgres,
        url: std::env::var("DATABASE_URL").ok(),
        max_connections: Some(2),
        min_connections: Some(1),
    };
    PgStore::new(init_pool(&config).await.unwrap())
}

fn manager_approval() -> StateChange {
    StateChange {
        expected: (NominationStatus::Pending, FinalStatus::Draft),
        status: NominationStatus::Approved,
        final_status: FinalStatus::Draft,
        rejection_reason: None,
    }
}

fn log_entry(nomination_id: i64, approved_by: i64) -> NewApprovalLog {
    NewApprovalLog {
        nomination_id,
        approved_by,
        role: UserRole::Manager,
        status: LogStatus::Approved,
        notes: "approved".to_string(),
        timestamp: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_conditional_transition_applies_once() {
    let store = store().await;
    let tag = uuid::Uuid::now_v7().simple().to_string();
    let short = &tag[tag.len() - 12..];

    let manager = store
        .create_user(
            &NewUser {
                full_name: "Manager".to_string(),
                national_id: format!("M{}", short),
                email: format!("manager-{}@example.com", tag),
                phone_number: None,
                job_number: Some(format!("M-{}", tag)),
                qualification: None,
                specialization: None,
                role: None,
            },
            UserRole::Manager,
        )
        .await
        .unwrap();
    let course = store
        .create_course(&NewTrainingCourse {
            course_title: format!("Course {}", tag),
            region: None,
            delivery_mode: None,
            start_date: None,
            duration_days: 1,
        })
        .await
        .unwrap();
    let nomination = store.create_nomination(manager.id, course.id).await.unwrap();

    let (updated, log) = store
        .apply_transition(nomination.id, &manager_approval(), &log_entry(nomination.id, manager.id))
        .await
        .unwrap();
    assert_eq!(updated.state(), (NominationStatus::Approved, FinalStatus::Draft));
    assert!(!updated.is_read);
    assert_eq!(log.nomination_id, nomination.id);

    let stale = store
        .apply_transition(nomination.id, &manager_approval(), &log_entry(nomination.id, manager.id))
        .await;
    assert!(matches!(stale, Err(DatabaseError::Conflict(_))));
    assert_eq!(store.nomination_history(nomination.id).await.unwrap().len(), 1);

    let missing = store
        .apply_transition(i64::MAX, &manager_approval(), &log_entry(i64::MAX, manager.id))
        .await;
    assert!(matches!(missing, Err(DatabaseError::NotFound)));

    let duplicate = store.create_nomination(manager.id, course.id).await;
    assert!(matches!(duplicate, Err(DatabaseError::Duplicate)));
}
