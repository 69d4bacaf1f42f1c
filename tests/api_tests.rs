use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nominations_backend::app::create_router;
use nominations_backend::app_state::AppState;
use nominations_backend::config::Config;
use nominations_backend::db::{MemoryStore, NewUser, Store, UserRole};
use nominations_backend::i18n::{init_i18n, SupportedLanguage};

struct TestApp {
    router: Router,
    admin: i64,
    hr: i64,
    entry: i64,
}

fn new_user(tag: &str) -> NewUser {
    NewUser {
        full_name: format!("User {}", tag),
        national_id: format!("NID-{}", tag),
        email: format!("{}@example.com", tag),
        phone_number: None,
        job_number: Some(format!("JOB-{}", tag)),
        qualification: None,
        specialization: None,
        role: None,
    }
}

async fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let admin = store.create_user(&new_user("admin"), UserRole::Admin).await.unwrap();
    let hr = store.create_user(&new_user("hr"), UserRole::Hr).await.unwrap();
    let entry = store.create_user(&new_user("entry"), UserRole::Entry).await.unwrap();

    let localizer = init_i18n(SupportedLanguage::Arabic).unwrap();
    let state = AppState::new(store, Config::default(), Arc::new(localizer));

    TestApp {
        router: create_router(state),
        admin: admin.id,
        hr: hr.id,
        entry: entry.id,
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, actor: Option<(i64, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-language", "en");
    if let Some((user_id, role)) = actor {
        builder = builder
            .header("x-user-id", user_id.to_string())
            .header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn register_employee(app: &TestApp, tag: &str) -> i64 {
    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/users",
            None,
            Some(json!({
                "full_name": format!("Employee {}", tag),
                "national_id": format!("E-{}", tag),
                "email": format!("{}@example.com", tag),
                "job_number": format!("J-{}", tag),
                "role": "admin"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = body_json(resp).await;
    // Self-registration ignores the requested role.
    assert_eq!(user["role"], "employee");
    user["id"].as_i64().unwrap()
}

async fn create_course(app: &TestApp) -> i64 {
    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/courses",
            Some((app.hr, "hr")),
            Some(json!({
                "course_title": "Fire safety",
                "region": "Jeddah",
                "delivery_mode": "remote",
                "start_date": "2026-11-02",
                "duration_days": 3
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["services"]["store"], "healthy");
}

#[tokio::test]
async fn test_decision_pipeline_over_http() {
    let app = test_app().await;
    let employee = register_employee(&app, "sara").await;
    let course = create_course(&app).await;

    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/nominations",
            Some((employee, "employee")),
            Some(json!({ "course_id": course })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let nomination = body_json(resp).await;
    assert_eq!(nomination["status"], "pending");
    assert_eq!(nomination["final_status"], "draft");
    assert_eq!(nomination["status_label"], "Pending");
    let id = nomination["id"].as_i64().unwrap();

    let decisions = [
        ((app.admin, "admin"), "approved", "draft"),
        ((app.hr, "hr"), "approved", "approved"),
        ((app.entry, "entry"), "approved", "submitted"),
    ];
    for (actor, status, final_status) in decisions {
        let resp = app
            .router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/nominations/{}/decision", id),
                Some(actor),
                Some(json!({ "action": "approve" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let outcome = body_json(resp).await;
        assert_eq!(outcome["nomination"]["status"], status);
        assert_eq!(outcome["nomination"]["final_status"], final_status);
        assert_eq!(outcome["log"]["role"], actor.1);
    }

    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/nominations/{}/decision", id),
            Some((app.entry, "entry")),
            Some(json!({ "action": "approve" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let error = body_json(resp).await;
    assert_eq!(error["error"]["code"], "conflict");

    let resp = app
        .router
        .oneshot(request(
            "GET",
            &format!("/nominations/{}", id),
            Some((employee, "employee")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let details = body_json(resp).await;
    assert_eq!(details["history"].as_array().unwrap().len(), 3);
    assert_eq!(details["position"]["kind"], "submitted");
}

#[tokio::test]
async fn test_duplicate_submission_is_conflict() {
    let app = test_app().await;
    let employee = register_employee(&app, "omar").await;
    let course = create_course(&app).await;

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let resp = app
            .router
            .clone()
            .oneshot(request(
                "POST",
                "/nominations",
                Some((employee, "employee")),
                Some(json!({ "course_id": course })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::CONFLICT {
            assert_eq!(body_json(resp).await["error"]["code"], "duplicate");
        }
    }
}

#[tokio::test]
async fn test_wrong_stage_is_forbidden() {
    let app = test_app().await;
    let employee = register_employee(&app, "lina").await;
    let course = create_course(&app).await;
    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/nominations",
            Some((employee, "employee")),
            Some(json!({ "course_id": course })),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .router
        .oneshot(request(
            "POST",
            &format!("/nominations/{}/decision", id),
            Some((app.hr, "hr")),
            Some(json!({ "action": "reject", "reason": "too early" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_actor_headers_are_unauthorized() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request("GET", "/dashboard", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"]["code"], "authentication");
}

#[tokio::test]
async fn test_error_messages_follow_request_language() {
    let app = test_app().await;

    let english = app
        .router
        .clone()
        .oneshot(request("GET", "/courses/999", None, None))
        .await
        .unwrap();
    assert_eq!(english.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(english).await["error"]["message"],
        "The requested record was not found."
    );

    let arabic = Request::builder()
        .uri("/courses/999")
        .header("accept-language", "ar-SA,en;q=0.5")
        .body(Body::empty())
        .unwrap();
    let arabic = app.router.oneshot(arabic).await.unwrap();
    assert_eq!(
        arabic.headers().get("content-language").unwrap(),
        "ar"
    );
    assert_eq!(
        body_json(arabic).await["error"]["message"],
        "السجل المطلوب غير موجود."
    );
}

#[tokio::test]
async fn test_courses_listing_and_featured() {
    let app = test_app().await;
    for _ in 0..4 {
        create_course(&app).await;
    }

    let resp = app
        .router
        .clone()
        .oneshot(request("GET", "/courses?delivery_mode=remote", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 4);

    let resp = app
        .router
        .oneshot(request("GET", "/courses/featured", None, None))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_dashboard_and_read_all() {
    let app = test_app().await;
    let employee = register_employee(&app, "huda").await;
    let course = create_course(&app).await;
    app.router
        .clone()
        .oneshot(request(
            "POST",
            "/nominations",
            Some((employee, "employee")),
            Some(json!({ "course_id": course })),
        ))
        .await
        .unwrap();

    let resp = app
        .router
        .clone()
        .oneshot(request("GET", "/dashboard", Some((app.admin, "admin")), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let dashboard = body_json(resp).await;
    assert_eq!(dashboard["stage"], "manager_review");
    assert_eq!(dashboard["new_requests_count"], 1);
    assert_eq!(dashboard["new_requests_label"], "One new request");

    let resp = app
        .router
        .clone()
        .oneshot(request("POST", "/dashboard/read-all", Some((app.admin, "admin")), None))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

    let resp = app
        .router
        .oneshot(request("GET", "/dashboard", Some((app.admin, "admin")), None))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["new_requests_count"], 0);
}

#[tokio::test]
async fn test_invalid_pagination_is_rejected() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request(
            "GET",
            "/nominations?page=0",
            Some((app.admin, "admin")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "validation");
}

#[tokio::test]
async fn test_unknown_action_is_a_json_bad_request() {
    let app = test_app().await;
    let employee = register_employee(&app, "nour").await;
    let course = create_course(&app).await;
    let resp = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/nominations",
            Some((employee, "employee")),
            Some(json!({ "course_id": course })),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .router
        .oneshot(request(
            "POST",
            &format!("/nominations/{}/decision", id),
            Some((app.admin, "admin")),
            Some(json!({ "action": "submit" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    let error = body_json(resp).await;
    assert_eq!(error["error"]["code"], "bad_request");
    assert_eq!(
        error["error"]["message"],
        "The request could not be understood."
    );
}

#[tokio::test]
async fn test_unknown_status_filter_is_a_json_bad_request() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request(
            "GET",
            "/nominations?status=pendng",
            Some((app.admin, "admin")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_non_numeric_id_is_a_json_bad_request() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request("GET", "/courses/abc", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_blank_course_title_is_rejected() {
    let app = test_app().await;
    let resp = app
        .router
        .oneshot(request(
            "POST",
            "/courses",
            Some((app.hr, "hr")),
            Some(json!({ "course_title": "   ", "duration_days": 2 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "validation");
}
