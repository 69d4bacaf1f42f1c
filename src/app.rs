use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    app_state::AppState,
    middleware::{actor, language_middleware, observability_middleware},
    modules::{
        approval_logs::routes::approval_log_routes, courses::routes::course_routes,
        dashboard::routes::dashboard_routes, i18n::routes::create_i18n_routes,
        nominations::routes::nomination_routes, users::routes::user_routes,
    },
};

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.env.server.cors_allowed_origins);

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .nest("/i18n", create_i18n_routes())
        .merge(user_routes())
        .merge(course_routes())
        .merge(nomination_routes())
        .merge(approval_log_routes())
        .merge(dashboard_routes())
        .layer(middleware::from_fn_with_state(state.clone(), language_middleware))
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT_LANGUAGE,
            HeaderName::from_static("x-language"),
            HeaderName::from_static(actor::USER_ID_HEADER),
            HeaderName::from_static(actor::USER_ROLE_HEADER),
        ]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn hello(State(state): State<AppState>) -> String {
    format!("{} says hello!\n", state.env.app.name)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_status = match state.service.store().ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::info!("Store health check failed: {}", e);
            "unhealthy"
        }
    };

    let telemetry_health = crate::telemetry::telemetry_health_check();
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "store": store_status,
            "telemetry": telemetry_health
        }
    }))
}
