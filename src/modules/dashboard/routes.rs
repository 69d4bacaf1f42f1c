use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{dashboard, mark_all_read};
use crate::app_state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/read-all", post(mark_all_read))
}
