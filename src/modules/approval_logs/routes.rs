use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{list_logs, mark_read};
use crate::app_state::AppState;

pub fn approval_log_routes() -> Router<AppState> {
    Router::new()
        .route("/approval-logs", get(list_logs))
        .route("/approval-logs/{id}/read", post(mark_read))
}
