use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{decide, get_nomination, list_nominations, mark_read, submit_nomination};
use crate::app_state::AppState;

pub fn nomination_routes() -> Router<AppState> {
    Router::new()
        .route("/nominations", get(list_nominations).post(submit_nomination))
        .route("/nominations/{id}", get(get_nomination))
        .route("/nominations/{id}/decision", post(decide))
        .route("/nominations/{id}/read", post(mark_read))
}
