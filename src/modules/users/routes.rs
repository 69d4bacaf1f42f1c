use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{current_user, get_user, provision, register, update_current_user};
use crate::app_state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(current_user).patch(update_current_user))
        .route("/users/{id}", get(get_user))
        .route("/admin/users", post(provision))
}
