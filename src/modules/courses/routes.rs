use axum::{routing::get, Router};

use super::handlers::{create_course, featured_courses, get_course, list_courses};
use crate::app_state::AppState;

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/featured", get(featured_courses))
        .route("/courses/{id}", get(get_course))
}
