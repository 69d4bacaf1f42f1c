use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::app_state::AppState;
use crate::db::{CourseFilter, NewTrainingCourse, TrainingCourse};
use crate::error::AppResult;
use crate::modules::extractors::{extract_json, extract_path, extract_query};
use crate::workflow::Actor;

pub async fn list_courses(
    State(state): State<AppState>,
    filter: Result<Query<CourseFilter>, QueryRejection>,
) -> AppResult<Json<Vec<TrainingCourse>>> {
    let filter = extract_query(filter)?;
    Ok(Json(state.service.list_courses(&filter).await?))
}

pub async fn featured_courses(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TrainingCourse>>> {
    Ok(Json(state.service.featured_courses().await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    course_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<TrainingCourse>> {
    let course_id = extract_path(course_id)?;
    Ok(Json(state.service.get_course(course_id).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<NewTrainingCourse>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TrainingCourse>)> {
    let payload = extract_json(payload)?;
    let course = state.service.create_course(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}
