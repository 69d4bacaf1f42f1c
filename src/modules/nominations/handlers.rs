use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::db::{FinalStatus, NominationFilter, NominationStatus, Page, PageRequest, TrainingCourse};
use crate::error::AppResult;
use crate::i18n::I18n;
use crate::modules::extractors::{extract_json, extract_path, extract_query};
use crate::modules::views::{ApprovalLogView, DecisionView, NominationView, UserView};
use crate::workflow::{Action, Actor, Position};

#[derive(Debug, Deserialize)]
pub struct SubmitNominationRequest {
    pub course_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: Action,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominationQuery {
    pub status: Option<NominationStatus>,
    pub final_status: Option<FinalStatus>,
    pub is_read: Option<bool>,
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
}

impl From<NominationQuery> for NominationFilter {
    fn from(query: NominationQuery) -> Self {
        NominationFilter {
            statuses: query.status.into_iter().collect(),
            final_statuses: query.final_status.into_iter().collect(),
            is_read: query.is_read,
            user_id: query.user_id,
            course_id: query.course_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NominationDetailsView {
    pub nomination: NominationView,
    pub position: Position,
    pub nominee: UserView,
    pub course: TrainingCourse,
    pub history: Vec<ApprovalLogView>,
}

/// Nominates the current user for a course.
pub async fn submit_nomination(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    payload: Result<Json<SubmitNominationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<NominationView>)> {
    let payload = extract_json(payload)?;
    let nomination = state
        .service
        .submit_nomination(actor.user_id, payload.course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(NominationView::new(nomination, &i18n))))
}

pub async fn list_nominations(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    query: Result<Query<NominationQuery>, QueryRejection>,
    page: Result<Query<PageRequest>, QueryRejection>,
) -> AppResult<Json<Page<NominationView>>> {
    let query = extract_query(query)?;
    let page = extract_query(page)?;
    let nominations = state
        .service
        .list_nominations(&actor, query.into(), page)
        .await?;
    Ok(Json(nominations.map(|n| NominationView::new(n, &i18n))))
}

pub async fn get_nomination(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    nomination_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<NominationDetailsView>> {
    let nomination_id = extract_path(nomination_id)?;
    let details = state.service.get_nomination(&actor, nomination_id).await?;
    Ok(Json(NominationDetailsView {
        nomination: NominationView::new(details.nomination, &i18n),
        position: details.position,
        nominee: UserView::new(details.nominee, &i18n),
        course: details.course,
        history: details
            .history
            .into_iter()
            .map(|log| ApprovalLogView::new(log, &i18n))
            .collect(),
    }))
}

/// Approve or reject at the actor's stage.
pub async fn decide(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    nomination_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> AppResult<Json<DecisionView>> {
    let nomination_id = extract_path(nomination_id)?;
    let payload = extract_json(payload)?;
    let outcome = state
        .service
        .decide(nomination_id, &actor, payload.action, payload.reason.as_deref())
        .await?;
    Ok(Json(DecisionView::new(outcome, &i18n)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    nomination_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<NominationView>> {
    let nomination_id = extract_path(nomination_id)?;
    let nomination = state
        .service
        .mark_nomination_read(&actor, nomination_id)
        .await?;
    Ok(Json(NominationView::new(nomination, &i18n)))
}
