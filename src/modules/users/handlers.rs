use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::app_state::AppState;
use crate::db::{NewUser, UpdateUserProfile};
use crate::error::AppResult;
use crate::i18n::I18n;
use crate::modules::extractors::{extract_json, extract_path};
use crate::modules::views::UserView;
use crate::workflow::Actor;

/// Public self-registration; the account is always an employee.
pub async fn register(
    State(state): State<AppState>,
    i18n: I18n,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let mut payload = extract_json(payload)?;
    payload.role = None;
    let user = state.service.create_user(None, payload).await?;
    Ok((StatusCode::CREATED, Json(UserView::new(user, &i18n))))
}

/// Account provisioning by an admin, with any role.
pub async fn provision(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let payload = extract_json(payload)?;
    let user = state.service.create_user(Some(&actor), payload).await?;
    Ok((StatusCode::CREATED, Json(UserView::new(user, &i18n))))
}

pub async fn current_user(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
) -> AppResult<Json<UserView>> {
    let user = state.service.get_user(actor.user_id).await?;
    Ok(Json(UserView::new(user, &i18n)))
}

pub async fn update_current_user(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    payload: Result<Json<UpdateUserProfile>, JsonRejection>,
) -> AppResult<Json<UserView>> {
    let payload = extract_json(payload)?;
    let user = state.service.update_profile(&actor, payload).await?;
    Ok(Json(UserView::new(user, &i18n)))
}

pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    user_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<UserView>> {
    let user_id = extract_path(user_id)?;
    let user = state.service.view_user(&actor, user_id).await?;
    Ok(Json(UserView::new(user, &i18n)))
}
