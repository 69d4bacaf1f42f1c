use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::db::{ApprovalLogFilter, Page, PageRequest, UserRole};
use crate::error::AppResult;
use crate::i18n::I18n;
use crate::modules::extractors::{extract_path, extract_query};
use crate::modules::views::ApprovalLogView;
use crate::workflow::Actor;

#[derive(Debug, Default, Deserialize)]
pub struct ApprovalLogQuery {
    pub nomination_id: Option<i64>,
    pub role: Option<UserRole>,
    pub is_read: Option<bool>,
}

impl From<ApprovalLogQuery> for ApprovalLogFilter {
    fn from(query: ApprovalLogQuery) -> Self {
        ApprovalLogFilter {
            nomination_id: query.nomination_id,
            role: query.role,
            is_read: query.is_read,
            ..Default::default()
        }
    }
}

pub async fn list_logs(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    query: Result<Query<ApprovalLogQuery>, QueryRejection>,
    page: Result<Query<PageRequest>, QueryRejection>,
) -> AppResult<Json<Page<ApprovalLogView>>> {
    let query = extract_query(query)?;
    let page = extract_query(page)?;
    let logs = state.service.list_logs(&actor, query.into(), page).await?;
    Ok(Json(logs.map(|log| ApprovalLogView::new(log, &i18n))))
}

pub async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    log_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ApprovalLogView>> {
    let log_id = extract_path(log_id)?;
    let log = state.service.mark_log_read(&actor, log_id).await?;
    Ok(Json(ApprovalLogView::new(log, &i18n)))
}
