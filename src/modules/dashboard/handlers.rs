use axum::extract::rejection::QueryRejection;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::db::{Page, PageRequest, UserRole};
use crate::error::AppResult;
use crate::i18n::I18n;
use crate::i18n_args;
use crate::modules::extractors::extract_query;
use crate::modules::views::{ApprovalLogView, NominationView};
use crate::workflow::{Actor, Stage};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub role: UserRole,
    pub role_label: String,
    pub stage: Option<Stage>,
    pub stage_label: Option<String>,
    pub queue: Page<NominationView>,
    pub new_requests_count: u64,
    pub new_requests_label: String,
    pub recent_decisions: Page<ApprovalLogView>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    page: Result<Query<PageRequest>, QueryRejection>,
) -> AppResult<Json<DashboardView>> {
    let page = extract_query(page)?;
    let dashboard = state.service.dashboard(&actor, page).await?;
    let count_args = i18n_args! { "count" => dashboard.new_requests_count };

    Ok(Json(DashboardView {
        role: dashboard.role,
        role_label: i18n.role(dashboard.role),
        stage: dashboard.stage,
        stage_label: dashboard.stage.map(|stage| i18n.stage(stage)),
        new_requests_label: i18n.get_with_args("dashboard-new-requests", &count_args),
        new_requests_count: dashboard.new_requests_count,
        queue: dashboard.queue.map(|n| NominationView::new(n, &i18n)),
        recent_decisions: dashboard
            .recent_decisions
            .map(|log| ApprovalLogView::new(log, &i18n)),
    }))
}

/// Marks the actor's whole review queue as read.
pub async fn mark_all_read(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
) -> AppResult<Json<Vec<NominationView>>> {
    let marked = state.service.mark_queue_read(&actor).await?;
    Ok(Json(
        marked
            .into_iter()
            .map(|n| NominationView::new(n, &i18n))
            .collect(),
    ))
}
