use axum::{
    Json,
    extract::{Path, Query, State},
    response::Html,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::AppState;
use crate::db::reports::{InsertReport, ReportRow};
use crate::error::{AppError, AppResult, current_trace_id};
use crate::report::{GeneratedReport, RenderOptions, ReportRequest, render_html};

#[derive(Debug, Deserialize)]
pub struct CreateReportBody {
    pub industry: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    pub id: Option<Uuid>,
    pub industry: String,
    pub sections: GeneratedReport,
    pub trace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> AppResult<Json<CreateReportResponse>> {
    let request = ReportRequest::new(body.industry, body.answers)?;
    let sections = state.generator.generate(&request).await;
    let trace_id = current_trace_id();
    let id = persist(&state, &request, &sections, trace_id.as_deref()).await;

    Ok(Json(CreateReportResponse {
        id,
        industry: request.industry,
        sections,
        trace_id,
    }))
}

pub async fn create_report_html(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> AppResult<Html<String>> {
    let request = ReportRequest::new(body.industry, body.answers)?;
    let sections = state.generator.generate(&request).await;
    let trace_id = current_trace_id();
    persist(&state, &request, &sections, trace_id.as_deref()).await;

    let options = RenderOptions::new(request.industry, state.config.contact_email.clone());
    Ok(Html(render_html(&sections, &options)?))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<ReportRow>>> {
    let pool = require_pool(&state)?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let reports = crate::db::reports::list_reports(pool, limit, offset).await?;

    Ok(Json(reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReportRow>> {
    Ok(Json(fetch_report(&state, id).await?))
}

pub async fn get_report_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let row = fetch_report(&state, id).await?;
    let options = RenderOptions::new(row.industry.clone(), state.config.contact_email.clone());

    Ok(Html(render_html(&row.report(), &options)?))
}

async fn fetch_report(state: &AppState, id: Uuid) -> AppResult<ReportRow> {
    let pool = require_pool(state)?;
    crate::db::reports::get_report(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))
}

fn require_pool(state: &AppState) -> AppResult<&PgPool> {
    state
        .pool
        .as_ref()
        .ok_or_else(|| AppError::ServiceDisabled("report storage is disabled".into()))
}

/// Stores a generated report when storage is enabled. Empty reports are not
/// stored; there is nothing to look up later. A storage failure is logged and
/// the caller still gets the generated content, without an id.
async fn persist(
    state: &AppState,
    request: &ReportRequest,
    sections: &GeneratedReport,
    trace_id: Option<&str>,
) -> Option<Uuid> {
    let pool = state.pool.as_ref()?;
    if sections.is_empty() {
        return None;
    }

    let sections_json = match serde_json::to_value(sections) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize report sections");
            return None;
        }
    };

    let result = crate::db::reports::insert_report(
        pool,
        &InsertReport {
            id: Uuid::new_v4(),
            industry: &request.industry,
            answers: &request.answers,
            sections: &sections_json,
            model: state.generator.model(),
            trace_id,
        },
    )
    .await;

    match result {
        Ok(id) => {
            tracing::info!(report.id = %id, "Report stored");
            Some(id)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store report");
            None
        }
    }
}
