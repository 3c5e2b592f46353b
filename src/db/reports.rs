use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::report::GeneratedReport;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub industry: String,
    pub answers: Vec<String>,
    pub sections: serde_json::Value,
    pub model: String,
    pub trace_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReportRow {
    /// Stored sections as a report; rows written by an older schema that lack
    /// a key come back with that section empty.
    pub fn report(&self) -> GeneratedReport {
        serde_json::from_value(self.sections.clone()).unwrap_or_else(|e| {
            tracing::warn!(report.id = %self.id, error = %e, "Stored sections are malformed");
            GeneratedReport::empty()
        })
    }
}

pub struct InsertReport<'a> {
    pub id: Uuid,
    pub industry: &'a str,
    pub answers: &'a [String],
    pub sections: &'a serde_json::Value,
    pub model: &'a str,
    pub trace_id: Option<&'a str>,
}

#[tracing::instrument(name = "db.reports.insert", skip_all, fields(report.id = %params.id))]
pub async fn insert_report(pool: &PgPool, params: &InsertReport<'_>) -> Result<Uuid, sqlx::Error> {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO insight_reports (id, industry, answers, sections, model, trace_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(params.id)
    .bind(params.industry)
    .bind(params.answers)
    .bind(params.sections)
    .bind(params.model)
    .bind(params.trace_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

#[tracing::instrument(name = "db.reports.get", skip(pool))]
pub async fn get_report(pool: &PgPool, id: Uuid) -> Result<Option<ReportRow>, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>(
        "SELECT id, industry, answers, sections, model, trace_id, created_at \
         FROM insight_reports WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(name = "db.reports.list", skip(pool))]
pub async fn list_reports(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReportRow>, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>(
        "SELECT id, industry, answers, sections, model, trace_id, created_at \
         FROM insight_reports ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
