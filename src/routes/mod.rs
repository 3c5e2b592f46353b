pub mod health;
pub mod reports;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route(
            "/api/reports",
            post(reports::create_report).get(reports::list_reports),
        )
        .route("/api/reports/html", post(reports::create_report_html))
        .route("/api/reports/{id}", get(reports::get_report))
        .route("/api/reports/{id}/html", get(reports::get_report_html))
        .with_state(state)
}
