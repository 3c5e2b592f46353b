pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod report;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use sqlx::PgPool;

pub use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<report::ReportGenerator>,
    pub pool: Option<PgPool>,
}
