use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::app_state::models::AppState;
use crate::services::status::reporter::{StatusReporter, StatusSummary};

pub async fn status(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<Json<StatusSummary>, StatusCode> {
    let reporter = StatusReporter::new(app_state.postgres_service.repository_status.clone());

    reporter.report().await.map(Json).map_err(|e| {
        error!("Failed to build status report: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
