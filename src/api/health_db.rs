use axum::{extract::Extension, http::StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::app_state::models::AppState;

pub async fn health_db(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<StatusCode, StatusCode> {
    // Check PostgreSQL connection
    match app_state.postgres_service.repository_status.ping().await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
