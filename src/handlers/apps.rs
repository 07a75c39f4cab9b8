//! Application status endpoint handler.
//!
//! This module provides the `/apps` endpoint handler that runs one refresh
//! and returns the grouped applications as JSON.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, instrument};

use herakles_target_monitor::Application;

use crate::state::SharedState;
use crate::status_updater::{refresh_status, UpdateError};

/// Error type for JSON endpoint failures.
#[derive(Debug)]
pub struct ApiError(pub UpdateError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            UpdateError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            UpdateError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpdateError> for ApiError {
    fn from(e: UpdateError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (self.status(), self.0.to_string()).into_response()
    }
}

/// Handler for the /apps endpoint.
#[instrument(skip(state))]
pub async fn apps_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Application>>, ApiError> {
    debug!("Processing /apps request");
    state.health_stats.record_http_request();

    let refresh = refresh_status(&state).await?;
    Ok(Json(refresh.applications))
}
