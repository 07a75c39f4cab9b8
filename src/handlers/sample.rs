//! Combined sample endpoint handler.

use axum::{extract::State, Json};
use tracing::{debug, instrument};

use herakles_target_monitor::Sample;

use crate::handlers::apps::ApiError;
use crate::state::SharedState;
use crate::status_updater::take_sample;

/// Handler for the /sample endpoint. Serializes to `null` when the combined
/// query returned no series.
#[instrument(skip(state))]
pub async fn sample_handler(
    State(state): State<SharedState>,
) -> Result<Json<Option<Sample>>, ApiError> {
    debug!("Processing /sample request");
    state.health_stats.record_http_request();

    Ok(Json(take_sample(&state).await?))
}
