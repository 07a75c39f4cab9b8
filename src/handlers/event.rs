//! Live status stream.
//!
//! `/event` pushes `{"apps": [...], "sample": {...}}` on every refresh
//! interval. A failed tick is reported as an `error` event and the stream
//! keeps polling; it ends when the client disconnects.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, instrument, warn};

use herakles_target_monitor::{Application, Sample};

use crate::state::SharedState;
use crate::status_updater::{refresh_status, take_sample};

/// Payload of one `message` event.
#[derive(Debug, Serialize)]
pub struct EventPayload {
    pub apps: Vec<Application>,
    pub sample: Option<Sample>,
}

/// Handler for the /event endpoint.
#[instrument(skip(state))]
pub async fn event_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Opening /event stream");
    state.health_stats.record_http_request();
    state.health_stats.record_event_stream();
    state.metrics.event_streams_total.inc();

    let mut ticker = interval(state.config.refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let stream = IntervalStream::new(ticker).then(move |_| {
        let state = state.clone();
        async move { Ok(next_event(&state).await) }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn next_event(state: &SharedState) -> Event {
    let (apps, sample) = tokio::join!(refresh_status(state), take_sample(state));

    let payload = match (apps, sample) {
        (Ok(refresh), Ok(sample)) => EventPayload {
            apps: refresh.applications,
            sample,
        },
        (Err(e), _) | (_, Err(e)) => {
            warn!("Event stream tick failed: {}", e);
            return Event::default().event("error").data(e.to_string());
        }
    };

    Event::default().json_data(&payload).unwrap_or_else(|e| {
        warn!("Failed to encode event payload: {}", e);
        Event::default().event("error").data(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_payload_shape() {
        let payload = EventPayload {
            apps: vec![],
            sample: Some(Sample {
                timestamp: 1_700_000_000,
                value: BTreeMap::from([("h:1,mem_used_bytes".to_string(), 42.0)]),
            }),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["apps"], serde_json::json!([]));
        assert_eq!(json["sample"]["timestamp"], 1_700_000_000);
        assert_eq!(json["sample"]["value"]["h:1,mem_used_bytes"], 42.0);

        let empty = EventPayload {
            apps: vec![],
            sample: None,
        };
        assert_eq!(
            serde_json::to_string(&empty).unwrap(),
            r#"{"apps":[],"sample":null}"#
        );
    }
}
