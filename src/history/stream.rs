use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::sampler::Sample;
use crate::AppState;

// ─── GET /api/stats ──────────────────────────────────────────────
/// Latest sample as JSON. Serializes to `null` until the first tick
/// has landed — an empty state, never an error.

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Option<Sample>> {
    Json(state.history.latest())
}

// ─── GET /api/history ────────────────────────────────────────────
/// The whole retained window, oldest first, length ≤ capacity.

pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<Sample>> {
    Json(state.history.snapshot())
}

// ─── GET /api/stats/stream ───────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes the latest sample as JSON once per sampling tick; the
/// browser's `EventSource` connects here and feeds the charts.

pub async fn stats_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.tick);

    let stream = IntervalStream::new(interval).map(move |_| {
        let latest = state.history.latest();
        let json = serde_json::to_string(&latest).unwrap_or_else(|_| "null".into());
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
