use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Public SSE stream (`game-update`, `buzz-event`)", content_type = "text/event-stream", body = String))
)]
/// Stream masked game updates and buzz notifications to players and the watch screen.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = sse_service::subscribe(&state, StreamKind::Public).await;
    info!("New public SSE connection");
    sse_service::to_sse_stream(subscription, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/host",
    tag = "sse",
    responses((status = 200, description = "Host SSE stream, game updates include the phrase", content_type = "text/event-stream", body = String))
)]
/// Stream game updates including the phrase to the host screen.
///
/// The stream is open to any client: there is no host claim token, so anyone who can reach
/// the server can read the phrase. Restrict access at the network edge if that matters.
pub async fn host_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = sse_service::subscribe(&state, StreamKind::Host).await;
    info!("New host SSE connection");
    sse_service::to_sse_stream(subscription, StreamKind::Host)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/host", get(host_stream))
}
