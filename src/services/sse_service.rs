use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::{
        game::{ClientGameState, HostGameState},
        sse::ServerEvent,
    },
    services::sse_events,
    state::SharedState,
};

/// Identifies the target SSE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Public,
    Host,
}

impl StreamKind {
    fn label(self) -> &'static str {
        match self {
            StreamKind::Public => "public",
            StreamKind::Host => "host",
        }
    }
}

/// A new subscription: the current snapshot plus every later event.
pub struct Subscription {
    pub snapshot: Option<ServerEvent>,
    pub receiver: broadcast::Receiver<ServerEvent>,
}

/// Subscribe to a stream and capture the projection it should start from.
///
/// The game lock is held while subscribing so no update slips between snapshot and stream.
pub async fn subscribe(state: &SharedState, kind: StreamKind) -> Subscription {
    let game = state.game().lock().await;
    match kind {
        StreamKind::Public => Subscription {
            receiver: state.public_sse().subscribe(),
            snapshot: sse_events::game_update_event(&ClientGameState::from(&*game)),
        },
        StreamKind::Host => Subscription {
            receiver: state.host_sse().subscribe(),
            snapshot: sse_events::game_update_event(&HostGameState::from(&*game)),
        },
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a subscription into an SSE response, forwarding events until the client leaves.
pub fn to_sse_stream(
    subscription: Subscription,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let Subscription {
        snapshot,
        mut receiver,
    } = subscription;
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(snapshot) = snapshot {
            if tx.send(Ok(to_event(snapshot))).await.is_err() {
                info!(stream = kind.label(), "SSE stream disconnected");
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // Clients resync from the next full game-update.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        info!(stream = kind.label(), "SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
