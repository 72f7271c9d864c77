use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`AppState`](super::AppState).
pub struct SseState {
    public: SseHub,
    host: SseHub,
}

impl SseState {
    /// Build both hubs with the same channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            public: SseHub::new(capacity),
            host: SseHub::new(capacity),
        }
    }

    /// Hub for players and the watch screen; never carries the phrase.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Hub for the host screen; its game updates include the phrase.
    pub fn host(&self) -> &SseHub {
        &self.host
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
