pub mod game;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};

use crate::{config::AppConfig, services::photo_upload::PhotoUploader, state::game::GameState};

pub use self::sse::SseHub;
use self::sse::SseState;

pub type SharedState = Arc<AppState>;

/// Central application state: the single game session and its collaborators.
///
/// The game mutex is held for a whole action (validate, upload, commit, broadcast) so actions
/// are serialised with respect to each other.
pub struct AppState {
    config: AppConfig,
    game: Mutex<GameState>,
    sse: SseState,
    uploader: Arc<dyn PhotoUploader>,
    reenable_timer: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, uploader: Arc<dyn PhotoUploader>) -> SharedState {
        Arc::new(Self {
            game: Mutex::new(GameState::new(&config)),
            sse: SseState::new(config.sse_capacity()),
            config,
            uploader,
            reenable_timer: Mutex::new(None),
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The authoritative game state.
    pub fn game(&self) -> &Mutex<GameState> {
        &self.game
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the host SSE stream.
    pub fn host_sse(&self) -> &SseHub {
        self.sse.host()
    }

    /// Collaborator that turns winner photos into stable URLs.
    pub fn uploader(&self) -> Arc<dyn PhotoUploader> {
        Arc::clone(&self.uploader)
    }

    /// Handle of the pending buzzer re-enable task, if any.
    pub fn reenable_timer(&self) -> &Mutex<Option<JoinHandle<()>>> {
        &self.reenable_timer
    }
}
