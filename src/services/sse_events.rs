use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::{ClientGameState, HostGameState},
        sse::{BuzzEvent, ServerEvent},
    },
    state::{AppState, game::GameState},
};

pub const EVENT_GAME_UPDATE: &str = "game-update";
pub const EVENT_BUZZ: &str = "buzz-event";

/// Broadcast the new projection: masked on the public stream, with the phrase on the host stream.
pub fn broadcast_game_update(state: &AppState, game: &GameState) {
    send_public_event(state, EVENT_GAME_UPDATE, &ClientGameState::from(game));
    send_host_event(state, EVENT_GAME_UPDATE, &HostGameState::from(game));
}

/// Broadcast that a player took the floor.
pub fn broadcast_buzz(state: &AppState, event: &BuzzEvent) {
    send_public_event(state, EVENT_BUZZ, event);
    send_host_event(state, EVENT_BUZZ, event);
}

/// Build a `game-update` event without sending it, used to greet new subscribers.
pub fn game_update_event(payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(EVENT_GAME_UPDATE.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize game snapshot");
            None
        }
    }
}

fn send_public_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_host_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.host_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}
