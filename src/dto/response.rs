use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::game::{ClientGameState, HostGameState};

/// Either projection, returned by `join`, `get_state` and `get_host_state`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StateView {
    /// Masked view for players.
    Client(ClientGameState),
    /// Full view for the host.
    Host(HostGameState),
}

/// Success body of `POST /api/game/action`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    /// Always `true`; failures use the error body instead.
    pub ok: bool,
    /// Projection for actions that return one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateView>,
    /// Player holding the floor after a `buzz`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buzzed_player_id: Option<String>,
    /// Stored photo reference after `set_winner_photo`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_photo_data_url: Option<String>,
}

impl ActionResponse {
    /// Plain `{"ok": true}`.
    pub fn ok() -> Self {
        Self {
            ok: true,
            state: None,
            buzzed_player_id: None,
            winner_photo_data_url: None,
        }
    }

    /// Success carrying a projection.
    pub fn with_state(state: StateView) -> Self {
        Self {
            state: Some(state),
            ..Self::ok()
        }
    }

    /// Success naming the floor holder.
    pub fn with_buzzed_player(player_id: String) -> Self {
        Self {
            buzzed_player_id: Some(player_id),
            ..Self::ok()
        }
    }

    /// Success carrying the stored photo reference.
    pub fn with_winner_photo(url: String) -> Self {
        Self {
            winner_photo_data_url: Some(url),
            ..Self::ok()
        }
    }
}
