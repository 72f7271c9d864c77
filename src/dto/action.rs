//! Inbound action envelope and its typed decoding.

use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{dto::validation::validate_image_data_url, error::ServiceError};

/// Body accepted by `POST /api/game/action`: a JSON object with an `action` name
/// (`join`, `buzz`, `guess_letter`, ...) plus fields interpreted according to it.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct ActionRequest(pub Map<String, Value>);

/// Winner photo submitted by the host at the end of a game.
#[derive(Debug, Clone)]
pub struct WinnerPhotoInput {
    /// `data:image/...` URL as sent by the client.
    pub data_url: String,
}

impl Validate for WinnerPhotoInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_image_data_url(&self.data_url) {
            errors.add("winnerPhotoDataUrl", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Decoded action with its payload.
///
/// Only presence and type checks happen here. Rules that depend on the game state (status,
/// turn order, pause) are enforced by the dispatcher so error precedence follows the game.
#[derive(Debug, Clone)]
pub enum GameAction {
    /// Add a player to the roster.
    Join {
        /// Client-generated id.
        player_id: String,
        /// Display name.
        player_name: String,
    },
    /// Begin a round.
    Start,
    /// Try to take the floor.
    Buzz {
        /// Requesting player.
        player_id: Option<String>,
    },
    /// Guess a letter while holding the floor.
    GuessLetter {
        /// Guessing player.
        player_id: Option<String>,
        /// Raw letter, normalised by the dispatcher.
        letter: Option<String>,
    },
    /// Release the floor.
    ClearBuzzer,
    /// Lift the last guesser's cooldown.
    ClearCooldown,
    /// Drop a player from the roster.
    RemovePlayer {
        /// Player to remove.
        player_id: String,
    },
    /// `None` asks the server to pick a letter.
    RevealLetter {
        /// Letter chosen by the host.
        letter: Option<String>,
    },
    /// Show the whole phrase.
    Reveal,
    /// Back to the lobby.
    Reset,
    /// Masked projection.
    GetState,
    /// Projection including the phrase.
    GetHostState,
    /// Store the winner photo.
    SetWinnerPhoto(WinnerPhotoInput),
    /// Toggle the last-guesser cooldown.
    SetSkipTurn(bool),
    /// Toggle the watch-screen unicorn.
    SetDancingUnicorn(bool),
    /// Toggle team mode, lobby only.
    SetTeamMode(bool),
    /// Replace the phrase, lobby only. Already trimmed and non-empty.
    SetPhrase(String),
    /// Flip the manual pause.
    ToggleBuzzersPause,
    /// Client hint that the pause deadline passed.
    ReenableBuzzers,
}

impl GameAction {
    /// Protocol name of the action, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::Join { .. } => "join",
            GameAction::Start => "start",
            GameAction::Buzz { .. } => "buzz",
            GameAction::GuessLetter { .. } => "guess_letter",
            GameAction::ClearBuzzer => "clear_buzzer",
            GameAction::ClearCooldown => "clear_cooldown",
            GameAction::RemovePlayer { .. } => "remove_player",
            GameAction::RevealLetter { .. } => "reveal_letter",
            GameAction::Reveal => "reveal",
            GameAction::Reset => "reset",
            GameAction::GetState => "get_state",
            GameAction::GetHostState => "get_host_state",
            GameAction::SetWinnerPhoto(_) => "set_winner_photo",
            GameAction::SetSkipTurn(_) => "set_skip_turn",
            GameAction::SetDancingUnicorn(_) => "set_dancing_unicorn",
            GameAction::SetTeamMode(_) => "set_team_mode",
            GameAction::SetPhrase(_) => "set_phrase",
            GameAction::ToggleBuzzersPause => "toggle_buzzers_pause",
            GameAction::ReenableBuzzers => "reenable_buzzers",
        }
    }
}

impl TryFrom<ActionRequest> for GameAction {
    type Error = ServiceError;

    fn try_from(request: ActionRequest) -> Result<Self, Self::Error> {
        let payload = &request.0;
        let Some(name) = payload.get("action").and_then(Value::as_str) else {
            return Err(ServiceError::UnknownAction);
        };

        let action = match name {
            "join" => match (
                string_field(payload, "playerId"),
                string_field(payload, "playerName"),
            ) {
                (Some(player_id), Some(player_name)) => GameAction::Join {
                    player_id,
                    player_name,
                },
                _ => return Err(invalid("Missing player info")),
            },
            "start" => GameAction::Start,
            "buzz" => GameAction::Buzz {
                player_id: string_field(payload, "playerId"),
            },
            "guess_letter" => GameAction::GuessLetter {
                player_id: string_field(payload, "playerId"),
                letter: string_field(payload, "letter"),
            },
            "clear_buzzer" => GameAction::ClearBuzzer,
            "clear_cooldown" => GameAction::ClearCooldown,
            "remove_player" => GameAction::RemovePlayer {
                player_id: string_field(payload, "playerId")
                    .ok_or_else(|| invalid("Missing player ID"))?,
            },
            "reveal_letter" => GameAction::RevealLetter {
                letter: string_field(payload, "letter"),
            },
            "reveal" => GameAction::Reveal,
            "reset" => GameAction::Reset,
            "get_state" => GameAction::GetState,
            "get_host_state" => GameAction::GetHostState,
            "set_winner_photo" => {
                let data_url = string_field(payload, "winnerPhotoDataUrl")
                    .ok_or_else(|| invalid("Missing or invalid winnerPhotoDataUrl"))?;
                let input = WinnerPhotoInput { data_url };
                input.validate()?;
                GameAction::SetWinnerPhoto(input)
            }
            "set_skip_turn" => GameAction::SetSkipTurn(bool_field(
                payload,
                "skipTurnAfterGuess",
                "skipTurnAfterGuess must be boolean",
            )?),
            "set_dancing_unicorn" => GameAction::SetDancingUnicorn(bool_field(
                payload,
                "showDancingUnicorn",
                "showDancingUnicorn must be boolean",
            )?),
            "set_team_mode" => GameAction::SetTeamMode(bool_field(
                payload,
                "teamMode",
                "teamMode must be boolean",
            )?),
            "set_phrase" => {
                let phrase = payload
                    .get("phrase")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|phrase| !phrase.is_empty())
                    .ok_or_else(|| invalid("Phrase cannot be empty"))?;
                GameAction::SetPhrase(phrase.to_string())
            }
            "toggle_buzzers_pause" => GameAction::ToggleBuzzersPause,
            "reenable_buzzers" => GameAction::ReenableBuzzers,
            _ => return Err(ServiceError::UnknownAction),
        };

        Ok(action)
    }
}

fn invalid(message: &str) -> ServiceError {
    ServiceError::InvalidInput(message.to_string())
}

/// Non-empty string field; anything else counts as missing.
fn string_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn bool_field(payload: &Map<String, Value>, key: &str, message: &str) -> Result<bool, ServiceError> {
    payload
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid(message))
}
