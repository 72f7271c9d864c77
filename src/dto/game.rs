//! Client and host projections of the authoritative game state.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::game::{GameState, GameStatus, Player, Team};

/// Placeholder shown for letters nobody has found yet.
pub const MASK_CHAR: char = '_';

/// View of the game every participant may see. The phrase only appears masked.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientGameState {
    /// Lifecycle status.
    pub status: GameStatus,
    /// Roster in join order.
    pub players: Vec<Player>,
    /// Player holding the floor.
    pub buzzed_player_id: Option<String>,
    /// Player under cooldown, if any.
    pub last_guesser_id: Option<String>,
    /// Revealed letters in reveal order.
    pub guessed_letters: Vec<String>,
    /// Whether the cooldown applies.
    pub skip_turn_after_guess: bool,
    /// Whether buzzing is refused.
    pub buzzers_paused: bool,
    /// Unix epoch milliseconds.
    pub buzzers_reenable_at: Option<i64>,
    /// Whether teams are on.
    pub team_mode: bool,
    /// Player id to team.
    #[schema(value_type = Object)]
    pub team_assignments: IndexMap<String, Team>,
    /// Watch-screen unicorn toggle.
    pub show_dancing_unicorn: bool,
    /// Stored winner photo reference, empty when unset.
    pub winner_photo_data_url: String,
    /// Number of characters in the phrase, spaces included.
    pub phrase_length: usize,
    /// Phrase with hidden letters replaced by `_`.
    pub masked_phrase: String,
}

impl From<&GameState> for ClientGameState {
    fn from(game: &GameState) -> Self {
        Self {
            status: game.status,
            players: game.players.clone(),
            buzzed_player_id: game.buzzed_player_id.clone(),
            last_guesser_id: game.last_guesser_id.clone(),
            guessed_letters: game
                .guessed_letters
                .iter()
                .map(|letter| letter.to_string())
                .collect(),
            skip_turn_after_guess: game.skip_turn_after_guess,
            buzzers_paused: game.buzzers_paused,
            buzzers_reenable_at: game.buzzers_reenable_at,
            team_mode: game.team_mode,
            team_assignments: game.team_assignments.clone(),
            show_dancing_unicorn: game.show_dancing_unicorn,
            winner_photo_data_url: game.winner_photo_data_url.clone(),
            phrase_length: game.target_phrase.chars().count(),
            masked_phrase: mask_phrase(game),
        }
    }
}

/// Privileged view for the host screen: the client view plus the raw phrase.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostGameState {
    /// Everything the players see.
    #[serde(flatten)]
    pub client: ClientGameState,
    /// The phrase in clear.
    pub target_phrase: String,
}

impl From<&GameState> for HostGameState {
    fn from(game: &GameState) -> Self {
        Self {
            client: game.into(),
            target_phrase: game.target_phrase.clone(),
        }
    }
}

/// Mask every non-space character that is neither guessed nor revealed.
pub fn mask_phrase(game: &GameState) -> String {
    let revealed = game.status == GameStatus::Revealed;
    game.target_phrase
        .chars()
        .map(|c| {
            if c == ' ' || revealed || game.guessed_letters.contains(&c.to_ascii_uppercase()) {
                c
            } else {
                MASK_CHAR
            }
        })
        .collect()
}
