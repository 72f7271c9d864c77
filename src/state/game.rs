use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    state::state_machine::{GameEvent, transition},
};

/// Lifecycle status of the single game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Lobby: players join, the host configures the phrase and team mode.
    #[default]
    Waiting,
    /// Buzzers and guesses are live.
    Active,
    /// The whole phrase is shown.
    Revealed,
}

/// Side a player belongs to while team mode is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Even join positions.
    Blue,
    /// Odd join positions.
    Red,
}

/// A participant who joined from their phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Player {
    /// Client-generated identifier, unique within the session.
    pub id: String,
    /// Display name shown on the board.
    pub name: String,
}

/// Authoritative state of the game session. Only the host projection exposes the phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Current lifecycle status.
    pub status: GameStatus,
    /// Join order is preserved; ids are unique.
    pub players: Vec<Player>,
    /// Player currently holding the floor.
    pub buzzed_player_id: Option<String>,
    /// Most recent guesser, barred from buzzing while the cooldown applies.
    pub last_guesser_id: Option<String>,
    /// Uppercase A-Z letters in the order they were revealed.
    pub guessed_letters: IndexSet<char>,
    /// Uppercase phrase being guessed.
    pub target_phrase: String,
    /// Whether the last guesser must sit out the next buzz.
    pub skip_turn_after_guess: bool,
    /// Buzzing is refused while set.
    pub buzzers_paused: bool,
    /// Unix epoch milliseconds after which buzzers come back on.
    pub buzzers_reenable_at: Option<i64>,
    /// Whether players are split into blue and red.
    pub team_mode: bool,
    /// Team of each player in join order, empty unless team mode is on.
    pub team_assignments: IndexMap<String, Team>,
    /// Display toggle for the watch screen.
    pub show_dancing_unicorn: bool,
    /// Stored winner photo reference, empty when unset.
    pub winner_photo_data_url: String,
}

impl GameState {
    /// Build the startup state for a fresh process.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            status: GameStatus::Waiting,
            players: Vec::new(),
            buzzed_player_id: None,
            last_guesser_id: None,
            guessed_letters: IndexSet::new(),
            target_phrase: config.default_phrase().to_string(),
            skip_turn_after_guess: config.skip_turn_after_guess(),
            buzzers_paused: false,
            buzzers_reenable_at: None,
            team_mode: false,
            team_assignments: IndexMap::new(),
            show_dancing_unicorn: config.show_dancing_unicorn(),
            winner_photo_data_url: String::new(),
        }
    }

    /// Return to the lobby with an empty roster.
    ///
    /// The phrase, the cooldown toggle, team mode and the winner photo survive a reset.
    pub fn reset(&mut self) {
        self.status = transition(self.status, GameEvent::Reset);
        self.players.clear();
        self.buzzed_player_id = None;
        self.last_guesser_id = None;
        self.guessed_letters.clear();
        self.buzzers_paused = false;
        self.buzzers_reenable_at = None;
        self.team_assignments.clear();
        self.show_dancing_unicorn = true;
    }

    /// Look up a joined player.
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Append a player unless the id already joined. Returns whether the roster changed.
    pub fn add_player(&mut self, id: &str, name: &str) -> bool {
        if self.player(id).is_some() {
            return false;
        }
        self.players.push(Player {
            id: id.to_string(),
            name: name.to_string(),
        });
        true
    }

    /// Remove a player and every reference to them.
    pub fn remove_player(&mut self, id: &str) {
        self.players.retain(|player| player.id != id);
        if self.buzzed_player_id.as_deref() == Some(id) {
            self.buzzed_player_id = None;
        }
        if self.last_guesser_id.as_deref() == Some(id) {
            self.last_guesser_id = None;
        }
        self.team_assignments.shift_remove(id);
    }
}
