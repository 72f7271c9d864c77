//! Turn, cooldown and team rules. Pure functions over [`GameState`].

use indexmap::{IndexMap, IndexSet};
use rand::{Rng, seq::IndexedRandom};
use time::OffsetDateTime;

use crate::{
    error::ServiceError,
    state::game::{GameState, Player, Team},
};

/// Outcome of an allowed buzz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzDecision {
    /// The requester takes the floor.
    Granted,
    /// Someone already holds the floor; the attempt is a silent no-op.
    FloorTaken(String),
}

/// Decide whether `player_id` may buzz right now.
///
/// Errors are checked in a fixed order: game status, pause, cooldown, then the requester.
pub fn check_buzz(game: &GameState, player_id: Option<&str>) -> Result<BuzzDecision, ServiceError> {
    game.status.ensure_active()?;

    if game.buzzers_paused {
        return Err(ServiceError::Forbidden(
            "Buzzers are paused, wait for the host to enable them".into(),
        ));
    }

    if game.skip_turn_after_guess
        && player_id.is_some()
        && game.last_guesser_id.as_deref() == player_id
    {
        return Err(ServiceError::Forbidden(
            "You must wait, another player goes first".into(),
        ));
    }

    let player_id =
        player_id.ok_or_else(|| ServiceError::InvalidInput("Missing player ID".into()))?;
    if game.player(player_id).is_none() {
        return Err(ServiceError::InvalidInput("Unknown player".into()));
    }

    match &game.buzzed_player_id {
        Some(holder) => Ok(BuzzDecision::FloorTaken(holder.clone())),
        None => Ok(BuzzDecision::Granted),
    }
}

/// Ensure `player_id` holds the floor and may guess.
pub fn check_guess(game: &GameState, player_id: Option<&str>) -> Result<(), ServiceError> {
    game.status.ensure_active()?;

    match (&game.buzzed_player_id, player_id) {
        (Some(holder), Some(requester)) if holder == requester => Ok(()),
        _ => Err(ServiceError::Forbidden("Not your turn".into())),
    }
}

/// Alternate blue and red over the current join order.
///
/// Fewer than two players yields no assignments.
pub fn team_assignments(players: &[Player]) -> IndexMap<String, Team> {
    if players.len() < 2 {
        return IndexMap::new();
    }

    players
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let team = if index % 2 == 0 { Team::Blue } else { Team::Red };
            (player.id.clone(), team)
        })
        .collect()
}

/// Recompute assignments when team mode is on, clear them otherwise.
pub fn refresh_teams(game: &mut GameState) {
    game.team_assignments = if game.team_mode {
        team_assignments(&game.players)
    } else {
        IndexMap::new()
    };
}

/// Distinct A-Z letters of the phrase that have not been revealed, in phrase order.
pub fn unguessed_phrase_letters(game: &GameState) -> Vec<char> {
    game.target_phrase
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() && !game.guessed_letters.contains(c))
        .collect::<IndexSet<char>>()
        .into_iter()
        .collect()
}

/// Pick a hidden phrase letter uniformly at random, or `None` when all are shown.
pub fn pick_reveal_letter<R: Rng + ?Sized>(game: &GameState, rng: &mut R) -> Option<char> {
    unguessed_phrase_letters(game).choose(rng).copied()
}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
