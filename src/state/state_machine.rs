use crate::{error::ServiceError, state::game::GameStatus};

/// Host events that move the session between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts (or restarts) play.
    Start,
    /// Host shows the whole phrase.
    Reveal,
    /// Host clears the roster and returns to the lobby.
    Reset,
}

/// Compute the status reached by applying `event` from `from`.
///
/// Every host event is accepted from every status: `start` may restart a revealed game and
/// `reveal` may skip straight from the lobby.
pub fn transition(from: GameStatus, event: GameEvent) -> GameStatus {
    match (from, event) {
        (_, GameEvent::Start) => GameStatus::Active,
        (_, GameEvent::Reveal) => GameStatus::Revealed,
        (_, GameEvent::Reset) => GameStatus::Waiting,
    }
}

impl GameStatus {
    /// Fail with "Game not active" unless buzzers and guesses are live.
    pub fn ensure_active(self) -> Result<(), ServiceError> {
        match self {
            GameStatus::Active => Ok(()),
            _ => Err(ServiceError::WrongPhase("Game not active".into())),
        }
    }

    /// Fail with `message` unless the session is still in the lobby.
    pub fn ensure_waiting(self, message: &str) -> Result<(), ServiceError> {
        match self {
            GameStatus::Waiting => Ok(()),
            _ => Err(ServiceError::WrongPhase(message.into())),
        }
    }
}
