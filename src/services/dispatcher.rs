//! Transition table of the game: applies one decoded action to a [`GameState`].
//!
//! [`apply`] is pure apart from the random source it is handed. Callers run it against a
//! scratch copy of the state and commit the copy only when it returns `Ok`.

use std::time::Duration;

use rand::Rng;

use crate::{
    dto::{action::GameAction, sse::BuzzEvent, validation::normalize_letter},
    error::ServiceError,
    services::policy::{self, BuzzDecision},
    state::{
        game::GameState,
        state_machine::{GameEvent, transition},
    },
};

/// Inputs an action may depend on besides the state itself.
pub struct DispatchContext<'a, R: Rng + ?Sized> {
    /// Unix epoch milliseconds at dispatch time.
    pub now_ms: i64,
    /// Pause length after a guess.
    pub reenable_delay: Duration,
    /// Let `reenable_buzzers` lift the pause before the deadline.
    pub honor_early_reenable: bool,
    /// Stored reference for `set_winner_photo`, produced by the upload collaborator.
    pub uploaded_photo: Option<String>,
    /// Source for the `reveal_letter` auto-pick.
    pub rng: &'a mut R,
}

/// What the caller should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain acknowledgement.
    Ok,
    /// Client projection of the committed state.
    State,
    /// Host projection of the committed state.
    HostState,
    /// Id of the player holding the floor.
    BuzzedPlayer(String),
    /// Stored photo reference.
    WinnerPhoto(String),
}

/// Effect on the server-side buzzer re-enable timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUpdate {
    /// Leave any pending timer alone.
    Keep,
    /// Replace any pending timer with one firing at this epoch-millisecond deadline.
    Schedule(i64),
    /// Drop any pending timer.
    Cancel,
}

/// Result of a successfully applied action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Response shape.
    pub reply: Reply,
    /// Whether subscribers must receive the new projection.
    pub broadcast: bool,
    /// Buzz notification to send, if the floor was just taken.
    pub buzz: Option<BuzzEvent>,
    /// Effect on the re-enable timer.
    pub timer: TimerUpdate,
}

impl Outcome {
    fn quiet(reply: Reply) -> Self {
        Self {
            reply,
            broadcast: false,
            buzz: None,
            timer: TimerUpdate::Keep,
        }
    }

    fn changed(reply: Reply) -> Self {
        Self {
            broadcast: true,
            ..Self::quiet(reply)
        }
    }

    fn with_timer(mut self, timer: TimerUpdate) -> Self {
        self.timer = timer;
        self
    }
}

/// Validate `action` against `game` and apply its effect.
///
/// On `Err` the state may be partially modified and must be discarded.
pub fn apply<R: Rng + ?Sized>(
    game: &mut GameState,
    action: &GameAction,
    ctx: DispatchContext<'_, R>,
) -> Result<Outcome, ServiceError> {
    let outcome = match action {
        GameAction::Join {
            player_id,
            player_name,
        } => {
            if game.add_player(player_id, player_name) && game.team_mode {
                policy::refresh_teams(game);
            }
            Outcome::changed(Reply::State)
        }
        GameAction::Start => {
            game.status = transition(game.status, GameEvent::Start);
            game.buzzed_player_id = None;
            game.last_guesser_id = None;
            game.guessed_letters.clear();
            game.buzzers_paused = false;
            game.buzzers_reenable_at = None;
            policy::refresh_teams(game);
            Outcome::changed(Reply::Ok).with_timer(TimerUpdate::Cancel)
        }
        GameAction::Buzz { player_id } => match policy::check_buzz(game, player_id.as_deref())? {
            BuzzDecision::FloorTaken(holder) => Outcome::quiet(Reply::BuzzedPlayer(holder)),
            BuzzDecision::Granted => {
                let player = game
                    .player(player_id.as_deref().unwrap_or_default())
                    .cloned()
                    .ok_or_else(|| ServiceError::Internal("buzzing player vanished".into()))?;
                game.buzzed_player_id = Some(player.id.clone());
                Outcome {
                    buzz: Some(BuzzEvent {
                        player_id: player.id.clone(),
                        player_name: player.name,
                    }),
                    ..Outcome::changed(Reply::BuzzedPlayer(player.id))
                }
            }
        },
        GameAction::GuessLetter { player_id, letter } => {
            policy::check_guess(game, player_id.as_deref())?;
            let letter = letter
                .as_deref()
                .ok_or_else(|| ServiceError::InvalidInput("Missing letter".into()))?;
            let letter = normalize_letter(letter).ok_or_else(|| {
                ServiceError::InvalidInput("Letter must be a single A-Z character".into())
            })?;

            let deadline = ctx.now_ms + ctx.reenable_delay.as_millis() as i64;
            game.guessed_letters.insert(letter);
            game.last_guesser_id = player_id.clone();
            game.buzzed_player_id = None;
            game.buzzers_paused = true;
            game.buzzers_reenable_at = Some(deadline);
            Outcome::changed(Reply::Ok).with_timer(TimerUpdate::Schedule(deadline))
        }
        GameAction::ClearBuzzer => {
            game.buzzed_player_id = None;
            Outcome::changed(Reply::Ok)
        }
        GameAction::ClearCooldown => {
            game.last_guesser_id = None;
            Outcome::changed(Reply::Ok)
        }
        GameAction::RemovePlayer { player_id } => {
            game.remove_player(player_id);
            if game.team_mode {
                policy::refresh_teams(game);
            }
            Outcome::changed(Reply::Ok)
        }
        GameAction::RevealLetter { letter } => {
            game.status.ensure_active()?;
            let picked = letter
                .as_deref()
                .and_then(normalize_letter)
                .or_else(|| policy::pick_reveal_letter(game, ctx.rng));
            match picked {
                Some(letter) => {
                    game.guessed_letters.insert(letter);
                    Outcome::changed(Reply::Ok)
                }
                None => Outcome::quiet(Reply::Ok),
            }
        }
        GameAction::Reveal => {
            game.status = transition(game.status, GameEvent::Reveal);
            game.buzzed_player_id = None;
            Outcome::changed(Reply::Ok)
        }
        GameAction::Reset => {
            game.reset();
            Outcome::changed(Reply::Ok).with_timer(TimerUpdate::Cancel)
        }
        GameAction::GetState => Outcome::quiet(Reply::State),
        GameAction::GetHostState => Outcome::quiet(Reply::HostState),
        GameAction::SetWinnerPhoto(_) => {
            let url = ctx
                .uploaded_photo
                .ok_or_else(|| ServiceError::Internal("winner photo was not uploaded".into()))?;
            game.winner_photo_data_url = url.clone();
            Outcome::changed(Reply::WinnerPhoto(url))
        }
        GameAction::SetSkipTurn(enabled) => {
            game.skip_turn_after_guess = *enabled;
            if !enabled {
                game.last_guesser_id = None;
            }
            Outcome::changed(Reply::Ok)
        }
        GameAction::SetDancingUnicorn(enabled) => {
            game.show_dancing_unicorn = *enabled;
            Outcome::changed(Reply::Ok)
        }
        GameAction::SetTeamMode(enabled) => {
            game.status
                .ensure_waiting("Can only change team mode before game starts")?;
            game.team_mode = *enabled;
            policy::refresh_teams(game);
            Outcome::changed(Reply::Ok)
        }
        GameAction::SetPhrase(phrase) => {
            game.status
                .ensure_waiting("Can only set phrase before game starts")?;
            game.target_phrase = phrase.to_uppercase();
            Outcome::changed(Reply::Ok)
        }
        GameAction::ToggleBuzzersPause => {
            game.buzzers_paused = !game.buzzers_paused;
            game.buzzers_reenable_at = None;
            Outcome::changed(Reply::Ok).with_timer(TimerUpdate::Cancel)
        }
        GameAction::ReenableBuzzers => match game.buzzers_reenable_at {
            Some(deadline) if ctx.honor_early_reenable || ctx.now_ms >= deadline => {
                game.buzzers_paused = false;
                game.buzzers_reenable_at = None;
                Outcome::changed(Reply::Ok).with_timer(TimerUpdate::Cancel)
            }
            // Early call: the server timer will clear the pause at the deadline.
            Some(_) => Outcome::quiet(Reply::Ok),
            None => Outcome::quiet(Reply::Ok),
        },
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig,
        dto::game::mask_phrase,
        state::game::{GameStatus, Team},
    };

    const NOW: i64 = 1_700_000_000_000;

    struct Harness {
        game: GameState,
        rng: StdRng,
        honor_early: bool,
        photo: Option<String>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                game: GameState::new(&AppConfig::default()),
                rng: StdRng::seed_from_u64(42),
                honor_early: false,
                photo: None,
            }
        }

        fn run_at(&mut self, now_ms: i64, action: GameAction) -> Result<Outcome, ServiceError> {
            let mut scratch = self.game.clone();
            let result = apply(
                &mut scratch,
                &action,
                DispatchContext {
                    now_ms,
                    reenable_delay: Duration::from_millis(5_000),
                    honor_early_reenable: self.honor_early,
                    uploaded_photo: self.photo.take(),
                    rng: &mut self.rng,
                },
            );
            if result.is_ok() {
                self.game = scratch;
            }
            result
        }

        fn run(&mut self, action: GameAction) -> Result<Outcome, ServiceError> {
            self.run_at(NOW, action)
        }

        fn join(&mut self, id: &str) {
            self.run(GameAction::Join {
                player_id: id.into(),
                player_name: id.to_uppercase(),
            })
            .unwrap();
        }

        fn buzz(&mut self, id: &str) -> Result<Outcome, ServiceError> {
            self.run(GameAction::Buzz {
                player_id: Some(id.into()),
            })
        }

        fn guess(&mut self, id: &str, letter: &str) -> Result<Outcome, ServiceError> {
            self.run(GameAction::GuessLetter {
                player_id: Some(id.into()),
                letter: Some(letter.into()),
            })
        }
    }

    fn cat_game() -> Harness {
        let mut h = Harness::new();
        h.run(GameAction::SetPhrase("cat".into())).unwrap();
        h.join("p1");
        h.join("p2");
        h.run(GameAction::Start).unwrap();
        h
    }

    #[test]
    fn buzz_then_guess_scenario() {
        let mut h = cat_game();

        let outcome = h.buzz("p1").unwrap();
        assert_eq!(outcome.reply, Reply::BuzzedPlayer("p1".into()));
        assert_eq!(
            outcome.buzz,
            Some(BuzzEvent {
                player_id: "p1".into(),
                player_name: "P1".into(),
            })
        );

        let outcome = h.guess("p1", "c").unwrap();
        assert_eq!(outcome.timer, TimerUpdate::Schedule(NOW + 5_000));
        assert!(h.game.guessed_letters.iter().eq(['C'].iter()));
        assert_eq!(h.game.buzzed_player_id, None);
        assert!(h.game.buzzers_paused);
        assert_eq!(h.game.last_guesser_id.as_deref(), Some("p1"));
        assert_eq!(h.game.buzzers_reenable_at, Some(NOW + 5_000));
        assert_eq!(mask_phrase(&h.game), "C__");
    }

    #[test]
    fn second_buzz_is_a_silent_no_op() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();

        let outcome = h.buzz("p2").unwrap();
        assert_eq!(outcome.reply, Reply::BuzzedPlayer("p1".into()));
        assert!(!outcome.broadcast);
        assert!(outcome.buzz.is_none());
    }

    #[test]
    fn repeated_guess_is_idempotent_but_reapplies_pause() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.guess("p1", "C").unwrap();
        h.run(GameAction::ToggleBuzzersPause).unwrap();
        h.buzz("p2").unwrap();

        let outcome = h
            .run_at(
                NOW + 1_000,
                GameAction::GuessLetter {
                    player_id: Some("p2".into()),
                    letter: Some("c".into()),
                },
            )
            .unwrap();

        assert_eq!(h.game.guessed_letters.len(), 1);
        assert!(h.game.buzzers_paused);
        assert_eq!(h.game.last_guesser_id.as_deref(), Some("p2"));
        assert_eq!(outcome.timer, TimerUpdate::Schedule(NOW + 6_000));
    }

    #[test]
    fn guess_errors_follow_turn_then_letter() {
        let mut h = cat_game();
        assert!(matches!(h.guess("p1", "C"), Err(ServiceError::Forbidden(_))));

        h.buzz("p1").unwrap();
        assert!(matches!(
            h.run(GameAction::GuessLetter {
                player_id: Some("p1".into()),
                letter: None,
            }),
            Err(ServiceError::InvalidInput(message)) if message == "Missing letter"
        ));
        assert!(matches!(
            h.guess("p1", "7"),
            Err(ServiceError::InvalidInput(message)) if message.contains("A-Z")
        ));
        assert_eq!(h.game.buzzed_player_id.as_deref(), Some("p1"));
    }

    #[test]
    fn buzz_refused_while_paused_even_without_cooldown() {
        let mut h = cat_game();
        h.run(GameAction::SetSkipTurn(false)).unwrap();
        h.run(GameAction::ToggleBuzzersPause).unwrap();
        assert!(matches!(h.buzz("p1"), Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn disabling_skip_turn_clears_cooldown() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.guess("p1", "A").unwrap();
        h.run(GameAction::ToggleBuzzersPause).unwrap();
        assert!(matches!(h.buzz("p1"), Err(ServiceError::Forbidden(_))));

        h.run(GameAction::SetSkipTurn(false)).unwrap();
        assert_eq!(h.game.last_guesser_id, None);
        assert!(h.buzz("p1").is_ok());
    }

    #[test]
    fn phrase_only_changes_while_waiting() {
        let mut h = Harness::new();
        h.run(GameAction::SetPhrase("mark shibley".into())).unwrap();
        assert_eq!(h.game.target_phrase, "MARK SHIBLEY");

        h.run(GameAction::Start).unwrap();
        assert!(matches!(
            h.run(GameAction::SetPhrase("dog".into())),
            Err(ServiceError::WrongPhase(_))
        ));
        assert_eq!(h.game.target_phrase, "MARK SHIBLEY");
    }

    #[test]
    fn team_mode_assigns_and_follows_roster() {
        let mut h = Harness::new();
        for id in ["a", "b", "c"] {
            h.join(id);
        }
        h.run(GameAction::SetTeamMode(true)).unwrap();
        h.join("d");
        assert_eq!(h.game.team_assignments["a"], Team::Blue);
        assert_eq!(h.game.team_assignments["b"], Team::Red);
        assert_eq!(h.game.team_assignments["c"], Team::Blue);
        assert_eq!(h.game.team_assignments["d"], Team::Red);

        h.run(GameAction::RemovePlayer {
            player_id: "a".into(),
        })
        .unwrap();
        assert_eq!(h.game.team_assignments["b"], Team::Blue);
        assert_eq!(h.game.team_assignments["c"], Team::Red);
        assert_eq!(h.game.team_assignments.len(), 3);

        h.run(GameAction::SetTeamMode(false)).unwrap();
        assert!(h.game.team_assignments.is_empty());

        h.run(GameAction::Start).unwrap();
        assert!(matches!(
            h.run(GameAction::SetTeamMode(true)),
            Err(ServiceError::WrongPhase(_))
        ));
    }

    #[test]
    fn removing_buzzed_player_clears_floor() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.run(GameAction::RemovePlayer {
            player_id: "p1".into(),
        })
        .unwrap();
        assert_eq!(h.game.buzzed_player_id, None);
        assert!(h.game.player("p1").is_none());
    }

    #[test]
    fn reveal_letter_auto_picks_hidden_letter() {
        let mut h = cat_game();
        h.run(GameAction::RevealLetter {
            letter: Some("c".into()),
        })
        .unwrap();

        h.run(GameAction::RevealLetter { letter: None }).unwrap();
        assert_eq!(h.game.guessed_letters.len(), 2);
        let picked = h.game.guessed_letters[1];
        assert!(picked == 'A' || picked == 'T');

        h.run(GameAction::RevealLetter {
            letter: Some("??".into()),
        })
        .unwrap();
        let outcome = h.run(GameAction::RevealLetter { letter: None }).unwrap();
        assert!(!outcome.broadcast);
        assert_eq!(h.game.guessed_letters.len(), 3);
    }

    #[test]
    fn reveal_letter_requires_active_game() {
        let mut h = Harness::new();
        assert!(matches!(
            h.run(GameAction::RevealLetter { letter: None }),
            Err(ServiceError::WrongPhase(_))
        ));
    }

    #[test]
    fn reveal_then_reset_keeps_settings() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.run(GameAction::Reveal).unwrap();
        assert_eq!(h.game.status, GameStatus::Revealed);
        assert_eq!(h.game.buzzed_player_id, None);
        assert_eq!(mask_phrase(&h.game), "CAT");

        let outcome = h.run(GameAction::Reset).unwrap();
        assert_eq!(outcome.timer, TimerUpdate::Cancel);
        assert_eq!(h.game.status, GameStatus::Waiting);
        assert!(h.game.players.is_empty());
        assert_eq!(h.game.target_phrase, "CAT");
    }

    #[test]
    fn early_reenable_is_ignored_unless_honoured() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.guess("p1", "C").unwrap();

        let outcome = h.run_at(NOW + 1_000, GameAction::ReenableBuzzers).unwrap();
        assert!(!outcome.broadcast);
        assert!(h.game.buzzers_paused);

        let outcome = h.run_at(NOW + 5_000, GameAction::ReenableBuzzers).unwrap();
        assert!(outcome.broadcast);
        assert!(!h.game.buzzers_paused);
        assert_eq!(h.game.buzzers_reenable_at, None);

        h.buzz("p2").unwrap();
        h.guess("p2", "A").unwrap();
        h.honor_early = true;
        h.run_at(NOW + 1, GameAction::ReenableBuzzers).unwrap();
        assert!(!h.game.buzzers_paused);
    }

    #[test]
    fn manual_toggle_cancels_pending_reenable() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.guess("p1", "C").unwrap();
        assert_eq!(h.game.buzzers_reenable_at, Some(NOW + 5_000));

        let outcome = h.run(GameAction::ToggleBuzzersPause).unwrap();
        assert_eq!(outcome.timer, TimerUpdate::Cancel);
        assert!(outcome.broadcast);
        assert!(!h.game.buzzers_paused);
        assert_eq!(h.game.buzzers_reenable_at, None);

        let outcome = h.run(GameAction::ToggleBuzzersPause).unwrap();
        assert_eq!(outcome.timer, TimerUpdate::Cancel);
        assert!(h.game.buzzers_paused);
        assert_eq!(h.game.buzzers_reenable_at, None);
    }

    #[test]
    fn start_clears_pause_and_round_state() {
        let mut h = cat_game();
        h.buzz("p1").unwrap();
        h.guess("p1", "C").unwrap();
        assert!(h.game.buzzers_paused);

        let outcome = h.run(GameAction::Start).unwrap();
        assert_eq!(outcome.timer, TimerUpdate::Cancel);
        assert_eq!(h.game.status, GameStatus::Active);
        assert!(!h.game.buzzers_paused);
        assert_eq!(h.game.buzzers_reenable_at, None);
        assert_eq!(h.game.last_guesser_id, None);
        assert!(h.game.guessed_letters.is_empty());
    }

    #[test]
    fn reenable_without_deadline_is_quiet() {
        let mut h = cat_game();
        h.run(GameAction::ToggleBuzzersPause).unwrap();
        let outcome = h.run(GameAction::ReenableBuzzers).unwrap();
        assert!(!outcome.broadcast);
        assert!(h.game.buzzers_paused);
    }

    #[test]
    fn winner_photo_is_stored_from_upload() {
        let mut h = Harness::new();
        h.photo = Some("https://blob.test/p.png".into());
        let outcome = h
            .run(GameAction::SetWinnerPhoto(
                crate::dto::action::WinnerPhotoInput {
                    data_url: "data:image/png;base64,AAAA".into(),
                },
            ))
            .unwrap();
        assert_eq!(
            outcome.reply,
            Reply::WinnerPhoto("https://blob.test/p.png".into())
        );
        assert_eq!(h.game.winner_photo_data_url, "https://blob.test/p.png");
    }

    #[test]
    fn failed_action_leaves_state_untouched() {
        let mut h = cat_game();
        let before = h.game.clone();
        assert!(h.guess("p2", "C").is_err());
        assert_eq!(h.game, before);
    }
}
