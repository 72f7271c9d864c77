use tokio::time::timeout;
use tracing::{debug, info};

use crate::{
    dto::{
        action::{ActionRequest, GameAction, WinnerPhotoInput},
        response::{ActionResponse, StateView},
    },
    error::ServiceError,
    services::{
        dispatcher::{self, DispatchContext, Reply},
        photo_upload::{DataUrlImage, UploadError},
        policy, reenable_timer, sse_events,
    },
    state::SharedState,
};

/// Decode, validate and apply one game action, then notify subscribers.
///
/// The game lock is held from validation to broadcast. The action runs against a copy of the
/// state which replaces the live state only on success.
pub async fn dispatch(
    state: &SharedState,
    request: ActionRequest,
) -> Result<ActionResponse, ServiceError> {
    let action = GameAction::try_from(request)?;
    let name = action.name();
    let mut game = state.game().lock().await;

    let uploaded_photo = match &action {
        GameAction::SetWinnerPhoto(input) => Some(upload_winner_photo(state, input).await?),
        _ => None,
    };

    let mut next = game.clone();
    let result = {
        let mut rng = rand::rng();
        dispatcher::apply(
            &mut next,
            &action,
            DispatchContext {
                now_ms: policy::now_millis(),
                reenable_delay: state.config().reenable_delay(),
                honor_early_reenable: state.config().honor_early_reenable(),
                uploaded_photo,
                rng: &mut rng,
            },
        )
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            debug!(action = name, error = %err, "action rejected");
            return Err(err);
        }
    };

    *game = next;
    if outcome.broadcast {
        sse_events::broadcast_game_update(state, &game);
        info!(action = name, status = ?game.status, players = game.players.len(), "game updated");
    }
    if let Some(buzz) = &outcome.buzz {
        sse_events::broadcast_buzz(state, buzz);
        info!(player_id = %buzz.player_id, "player buzzed in");
    }
    reenable_timer::apply(state, outcome.timer).await;

    let response = match outcome.reply {
        Reply::Ok => ActionResponse::ok(),
        Reply::State => ActionResponse::with_state(StateView::Client((&*game).into())),
        Reply::HostState => ActionResponse::with_state(StateView::Host((&*game).into())),
        Reply::BuzzedPlayer(player_id) => ActionResponse::with_buzzed_player(player_id),
        Reply::WinnerPhoto(url) => ActionResponse::with_winner_photo(url),
    };
    Ok(response)
}

/// Hand the photo to the upload collaborator, bounded by the configured timeout.
async fn upload_winner_photo(
    state: &SharedState,
    input: &WinnerPhotoInput,
) -> Result<String, ServiceError> {
    let image = DataUrlImage::parse(input.data_url.clone())?;
    let uploader = state.uploader();
    let limit = state.config().upload_timeout();

    match timeout(limit, uploader.upload(image)).await {
        Ok(stored) => {
            let stored = stored?;
            info!(uploader = uploader.kind(), "winner photo stored");
            Ok(stored)
        }
        Err(_) => Err(UploadError::TimedOut.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        config::AppConfig,
        services::photo_upload::{InlineUploader, PhotoUploader},
        state::AppState,
    };

    struct FailingUploader;

    impl PhotoUploader for FailingUploader {
        fn upload(&self, _image: DataUrlImage) -> BoxFuture<'static, Result<String, UploadError>> {
            Box::pin(async { Err(UploadError::InvalidDataUrl("refused")) })
        }

        fn kind(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowUploader;

    impl PhotoUploader for SlowUploader {
        fn upload(&self, _image: DataUrlImage) -> BoxFuture<'static, Result<String, UploadError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("https://never.test".to_string())
            })
        }

        fn kind(&self) -> &'static str {
            "slow"
        }
    }

    fn request(body: Value) -> ActionRequest {
        serde_json::from_value(body).unwrap()
    }

    async fn run(state: &SharedState, body: Value) -> Result<ActionResponse, ServiceError> {
        dispatch(state, request(body)).await
    }

    const PHOTO: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[tokio::test]
    async fn join_broadcasts_and_returns_client_state() {
        let state = AppState::new(AppConfig::default(), Arc::new(InlineUploader));
        let mut public = state.public_sse().subscribe();

        let response = run(&state, json!({"action": "join", "playerId": "p1", "playerName": "Ada"}))
            .await
            .unwrap();

        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["state"]["players"][0]["name"], "Ada");
        assert!(body["state"].get("targetPhrase").is_none());
        assert_eq!(
            public.try_recv().unwrap().event.as_deref(),
            Some(sse_events::EVENT_GAME_UPDATE)
        );
    }

    #[tokio::test]
    async fn rejected_action_does_not_broadcast() {
        let state = AppState::new(AppConfig::default(), Arc::new(InlineUploader));
        let mut public = state.public_sse().subscribe();

        let err = run(&state, json!({"action": "buzz", "playerId": "p1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::WrongPhase(_)));
        assert!(public.try_recv().is_err());
    }

    #[tokio::test]
    async fn inline_photo_is_stored_as_is() {
        let state = AppState::new(AppConfig::default(), Arc::new(InlineUploader));
        let response = run(
            &state,
            json!({"action": "set_winner_photo", "winnerPhotoDataUrl": PHOTO}),
        )
        .await
        .unwrap();

        assert_eq!(response.winner_photo_data_url.as_deref(), Some(PHOTO));
        assert_eq!(state.game().lock().await.winner_photo_data_url, PHOTO);
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_photo() {
        let state = AppState::new(AppConfig::default(), Arc::new(FailingUploader));
        state.game().lock().await.winner_photo_data_url = "previous".into();

        let err = run(
            &state,
            json!({"action": "set_winner_photo", "winnerPhotoDataUrl": PHOTO}),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Upload(_)));
        assert_eq!(state.game().lock().await.winner_photo_data_url, "previous");
    }

    #[tokio::test]
    async fn slow_upload_times_out() {
        let config = AppConfig::default().with_upload_timeout(Duration::from_millis(20));
        let state = AppState::new(config, Arc::new(SlowUploader));

        let err = run(
            &state,
            json!({"action": "set_winner_photo", "winnerPhotoDataUrl": PHOTO}),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Upload(UploadError::TimedOut)));
        assert!(state.game().lock().await.winner_photo_data_url.is_empty());
    }

    #[tokio::test]
    async fn guess_schedules_and_reset_cancels_timer() {
        let state = AppState::new(AppConfig::default(), Arc::new(InlineUploader));
        for body in [
            json!({"action": "set_phrase", "phrase": "cat"}),
            json!({"action": "join", "playerId": "p1", "playerName": "Ada"}),
            json!({"action": "start"}),
            json!({"action": "buzz", "playerId": "p1"}),
            json!({"action": "guess_letter", "playerId": "p1", "letter": "c"}),
        ] {
            run(&state, body).await.unwrap();
        }
        assert!(state.reenable_timer().lock().await.is_some());

        run(&state, json!({"action": "reset"})).await.unwrap();
        assert!(state.reenable_timer().lock().await.is_none());
    }

    #[tokio::test]
    async fn pause_toggle_cancels_timer() {
        let state = AppState::new(AppConfig::default(), Arc::new(InlineUploader));
        for body in [
            json!({"action": "set_phrase", "phrase": "cat"}),
            json!({"action": "join", "playerId": "p1", "playerName": "Ada"}),
            json!({"action": "start"}),
            json!({"action": "buzz", "playerId": "p1"}),
            json!({"action": "guess_letter", "playerId": "p1", "letter": "c"}),
        ] {
            run(&state, body).await.unwrap();
        }
        assert!(state.reenable_timer().lock().await.is_some());

        run(&state, json!({"action": "toggle_buzzers_pause"})).await.unwrap();
        assert!(state.reenable_timer().lock().await.is_none());
        let game = state.game().lock().await;
        assert!(!game.buzzers_paused);
        assert_eq!(game.buzzers_reenable_at, None);
    }
}
