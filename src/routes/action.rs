use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use tracing::debug;

use crate::{
    dto::{action::ActionRequest, response::ActionResponse},
    error::AppError,
    services::action_service,
    state::SharedState,
};

#[utoipa::path(
    post,
    path = "/api/game/action",
    tag = "game",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action applied", body = ActionResponse),
        (status = 400, description = "Invalid payload, wrong game phase or unknown action", body = crate::error::ErrorBody),
        (status = 403, description = "Requester may not act right now", body = crate::error::ErrorBody),
        (status = 500, description = "Upload or internal failure", body = crate::error::ErrorBody)
    )
)]
/// Apply one game action (`join`, `buzz`, `guess_letter`, host controls, ...).
pub async fn game_action(
    State(state): State<SharedState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected action body");
        AppError::BadRequest("Invalid request body".into())
    })?;
    let response = action_service::dispatch(&state, request).await?;
    Ok(Json(response))
}

/// Configure the game action route.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/api/game/action", post(game_action))
}
