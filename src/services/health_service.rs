use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the upload mode and roster size.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let players = state.game().lock().await.players.len();
    HealthResponse::ok(state.uploader().kind(), players)
}
