use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
/// Return the health status with the upload mode and player count.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::health_status(&state).await)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}
