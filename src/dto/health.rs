use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Where winner photos go: "blob" or "inline".
    pub uploads: String,
    /// Players currently in the session.
    pub players: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(uploads: &str, players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            uploads: uploads.to_string(),
            players,
        }
    }
}
