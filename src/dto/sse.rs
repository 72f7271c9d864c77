use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Emitted once when a player takes the floor.
pub struct BuzzEvent {
    /// Player who took the floor.
    pub player_id: String,
    /// Their display name.
    pub player_name: String,
}
