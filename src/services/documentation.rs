use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Phrase Buzz Back.
#[openapi(
    paths(
        crate::routes::action::game_action,
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::host_stream,
    ),
    components(
        schemas(
            crate::dto::action::ActionRequest,
            crate::dto::response::ActionResponse,
            crate::dto::response::StateView,
            crate::dto::game::ClientGameState,
            crate::dto::game::HostGameState,
            crate::dto::sse::BuzzEvent,
            crate::dto::health::HealthResponse,
            crate::error::ErrorBody,
            crate::state::game::GameStatus,
            crate::state::game::Player,
            crate::state::game::Team,
        )
    ),
    tags(
        (name = "game", description = "Game actions"),
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
