use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Swagger UI at `/docs`, document at `/api-doc/openapi.json`.
pub fn router() -> Router<SharedState> {
    SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into()
}
