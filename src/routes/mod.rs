use axum::Router;

use crate::state::SharedState;

pub mod action;
pub mod docs;
pub mod health;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router: Router<SharedState> = health::router()
        .merge(sse::router())
        .merge(action::router())
        .merge(docs::router());

    api_router.with_state(state)
}
