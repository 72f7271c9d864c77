/// Entry point for game actions: locking, commit, broadcast.
pub mod action_service;
/// Action transition table.
pub mod dispatcher;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Winner photo storage.
pub mod photo_upload;
/// Buzz, guess and team rules.
pub mod policy;
/// Server-side buzzer re-enable timer.
pub mod reenable_timer;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
