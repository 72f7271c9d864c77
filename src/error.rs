use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::services::photo_upload::UploadError;

/// Generic message returned for failures whose details must stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed fields in the action payload.
    #[error("{0}")]
    InvalidInput(String),
    /// Action is not allowed in the current game status.
    #[error("{0}")]
    WrongPhase(String),
    /// Requester is not allowed to act right now (paused, cooldown, not their turn).
    #[error("{0}")]
    Forbidden(String),
    /// Action name is not part of the protocol.
    #[error("Unknown action")]
    UnknownAction,
    /// The blob upload collaborator failed.
    #[error("Failed to upload photo")]
    Upload(#[source] UploadError),
    /// Unexpected failure; the detail is logged and never returned to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<UploadError> for ServiceError {
    fn from(err: UploadError) -> Self {
        ServiceError::Upload(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        let message = err
            .field_errors()
            .into_values()
            .flat_map(|errors| errors.iter())
            .find_map(|error| error.message.as_ref().map(|message| message.to_string()))
            .unwrap_or_else(|| format!("validation failed: {err}"));
        ServiceError::InvalidInput(message)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input or a wrong game phase.
    #[error("{0}")]
    BadRequest(String),
    /// Requester is not allowed to perform the action right now.
    #[error("{0}")]
    Forbidden(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) | ServiceError::WrongPhase(message) => {
                AppError::BadRequest(message)
            }
            ServiceError::UnknownAction => AppError::BadRequest(err.to_string()),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::Upload(ref source) => {
                error!(error = %source, "winner photo upload failed");
                AppError::Internal(err.to_string())
            }
            ServiceError::Internal(detail) => {
                error!(%detail, "game action failed");
                AppError::Internal(INTERNAL_ERROR_MESSAGE.into())
            }
        }
    }
}

/// Body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable reason.
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}
