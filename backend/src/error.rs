//! Error handling for the Cropwise platform
//!
//! Every error maps to an HTTP status and a stable machine-readable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{ExtractionError, ValidationFailure};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    // Pipeline errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("Location not found. Please check the spelling and try again.")]
    LocationNotFound,

    #[error("Weather service returned status {status}")]
    WeatherServiceError { status: u16 },

    #[error("Generative service returned status {status}")]
    GenerativeServiceError { status: u16 },

    #[error("Malformed model response: {0}")]
    MalformedModelResponse(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::LocationNotFound => "LOCATION_NOT_FOUND",
            AppError::WeatherServiceError { .. } => "WEATHER_SERVICE_ERROR",
            AppError::GenerativeServiceError { .. } => "GENERATIVE_SERVICE_ERROR",
            AppError::MalformedModelResponse(_) => "MALFORMED_MODEL_RESPONSE",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::LocationNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::WeatherServiceError { .. }
            | AppError::GenerativeServiceError { .. }
            | AppError::MalformedModelResponse(_)
            | AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to end users
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Invalid email or password".to_string(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::Conflict { message, .. } => message.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalError(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures of an outbound provider rather than of the caller's input
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::LocationNotFound
                | AppError::WeatherServiceError { .. }
                | AppError::GenerativeServiceError { .. }
                | AppError::MalformedModelResponse(_)
                | AppError::ExternalService(_)
        )
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        AppError::Validation {
            field: failure.field.to_string(),
            message: failure.message.to_string(),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        AppError::MalformedModelResponse(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().map(|k| k.to_string()).collect();
        fields.sort();
        match fields.as_slice() {
            [field] => AppError::Validation {
                field: field.clone(),
                message: format!("Invalid value for {}", field),
            },
            _ => AppError::ValidationError(format!("Invalid fields: {}", fields.join(", "))),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            AppError::Conflict { resource, .. } => Some(resource.clone()),
            _ => None,
        };

        let status = self.status();
        let error_detail = ErrorDetail {
            code: self.code().to_string(),
            message: self.user_message(),
            field,
        };

        // Log the error for debugging
        if self.is_upstream() {
            tracing::warn!(code = self.code(), "Upstream provider error: {:?}", self);
        } else if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::LocationNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::WeatherServiceError { status: 500 }.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::InvalidStateTransition("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_validation_failure_conversion() {
        let err: AppError = ValidationFailure::new("location", "Please enter a location").into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.user_message(), "Please enter a location");
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_extraction_error_conversion() {
        let err: AppError = ExtractionError::NotFound(shared::JsonShape::Array).into();
        assert_eq!(err.code(), "MALFORMED_MODEL_RESPONSE");
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_upstream_error_response() {
        let err = AppError::GenerativeServiceError { status: 503 };
        assert!(err.is_upstream());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "GENERATIVE_SERVICE_ERROR");
        assert!(body["error"].get("field").is_none());
    }

    #[test]
    fn test_location_not_found_message() {
        assert!(AppError::LocationNotFound
            .user_message()
            .contains("Location not found"));
    }
}
