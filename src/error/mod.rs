//! Centralized API error handling for LoanDesk
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::account_service::AccountError;
use crate::loan_service::LoanError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    ValidationError {
        reason: &'static str,
        message: String,
    },

    /// Carries the internal cause, which is logged but never sent to the client.
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller
    pub fn client_message(&self) -> String {
        match self {
            ApiError::InternalError(_) => "Server error".to_string(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Forbidden(m)
            | ApiError::Conflict(m) => m.clone(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::ValidationError { reason, .. } => Some(reason.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server errors
        match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.client_message(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Conversions from domain errors

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        let message = err.to_string();
        match err {
            LoanError::MissingField(_) => ApiError::ValidationError {
                reason: "MISSING_FIELD",
                message,
            },
            LoanError::AmountExceeded(_) => ApiError::ValidationError {
                reason: "AMOUNT_EXCEEDED",
                message,
            },
            LoanError::InvalidAmount(_) => ApiError::ValidationError {
                reason: "INVALID_AMOUNT",
                message,
            },
            LoanError::InvalidCategory(_) => ApiError::ValidationError {
                reason: "INVALID_CATEGORY",
                message,
            },
            LoanError::Forbidden(_) => ApiError::Forbidden("Forbidden".to_string()),
            LoanError::NotFound(_) => ApiError::NotFound(message),
            LoanError::InvalidTransition { .. } => ApiError::Conflict(message),
            LoanError::ApplicantNotFound { .. }
            | LoanError::Store(_)
            | LoanError::Notification(_) => ApiError::InternalError(message),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::Forbidden(_) => ApiError::Forbidden("Forbidden".to_string()),
            AccountError::NotFound(_) => ApiError::NotFound(message),
            AccountError::Store(_) | AccountError::Notification(_) => {
                ApiError::InternalError(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
