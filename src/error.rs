//! Application error type shared by every layer.
//!
//! Each variant carries a stable machine-readable code (see [`AppError::code`]),
//! a human-readable message and optional structured details. Raw storage and
//! cache errors are logged where they happen and never reach the response body.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// The link exists but its expiry time has passed.
    #[error("{message}")]
    Expired { message: String, details: Value },

    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Code allocation hit its retry bound.
    #[error("{message}")]
    GenerationExhausted { message: String, details: Value },

    #[error("{message}")]
    TransientStore { message: String, details: Value },

    #[error("{message}")]
    TransientCache { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited {
            message: "Rate limit exceeded, try again later".to_string(),
            retry_after_secs,
        }
    }

    pub fn generation_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::GenerationExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn transient_store(message: impl Into<String>, details: Value) -> Self {
        Self::TransientStore {
            message: message.into(),
            details,
        }
    }

    pub fn transient_cache(message: impl Into<String>, details: Value) -> Self {
        Self::TransientCache {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable error kind exposed to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Expired { .. } => "expired",
            Self::RateLimited { .. } => "rate_limited",
            Self::GenerationExhausted { .. } => "generation_exhausted",
            Self::TransientStore { .. } => "transient_store_failure",
            Self::TransientCache { .. } => "transient_cache_failure",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Expired { .. } => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::GenerationExhausted { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TransientStore { .. } | Self::TransientCache { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Returns true for failures a caller may safely retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientStore { .. } | Self::TransientCache { .. }
        )
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let details = match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => json!({ "retry_after_secs": retry_after_secs }),
            Self::Validation { details, .. }
            | Self::NotFound { details, .. }
            | Self::Conflict { details, .. }
            | Self::Expired { details, .. }
            | Self::GenerationExhausted { details, .. }
            | Self::TransientStore { details, .. }
            | Self::TransientCache { details, .. }
            | Self::Internal { details, .. } => details.clone(),
        };

        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::warn!("Transient database error: {}", e);
                AppError::transient_store("Storage temporarily unavailable", json!({}))
            }
            other => {
                tracing::error!("Database error: {}", other);
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();

        AppError::bad_request("Request validation failed", json!({ "fields": fields }))
    }
}
