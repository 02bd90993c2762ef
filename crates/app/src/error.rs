//! Maps service failures to HTTP statuses and a JSON error body.
//!
//! The body carries `detail`, which is the field browser clients of this API
//! already read their error text from.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docvoice_core::{ExtractError, GenerationError, ServiceError, TranscriptionError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code, e.g. "validation_error".
    pub error: String,
    pub detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 415: upload extension is not one we can extract.
    UnsupportedMediaType(String),
    /// 422: request parsed but its values are unusable.
    Validation(String),
    /// 404
    NotFound(String),
    /// 502: an upstream AI or speech service failed.
    Upstream(String),
    /// 503: a required external service is not configured.
    NotConfigured(String),
    /// 500
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::UnsupportedMediaType(_) => "unsupported_format",
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::NotConfigured(_) => "configuration_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn into_detail(self) -> String {
        match self {
            ApiError::UnsupportedMediaType(detail)
            | ApiError::Validation(detail)
            | ApiError::NotFound(detail)
            | ApiError::Upstream(detail)
            | ApiError::NotConfigured(detail)
            | ApiError::Internal(detail) => detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = ?self, "request rejected");
        }

        let body = ErrorBody {
            error: self.code().to_string(),
            detail: self.into_detail(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Configuration(_) => ApiError::NotConfigured(message),
            ServiceError::Validation(_) => ApiError::Validation(message),
            ServiceError::NotFound(_) => ApiError::NotFound(message),
            ServiceError::Extraction(ExtractError::UnsupportedFormat(_)) => {
                ApiError::UnsupportedMediaType(message)
            }
            ServiceError::Extraction(ExtractError::Worker(_) | ExtractError::Io(_)) => {
                ApiError::Internal(message)
            }
            ServiceError::Extraction(_) => ApiError::Validation(message),
            ServiceError::Generation(GenerationError::Worker(_))
            | ServiceError::Transcription(TranscriptionError::Worker(_)) => {
                ApiError::Internal(message)
            }
            ServiceError::Transcription(TranscriptionError::InvalidAudio(_)) => {
                ApiError::Validation(message)
            }
            ServiceError::Generation(_) | ServiceError::Transcription(_) => {
                ApiError::Upstream(message)
            }
        }
    }
}
