//! Domain error taxonomy shared by the stores, the deployment lifecycle
//! and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::server::metrics::record_error;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// Unknown id or slug. Also used when the caller does not own the row.
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        missing_keys: Vec<String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

impl MarketplaceError {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        MarketplaceError::NotFound(message.into())
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        MarketplaceError::Validation {
            message: message.into(),
            missing_keys: vec![],
        }
    }

    pub fn missing_keys(missing_keys: Vec<String>) -> Self {
        MarketplaceError::Validation {
            message: format!(
                "Missing required environment variables: {}",
                missing_keys.join(", ")
            ),
            missing_keys,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::Validation { .. } => StatusCode::BAD_REQUEST,
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::Unauthorized => StatusCode::UNAUTHORIZED,
            MarketplaceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            MarketplaceError::NotFound(_) => "not_found",
            MarketplaceError::Validation { .. } => "validation",
            MarketplaceError::Conflict(_) => "conflict",
            MarketplaceError::Unauthorized => "unauthorized",
            MarketplaceError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_keys: Vec<String>,
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        record_error(self.kind(), status.as_u16());
        let body = match self {
            MarketplaceError::Validation {
                message,
                missing_keys,
            } => ErrorBody {
                message,
                missing_keys,
            },
            MarketplaceError::Internal(err) => {
                error!("Internal error: {:#}", err);
                // Only the outermost context reaches the client.
                ErrorBody {
                    message: err.to_string(),
                    missing_keys: vec![],
                }
            }
            other => ErrorBody {
                message: other.to_string(),
                missing_keys: vec![],
            },
        };
        (status, Json(body)).into_response()
    }
}
