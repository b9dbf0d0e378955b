//! Error types shared by the engines, stores, and HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Product {product} is out of stock")]
    InsufficientStock { product: String },

    #[error("You have already reviewed this product")]
    DuplicateReview,

    #[error("You are not logged in")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// "No {resource} found with that ID" — the generic lookup failure.
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound {
            message: format!("No {resource} found with that ID"),
        }
    }

    /// Checkout's per-item lookup failure, which names the missing id.
    pub fn product_missing(id: Uuid) -> Self {
        Self::NotFound {
            message: format!("Product with ID {id} not found"),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable machine-readable kind for the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::DuplicateReview => "duplicate_review",
            Self::Unauthorized => "unauthorized",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::InsufficientStock { .. } | Self::DuplicateReview => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// "fail" for client errors, "error" for server errors.
    pub status: &'static str,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            status: if status.is_server_error() { "error" } else { "fail" },
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
