use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected before any query runs (out-of-range rounds, unknown metric, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Single-entity lookup with no matching rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Snapshot missing or unreadable. Fatal at startup.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The SQL mirror and the in-memory engine disagreed on a query.
    #[error("Backend divergence in {query}: in-memory and SQL results differ")]
    BackendDivergence { query: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            _ => {
                // Full detail stays server-side.
                error!(error = %self, "Query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
