use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stackpilot_config::ConfigError;
use stackpilot_orchestrator::OrchestratorError;
use stackpilot_store::LedgerError;
use thiserror::Error;

/// Every failure a handler can produce, mapped onto the JSON envelope
/// `{"ok": false, "error": <message>}` with the matching HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized. Sign in first.")]
    Unauthorized,

    #[error("Forbidden. {role} role required.")]
    Forbidden { role: &'static str },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(LedgerError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Orchestrator(OrchestratorError::Ledger(LedgerError::Store(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({"ok": false, "error": self.to_string()}));
        (status, body).into_response()
    }
}
