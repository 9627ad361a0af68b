//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use league_core::LeagueError;

/// Error returned by every handler, rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    League(#[from] LeagueError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::League(e) => match e {
                LeagueError::InvalidMatch(_)
                | LeagueError::InvalidSettings(_)
                | LeagueError::InvalidAgent(_) => StatusCode::BAD_REQUEST,
                LeagueError::UnknownLeague(_) | LeagueError::UnknownAgent(_) => StatusCode::NOT_FOUND,
                LeagueError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
                LeagueError::Storage(_) | LeagueError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
