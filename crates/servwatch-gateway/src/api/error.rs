use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use servwatch_core::error::ServWatchError;

/// HTTP wrapper around the shared error type.
#[derive(Debug)]
pub struct ApiError {
    err: ServWatchError,
    /// Overrides the error's own message in the response body.
    message: Option<&'static str>,
}

impl ApiError {
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.err {
            ServWatchError::BadRequest(_) | ServWatchError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ServWatchError::NotFound(_) => StatusCode::NOT_FOUND,
            ServWatchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServWatchError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServWatchError::UnsupportedVersion | ServWatchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        if let Some(m) = self.message {
            return m.to_string();
        }
        match &self.err {
            ServWatchError::InvalidId(_) => "Invalid server ID format".to_string(),
            ServWatchError::NotFound(_) => "Server not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ServWatchError> for ApiError {
    fn from(err: ServWatchError) -> Self {
        Self { err, message: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message(),
            "code": self.err.client_code().as_str(),
        }));
        (self.status(), body).into_response()
    }
}
