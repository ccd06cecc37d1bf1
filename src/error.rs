use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// API error taxonomy. Every variant maps to a stable status code and a
/// generic message; internal detail is logged, never serialized.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Decryption failed")]
    Decrypt,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid credentials".into()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".into()),
            ApiError::Decrypt => (StatusCode::INTERNAL_SERVER_ERROR, "Server error".into()),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".into())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_stable() {
        let cases = [
            (ApiError::Validation("Query required".into()), 400),
            (ApiError::DuplicateEmail, 409),
            (ApiError::Unauthorized, 401),
            (ApiError::NotFound, 404),
            (ApiError::Decrypt, 500),
            (ApiError::Internal(anyhow::anyhow!("db down")), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.into_response().status().as_u16(), code);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let resp = ApiError::Internal(anyhow::anyhow!("pool timeout at 10.0.0.3")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body carries only the generic message; detail stays in logs.
    }
}
