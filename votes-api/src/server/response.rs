// Response envelope and error rendering
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use votes_engine::VoteError;

/// Body of every vote endpoint response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, content: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            content: Some(content),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// A `VoteError` on its way out of a handler.
#[derive(Debug)]
pub struct HandlerError(pub VoteError);

impl From<VoteError> for HandlerError {
    fn from(err: VoteError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &VoteError) -> StatusCode {
    match err {
        VoteError::Unauthenticated => StatusCode::UNAUTHORIZED,
        VoteError::ResourceNotFound(_) | VoteError::VoteNotFound { .. } => StatusCode::NOT_FOUND,
        VoteError::Conflict { .. } => StatusCode::CONFLICT,
        VoteError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Seconds a client should wait before retrying a failed commit.
pub const RETRY_AFTER_SECS: &str = "1";

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ApiResponse::<()> {
        status_code: status.as_u16(),
        message,
        content: None,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let mut response = error_response(status, self.0.to_string());
        if self.0.is_retryable() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

/// A request axum could not extract (bad JSON body, missing query parameter).
#[derive(Debug)]
pub struct RejectedRequest {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for RejectedRequest {
    fn into_response(self) -> Response {
        error_response(self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(status_for(&VoteError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&VoteError::ResourceNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&VoteError::VoteNotFound { user_id: id, resource_id: id }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&VoteError::Conflict { user_id: id, resource_id: id }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&VoteError::persistence("pool closed")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_only_persistence_failures_carry_retry_after() {
        let response = HandlerError(VoteError::persistence("commit timed out")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], RETRY_AFTER_SECS);

        let response = HandlerError(VoteError::Unauthenticated).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let body = serde_json::to_value(ApiResponse::ok("Vote recorded successfully.", 7)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "statusCode": 200,
                "message": "Vote recorded successfully.",
                "content": 7
            })
        );
    }
}
