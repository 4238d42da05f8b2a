use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use serde::Serialize;
use std::error::Error;

/// Ties a domain error to the HTTP status an endpoint answers with.
/// The `Display` impl of the error is the public message; anything attached
/// to the report stays in the logs.
pub trait HttpError: Error {
    fn status_code(&self) -> StatusCode;
}

#[derive(thiserror::Error)]
#[error("there was an error running the endpoint")]
pub struct EndpointError<T: HttpError>(Report<T>);

impl<T: HttpError> std::fmt::Debug for EndpointError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl<T> From<Report<T>> for EndpointError<T>
where
    T: HttpError,
{
    fn from(value: Report<T>) -> Self {
        Self(value)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl<T: HttpError + Send + Sync + 'static> IntoResponse for EndpointError<T> {
    fn into_response(self) -> Response {
        let status = self.0.current_context().status_code();
        if status.is_server_error() {
            tracing::error!("endpoint failed: {:?}", self.0);
        } else {
            tracing::warn!("endpoint rejected the request: {:?}", self.0);
        }

        let body = ErrorBody {
            error: self.0.current_context().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
