use axum::http::StatusCode;
use engine::error::HttpError;

/// Every way an endpoint can fail, with the status it answers with. The
/// display strings double as the public `{error}` message; upstream payload
/// detail stays in the report attachments, which only reach the logs.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum DashboardServiceError {
    #[error("a required query parameter is missing or empty")]
    MissingParameter,
    #[error("a username needs at least one character besides '@'")]
    BadUsername,
    #[error("no matching data was found upstream")]
    NotFound,
    #[error("the upstream data source could not be reached")]
    Upstream,
    #[error("building the export file failed")]
    Export,
}

impl HttpError for DashboardServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::BadUsername => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream | Self::Export => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
