use audience_core::audience::AudienceReport;
use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Body of the audience endpoint. The status mirrors how the fan-out went:
/// OK when every batch arrived, MULTI_STATUS when some failed, and a server
/// error when none did.
#[derive(Debug, Serialize, ToSchema)]
pub struct AudienceResponse {
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(flatten)]
    report: AudienceReport,
}

impl AudienceResponse {
    pub fn new(report: AudienceReport) -> Self {
        let status_code = match (report.batches.len(), report.failures.len()) {
            (_, 0) => StatusCode::OK,
            (0, 1..) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::MULTI_STATUS,
        };

        Self {
            status_code,
            report,
        }
    }
}

impl IntoResponse for AudienceResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// A one-shot spreadsheet download; there is no import counterpart.
#[derive(Debug)]
pub struct CsvFile {
    filename: String,
    bytes: Vec<u8>,
}

impl CsvFile {
    pub fn new(filename: String, bytes: Vec<u8>) -> Self {
        Self { filename, bytes }
    }
}

impl IntoResponse for CsvFile {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.bytes,
        )
            .into_response()
    }
}
