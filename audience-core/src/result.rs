use error_stack::Report;

pub type ApiResult<T> = Result<T, Report<UpstreamApiError>>;

/// What went wrong talking to an upstream API. The display strings are the
/// only thing a caller may show to an end user; the upstream payload itself
/// belongs in the logs, attached to the report.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamApiError {
    #[error("the upstream request could not be sent")]
    Transport,
    #[error("the upstream response could not be decoded")]
    Decode,
    #[error("upstream rejected the request")]
    Rejected,
    #[error("upstream returned no matching data")]
    NoData,
}
