use crate::error::DashboardServiceError;
use error_stack::Report;

pub type ServiceResult<T> = Result<T, Report<DashboardServiceError>>;
mod error;
mod metrics;
pub mod routes;
pub mod service;
pub mod state;
