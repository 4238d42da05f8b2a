use crate::service::DashboardService;
use audience_core::DashboardEngine;
use axum::extract::FromRef;
use std::num::NonZeroUsize;

#[derive(Clone)]
pub struct DashboardAppState<T: DashboardEngine> {
    pub service: DashboardService<T>,
    pub metrics_enabled: bool,
}

impl<T: DashboardEngine> DashboardAppState<T> {
    pub fn new_with_metrics(engine: T) -> Self {
        Self {
            service: DashboardService::new(engine),
            metrics_enabled: true,
        }
    }

    pub fn new_without_metrics(engine: T) -> Self {
        Self {
            service: DashboardService::new(engine),
            metrics_enabled: false,
        }
    }

    pub fn with_fan_out(mut self, fan_out: NonZeroUsize) -> Self {
        self.service = self.service.with_fan_out(fan_out);
        self
    }
}

impl<T: DashboardEngine> FromRef<DashboardAppState<T>> for DashboardService<T> {
    fn from_ref(input: &DashboardAppState<T>) -> Self {
        input.service.clone()
    }
}
