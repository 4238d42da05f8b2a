use crate::ServiceResult;
use crate::error::DashboardServiceError;
use audience_core::DashboardEngine;
use audience_core::analysis::{self, RankedLiker};
use audience_core::audience::{
    AudienceAggregator, AudienceError, AudienceReport, DEFAULT_FAN_OUT,
};
use audience_core::export;
use audience_core::model::{
    Business, BusinessId, LatLng, Liker, Location, LocationId, Post, PostId, Review, Username,
};
use audience_core::result::UpstreamApiError;
use audience_core::{PlacesApi, SocialApi};
use engine::{Cursor, Page};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_ANALYSIS_LIMIT: usize = 50;
pub const DEFAULT_REVIEW_LIMIT: u32 = 20;
pub const MAX_REVIEW_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct DashboardService<T> {
    engine: T,
    fan_out: NonZeroUsize,
}

/// The two audience lists a marketer actually works with: who engages the
/// most with the user's own posts, and the distinct people orbiting the
/// posts the user is tagged in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AudienceAnalysis {
    pub run: Uuid,
    pub top_likers: Vec<RankedLiker>,
    pub warm_audience: Vec<Liker>,
    pub incomplete_batches: usize,
}

/// A finished export, ready to hand to the browser as a download.
#[derive(Debug)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl<T> DashboardService<T>
where
    T: DashboardEngine,
{
    pub fn new(engine: T) -> Self {
        Self {
            engine,
            fan_out: DEFAULT_FAN_OUT,
        }
    }

    pub fn with_fan_out(mut self, fan_out: NonZeroUsize) -> Self {
        self.fan_out = fan_out;
        self
    }

    #[instrument(skip(self), name = "service#search_locations")]
    pub async fn search_locations(&self, query: &str) -> ServiceResult<Vec<Location>> {
        let locations = self
            .engine
            .social()
            .search_locations(query)
            .await
            .map_err(upstream_failure)?;

        if locations.is_empty() {
            return Err(Report::new(DashboardServiceError::NotFound)
                .attach("no locations matched the search"));
        }
        Ok(locations)
    }

    #[instrument(skip(self), name = "service#location_posts")]
    pub async fn location_posts(
        &self,
        location: &LocationId,
        cursor: Option<Cursor>,
    ) -> ServiceResult<Page<Post>> {
        self.engine
            .social()
            .location_posts(location, cursor)
            .await
            .map_err(upstream_failure)
    }

    #[instrument(skip(self), name = "service#user_posts")]
    pub async fn user_posts(
        &self,
        username: &str,
        cursor: Option<Cursor>,
    ) -> ServiceResult<Page<Post>> {
        let username = parse_username(username)?;
        self.engine
            .social()
            .user_posts(&username, cursor)
            .await
            .map_err(upstream_failure)
    }

    #[instrument(skip(self), name = "service#tagged_posts")]
    pub async fn tagged_posts(
        &self,
        username: &str,
        cursor: Option<Cursor>,
    ) -> ServiceResult<Page<Post>> {
        let username = parse_username(username)?;
        self.engine
            .social()
            .tagged_posts(&username, cursor)
            .await
            .map_err(upstream_failure)
    }

    #[instrument(skip(self), name = "service#post_likers")]
    pub async fn post_likers(&self, post: &PostId) -> ServiceResult<Vec<Liker>> {
        self.engine
            .social()
            .post_likers(post)
            .await
            .map_err(upstream_failure)
    }

    #[instrument(skip(self), name = "service#audience")]
    pub async fn audience(&self, username: &str, strict: bool) -> ServiceResult<AudienceReport> {
        let username = parse_username(username)?;
        let aggregator =
            AudienceAggregator::new(self.engine.social()).with_fan_out(self.fan_out);

        let result = if strict {
            aggregator.collect_strict(&username).await
        } else {
            aggregator.collect(&username).await
        };
        result.map_err(audience_failure)
    }

    #[instrument(skip(self), name = "service#audience_analysis")]
    pub async fn audience_analysis(
        &self,
        username: &str,
        limit: usize,
    ) -> ServiceResult<AudienceAnalysis> {
        let report = self.audience(username, false).await?;
        Ok(analyze(report, limit))
    }

    #[instrument(skip(self), name = "service#audience_export")]
    pub async fn audience_export(&self, username: &str, limit: usize) -> ServiceResult<CsvExport> {
        let parsed = parse_username(username)?;
        let analysis = self.audience_analysis(username, limit).await?;

        let rows = export::audience_rows(&analysis.top_likers, &analysis.warm_audience);
        let bytes = export::write_csv(&rows).change_context(DashboardServiceError::Export)?;

        Ok(CsvExport {
            filename: format!("{parsed}_potential_customers.csv"),
            bytes,
        })
    }

    #[instrument(skip(self), name = "service#search_businesses")]
    pub async fn search_businesses(
        &self,
        query: &str,
        near: Option<LatLng>,
    ) -> ServiceResult<Vec<Business>> {
        let businesses = self
            .engine
            .places()
            .search_businesses(query, near)
            .await
            .map_err(upstream_failure)?;

        if businesses.is_empty() {
            return Err(Report::new(DashboardServiceError::NotFound)
                .attach("no businesses matched the search"));
        }
        Ok(businesses)
    }

    #[instrument(skip(self), name = "service#business_reviews")]
    pub async fn business_reviews(
        &self,
        business: &BusinessId,
        limit: Option<u32>,
        cursor: Option<Cursor>,
    ) -> ServiceResult<Page<Review>> {
        let limit = limit.unwrap_or(DEFAULT_REVIEW_LIMIT).min(MAX_REVIEW_LIMIT);
        self.engine
            .places()
            .business_reviews(business, limit, cursor)
            .await
            .map_err(upstream_failure)
    }
}

fn analyze(report: AudienceReport, limit: usize) -> AudienceAnalysis {
    let own: Vec<Liker> = report.own_likers().cloned().collect();
    let tagged: Vec<Liker> = report.tagged_likers().cloned().collect();

    let mut top_likers = analysis::rank_top_likers(&own);
    top_likers.truncate(limit);
    let mut warm_audience = analysis::unique_audience(&tagged);
    warm_audience.truncate(limit);

    AudienceAnalysis {
        run: report.run,
        top_likers,
        warm_audience,
        incomplete_batches: report.failures.len(),
    }
}

fn parse_username(raw: &str) -> Result<Username, Report<DashboardServiceError>> {
    Username::new(raw).change_context(DashboardServiceError::BadUsername)
}

fn upstream_failure(report: Report<UpstreamApiError>) -> Report<DashboardServiceError> {
    let context = match report.current_context() {
        UpstreamApiError::Rejected | UpstreamApiError::NoData => DashboardServiceError::NotFound,
        UpstreamApiError::Transport | UpstreamApiError::Decode => DashboardServiceError::Upstream,
    };
    report.change_context(context)
}

fn audience_failure(report: Report<AudienceError>) -> Report<DashboardServiceError> {
    let context = match report.current_context() {
        AudienceError::Incomplete { .. } => DashboardServiceError::Upstream,
        AudienceError::Posts => match report.downcast_ref::<UpstreamApiError>() {
            Some(UpstreamApiError::Rejected | UpstreamApiError::NoData) => {
                DashboardServiceError::NotFound
            }
            _ => DashboardServiceError::Upstream,
        },
    };
    report.change_context(context)
}
