use crate::config::UpstreamConfig;
use crate::wire::{PlacesEnvelope, WireBusiness, WireReview, WireReviewsPayload};
use audience_core::PlacesApi;
use audience_core::model::{Business, BusinessId, LatLng, Review};
use audience_core::result::{ApiResult, UpstreamApiError};
use engine::{Cursor, Page};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const BUSINESS_SEARCH_PATH: &str = "/search";
const BUSINESS_REVIEWS_PATH: &str = "/business-reviews-v2";

// tightens search accuracy for place lookups
const SEARCH_ZOOM: &str = "13";

/// The local-business upstream. Same gateway authentication as the social
/// client, but success is additionally signalled through a `status` field.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
}

impl PlacesClient {
    pub fn new(http: reqwest::Client, config: Arc<UpstreamConfig>) -> Self {
        Self { http, config }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let url = format!("https://{}{path}", self.config.places_host);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.places_host)
            .query(query)
            .send()
            .await
            .change_context(UpstreamApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                Report::new(UpstreamApiError::Rejected).attach(format!("{path} answered {status}"))
            );
        }

        response
            .json()
            .await
            .change_context(UpstreamApiError::Decode)
    }
}

impl PlacesApi for PlacesClient {
    async fn search_businesses(
        &self,
        query: &str,
        near: Option<LatLng>,
    ) -> ApiResult<Vec<Business>> {
        let mut params = vec![
            ("query", query.to_string()),
            ("zoom", SEARCH_ZOOM.to_string()),
            ("language", self.config.places_language.clone()),
            ("region", self.config.places_region.clone()),
        ];
        if let Some(LatLng { lat, lng }) = near {
            params.push(("lat", lat.to_string()));
            params.push(("lng", lng.to_string()));
        }

        let envelope: PlacesEnvelope<Vec<WireBusiness>> =
            self.get(BUSINESS_SEARCH_PATH, &to_query(&params)).await?;

        if !envelope.is_ok() {
            return Err(Report::new(UpstreamApiError::Rejected)
                .attach("business search answered a non-OK status"));
        }

        let Some(data) = envelope.data else {
            return Err(Report::new(UpstreamApiError::NoData));
        };

        Ok(data.into_iter().filter_map(WireBusiness::normalize).collect())
    }

    async fn business_reviews(
        &self,
        business: &BusinessId,
        limit: u32,
        cursor: Option<Cursor>,
    ) -> ApiResult<Page<Review>> {
        let limit = limit.to_string();
        let mut query = vec![
            ("business_id", business.as_str()),
            ("limit", limit.as_str()),
            ("language", self.config.places_language.as_str()),
            ("region", self.config.places_region.as_str()),
        ];
        if let Some(cursor) = cursor.as_ref() {
            query.push(("cursor", cursor.as_str()));
        }

        let envelope: PlacesEnvelope<WireReviewsPayload> =
            self.get(BUSINESS_REVIEWS_PATH, &query).await?;

        if !envelope.is_ok() {
            return Err(Report::new(UpstreamApiError::Rejected)
                .attach("review listing answered a non-OK status"));
        }

        let Some(payload) = envelope.data else {
            return Err(Report::new(UpstreamApiError::NoData));
        };

        let reviews = payload
            .reviews
            .into_iter()
            .map(WireReview::normalize)
            .collect();

        Ok(Page::new(reviews, payload.cursor.map(Cursor::new)))
    }
}

fn to_query<'a>(params: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    params.iter().map(|(k, v)| (*k, v.as_str())).collect()
}
