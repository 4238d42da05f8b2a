use crate::config::UpstreamConfig;
use crate::wire::{self, ItemList, SocialEnvelope, WireLiker, WireLocation, WirePost};
use audience_core::SocialApi;
use audience_core::model::{Liker, Location, LocationId, Post, PostId, Username};
use audience_core::result::{ApiResult, UpstreamApiError};
use engine::{Cursor, Page};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const SEARCH_LOCATION_PATH: &str = "/v1/search_location";
const LOCATION_POSTS_PATH: &str = "/v1/location_posts";
const USER_POSTS_PATH: &str = "/v1/posts";
const TAGGED_POSTS_PATH: &str = "/v1/tagged";
const POST_LIKERS_PATH: &str = "/v1/likes";

/// The social-media content upstream. One HTTP call per method; the gateway
/// authenticates through the key/host header pair.
#[derive(Debug, Clone)]
pub struct SocialClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
}

impl SocialClient {
    pub fn new(http: reqwest::Client, config: Arc<UpstreamConfig>) -> Self {
        Self { http, config }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let url = format!("https://{}{path}", self.config.social_host);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.social_host)
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

impl SocialApi for SocialClient {
    async fn search_locations(&self, query: &str) -> ApiResult<Vec<Location>> {
        let envelope: SocialEnvelope<ItemList<WireLocation>> = self
            .get(SEARCH_LOCATION_PATH, &[("search_query", query)])
            .await?;

        Ok(wire::location_list(envelope))
    }

    async fn location_posts(
        &self,
        location: &LocationId,
        cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        let mut query = vec![("location_id", location.as_str())];
        if let Some(cursor) = cursor.as_ref() {
            query.push(("pagination_token", cursor.as_str()));
        }

        let envelope: SocialEnvelope<ItemList<WirePost>> =
            self.get(LOCATION_POSTS_PATH, &query).await?;

        Ok(wire::post_page(envelope))
    }

    async fn user_posts(
        &self,
        username: &Username,
        cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        let mut query = vec![("username_or_id_or_url", username.as_str())];
        if let Some(cursor) = cursor.as_ref() {
            query.push(("pagination_token", cursor.as_str()));
        }

        let envelope: SocialEnvelope<ItemList<WirePost>> =
            self.get(USER_POSTS_PATH, &query).await?;

        Ok(wire::post_page(envelope))
    }

    async fn tagged_posts(
        &self,
        username: &Username,
        cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        let mut query = vec![("username_or_id_or_url", username.as_str())];
        if let Some(cursor) = cursor.as_ref() {
            query.push(("pagination_token", cursor.as_str()));
        }

        let envelope: SocialEnvelope<ItemList<WirePost>> =
            self.get(TAGGED_POSTS_PATH, &query).await?;

        Ok(wire::post_page(envelope))
    }

    async fn post_likers(&self, post: &PostId) -> ApiResult<Vec<Liker>> {
        let envelope: SocialEnvelope<ItemList<WireLiker>> = self
            .get(POST_LIKERS_PATH, &[("code_or_id_or_url", post.as_str())])
            .await?;

        Ok(wire::liker_list(envelope))
    }
}
