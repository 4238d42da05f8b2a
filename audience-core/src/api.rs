use crate::model::{
    Business, BusinessId, LatLng, Liker, Location, LocationId, Post, PostId, Review, Username,
};
use crate::result::ApiResult;
use engine::{Cursor, Page};

/// The social-media content upstream: location search, post listings and
/// per-post likers. Implementations do one upstream call per method, no
/// retries, no caching.
pub trait SocialApi {
    fn search_locations(&self, query: &str)
    -> impl Future<Output = ApiResult<Vec<Location>>> + Send;

    fn location_posts(
        &self,
        location: &LocationId,
        cursor: Option<Cursor>,
    ) -> impl Future<Output = ApiResult<Page<Post>>> + Send;

    fn user_posts(
        &self,
        username: &Username,
        cursor: Option<Cursor>,
    ) -> impl Future<Output = ApiResult<Page<Post>>> + Send;

    fn tagged_posts(
        &self,
        username: &Username,
        cursor: Option<Cursor>,
    ) -> impl Future<Output = ApiResult<Page<Post>>> + Send;

    fn post_likers(&self, post: &PostId) -> impl Future<Output = ApiResult<Vec<Liker>>> + Send;
}

/// The local-business upstream: lookup plus paginated reviews.
pub trait PlacesApi {
    fn search_businesses(
        &self,
        query: &str,
        near: Option<LatLng>,
    ) -> impl Future<Output = ApiResult<Vec<Business>>> + Send;

    fn business_reviews(
        &self,
        business: &BusinessId,
        limit: u32,
        cursor: Option<Cursor>,
    ) -> impl Future<Output = ApiResult<Page<Review>>> + Send;
}
