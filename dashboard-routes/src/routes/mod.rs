use crate::error::DashboardServiceError;
use crate::metrics;
use crate::routes::requests::{
    AnalysisParams, AudienceParams, BusinessSearchParams, CursorParams, ReviewParams, SearchParams,
};
use crate::routes::responses::{AudienceResponse, CsvFile};
use crate::service::{AudienceAnalysis, DEFAULT_ANALYSIS_LIMIT, DashboardService};
use crate::state::DashboardAppState;
use audience_core::DashboardEngine;
use audience_core::model::{
    Business, BusinessId, LatLng, Liker, Location, LocationId, Post, PostId, Review,
};
use axum::middleware::{self};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response, Result},
    routing::get,
};
use engine::Page;
use engine::error::EndpointError;
use engine::stream::StreamingResponse;
use error_stack::Report;
use tracing::{info, instrument};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod api_doc;
mod requests;
mod responses;

const LOCATION_ROOT_PATH: &str = "/api/locations";
const USER_ROOT_PATH: &str = "/api/users";
const POST_ROOT_PATH: &str = "/api/posts";
const BUSINESS_ROOT_PATH: &str = "/api/businesses";

#[derive(OpenApi)]
#[openapi(nest(
    (path = LOCATION_ROOT_PATH, api = LocationDocs),
    (path = USER_ROOT_PATH, api = UserDocs),
    (path = POST_ROOT_PATH, api = PostDocs),
    (path = BUSINESS_ROOT_PATH, api = BusinessDocs),
))]
struct ApiDoc;

#[derive(OpenApi)]
#[openapi(paths(search_locations, location_posts))]
struct LocationDocs;

#[derive(OpenApi)]
#[openapi(paths(user_posts, tagged_posts, audience, audience_analysis, audience_export))]
struct UserDocs;

#[derive(OpenApi)]
#[openapi(paths(post_likers))]
struct PostDocs;

#[derive(OpenApi)]
#[openapi(paths(search_businesses, business_reviews))]
struct BusinessDocs;

const LOCATION_SEARCH_PATH: &str = "/search";
const LOCATION_POSTS_PATH: &str = "/{location_id}/posts";
const USER_POSTS_PATH: &str = "/{username}/posts";
const USER_TAGGED_PATH: &str = "/{username}/tagged";
const USER_AUDIENCE_PATH: &str = "/{username}/audience";
const USER_AUDIENCE_ANALYSIS_PATH: &str = "/{username}/audience/analysis";
const USER_AUDIENCE_EXPORT_PATH: &str = "/{username}/audience/export";
const POST_LIKERS_PATH: &str = "/{post_id}/likers";
const BUSINESS_SEARCH_PATH: &str = "/search";
const BUSINESS_REVIEWS_PATH: &str = "/{business_id}/reviews";

pub fn build<T: DashboardEngine>(app_state: DashboardAppState<T>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes(app_state))
        .split_for_parts();

    router.merge(SwaggerUi::new("/api/swagger-ui").url("/api/api-docs/openapi.json", api))
}

fn routes<S, T: DashboardEngine>(app_state: DashboardAppState<T>) -> OpenApiRouter<S> {
    let location_router = OpenApiRouter::new()
        .route(LOCATION_SEARCH_PATH, get(search_locations))
        .route(LOCATION_POSTS_PATH, get(location_posts));

    let user_router = OpenApiRouter::new()
        .route(USER_POSTS_PATH, get(user_posts))
        .route(USER_TAGGED_PATH, get(tagged_posts))
        .route(USER_AUDIENCE_PATH, get(audience))
        .route(USER_AUDIENCE_ANALYSIS_PATH, get(audience_analysis))
        .route(USER_AUDIENCE_EXPORT_PATH, get(audience_export));

    let post_router = OpenApiRouter::new().route(POST_LIKERS_PATH, get(post_likers));

    let business_router = OpenApiRouter::new()
        .route(BUSINESS_SEARCH_PATH, get(search_businesses))
        .route(BUSINESS_REVIEWS_PATH, get(business_reviews));

    let main_router = OpenApiRouter::new()
        .nest(LOCATION_ROOT_PATH, location_router)
        .nest(USER_ROOT_PATH, user_router)
        .nest(POST_ROOT_PATH, post_router)
        .nest(BUSINESS_ROOT_PATH, business_router);

    let router = if app_state.metrics_enabled {
        info!("metrics enabled, setting up metrics handler");
        let metrics_recorder = metrics::setup_recorder();
        main_router
            .route("/metrics", get(|| async move { metrics_recorder.render() }))
            .route_layer(middleware::from_fn(metrics::track_http))
    } else {
        info!("metrics not enabled, setting up service unavailable metrics handler");
        main_router.route(
            "/metrics",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Metrics endpoint is disabled. Metrics must be enabled and the service restarted",
                )
            }),
        )
    };

    router.with_state(app_state)
}

fn require(param: Option<String>) -> Result<String, Report<DashboardServiceError>> {
    param
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Report::new(DashboardServiceError::MissingParameter))
}

/// Search the social API for locations matching a free-text query.
#[utoipa::path(
    get,
    path = LOCATION_SEARCH_PATH,
    responses(
        (status = OK, description = "At least one location matched", body = Vec<Location>),
        (status = BAD_REQUEST, description = "The q parameter was missing or empty"),
        (status = NOT_FOUND, description = "No location matched the query"),
    ),
    params(
        ("q" = String, Query, description = "Free-text location search"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn search_locations<T>(
    State(service): State<DashboardService<T>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let query = require(params.q)?;
    let locations = service.search_locations(&query).await?;

    metrics::increment_location_searches();
    Ok(StreamingResponse::ok(locations).into_response())
}

/// List the posts published at a location, one page per call.
#[utoipa::path(
    get,
    path = LOCATION_POSTS_PATH,
    responses(
        (status = OK, description = "One page of posts; an absent next_cursor means the listing is done", body = Page<Post>),
        (status = NOT_FOUND, description = "The location is unknown upstream"),
    ),
    params(
        ("location_id" = String, Path, description = "Location to list posts for"),
        ("cursor" = Option<String>, Query, description = "Continuation token from the previous page"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn location_posts<T>(
    State(service): State<DashboardService<T>>,
    Path(location_id): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let page = service
        .location_posts(&LocationId::new(location_id), params.cursor)
        .await?;

    metrics::increment_posts_retrieved_by(page.items.len());
    Ok(axum::Json(page).into_response())
}

/// List a user's own posts, one page per call.
#[utoipa::path(
    get,
    path = USER_POSTS_PATH,
    responses(
        (status = OK, description = "One page of the user's posts", body = Page<Post>),
        (status = BAD_REQUEST, description = "The username was empty"),
        (status = NOT_FOUND, description = "The user is unknown upstream"),
    ),
    params(
        ("username" = String, Path, description = "Username, with or without a leading @"),
        ("cursor" = Option<String>, Query, description = "Continuation token from the previous page"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn user_posts<T>(
    State(service): State<DashboardService<T>>,
    Path(username): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let page = service.user_posts(&username, params.cursor).await?;

    metrics::increment_posts_retrieved_by(page.items.len());
    Ok(axum::Json(page).into_response())
}

/// List the posts a user is tagged in, one page per call.
#[utoipa::path(
    get,
    path = USER_TAGGED_PATH,
    responses(
        (status = OK, description = "One page of tagged posts", body = Page<Post>),
        (status = BAD_REQUEST, description = "The username was empty"),
        (status = NOT_FOUND, description = "The user is unknown upstream"),
    ),
    params(
        ("username" = String, Path, description = "Username, with or without a leading @"),
        ("cursor" = Option<String>, Query, description = "Continuation token from the previous page"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn tagged_posts<T>(
    State(service): State<DashboardService<T>>,
    Path(username): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let page = service.tagged_posts(&username, params.cursor).await?;

    metrics::increment_posts_retrieved_by(page.items.len());
    Ok(axum::Json(page).into_response())
}

/// The users who liked one post.
#[utoipa::path(
    get,
    path = POST_LIKERS_PATH,
    responses(
        (status = OK, description = "The likers of the post; may be empty", body = Vec<Liker>),
        (status = NOT_FOUND, description = "The post is unknown upstream"),
    ),
    params(
        ("post_id" = String, Path, description = "Post code or pk"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn post_likers<T>(
    State(service): State<DashboardService<T>>,
    Path(post_id): Path<String>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let likers = service.post_likers(&PostId::new(post_id)).await?;

    metrics::increment_likers_retrieved_by(likers.len());
    Ok(StreamingResponse::ok(likers).into_response())
}

/// Fan out a likers request across the user's own and tagged posts and
/// report every batch, paired with the post that produced it.
#[utoipa::path(
    get,
    path = USER_AUDIENCE_PATH,
    responses(
        (
            status = OK,
            description = "Every liker batch arrived",
            body = AudienceResponse,
            example = json!(api_doc::examples::audience::complete_run()),
        ),
        (
            status = MULTI_STATUS,
            description = "Some batches failed; each failure names its post",
            body = AudienceResponse,
            example = json!(api_doc::examples::audience::partial_run()),
        ),
        (status = BAD_REQUEST, description = "The username was empty"),
        (status = INTERNAL_SERVER_ERROR, description = "The post lists could not be loaded, every batch failed, or strict mode saw any failure"),
    ),
    params(
        ("username" = String, Path, description = "Username, with or without a leading @"),
        ("strict" = Option<bool>, Query, description = "Reject the whole run if any single batch fails"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn audience<T>(
    State(service): State<DashboardService<T>>,
    Path(username): Path<String>,
    Query(params): Query<AudienceParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let report = service.audience(&username, params.strict).await?;

    metrics::increment_audience_runs();
    metrics::increment_likers_retrieved_by(
        report.batches.iter().map(|batch| batch.likers.len()).sum(),
    );
    Ok(AudienceResponse::new(report).into_response())
}

/// Rank the audience: most frequent likers of the user's own posts, plus the
/// deduplicated audience of the posts the user is tagged in.
#[utoipa::path(
    get,
    path = USER_AUDIENCE_ANALYSIS_PATH,
    responses(
        (
            status = OK,
            description = "Both ranked lists, truncated to the limit",
            body = AudienceAnalysis,
            example = json!(api_doc::examples::analysis::ranked()),
        ),
        (status = BAD_REQUEST, description = "The username was empty"),
        (status = INTERNAL_SERVER_ERROR, description = "The post lists could not be loaded"),
    ),
    params(
        ("username" = String, Path, description = "Username, with or without a leading @"),
        ("limit" = Option<usize>, Query, description = "Entries kept per list; defaults to 50"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn audience_analysis<T>(
    State(service): State<DashboardService<T>>,
    Path(username): Path<String>,
    Query(params): Query<AnalysisParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_ANALYSIS_LIMIT);
    let analysis = service.audience_analysis(&username, limit).await?;

    Ok(axum::Json(analysis).into_response())
}

/// Download the audience analysis as a spreadsheet.
#[utoipa::path(
    get,
    path = USER_AUDIENCE_EXPORT_PATH,
    responses(
        (status = OK, description = "CSV attachment with one row per retained analysis entry"),
        (status = BAD_REQUEST, description = "The username was empty"),
        (status = INTERNAL_SERVER_ERROR, description = "The post lists could not be loaded or the file could not be built"),
    ),
    params(
        ("username" = String, Path, description = "Username, with or without a leading @"),
        ("limit" = Option<usize>, Query, description = "Entries kept per list; defaults to 50"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn audience_export<T>(
    State(service): State<DashboardService<T>>,
    Path(username): Path<String>,
    Query(params): Query<AnalysisParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_ANALYSIS_LIMIT);
    let export = service.audience_export(&username, limit).await?;

    Ok(CsvFile::new(export.filename, export.bytes).into_response())
}

/// Look a business up on the maps API.
#[utoipa::path(
    get,
    path = BUSINESS_SEARCH_PATH,
    responses(
        (status = OK, description = "At least one business matched", body = Vec<Business>),
        (status = BAD_REQUEST, description = "The q parameter was missing or empty"),
        (status = NOT_FOUND, description = "No business matched the query"),
    ),
    params(
        ("q" = String, Query, description = "Business name to look up"),
        ("lat" = Option<f64>, Query, description = "Bias point latitude; needs lng as well"),
        ("lng" = Option<f64>, Query, description = "Bias point longitude; needs lat as well"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn search_businesses<T>(
    State(service): State<DashboardService<T>>,
    Query(params): Query<BusinessSearchParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let query = require(params.q)?;
    let near = params
        .lat
        .zip(params.lng)
        .map(|(lat, lng)| LatLng { lat, lng });
    let businesses = service.search_businesses(&query, near).await?;

    metrics::increment_business_searches();
    Ok(StreamingResponse::ok(businesses).into_response())
}

/// List the reviews of a business, one page per call.
#[utoipa::path(
    get,
    path = BUSINESS_REVIEWS_PATH,
    responses(
        (status = OK, description = "One page of reviews; an absent next_cursor ends the listing", body = Page<Review>),
        (status = NOT_FOUND, description = "The business is unknown upstream"),
    ),
    params(
        ("business_id" = String, Path, description = "Business to list reviews for"),
        ("limit" = Option<u32>, Query, description = "Reviews per page; defaults to 20, capped at 1000"),
        ("cursor" = Option<String>, Query, description = "Continuation token from the previous page"),
    )
)]
#[instrument(skip(service), err(Debug))]
pub async fn business_reviews<T>(
    State(service): State<DashboardService<T>>,
    Path(business_id): Path<String>,
    Query(params): Query<ReviewParams>,
) -> Result<Response, EndpointError<DashboardServiceError>>
where
    T: DashboardEngine,
{
    let page = service
        .business_reviews(&BusinessId::new(business_id), params.limit, params.cursor)
        .await?;

    metrics::increment_reviews_retrieved_by(page.items.len());
    Ok(axum::Json(page).into_response())
}
