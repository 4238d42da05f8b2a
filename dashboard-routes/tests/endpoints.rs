use audience_core::model::{
    Business, BusinessId, LatLng, Liker, Location, LocationId, Post, PostId, PostUser, Review,
    Username,
};
use audience_core::result::{ApiResult, UpstreamApiError};
use audience_core::{DashboardEngine, PlacesApi, SocialApi};
use axum_test::TestServer;
use axum_test::http::StatusCode;
use axum_test::http::header;
use dashboard_routes::routes;
use dashboard_routes::state::DashboardAppState;
use engine::{Cursor, Page};
use error_stack::Report;
use rstest::rstest;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct FakeUpstream {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    upstream_calls: AtomicUsize,
    seen_usernames: Mutex<Vec<String>>,
    seen_review_limits: Mutex<Vec<u32>>,
    locations: Vec<Location>,
    own_posts: Vec<Post>,
    tagged_posts: Vec<Post>,
    likers: HashMap<String, Vec<Liker>>,
    failing_likers: Vec<String>,
    businesses: Vec<Business>,
    reviews: Vec<Review>,
    /// (cursor, page) pairs served by the location posts listing
    location_pages: Vec<(Option<String>, Page<Post>)>,
}

impl FakeUpstream {
    fn upstream_calls(&self) -> usize {
        self.inner.upstream_calls.load(Ordering::SeqCst)
    }

    fn count_call(&self) {
        self.inner.upstream_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn seen_usernames(&self) -> Vec<String> {
        self.inner.seen_usernames.lock().unwrap().clone()
    }

    fn seen_review_limits(&self) -> Vec<u32> {
        self.inner.seen_review_limits.lock().unwrap().clone()
    }
}

impl SocialApi for FakeUpstream {
    async fn search_locations(&self, _query: &str) -> ApiResult<Vec<Location>> {
        self.count_call();
        Ok(self.inner.locations.clone())
    }

    async fn location_posts(
        &self,
        _location: &LocationId,
        cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        self.count_call();
        let key = cursor.map(|c| c.as_str().to_string());

        Ok(self
            .inner
            .location_pages
            .iter()
            .find(|(served, _)| *served == key)
            .map(|(_, page)| page.clone())
            .unwrap_or_else(|| Page::end(Vec::new())))
    }

    async fn user_posts(
        &self,
        username: &Username,
        _cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        self.count_call();
        self.inner
            .seen_usernames
            .lock()
            .unwrap()
            .push(username.as_str().to_string());
        Ok(Page::end(self.inner.own_posts.clone()))
    }

    async fn tagged_posts(
        &self,
        username: &Username,
        _cursor: Option<Cursor>,
    ) -> ApiResult<Page<Post>> {
        self.count_call();
        self.inner
            .seen_usernames
            .lock()
            .unwrap()
            .push(username.as_str().to_string());
        Ok(Page::end(self.inner.tagged_posts.clone()))
    }

    async fn post_likers(&self, post: &PostId) -> ApiResult<Vec<Liker>> {
        self.count_call();
        if self.inner.failing_likers.iter().any(|id| id == post.as_str()) {
            return Err(Report::new(UpstreamApiError::Transport));
        }
        Ok(self
            .inner
            .likers
            .get(post.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

impl PlacesApi for FakeUpstream {
    async fn search_businesses(
        &self,
        _query: &str,
        _near: Option<LatLng>,
    ) -> ApiResult<Vec<Business>> {
        self.count_call();
        Ok(self.inner.businesses.clone())
    }

    async fn business_reviews(
        &self,
        _business: &BusinessId,
        limit: u32,
        _cursor: Option<Cursor>,
    ) -> ApiResult<Page<Review>> {
        self.count_call();
        self.inner.seen_review_limits.lock().unwrap().push(limit);
        Ok(Page::end(self.inner.reviews.clone()))
    }
}

#[derive(Clone)]
struct FakeEngine(FakeUpstream);

impl DashboardEngine for FakeEngine {
    type Social = FakeUpstream;
    type Places = FakeUpstream;

    fn social(&self) -> Self::Social {
        self.0.clone()
    }

    fn places(&self) -> Self::Places {
        self.0.clone()
    }
}

fn server(fake: FakeUpstream) -> TestServer {
    let routes = routes::build(DashboardAppState::new_without_metrics(FakeEngine(fake)));
    TestServer::new(routes).unwrap()
}

fn post(id: &str) -> Post {
    Post {
        id: PostId::new(id),
        user: PostUser {
            username: "poster".to_string(),
            full_name: "The Poster".to_string(),
            is_verified: false,
            profile_pic_url: None,
        },
        caption: None,
        mentions: Vec::new(),
        like_count: 0,
        comment_count: 0,
        taken_at: None,
        image_urls: Vec::new(),
    }
}

fn liker(username: &str) -> Liker {
    Liker {
        username: username.to_string(),
        full_name: String::new(),
    }
}

fn location(id: &str, name: &str) -> Location {
    Location {
        id: LocationId::new(id),
        name: name.to_string(),
        address: None,
        latitude: None,
        longitude: None,
    }
}

fn business(id: &str, name: &str) -> Business {
    Business {
        id: BusinessId::new(id),
        name: name.to_string(),
        full_address: None,
        rating: Some(4.4),
        review_count: Some(12),
    }
}

fn upstream_with_audience() -> FakeUpstream {
    let mut inner = Inner::default();
    inner.own_posts = vec![post("own1"), post("own2")];
    inner.tagged_posts = vec![post("tag1")];
    inner.likers = HashMap::from([
        ("own1".to_string(), vec![liker("ayse"), liker("mehmet")]),
        ("own2".to_string(), vec![liker("ayse")]),
        ("tag1".to_string(), vec![liker("deniz"), liker("ayse")]),
    ]);

    FakeUpstream {
        inner: Arc::new(inner),
    }
}

#[rstest]
#[case::locations("/api/locations/search")]
#[case::businesses("/api/businesses/search")]
#[tokio::test]
async fn search_without_q_is_rejected_without_an_upstream_call(#[case] path: &str) {
    let fake = FakeUpstream::default();
    let server = server(fake.clone());

    let response = server.get(path).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        "a required query parameter is missing or empty",
        body["error"]
    );
    assert_eq!(0, fake.upstream_calls());
}

#[rstest]
#[case::blank("   ")]
#[case::empty("")]
#[tokio::test]
async fn blank_search_terms_count_as_missing(#[case] q: &str) {
    let fake = FakeUpstream::default();
    let server = server(fake.clone());

    let response = server
        .get("/api/locations/search")
        .add_query_param("q", q)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(0, fake.upstream_calls());
}

#[tokio::test]
async fn location_search_returns_matches() {
    let mut inner = Inner::default();
    inner.locations = vec![location("42", "Caki Restoran")];
    let server = server(FakeUpstream {
        inner: Arc::new(inner),
    });

    let response = server
        .get("/api/locations/search")
        .add_query_param("q", "Caki")
        .await;

    response.assert_status_ok();
    let locations: Vec<Location> = response.json();
    assert_eq!(1, locations.len());
    assert_eq!("Caki Restoran", locations[0].name);
}

#[tokio::test]
async fn location_search_with_no_matches_is_not_found() {
    let server = server(FakeUpstream::default());

    let response = server
        .get("/api/locations/search")
        .add_query_param("q", "nowhere")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!("no matching data was found upstream", body["error"]);
}

#[tokio::test]
async fn location_posts_pages_chain_by_cursor() {
    let mut inner = Inner::default();
    inner.location_pages = vec![
        (
            None,
            Page::new(vec![post("p1")], Some(Cursor::new("tok2"))),
        ),
        (Some("tok2".to_string()), Page::end(vec![post("p2")])),
    ];
    let fake = FakeUpstream {
        inner: Arc::new(inner),
    };
    let server = server(fake.clone());

    let first: Page<Post> = server.get("/api/locations/42/posts").await.json();
    assert_eq!(Some("tok2"), first.next_cursor.as_ref().map(Cursor::as_str));

    let second: Page<Post> = server
        .get("/api/locations/42/posts")
        .add_query_param("cursor", "tok2")
        .await
        .json();
    assert!(second.is_last());

    // the caller appends: both pages together hold the full listing
    let mut all = first.items;
    all.extend(second.items);
    let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(vec!["p1", "p2"], ids);

    assert_eq!(2, fake.upstream_calls());
}

#[tokio::test]
async fn user_posts_strip_the_at_prefix() {
    let fake = FakeUpstream::default();
    let server = server(fake.clone());

    server.get("/api/users/@kemal/posts").await.assert_status_ok();

    assert_eq!(vec!["kemal".to_string()], fake.seen_usernames());
}

#[tokio::test]
async fn an_effectively_empty_username_is_rejected() {
    let fake = FakeUpstream::default();
    let server = server(fake.clone());

    let response = server.get("/api/users/@/posts").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(0, fake.upstream_calls());
}

#[tokio::test]
async fn post_likers_lists_the_likers() {
    let mut inner = Inner::default();
    inner.likers = HashMap::from([("abc".to_string(), vec![liker("ayse"), liker("deniz")])]);
    let server = server(FakeUpstream {
        inner: Arc::new(inner),
    });

    let response = server.get("/api/posts/abc/likers").await;

    response.assert_status_ok();
    let likers: Vec<Liker> = response.json();
    assert_eq!(2, likers.len());
}

#[tokio::test]
async fn a_complete_audience_run_answers_ok() {
    let server = server(upstream_with_audience());

    let response = server.get("/api/users/@kemal/audience").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(2, body["own_post_count"]);
    assert_eq!(1, body["tagged_post_count"]);
    assert_eq!(3, body["batches"].as_array().unwrap().len());
    assert_eq!(0, body["failures"].as_array().unwrap().len());
    assert!(body["run"].is_string());
}

#[tokio::test]
async fn a_partial_audience_run_answers_multi_status() {
    let fake = upstream_with_audience();
    let mut inner = Inner::default();
    inner.own_posts = fake.inner.own_posts.clone();
    inner.tagged_posts = fake.inner.tagged_posts.clone();
    inner.likers = fake.inner.likers.clone();
    inner.failing_likers = vec!["own2".to_string()];
    let server = server(FakeUpstream {
        inner: Arc::new(inner),
    });

    let response = server.get("/api/users/@kemal/audience").await;

    response.assert_status(StatusCode::MULTI_STATUS);
    let body: Value = response.json();
    assert_eq!(2, body["batches"].as_array().unwrap().len());

    let failures = body["failures"].as_array().unwrap();
    assert_eq!(1, failures.len());
    assert_eq!("own2", failures[0]["post"]);
    assert_eq!("own", failures[0]["source"]);
}

#[tokio::test]
async fn strict_mode_turns_one_failure_into_a_server_error() {
    let mut inner = Inner::default();
    inner.own_posts = vec![post("own1")];
    inner.likers = HashMap::from([("own1".to_string(), vec![liker("ayse")])]);
    inner.failing_likers = vec!["own1".to_string()];
    let server = server(FakeUpstream {
        inner: Arc::new(inner),
    });

    let response = server
        .get("/api/users/@kemal/audience")
        .add_query_param("strict", "true")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn audience_analysis_ranks_and_dedups() {
    let server = server(upstream_with_audience());

    let response = server.get("/api/users/@kemal/audience/analysis").await;

    response.assert_status_ok();
    let body: Value = response.json();

    // ayse liked own1 and own2, mehmet only own1
    let top = body["top_likers"].as_array().unwrap();
    assert_eq!("ayse", top[0]["username"]);
    assert_eq!(2, top[0]["like_count"]);
    assert_eq!("mehmet", top[1]["username"]);
    assert_eq!(1, top[1]["like_count"]);

    let warm = body["warm_audience"].as_array().unwrap();
    let warm_names: Vec<&str> = warm.iter().map(|w| w["username"].as_str().unwrap()).collect();
    assert_eq!(vec!["deniz", "ayse"], warm_names);

    assert_eq!(0, body["incomplete_batches"]);
}

#[tokio::test]
async fn audience_analysis_honors_the_limit() {
    let server = server(upstream_with_audience());

    let response = server
        .get("/api/users/@kemal/audience/analysis")
        .add_query_param("limit", "1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(1, body["top_likers"].as_array().unwrap().len());
    assert_eq!(1, body["warm_audience"].as_array().unwrap().len());
}

#[tokio::test]
async fn audience_export_is_a_csv_download() {
    let server = server(upstream_with_audience());

    let response = server.get("/api/users/@kemal/audience/export").await;

    response.assert_status_ok();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("kemal_potential_customers.csv"));

    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!("category,username,full_name,like_count", lines[0]);
    assert!(lines.iter().any(|line| line.starts_with("Top Liker,ayse")));
    assert!(lines.iter().any(|line| line.starts_with("Warm Audience,deniz")));
}

#[tokio::test]
async fn business_search_returns_matches() {
    let mut inner = Inner::default();
    inner.businesses = vec![business("biz1", "Caki Restoran")];
    let server = server(FakeUpstream {
        inner: Arc::new(inner),
    });

    let response = server
        .get("/api/businesses/search")
        .add_query_param("q", "Caki")
        .await;

    response.assert_status_ok();
    let businesses: Vec<Business> = response.json();
    assert_eq!("Caki Restoran", businesses[0].name);
}

#[tokio::test]
async fn business_search_with_no_matches_is_not_found() {
    let server = server(FakeUpstream::default());

    let response = server
        .get("/api/businesses/search")
        .add_query_param("q", "nowhere")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_limits_default_and_cap() {
    let fake = FakeUpstream::default();
    let server = server(fake.clone());

    server
        .get("/api/businesses/biz1/reviews")
        .await
        .assert_status_ok();
    server
        .get("/api/businesses/biz1/reviews")
        .add_query_param("limit", "5000")
        .await
        .assert_status_ok();
    server
        .get("/api/businesses/biz1/reviews")
        .add_query_param("limit", "300")
        .await
        .assert_status_ok();

    assert_eq!(vec![20, 1000, 300], fake.seen_review_limits());
}
