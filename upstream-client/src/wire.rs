//! Wire shapes of the two upstream APIs and the one place they become
//! canonical records. Upstream is inconsistent about field names
//! (`owner` vs `user`, `code` vs `pk`, `address` vs `city`), so every
//! fallback lives here and nowhere else.

use audience_core::model::{
    Business, BusinessId, Liker, Location, LocationId, Post, PostId, PostUser, Review,
};
use chrono::{DateTime, Utc};
use engine::{Cursor, Page};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// The social API wraps payloads in `data` and puts the continuation token
/// at the top level.
#[derive(Debug, Deserialize)]
pub struct SocialEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ItemList<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

/// The places API wraps payloads in `data` and reports success through a
/// `status` field instead of relying on the HTTP status alone.
#[derive(Debug, Deserialize)]
pub struct PlacesEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    pub data: Option<T>,
}

impl<T> PlacesEnvelope<T> {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct WireLocation {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,
}

impl WireLocation {
    pub fn normalize(self) -> Option<Location> {
        let id = self.id.as_ref().and_then(id_string)?;

        Some(Location {
            id: LocationId::new(id),
            name: self.name.unwrap_or_default(),
            address: self.address.or(self.city),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

impl WireUser {
    fn normalize(self) -> PostUser {
        PostUser {
            username: self.username.unwrap_or_default(),
            full_name: self.full_name.unwrap_or_default(),
            is_verified: self.is_verified.unwrap_or(false),
            profile_pic_url: self.profile_pic_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireCaption {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireImageVersions {
    #[serde(default)]
    pub items: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WirePost {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub pk: Option<Value>,
    #[serde(default)]
    pub owner: Option<WireUser>,
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub caption: Option<WireCaption>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub taken_at: Option<i64>,
    #[serde(default)]
    pub image_versions: Option<WireImageVersions>,
}

impl WirePost {
    /// Posts are keyed by `code` when present, `pk` otherwise. A post with
    /// neither cannot be fed to the likers endpoint, so it is dropped.
    pub fn normalize(self) -> Option<Post> {
        let id = self
            .code
            .filter(|code| !code.is_empty())
            .or_else(|| self.pk.as_ref().and_then(id_string))?;

        let user = self
            .owner
            .or(self.user)
            .map(WireUser::normalize)
            .unwrap_or(PostUser {
                username: String::new(),
                full_name: String::new(),
                is_verified: false,
                profile_pic_url: None,
            });

        let (caption, mentions) = match self.caption {
            Some(caption) => (caption.text.filter(|t| !t.is_empty()), caption.mentions),
            None => (None, Vec::new()),
        };

        Some(Post {
            id: PostId::new(id),
            user,
            caption,
            mentions,
            like_count: self.like_count.unwrap_or(0),
            comment_count: self.comment_count.unwrap_or(0),
            taken_at: self.taken_at.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            image_urls: self
                .image_versions
                .map(|versions| versions.items.into_iter().filter_map(|img| img.url).collect())
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireLiker {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl WireLiker {
    /// A liker without a username has no identity to group on; dropped.
    pub fn normalize(self) -> Option<Liker> {
        let username = self.username.filter(|u| !u.is_empty())?;

        Some(Liker {
            username,
            full_name: self.full_name.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireBusiness {
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
}

impl WireBusiness {
    pub fn normalize(self) -> Option<Business> {
        let id = self.business_id.filter(|id| !id.is_empty())?;

        Some(Business {
            id: BusinessId::new(id),
            name: self.name.unwrap_or_default(),
            full_address: self.full_address,
            rating: self.rating,
            review_count: self.review_count,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireReviewsPayload {
    #[serde(default)]
    pub reviews: Vec<WireReview>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireReview {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub review_datetime_utc: Option<String>,
    #[serde(default)]
    pub review_link: Option<String>,
}

impl WireReview {
    pub fn normalize(self) -> Review {
        Review {
            author_name: self.author_name.unwrap_or_default(),
            rating: self.rating,
            text: self.review_text.filter(|t| !t.is_empty()),
            time: self.review_datetime_utc.as_deref().and_then(parse_review_time),
            link: self.review_link,
        }
    }
}

fn parse_review_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

pub fn location_list(envelope: SocialEnvelope<ItemList<WireLocation>>) -> Vec<Location> {
    envelope
        .data
        .map(|data| data.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(WireLocation::normalize)
        .collect()
}

pub fn liker_list(envelope: SocialEnvelope<ItemList<WireLiker>>) -> Vec<Liker> {
    envelope
        .data
        .map(|data| data.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(WireLiker::normalize)
        .collect()
}

pub fn post_page(envelope: SocialEnvelope<ItemList<WirePost>>) -> Page<Post> {
    let items = envelope.data.map(|data| data.items).unwrap_or_default();
    let received = items.len();

    let posts: Vec<Post> = items.into_iter().filter_map(WirePost::normalize).collect();
    if posts.len() < received {
        warn!("dropped {} posts with no usable id", received - posts.len());
    }

    Page::new(posts, envelope.pagination_token.map(Cursor::new))
}
