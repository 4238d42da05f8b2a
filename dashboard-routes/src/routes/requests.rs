use engine::Cursor;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CursorParams {
    /// Continuation token from the previous page, passed back verbatim.
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AudienceParams {
    /// When set, one failed liker fetch rejects the whole run instead of
    /// being reported per post.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisParams {
    /// How many entries to keep per audience list. Non-positive values are
    /// ignored in favor of the default.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BusinessSearchParams {
    pub q: Option<String>,
    /// Optional point to bias the lookup around; only used when both
    /// coordinates are present.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewParams {
    /// Upstream refuses more than 1000 reviews per page; larger values are
    /// capped, absent ones default to 20.
    pub limit: Option<u32>,
    pub cursor: Option<Cursor>,
}
