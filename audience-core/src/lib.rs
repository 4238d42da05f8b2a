pub mod analysis;
mod api;
pub use api::{PlacesApi, SocialApi};
pub mod audience;
pub mod export;
pub mod model;
pub mod result;

/// The seam between the HTTP surface and the two upstream data sources.
/// Route handlers are generic over this, so tests can swap the reqwest
/// clients for recording fakes.
pub trait DashboardEngine: Clone + Send + Sync + 'static {
    type Social: SocialApi + Send + Sync + 'static;
    type Places: PlacesApi + Send + Sync + 'static;

    fn social(&self) -> Self::Social;
    fn places(&self) -> Self::Places;
}
