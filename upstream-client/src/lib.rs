mod config;
pub use config::{ConfigError, UpstreamConfig};
mod places;
pub use places::PlacesClient;
mod social;
pub use social::SocialClient;
mod wire;
