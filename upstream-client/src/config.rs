use error_stack::{Report, ResultExt};

pub const DEFAULT_SOCIAL_HOST: &str = "instagram-social-api.p.rapidapi.com";
pub const DEFAULT_PLACES_HOST: &str = "local-business-data.p.rapidapi.com";

#[derive(Debug, thiserror::Error)]
#[error("the upstream configuration is incomplete")]
pub struct ConfigError;

/// Everything the two upstream clients need, read once at startup. Both
/// upstreams sit behind the same API gateway, so one key covers them.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_key: String,
    pub social_host: String,
    pub places_host: String,
    pub places_language: String,
    pub places_region: String,
}

impl UpstreamConfig {
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        let api_key = std::env::var("RAPIDAPI_KEY")
            .change_context(ConfigError)
            .attach("RAPIDAPI_KEY is missing")?;

        Ok(Self {
            api_key,
            social_host: env_or("SOCIAL_API_HOST", DEFAULT_SOCIAL_HOST),
            places_host: env_or("PLACES_API_HOST", DEFAULT_PLACES_HOST),
            places_language: env_or("PLACES_LANGUAGE", "tr"),
            places_region: env_or("PLACES_REGION", "tr"),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
