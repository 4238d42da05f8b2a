use audience_core::DashboardEngine;
use dashboard_routes::state::DashboardAppState;
use dotenv::dotenv;
use engine::app::{AppError, AppProperties, AppResult};
use error_stack::ResultExt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use upstream_client::{PlacesClient, SocialClient, UpstreamConfig};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    match try_main().await {
        Ok(_) => info!("dashboard service shutting down"),
        Err(e) => {
            error!("dashboard service exited with error: {e:?}");
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("DASHBOARD_LOG"))
        .init();
}

async fn try_main() -> AppResult<()> {
    init_logging();

    if let Err(e) = dotenv() {
        warn!("failed to load .env file: {e}");
    }

    let state = build_state()?;

    debug!("building routes..");
    let routes = dashboard_routes::routes::build(state);

    engine::app::run(routes, AppProperties { port: port() }).await
}

fn build_state() -> AppResult<DashboardAppState<UpstreamEngine>> {
    let config = Arc::new(UpstreamConfig::from_env().change_context(AppError)?);
    let http = reqwest::Client::new();

    let engine = UpstreamEngine {
        social: SocialClient::new(http.clone(), Arc::clone(&config)),
        places: PlacesClient::new(http, config),
    };

    let mut state = DashboardAppState::new_with_metrics(engine);
    if let Some(fan_out) = fan_out() {
        state = state.with_fan_out(fan_out);
    }
    Ok(state)
}

fn port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn fan_out() -> Option<NonZeroUsize> {
    std::env::var("AUDIENCE_FAN_OUT")
        .ok()
        .and_then(|raw| raw.parse().ok())
}

#[derive(Debug, Clone)]
struct UpstreamEngine {
    social: SocialClient,
    places: PlacesClient,
}

impl DashboardEngine for UpstreamEngine {
    type Social = SocialClient;
    type Places = PlacesClient;

    fn social(&self) -> Self::Social {
        self.social.clone()
    }

    fn places(&self) -> Self::Places {
        self.places.clone()
    }
}
