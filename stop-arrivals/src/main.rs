use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stop_arrivals::domain::parse_route_types;
use stop_arrivals::engine::{ArrivalsEngine, EngineConfig, TransitFeed};
use stop_arrivals::poller::{PollConfig, Poller};
use stop_arrivals::tranzy::{FileFeed, TranzyClient, TranzyConfig};
use stop_arrivals::web::{AppState, create_router};

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stop_arrivals=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let poll_config = poll_config_from_env()?;
    let addr: SocketAddr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR)
        .parse()
        .map_err(|e| format!("invalid BIND_ADDR: {e}"))?;

    // Use local files instead of the live API when TRANZY_MOCK_DIR is set
    if let Ok(dir) = std::env::var("TRANZY_MOCK_DIR") {
        info!(%dir, "using file feed");
        let feed = FileFeed::new(&dir).map_err(|e| e.to_string())?;
        return serve(feed, poll_config, addr).await;
    }

    let api_key = std::env::var("TRANZY_API_KEY").map_err(|_| "TRANZY_API_KEY not set")?;
    let agency_id = std::env::var("TRANZY_AGENCY_ID").map_err(|_| "TRANZY_AGENCY_ID not set")?;
    let client = TranzyClient::new(TranzyConfig::new(api_key, agency_id))
        .map_err(|e| format!("failed to create Tranzy client: {e}"))?;

    info!("checking Tranzy credentials");
    if let Err(e) = client.test_connection().await {
        if e.is_transient() {
            warn!(error = %e, "Tranzy API unreachable, starting anyway");
        } else {
            return Err(format!("Tranzy API rejected the connection: {e}"));
        }
    }

    serve(client, poll_config, addr).await
}

/// Start the poller and serve HTTP until the process is stopped.
async fn serve<F: TransitFeed + 'static>(
    feed: F,
    poll_config: PollConfig,
    addr: SocketAddr,
) -> Result<(), String> {
    let engine = Arc::new(ArrivalsEngine::new(feed, EngineConfig::default()));
    let poller = Poller::new(Arc::clone(&engine), poll_config);
    let state = AppState::new(Arc::clone(&engine), poller.snapshot());
    tokio::spawn(poller.run());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    info!("stop arrivals listening on http://{addr}");
    info!("endpoints: GET /health, GET /arrivals, GET /stops?search=, GET /stops/{{stop_id}}");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}

fn poll_config_from_env() -> Result<PollConfig, String> {
    let stop_id = std::env::var("TRANZY_STOP_ID").map_err(|_| "TRANZY_STOP_ID not set")?;

    let vehicle_types = parse_route_types(&env_or("TRANZY_VEHICLE_TYPES", "0"))
        .map_err(|e| format!("invalid TRANZY_VEHICLE_TYPES: {e}"))?;

    let scan_secs: u64 = env_or("TRANZY_SCAN_INTERVAL", "30")
        .parse()
        .map_err(|e| format!("invalid TRANZY_SCAN_INTERVAL: {e}"))?;
    if scan_secs == 0 {
        return Err("TRANZY_SCAN_INTERVAL must be positive".to_string());
    }

    let max_arrivals: usize = env_or("TRANZY_MAX_ARRIVALS", "10")
        .parse()
        .map_err(|e| format!("invalid TRANZY_MAX_ARRIVALS: {e}"))?;

    Ok(PollConfig::new(stop_id)
        .with_vehicle_types(vehicle_types)
        .with_scan_interval(Duration::from_secs(scan_secs))
        .with_max_arrivals(max_arrivals))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
