//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! Creates the axum router, registers every proxy and price route, applies
//! middleware (request stamping, logging, tracing, CORS), and starts the
//! listener.

// region: --- Imports
use crate::handlers;
use crate::middleware::{log_requests, stamp_req};
use crate::proxy::UpstreamClient;
use crate::services::{AgentService, PriceService};
use axum::{
    routing::{get, post, put},
    Router,
};
use lib_core::Config;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub prices: PriceService,
    pub agents: AgentService,
}

impl AppState {
    /// Build the state from a loaded configuration. One reqwest client is
    /// shared between the backend proxy and both service clients.
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let upstream = UpstreamClient::new(http.clone(), config.backend_url.clone());
        let prices = PriceService::new(http.clone(), config.price_api_url.clone());
        let agents = AgentService::new(http, config.price_api_url.clone());

        Self {
            config,
            upstream,
            prices,
            agents,
        }
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for UpstreamClient {
    fn from_ref(state: &AppState) -> Self {
        state.upstream.clone()
    }
}

impl axum::extract::FromRef<AppState> for PriceService {
    fn from_ref(state: &AppState) -> Self {
        state.prices.clone()
    }
}

impl axum::extract::FromRef<AppState> for AgentService {
    fn from_ref(state: &AppState) -> Self {
        state.agents.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration.
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server.
///
/// # Errors
///
/// Returns an error if configuration loading or validation fails, or if the
/// listener cannot bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(" LENZU GATEWAY STARTING");

    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    let app_config = Config::from_env()?;
    app_config.validate()?;

    info!("Upstream backend: {}", app_config.backend_url);
    info!("Price service:    {}", app_config.price_api_url);

    let state = AppState::new(app_config);
    let app = create_router(state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_route_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes.
pub fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        // Auth
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route("/api/auth/refresh", post(handlers::auth::refresh_token))
        .route("/api/auth/wallet", post(handlers::auth::connect_wallet))
        // Bets
        .route(
            "/api/bets",
            get(handlers::bets::list_bets).post(handlers::bets::place_bet),
        )
        .route("/api/bets/{bet_id}", get(handlers::bets::get_bet))
        .route("/api/bets/stats/summary", get(handlers::bets::get_bet_stats))
        // Charts
        .route(
            "/api/charts/market/{identifier}/probability",
            get(handlers::charts::get_market_probability),
        )
        // Markets
        .route("/api/markets", get(handlers::markets::list_markets))
        .route("/api/markets/{identifier}", get(handlers::markets::get_market))
        .route(
            "/api/markets/{identifier}/image",
            put(handlers::markets::update_market_image),
        )
        .route(
            "/api/markets/blockchain/{market_id}",
            get(handlers::markets::get_blockchain_market),
        )
        .route(
            "/api/markets/blockchain/status",
            get(handlers::markets::get_blockchain_status),
        )
        .route(
            "/api/markets/create-blockchain",
            post(handlers::markets::create_blockchain_market),
        )
        // Prices
        .route("/api/prices", get(handlers::prices::get_all_prices))
        .route("/api/prices/usdc-usd", get(handlers::prices::get_usdc_usd))
        .route("/api/prices/update", post(handlers::prices::update_prices))
        .route(
            "/api/prices/calculate-portfolio",
            post(handlers::prices::calculate_portfolio),
        )
        .route("/api/prices/{symbol}", get(handlers::prices::get_token_price))
        .route(
            "/api/prices/{symbol}/history",
            get(handlers::prices::get_price_history),
        )
        .route(
            "/api/prices/{symbol}/cached",
            get(handlers::prices::get_cached_price),
        )
        // Agents
        .route("/api/agents/register", post(handlers::agents::register_agent))
        .route(
            "/api/agents/statistics/global",
            get(handlers::agents::get_global_statistics),
        )
        .route(
            "/api/agents/{address}/status",
            get(handlers::agents::get_agent_status),
        )
        .route(
            "/api/agents/{address}/config",
            post(handlers::agents::update_agent_config),
        )
        .route(
            "/api/agents/{address}/start",
            post(handlers::agents::start_agent),
        )
        .route(
            "/api/agents/{address}/stop",
            post(handlers::agents::stop_agent),
        )
        .route(
            "/api/agents/{address}/execute-once",
            post(handlers::agents::execute_once),
        )
        .route(
            "/api/agents/{address}/portfolio-history",
            get(handlers::agents::get_portfolio_history),
        )
        .route(
            "/api/agents/{address}/initial-deposit",
            post(handlers::agents::set_initial_deposit),
        )
        .route(
            "/api/agents/{address}/statistics",
            get(handlers::agents::get_agent_statistics),
        )
        .route(
            "/api/agents/{address}/performance",
            get(handlers::agents::get_agent_performance),
        )
        .route(
            "/api/agents/{address}/transactions",
            get(handlers::agents::get_agent_transactions),
        )
        // Yields
        .route("/api/yields", get(handlers::yields::list_yields))
        .route("/api/yields/apy/current", get(handlers::yields::get_current_apy))
        .route("/api/yields/update", post(handlers::yields::update_yields))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        // Layers run outermost-last: cors -> stamp -> logging -> trace.
        // Stamping must wrap logging and tracing so both see the request ID.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<crate::middleware::RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                },
            ),
        )
        .layer(axum::middleware::from_fn(log_requests))
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Log route information.
fn log_route_info() {
    info!("AUTH:");
    info!("   • PUT  /api/auth/profile");
    info!("   • POST /api/auth/refresh");
    info!("   • POST /api/auth/wallet");
    info!("BETS:");
    info!("   • GET  /api/bets?userAddress={{address}}");
    info!("   • POST /api/bets");
    info!("   • GET  /api/bets/{{betId}}");
    info!("   • GET  /api/bets/stats/summary");
    info!("MARKETS:");
    info!("   • GET  /api/markets");
    info!("   • GET  /api/markets/{{identifier}}");
    info!("   • PUT  /api/markets/{{identifier}}/image");
    info!("   • GET  /api/markets/blockchain/{{marketId}}");
    info!("   • GET  /api/markets/blockchain/status");
    info!("   • POST /api/markets/create-blockchain");
    info!("CHARTS:");
    info!("   • GET  /api/charts/market/{{identifier}}/probability");
    info!("YIELDS:");
    info!("   • GET  /api/yields?limit={{n}}&offset={{n}}&marketId={{id}}");
    info!("   • GET  /api/yields/apy/current");
    info!("   • POST /api/yields/update");
    info!("PRICES:");
    info!("   • GET  /api/prices");
    info!("   • GET  /api/prices/usdc-usd");
    info!("   • GET  /api/prices/{{symbol}}");
    info!("   • GET  /api/prices/{{symbol}}/history?timeframe=24h");
    info!("   • GET  /api/prices/{{symbol}}/cached");
    info!("   • POST /api/prices/calculate-portfolio");
    info!("   • POST /api/prices/update");
    info!("AGENTS:");
    info!("   • POST /api/agents/register");
    info!("   • GET  /api/agents/{{address}}/status");
    info!("   • POST /api/agents/{{address}}/config");
    info!("   • POST /api/agents/{{address}}/start");
    info!("   • POST /api/agents/{{address}}/stop");
    info!("   • POST /api/agents/{{address}}/execute-once");
    info!("   • GET  /api/agents/{{address}}/portfolio-history?timeframe=24h");
    info!("   • POST /api/agents/{{address}}/initial-deposit");
    info!("   • GET  /api/agents/{{address}}/statistics");
    info!("   • GET  /api/agents/{{address}}/performance");
    info!("   • GET  /api/agents/{{address}}/transactions?limit=50");
    info!("   • GET  /api/agents/statistics/global");
    info!("HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
