//! # Price Handlers
//!
//! Two kinds of price routes live here:
//!
//! - `GET /api/prices/usdc-usd` proxies the backend like every other route
//!   (flat envelope, re-wrap policy).
//! - The remaining routes are served by the local [`PriceService`] cache in
//!   front of the external price/agent service (quotes, history, cached
//!   reads, portfolio valuation, forced refresh) and use the `AppError`
//!   envelope instead of the proxy families.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use lib_core::dto::{AllPricesResponse, PortfolioResponse, PriceHistoryResponse, PriceResponse};
use lib_core::{AppError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::proxy::{self, RouteSpec, UpstreamClient};
use crate::services::PriceService;

/// USDC/USD reference price from the backend.
pub async fn get_usdc_usd(State(upstream): State<UpstreamClient>) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/prices/usdc-usd")
            .flat()
            .rewrap()
            .no_store()
            .context("Failed to fetch USDC/USD price"),
    )
    .await
}

/// Current quote for one token symbol, served from the price cache.
pub async fn get_token_price(
    State(prices): State<PriceService>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceResponse>> {
    let symbol = symbol.to_uppercase();

    match prices.token_price(&symbol).await {
        Some(price_data) => Ok(Json(PriceResponse {
            status: "success".to_string(),
            symbol: Some(symbol),
            price_data: Some(price_data),
            message: None,
        })),
        None => Err(AppError::NotFound(format!(
            "No price data available for {}",
            symbol
        ))),
    }
}

/// Current quotes for every tracked token; empty when the upstream is down
/// and nothing is cached.
pub async fn get_all_prices(State(prices): State<PriceService>) -> Json<AllPricesResponse> {
    let quotes = prices.all_prices().await;

    Json(AllPricesResponse {
        status: "success".to_string(),
        timestamp: chrono::Utc::now().timestamp() as f64,
        prices: quotes,
    })
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    timeframe: Option<String>,
}

/// Price history for one token symbol.
pub async fn get_price_history(
    State(prices): State<PriceService>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Json<PriceHistoryResponse> {
    let symbol = symbol.to_uppercase();
    let timeframe = params.timeframe.unwrap_or_else(|| "24h".to_string());

    let history = prices.price_history(&symbol, &timeframe).await;

    Json(PriceHistoryResponse {
        status: "success".to_string(),
        symbol,
        timeframe,
        data_points: history.len() as u64,
        history,
    })
}

/// Cached quote for one token symbol, never touching the network. Serves
/// stale entries and the static fallback table for immediate reads.
pub async fn get_cached_price(
    State(prices): State<PriceService>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceResponse>> {
    let symbol = symbol.to_uppercase();

    match prices.cached_price(&symbol).await {
        Some(price_data) => Ok(Json(PriceResponse {
            status: "success".to_string(),
            symbol: Some(symbol),
            price_data: Some(price_data),
            message: None,
        })),
        None => Err(AppError::NotFound(format!(
            "No cached price available for {}",
            symbol
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    balances: HashMap<String, f64>,
}

/// Value the given token balances in USD via the price service.
pub async fn calculate_portfolio(
    State(prices): State<PriceService>,
    Json(request): Json<PortfolioRequest>,
) -> Result<Json<PortfolioResponse>> {
    match prices.calculate_portfolio(&request.balances).await {
        Some(portfolio) => Ok(Json(PortfolioResponse {
            status: "success".to_string(),
            portfolio: Some(portfolio),
        })),
        None => Err(AppError::Upstream(
            "Portfolio calculation failed".to_string(),
        )),
    }
}

/// Force a refresh of the upstream price feed and drop the local cache.
pub async fn update_prices(State(prices): State<PriceService>) -> Result<Json<Value>> {
    if prices.force_update().await {
        Ok(Json(json!({ "status": "success" })))
    } else {
        Err(AppError::Upstream("Price update failed".to_string()))
    }
}
