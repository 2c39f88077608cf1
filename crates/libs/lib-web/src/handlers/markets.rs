//! # Market Handlers
//!
//! Proxy routes for market listings, market detail, blockchain market state,
//! and on-chain market creation. This family uses the flat
//! `{"success":false,...}` error envelope. The listing, blockchain, and
//! creation routes re-wrap upstream failures into a generic local 500; the
//! detail and image routes pass upstream failures through verbatim. Both
//! behaviors are load-bearing for the dashboard and are kept per route.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    response::Response,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::proxy::{self, ErrorStyle, RouteSpec, UpstreamClient};
use crate::validate;

/// List markets, forwarding any filter query verbatim.
pub async fn list_markets(
    State(upstream): State<UpstreamClient>,
    RawQuery(query): RawQuery,
) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/markets")
            .query(query)
            .flat()
            .rewrap()
            .no_store()
            .context("Failed to fetch markets"),
    )
    .await
}

/// Fetch one market by identifier.
pub async fn get_market(
    State(upstream): State<UpstreamClient>,
    Path(identifier): Path<String>,
) -> Response {
    if identifier.is_empty() {
        return proxy::validation_error(ErrorStyle::Flat, "Market identifier is required");
    }

    proxy::forward(
        &upstream,
        RouteSpec::get(format!(
            "/api/markets/{}",
            urlencoding::encode(&identifier)
        ))
        .flat()
        .no_store()
        .context("Failed to fetch market data"),
    )
    .await
}

/// Update a market's display image.
///
/// `imageUrl` is optional; when supplied it must be a string and, unless
/// blank, an http(s) URL. Only the `imageUrl` field is forwarded.
pub async fn update_market_image(
    State(upstream): State<UpstreamClient>,
    Path(identifier): Path<String>,
    body: Bytes,
) -> Response {
    const CONTEXT: &str = "Failed to update market image";

    if identifier.is_empty() {
        return proxy::validation_error(ErrorStyle::Flat, "Market identifier is required");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return proxy::failure(ErrorStyle::Flat, CONTEXT, err.to_string()),
    };

    if let Some(image_url) = payload.get("imageUrl").filter(|value| !value.is_null()) {
        let Some(image_url) = image_url.as_str() else {
            return proxy::validation_error(ErrorStyle::Flat, "Image URL must be a string");
        };

        if !image_url.trim().is_empty() && !validate::is_http_url(image_url) {
            return proxy::validation_error(
                ErrorStyle::Flat,
                "Image URL must be a valid HTTP/HTTPS URL",
            );
        }
    }

    let mut forward_body = Map::new();
    if let Some(value) = payload.get("imageUrl") {
        forward_body.insert("imageUrl".to_string(), value.clone());
    }

    proxy::forward(
        &upstream,
        RouteSpec::put(format!(
            "/api/markets/{}/image",
            urlencoding::encode(&identifier)
        ))
        .json(Value::Object(forward_body))
        .flat()
        .context(CONTEXT),
    )
    .await
}

/// Fetch on-chain market state by numeric market id.
pub async fn get_blockchain_market(
    State(upstream): State<UpstreamClient>,
    Path(market_id): Path<String>,
) -> Response {
    if market_id.is_empty() {
        return proxy::validation_error(ErrorStyle::Flat, "Market ID is required");
    }

    proxy::forward(
        &upstream,
        RouteSpec::get(format!(
            "/api/markets/blockchain/{}",
            urlencoding::encode(&market_id)
        ))
        .flat()
        .rewrap()
        .no_store()
        .context("Failed to fetch blockchain market data"),
    )
    .await
}

/// Health/status of the backend's blockchain integration.
pub async fn get_blockchain_status(State(upstream): State<UpstreamClient>) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/markets/blockchain/status")
            .flat()
            .rewrap()
            .no_store()
            .context("Failed to fetch blockchain status"),
    )
    .await
}

/// Create a market on-chain through the backend.
///
/// On upstream failure the backend's own `message` is surfaced when present;
/// the rest of the re-wrap family substitutes a status message instead.
pub async fn create_blockchain_market(
    State(upstream): State<UpstreamClient>,
    body: Bytes,
) -> Response {
    const CONTEXT: &str = "Failed to create market";

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return proxy::failure(ErrorStyle::Flat, CONTEXT, err.to_string()),
    };

    let complete = ["question", "category", "endTime", "initialFunding"]
        .iter()
        .all(|field| validate::is_present(payload.get(*field)));

    if !complete {
        return proxy::failure_with_status(
            ErrorStyle::Flat,
            axum::http::StatusCode::BAD_REQUEST,
            "Missing required fields",
            "question, category, endTime, and initialFunding are required".to_string(),
        );
    }

    info!("[MARKETS] creating blockchain market");

    proxy::forward(
        &upstream,
        RouteSpec::post("/api/markets/create-blockchain")
            .json(payload)
            .flat()
            .rewrap()
            .upstream_message()
            .context(CONTEXT),
    )
    .await
}
