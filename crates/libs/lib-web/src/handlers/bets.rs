//! # Bet Handlers
//!
//! Proxy routes for listing, placing, and inspecting bets. Nested error
//! envelope, upstream failures passed through verbatim. Placing a bet is the
//! one creation route in the API and answers 201 on success.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::proxy::{self, ErrorStyle, RouteSpec, UpstreamClient};
use crate::validate;

/// List bets, forwarding any filter query verbatim.
pub async fn list_bets(
    State(upstream): State<UpstreamClient>,
    RawQuery(query): RawQuery,
) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/bets")
            .query(query)
            .no_store()
            .context("Failed to fetch bets"),
    )
    .await
}

/// Place a bet on a market.
///
/// Requires `marketIdentifier`, a boolean `position`, a positive `amount`
/// (number or numeric string), and a well-formed `userAddress`. The original
/// request body is forwarded untouched once it passes validation.
pub async fn place_bet(State(upstream): State<UpstreamClient>, body: Bytes) -> Response {
    const CONTEXT: &str = "Failed to place bet";

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return proxy::failure(ErrorStyle::Nested, CONTEXT, err.to_string()),
    };

    let market_identifier = payload.get("marketIdentifier");
    let position = payload.get("position");
    let amount = payload.get("amount");
    let user_address = payload.get("userAddress");

    let complete = validate::is_present(market_identifier)
        && position.is_some_and(Value::is_boolean)
        && validate::is_present(amount)
        && validate::is_present(user_address);

    if !complete {
        let body = json!({
            "error": {
                "message": "Missing required fields",
                "required": ["marketIdentifier", "position", "amount", "userAddress"],
            }
        });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let bet_amount = amount.and_then(validate::parse_amount);

    if !bet_amount.is_some_and(|amount| amount.is_finite() && amount > 0.0) {
        return proxy::validation_error(ErrorStyle::Nested, "Amount must be a positive number");
    }

    let valid_address = user_address
        .and_then(Value::as_str)
        .is_some_and(validate::is_wallet_address);

    if !valid_address {
        return proxy::validation_error(ErrorStyle::Nested, "Invalid Aptos wallet address format");
    }

    info!(amount = bet_amount, "[BETS] placing bet");

    proxy::forward(
        &upstream,
        RouteSpec::post("/api/bets")
            .json(payload)
            .created()
            .context(CONTEXT),
    )
    .await
}

/// Fetch one bet by its identifier.
pub async fn get_bet(
    State(upstream): State<UpstreamClient>,
    Path(bet_id): Path<String>,
) -> Response {
    if bet_id.is_empty() {
        return proxy::validation_error(ErrorStyle::Nested, "Bet ID is required");
    }

    proxy::forward(
        &upstream,
        RouteSpec::get(format!("/api/bets/{}", urlencoding::encode(&bet_id)))
            .no_store()
            .context("Failed to fetch bet"),
    )
    .await
}

/// Aggregate bet statistics, forwarding any filter query verbatim.
pub async fn get_bet_stats(
    State(upstream): State<UpstreamClient>,
    RawQuery(query): RawQuery,
) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/bets/stats/summary")
            .query(query)
            .no_store()
            .context("Failed to fetch bet statistics"),
    )
    .await
}
