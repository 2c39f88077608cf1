//! # Chart Handlers
//!
//! Proxy route for market probability chart data. Nested error envelope,
//! upstream failures passed through verbatim.

use axum::{
    extract::{Path, RawQuery, State},
    response::Response,
};

use crate::proxy::{self, ErrorStyle, RouteSpec, UpstreamClient};

/// Probability history for one market, forwarding range/resolution queries
/// verbatim.
pub async fn get_market_probability(
    State(upstream): State<UpstreamClient>,
    Path(identifier): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if identifier.is_empty() {
        return proxy::validation_error(ErrorStyle::Nested, "Market identifier is required");
    }

    proxy::forward(
        &upstream,
        RouteSpec::get(format!(
            "/api/charts/market/{}/probability",
            urlencoding::encode(&identifier)
        ))
        .query(query)
        .no_store()
        .context("Failed to fetch probability data"),
    )
    .await
}
