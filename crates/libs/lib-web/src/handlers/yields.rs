//! # Yield Handlers
//!
//! Proxy routes for yield history and APY data. Nested error envelope,
//! upstream failures passed through verbatim.
//!
//! Unlike the other list routes, `/api/yields` rebuilds its query string
//! from a whitelist (`limit`, `offset`, `marketId`) instead of forwarding
//! arbitrary parameters.

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::proxy::{self, RouteSpec, UpstreamClient};

#[derive(Debug, Deserialize)]
pub struct YieldsQuery {
    limit: Option<String>,
    offset: Option<String>,
    #[serde(rename = "marketId")]
    market_id: Option<String>,
}

impl YieldsQuery {
    /// Rebuild the upstream query string from the whitelisted parameters.
    fn to_query_string(&self) -> Option<String> {
        let pairs = [
            ("limit", self.limit.as_deref()),
            ("offset", self.offset.as_deref()),
            ("marketId", self.market_id.as_deref()),
        ];

        let query = pairs
            .iter()
            .filter_map(|(key, value)| {
                value.map(|value| format!("{}={}", key, urlencoding::encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&");

        (!query.is_empty()).then_some(query)
    }
}

/// Yield history, optionally filtered by market and paginated.
pub async fn list_yields(
    State(upstream): State<UpstreamClient>,
    Query(params): Query<YieldsQuery>,
) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/yields")
            .query(params.to_query_string())
            .no_store()
            .context("Failed to fetch yields"),
    )
    .await
}

/// Current APY rates across venues.
pub async fn get_current_apy(State(upstream): State<UpstreamClient>) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::get("/api/yields/apy/current")
            .no_store()
            .context("Failed to fetch current APY rates"),
    )
    .await
}

/// Trigger a yield recomputation on the backend.
pub async fn update_yields(State(upstream): State<UpstreamClient>) -> Response {
    proxy::forward(
        &upstream,
        RouteSpec::post("/api/yields/update")
            .no_store()
            .context("Failed to update yields"),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_whitelist_drops_unknown_params() {
        let params = YieldsQuery {
            limit: Some("5".to_string()),
            offset: None,
            market_id: Some("btc-100k".to_string()),
        };
        assert_eq!(
            params.to_query_string(),
            Some("limit=5&marketId=btc-100k".to_string())
        );
    }

    #[test]
    fn empty_query_is_omitted() {
        let params = YieldsQuery {
            limit: None,
            offset: None,
            market_id: None,
        };
        assert_eq!(params.to_query_string(), None);
    }

    #[test]
    fn query_values_are_encoded() {
        let params = YieldsQuery {
            limit: None,
            offset: None,
            market_id: Some("a b&c".to_string()),
        };
        assert_eq!(
            params.to_query_string(),
            Some("marketId=a%20b%26c".to_string())
        );
    }
}
