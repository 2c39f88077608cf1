//! # Auth Handlers
//!
//! Proxy routes in front of the backend's auth endpoints. All three use the
//! nested error envelope and pass upstream failures through verbatim.
//!
//! ## Endpoints
//!
//! - `PUT /api/auth/profile` - Update username/avatar (requires auth header)
//! - `POST /api/auth/refresh` - Refresh an access token (requires auth header)
//! - `POST /api/auth/wallet` - Connect a wallet address

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::Response,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::proxy::{self, ErrorStyle, RouteSpec, UpstreamClient};
use crate::validate;

/// Update the authenticated user's profile.
///
/// Both fields are optional, but anything supplied is validated before the
/// backend is contacted: `username` must be a 3–30 character string of
/// letters, numbers, hyphens, and underscores; `avatarUrl` must be an
/// http(s) URL when non-blank. Only those two fields are forwarded.
pub async fn update_profile(
    State(upstream): State<UpstreamClient>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    const CONTEXT: &str = "Failed to update profile";

    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        return proxy::auth_required(ErrorStyle::Nested);
    };

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return proxy::failure(ErrorStyle::Nested, CONTEXT, err.to_string()),
    };

    if let Some(username) = payload.get("username") {
        let Some(username) = username.as_str() else {
            return proxy::validation_error(ErrorStyle::Nested, "Username must be a string");
        };

        if let Err(message) = validate::validate_username(username) {
            return proxy::validation_error(ErrorStyle::Nested, message);
        }
    }

    if let Some(avatar_url) = payload.get("avatarUrl").filter(|value| !value.is_null()) {
        let Some(avatar_url) = avatar_url.as_str() else {
            return proxy::validation_error(ErrorStyle::Nested, "Avatar URL must be a string");
        };

        if !avatar_url.trim().is_empty() && !validate::is_http_url(avatar_url) {
            return proxy::validation_error(
                ErrorStyle::Nested,
                "Avatar URL must be a valid HTTP/HTTPS URL",
            );
        }
    }

    // Forward only the validated fields, preserving an explicit null avatar.
    let mut forward_body = Map::new();
    for field in ["username", "avatarUrl"] {
        if let Some(value) = payload.get(field) {
            forward_body.insert(field.to_string(), value.clone());
        }
    }

    info!("[AUTH] profile update forwarded");

    proxy::forward(
        &upstream,
        RouteSpec::put("/api/auth/profile")
            .auth(auth.clone())
            .json(Value::Object(forward_body))
            .context(CONTEXT),
    )
    .await
}

/// Refresh the caller's access token.
pub async fn refresh_token(
    State(upstream): State<UpstreamClient>,
    headers: HeaderMap,
) -> Response {
    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        return proxy::auth_required(ErrorStyle::Nested);
    };

    proxy::forward(
        &upstream,
        RouteSpec::post("/api/auth/refresh")
            .auth(auth.clone())
            .context("Failed to refresh token"),
    )
    .await
}

/// Register a wallet address with the backend.
pub async fn connect_wallet(State(upstream): State<UpstreamClient>, body: Bytes) -> Response {
    const CONTEXT: &str = "Failed to connect wallet";

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return proxy::failure(ErrorStyle::Nested, CONTEXT, err.to_string()),
    };

    let address = payload.get("address");

    if !validate::is_present(address) {
        return proxy::validation_error(ErrorStyle::Nested, "Wallet address is required");
    }

    let valid = address
        .and_then(Value::as_str)
        .is_some_and(validate::is_wallet_address);

    if !valid {
        return proxy::validation_error(ErrorStyle::Nested, "Invalid Aptos wallet address format");
    }

    let mut forward_body = Map::new();
    forward_body.insert("address".to_string(), address.cloned().unwrap_or(Value::Null));

    proxy::forward(
        &upstream,
        RouteSpec::post("/api/auth/wallet")
            .json(Value::Object(forward_body))
            .context(CONTEXT),
    )
    .await
}
