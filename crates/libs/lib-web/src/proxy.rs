//! # Upstream Proxy
//!
//! The generic validate → forward → normalize forwarder behind every proxy
//! route. Each handler validates its own inputs, then describes the outbound
//! call with a [`RouteSpec`] and hands it to [`forward`], which guarantees
//! that every request yields exactly one well-formed JSON response:
//!
//! - upstream 2xx → forwarded body with the route's success status
//! - upstream non-2xx → forwarded verbatim or re-wrapped as a local 500,
//!   depending on the route's [`UpstreamPolicy`]
//! - network or JSON-parse failure → local 500 carrying the route's context
//!   message plus the caught error's message
//!
//! Two error-envelope shapes exist across the dashboard's API surface and
//! its consumers pattern-match on them, so both are preserved per route
//! family ([`ErrorStyle`]) rather than unified.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

/// Shared HTTP client bound to the upstream backend origin.
///
/// One reqwest client is created at startup and cloned into every handler
/// (cloning shares the underlying connection pool). No timeout is configured
/// beyond the client default and no retries are attempted: each request is a
/// single outbound call.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Client-facing error envelope family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorStyle {
    /// `{"error": {"message": ..., "details"?: ...}}` — auth, bets, charts,
    /// and yields routes.
    Nested,
    /// `{"success": false, "error": ..., "message"?: ...}` — markets and
    /// price routes.
    Flat,
}

/// What to do when the upstream answers with a non-2xx status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamPolicy {
    /// Forward the upstream status and JSON body verbatim. Upstream error
    /// detail is authoritative.
    PassThrough,
    /// Discard upstream detail and answer 500 with a synthesized
    /// `"Backend responded with status: N"` message.
    Rewrap,
}

/// Per-route description of one outbound call, consumed by [`forward`].
#[derive(Debug)]
pub struct RouteSpec {
    method: Method,
    path: String,
    query: Option<String>,
    body: Option<Value>,
    auth: Option<HeaderValue>,
    style: ErrorStyle,
    policy: UpstreamPolicy,
    context: &'static str,
    success_status: StatusCode,
    no_store: bool,
    upstream_message: bool,
}

impl RouteSpec {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
            auth: None,
            style: ErrorStyle::Nested,
            policy: UpstreamPolicy::PassThrough,
            context: "Request failed",
            success_status: StatusCode::OK,
            no_store: false,
            upstream_message: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Forward the inbound query string unchanged.
    pub fn query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    /// JSON body to forward upstream.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Forward the inbound `Authorization` header verbatim.
    pub fn auth(mut self, value: HeaderValue) -> Self {
        self.auth = Some(value);
        self
    }

    /// Use the flat `{"success":false,...}` envelope for local failures.
    pub fn flat(mut self) -> Self {
        self.style = ErrorStyle::Flat;
        self
    }

    /// Re-wrap upstream failures as a generic local 500.
    pub fn rewrap(mut self) -> Self {
        self.policy = UpstreamPolicy::Rewrap;
        self
    }

    /// When re-wrapping, prefer the upstream body's `message` field over the
    /// synthesized status message (market creation behaves this way).
    pub fn upstream_message(mut self) -> Self {
        self.upstream_message = true;
        self
    }

    /// Route context message carried by local 500 responses.
    pub fn context(mut self, context: &'static str) -> Self {
        self.context = context;
        self
    }

    /// Answer 201 instead of 200 on upstream success (creation routes).
    pub fn created(mut self) -> Self {
        self.success_status = StatusCode::CREATED;
        self
    }

    /// Ask intermediaries not to serve this route from cache; used by every
    /// GET route that reflects live state.
    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }
}

/// Execute one proxied request against the upstream backend.
pub async fn forward(upstream: &UpstreamClient, spec: RouteSpec) -> Response {
    let mut url = format!("{}{}", upstream.base_url(), spec.path);
    if let Some(query) = &spec.query {
        url.push('?');
        url.push_str(query);
    }

    debug!(method = %spec.method, url = %url, "[PROXY] forwarding request");

    let mut request = upstream
        .http
        .request(spec.method.clone(), &url)
        .header(header::CONTENT_TYPE, "application/json");

    if spec.no_store {
        request = request.header(header::CACHE_CONTROL, "no-store");
    }

    if let Some(auth) = &spec.auth {
        request = request.header(header::AUTHORIZATION, auth);
    }

    if let Some(body) = &spec.body {
        request = request.json(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            error!(url = %url, error = %err, "[PROXY] upstream call failed");
            return failure(spec.style, spec.context, err.to_string());
        }
    };

    let status = response.status();

    if !status.is_success() {
        return match spec.policy {
            UpstreamPolicy::Rewrap => {
                warn!(url = %url, status = status.as_u16(), "[PROXY] re-wrapping upstream failure");
                let detail = rewrap_detail(&spec, response).await;
                failure(spec.style, spec.context, detail)
            }
            UpstreamPolicy::PassThrough => {
                debug!(url = %url, status = status.as_u16(), "[PROXY] passing upstream failure through");
                match response.json::<Value>().await {
                    Ok(payload) => (status, Json(payload)).into_response(),
                    Err(err) => failure(spec.style, spec.context, err.to_string()),
                }
            }
        };
    }

    match response.json::<Value>().await {
        Ok(payload) => (spec.success_status, Json(payload)).into_response(),
        Err(err) => {
            error!(url = %url, error = %err, "[PROXY] upstream body was not valid JSON");
            failure(spec.style, spec.context, err.to_string())
        }
    }
}

/// Detail message for a re-wrapped upstream failure.
async fn rewrap_detail(spec: &RouteSpec, response: reqwest::Response) -> String {
    let status_message = format!("Backend responded with status: {}", response.status().as_u16());

    if !spec.upstream_message {
        return status_message;
    }

    match response.json::<Value>().await {
        Ok(payload) => payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or(status_message),
        Err(_) => status_message,
    }
}

/// Render an error body in the given envelope family.
///
/// `detail` carries the caught error's message on 500 responses; validation
/// failures pass `None` and emit only the message itself.
pub fn error_body(style: ErrorStyle, message: &str, detail: Option<&str>) -> Value {
    match (style, detail) {
        (ErrorStyle::Nested, None) => json!({ "error": { "message": message } }),
        (ErrorStyle::Nested, Some(detail)) => {
            json!({ "error": { "message": message, "details": detail } })
        }
        (ErrorStyle::Flat, None) => json!({ "success": false, "error": message }),
        (ErrorStyle::Flat, Some(detail)) => {
            json!({ "success": false, "error": message, "message": detail })
        }
    }
}

/// 400 response for a failed pre-flight validation.
pub fn validation_error(style: ErrorStyle, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(error_body(style, message, None))).into_response()
}

/// 401 response for a missing `Authorization` header on an auth-scoped route.
pub fn auth_required(style: ErrorStyle) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(error_body(style, "Authorization token required", None)),
    )
        .into_response()
}

/// Error response with an explicit status and detail line (used by the one
/// validation failure that carries a `message` alongside its `error`).
pub fn failure_with_status(
    style: ErrorStyle,
    status: StatusCode,
    message: &str,
    detail: String,
) -> Response {
    (status, Json(error_body(style, message, Some(&detail)))).into_response()
}

/// 500 response for a transport failure or unhandled local error.
pub fn failure(style: ErrorStyle, context: &'static str, detail: String) -> Response {
    let detail = if detail.is_empty() {
        "Unknown error".to_string()
    } else {
        detail
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_body(style, context, Some(&detail))),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_envelope_without_detail() {
        let body = error_body(ErrorStyle::Nested, "Bet ID is required", None);
        assert_eq!(body, json!({ "error": { "message": "Bet ID is required" } }));
    }

    #[test]
    fn nested_envelope_with_detail() {
        let body = error_body(ErrorStyle::Nested, "Failed to fetch bets", Some("connection refused"));
        assert_eq!(
            body,
            json!({ "error": { "message": "Failed to fetch bets", "details": "connection refused" } })
        );
    }

    #[test]
    fn flat_envelope_without_detail() {
        let body = error_body(ErrorStyle::Flat, "Market identifier is required", None);
        assert_eq!(
            body,
            json!({ "success": false, "error": "Market identifier is required" })
        );
    }

    #[test]
    fn flat_envelope_with_detail() {
        let body = error_body(
            ErrorStyle::Flat,
            "Failed to fetch markets",
            Some("Backend responded with status: 404"),
        );
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Failed to fetch markets",
                "message": "Backend responded with status: 404"
            })
        );
    }

    #[tokio::test]
    async fn failure_substitutes_unknown_error_for_empty_detail() {
        let response = failure(ErrorStyle::Nested, "Failed to fetch bets", String::new());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["details"], "Unknown error");
    }
}
