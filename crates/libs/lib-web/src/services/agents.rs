//! # Agent Service
//!
//! Client for the agent half of the external price/agent service: user
//! registration, agent lifecycle control (start/stop/execute-once), and the
//! per-user portfolio, performance, statistics, and transaction reads.
//!
//! Unlike the price cache, nothing here is cached: every call is a live
//! control operation or a read whose staleness would mislead the dashboard.
//! Errors surface as [`AppError`] so the routes can map them to statuses.

use lib_core::dto::{PerformanceMetrics, UserStatistics, UserStatus, UserTransactions};
use lib_core::{AppError, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

/// Client for the agent control and reporting endpoints.
#[derive(Clone)]
pub struct AgentService {
    http: reqwest::Client,
    base_url: String,
}

impl AgentService {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        debug!(method = %method, url = %url, "[AGENTS] calling agent service");

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AppError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "HTTP error! status: {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| AppError::Transport(err.to_string()))
    }

    fn user_path(user_address: &str, suffix: &str) -> String {
        format!("/users/{}{}", urlencoding::encode(user_address), suffix)
    }

    /// Register a user with the agent service.
    pub async fn register_user(&self, user_address: &str, enabled: bool) -> Result<Value> {
        self.send(
            Method::POST,
            "/users/register",
            Some(&json!({ "user_address": user_address, "enabled": enabled })),
        )
        .await
    }

    /// Registration and lifecycle state for one user's agent.
    pub async fn user_status(&self, user_address: &str) -> Result<UserStatus> {
        let data = self
            .send(Method::GET, &Self::user_path(user_address, "/status"), None)
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Enable or disable the agent without starting or stopping it.
    pub async fn update_config(&self, user_address: &str, enabled: bool) -> Result<Value> {
        self.send(
            Method::POST,
            &Self::user_path(user_address, "/config"),
            Some(&json!({ "enabled": enabled })),
        )
        .await
    }

    /// Start the agent's iteration loop.
    pub async fn start_agent(&self, user_address: &str) -> Result<Value> {
        self.send(
            Method::POST,
            &Self::user_path(user_address, "/agent/start"),
            None,
        )
        .await
    }

    /// Stop the agent's iteration loop.
    pub async fn stop_agent(&self, user_address: &str) -> Result<Value> {
        self.send(
            Method::POST,
            &Self::user_path(user_address, "/agent/stop"),
            None,
        )
        .await
    }

    /// Run a single agent iteration immediately.
    pub async fn execute_once(&self, user_address: &str) -> Result<Value> {
        self.send(
            Method::POST,
            &Self::user_path(user_address, "/execute-once"),
            None,
        )
        .await
    }

    /// Portfolio value snapshots over a timeframe (`1h`/`24h`/`7d`/`30d`/`all`).
    pub async fn portfolio_history(&self, user_address: &str, timeframe: &str) -> Result<Value> {
        let path = format!(
            "{}?timeframe={}",
            Self::user_path(user_address, "/portfolio-history"),
            urlencoding::encode(timeframe)
        );
        self.send(Method::GET, &path, None).await
    }

    /// Record the user's initial deposit, the baseline for P&L numbers.
    pub async fn set_initial_deposit(&self, user_address: &str, amount_usd: f64) -> Result<Value> {
        self.send(
            Method::POST,
            &Self::user_path(user_address, "/set-initial-deposit"),
            Some(&json!({ "amount_usd": amount_usd })),
        )
        .await
    }

    /// Lifetime counters for one user.
    pub async fn user_statistics(&self, user_address: &str) -> Result<UserStatistics> {
        let data = self
            .send(
                Method::GET,
                &Self::user_path(user_address, "/statistics"),
                None,
            )
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// P&L and activity metrics for one user.
    pub async fn performance(&self, user_address: &str) -> Result<PerformanceMetrics> {
        let data = self
            .send(
                Method::GET,
                &Self::user_path(user_address, "/performance"),
                None,
            )
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Most recent agent transactions for one user.
    pub async fn transactions(&self, user_address: &str, limit: u32) -> Result<UserTransactions> {
        let path = format!(
            "{}?limit={}",
            Self::user_path(user_address, "/transactions"),
            limit
        );
        let data = self.send(Method::GET, &path, None).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Service-wide aggregates across all users.
    pub async fn global_statistics(&self) -> Result<Value> {
        self.send(Method::GET, "/statistics/global", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, routing::post, Json, Router};

    async fn spawn_agent_stub() -> String {
        let app = Router::new()
            .route(
                "/users/register",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "status": "registered", "echo": body }))
                }),
            )
            .route(
                "/users/{address}/status",
                get(|| async {
                    Json(json!({
                        "user_address": "0xabc123",
                        "enabled": true,
                        "running": false,
                        "iteration_count": 7,
                        "last_iteration": null,
                        "last_sensor_data": null,
                        "last_decision": null,
                    }))
                }),
            )
            .route(
                "/users/{address}/agent/start",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn register_posts_the_address_and_flag() {
        let base_url = spawn_agent_stub().await;
        let service = AgentService::new(reqwest::Client::new(), base_url);

        let response = service
            .register_user("0xabc123", true)
            .await
            .expect("registration response");

        assert_eq!(
            response["echo"],
            json!({ "user_address": "0xabc123", "enabled": true })
        );
    }

    #[tokio::test]
    async fn status_parses_the_typed_response() {
        let base_url = spawn_agent_stub().await;
        let service = AgentService::new(reqwest::Client::new(), base_url);

        let status = service.user_status("0xabc123").await.expect("status");

        assert_eq!(status.user_address, "0xabc123");
        assert_eq!(status.iteration_count, 7);
        assert!(status.last_decision.is_none());
    }

    #[tokio::test]
    async fn non_2xx_responses_become_upstream_errors() {
        let base_url = spawn_agent_stub().await;
        let service = AgentService::new(reqwest::Client::new(), base_url);

        let err = service.start_agent("0xabc123").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(err.to_string(), "Upstream error: HTTP error! status: 503");
    }

    #[tokio::test]
    async fn transport_failures_become_transport_errors() {
        let service = AgentService::new(reqwest::Client::new(), "http://127.0.0.1:1");

        let err = service.global_statistics().await.unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
    }
}
