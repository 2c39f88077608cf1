//! # Agent Handlers
//!
//! Control panel routes for the per-user trading agent, backed by
//! [`AgentService`]. These routes are served by the gateway itself (the
//! agent service has no proxy family), so they use the `AppError` envelope:
//! 400 for a malformed address, 502 when the agent service is unreachable
//! or rejects the call.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use lib_core::dto::{PerformanceMetrics, UserStatistics, UserStatus, UserTransactions};
use lib_core::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::services::AgentService;
use crate::validate;

fn checked_address(address: &str) -> Result<&str> {
    if validate::is_wallet_address(address) {
        Ok(address)
    } else {
        Err(AppError::InvalidInput(
            "Invalid wallet address format".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    user_address: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Register a user with the agent service. Enabled by default.
pub async fn register_agent(
    State(agents): State<AgentService>,
    Json(request): Json<RegisterAgentRequest>,
) -> Result<Json<Value>> {
    let address = checked_address(&request.user_address)?;

    info!(enabled = request.enabled, "[AGENTS] registering user");

    Ok(Json(agents.register_user(address, request.enabled).await?))
}

/// Registration and lifecycle state for one user's agent.
pub async fn get_agent_status(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<UserStatus>> {
    let address = checked_address(&address)?;
    Ok(Json(agents.user_status(address).await?))
}

#[derive(Debug, Deserialize)]
pub struct AgentConfigRequest {
    enabled: bool,
}

/// Enable or disable the agent without touching its run state.
pub async fn update_agent_config(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
    Json(request): Json<AgentConfigRequest>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;
    Ok(Json(agents.update_config(address, request.enabled).await?))
}

/// Start the agent's iteration loop.
pub async fn start_agent(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;

    info!("[AGENTS] starting agent");

    Ok(Json(agents.start_agent(address).await?))
}

/// Stop the agent's iteration loop.
pub async fn stop_agent(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;

    info!("[AGENTS] stopping agent");

    Ok(Json(agents.stop_agent(address).await?))
}

/// Run a single agent iteration immediately.
pub async fn execute_once(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;
    Ok(Json(agents.execute_once(address).await?))
}

#[derive(Debug, Deserialize)]
pub struct TimeframeQuery {
    timeframe: Option<String>,
}

/// Portfolio value snapshots over a timeframe (defaults to `24h`).
pub async fn get_portfolio_history(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
    Query(params): Query<TimeframeQuery>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;
    let timeframe = params.timeframe.unwrap_or_else(|| "24h".to_string());

    Ok(Json(agents.portfolio_history(address, &timeframe).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialDepositRequest {
    amount_usd: f64,
}

/// Record the user's initial deposit, the baseline for P&L numbers.
pub async fn set_initial_deposit(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
    Json(request): Json<InitialDepositRequest>,
) -> Result<Json<Value>> {
    let address = checked_address(&address)?;

    if !request.amount_usd.is_finite() || request.amount_usd <= 0.0 {
        return Err(AppError::InvalidInput(
            "Amount must be a positive number".to_string(),
        ));
    }

    Ok(Json(
        agents
            .set_initial_deposit(address, request.amount_usd)
            .await?,
    ))
}

/// Lifetime counters for one user.
pub async fn get_agent_statistics(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<UserStatistics>> {
    let address = checked_address(&address)?;
    Ok(Json(agents.user_statistics(address).await?))
}

/// P&L and activity metrics for one user.
pub async fn get_agent_performance(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
) -> Result<Json<PerformanceMetrics>> {
    let address = checked_address(&address)?;
    Ok(Json(agents.performance(address).await?))
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    limit: Option<u32>,
}

/// Most recent agent transactions for one user (default limit 50).
pub async fn get_agent_transactions(
    State(agents): State<AgentService>,
    Path(address): Path<String>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Json<UserTransactions>> {
    let address = checked_address(&address)?;
    let limit = params.limit.unwrap_or(50);

    Ok(Json(agents.transactions(address, limit).await?))
}

/// Service-wide aggregates across all users.
pub async fn get_global_statistics(
    State(agents): State<AgentService>,
) -> Result<Json<Value>> {
    Ok(Json(agents.global_statistics().await?))
}
