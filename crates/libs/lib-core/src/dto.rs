//! # Data Transfer Objects
//!
//! Wire types for the external price/agent service. Field names follow the
//! upstream's snake_case JSON format verbatim.
//!
//! The proxy routes themselves carry opaque `serde_json::Value` payloads and
//! define no DTOs: the gateway never owns or reshapes backend data. The agent
//! service types only the responses consumers inspect field-by-field; its
//! remaining operations carry opaque payloads too.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current quote for a single token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPriceData {
    pub coingecko_id: String,
    pub price_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<f64>,
    /// Unix timestamp (seconds) of the upstream's last refresh.
    pub last_updated: f64,
}

/// Envelope returned by `GET /prices/{SYMBOL}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_data: Option<TokenPriceData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Envelope returned by `GET /prices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllPricesResponse {
    pub status: String,
    pub timestamp: f64,
    pub prices: std::collections::HashMap<String, TokenPriceData>,
}

/// One sample in a token's price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub symbol: String,
    pub price_usd: f64,
    pub timestamp: i64,
    pub interval_type: String,
}

/// Envelope returned by `GET /prices/{SYMBOL}/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub status: String,
    pub symbol: String,
    pub timeframe: String,
    pub data_points: u64,
    pub history: Vec<PriceHistoryPoint>,
}

/// One token's slice of a valued portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioValue {
    pub balance: f64,
    pub price_usd: f64,
    pub value_usd: f64,
    pub percentage: f64,
}

/// Valued portfolio returned by `POST /prices/calculate-portfolio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioBreakdown {
    pub total_value_usd: f64,
    pub tokens: std::collections::HashMap<String, PortfolioValue>,
    pub timestamp: f64,
}

/// Envelope around a portfolio valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<PortfolioBreakdown>,
}

/// Registration and lifecycle state of one user's agent,
/// from `GET /users/{address}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatus {
    pub user_address: String,
    pub enabled: bool,
    pub running: bool,
    pub iteration_count: u64,
    pub last_iteration: Option<f64>,
    pub last_sensor_data: Option<SensorData>,
    pub last_decision: Option<Decision>,
}

/// On-chain balances and positions the agent observed on its last iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorData {
    pub wallet_balance_stt: f64,
    pub weth_balance: f64,
    pub usdc_balance: f64,
    pub elix_position: ElixPosition,
    pub tokos_position: TokosPosition,
    pub health_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElixPosition {
    pub kandel_address: String,
    pub is_active: bool,
    pub weth_deployed: f64,
    pub usdc_deployed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokosPosition {
    pub supplied: f64,
    pub borrowed: f64,
}

/// The agent's reasoning and planned actions for one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub reasoning: String,
    pub actions: Vec<AgentAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    pub action: String,
    pub params: Value,
}

/// P&L and activity metrics from `GET /users/{address}/performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub user_address: String,
    pub total_pnl_usd: f64,
    pub total_pnl_percentage: f64,
    pub daily_change_usd: f64,
    pub daily_change_percentage: f64,
    pub current_portfolio: CurrentPortfolio,
    pub average_health_factor: f64,
    pub min_health_factor: f64,
    pub positions: PositionSummary,
    pub apys: ApySummary,
    pub avg_gain_per_tx: f64,
    pub total_iterations: u64,
    pub total_actions_executed: u64,
    pub successful_actions: u64,
    pub failed_actions: u64,
    pub success_rate: f64,
    pub total_gas_used: f64,
    pub total_gas_cost_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPortfolio {
    pub stt_balance: f64,
    pub weth_balance: f64,
    pub usdc_balance: f64,
    pub total_value_usd: f64,
    pub health_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub elix_active: bool,
    pub elix_total_deployed_usd: f64,
    pub tokos_supplied: f64,
    pub tokos_borrowed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApySummary {
    pub elix_apy: Option<f64>,
    pub tokos_apy: Option<f64>,
}

/// One executed (or attempted) agent action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTransaction {
    pub timestamp: f64,
    pub action: String,
    pub params: Value,
    pub tx_hash: Option<String>,
    pub status: String,
    pub reasoning: String,
}

/// Envelope returned by `GET /users/{address}/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTransactions {
    pub user_address: String,
    pub transaction_count: u64,
    pub transactions: Vec<AgentTransaction>,
}

/// Lifetime counters from `GET /users/{address}/statistics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    pub user_address: String,
    pub initial_deposit_usd: f64,
    pub current_value_usd: f64,
    pub total_pnl_usd: f64,
    pub total_pnl_percentage: f64,
    pub total_iterations: u64,
    pub total_actions_executed: u64,
    pub successful_actions: u64,
    pub failed_actions: u64,
    pub success_rate: f64,
    pub total_gas_used: f64,
    pub total_gas_cost_usd: f64,
    pub total_runtime_seconds: f64,
    pub last_active: Option<f64>,
    pub snapshot_count: u64,
    pub transaction_count: u64,
}
