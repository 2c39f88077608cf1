//! # Web Services
//!
//! Service layer between handlers and external systems.

pub mod agents;
pub mod prices;

pub use agents::AgentService;
pub use prices::PriceService;
