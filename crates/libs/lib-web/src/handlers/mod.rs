//! # Route Handlers
//!
//! One module per upstream route family. Every proxy handler follows the
//! same shape: validate inbound parameters, build a [`crate::proxy::RouteSpec`],
//! and let [`crate::proxy::forward`] normalize the outcome. The price and
//! agent modules are served by the gateway's own services instead: the
//! in-memory price cache and the agent control client.

pub mod agents;
pub mod auth;
pub mod bets;
pub mod charts;
pub mod markets;
pub mod prices;
pub mod yields;
