//! # Web Library
//!
//! HTTP handlers, middleware, the generic upstream proxy, and web services
//! for the Lenzu gateway.

pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod server;
pub mod services;
pub mod validate;

pub use server::{start_server, AppState, ServerConfig};
