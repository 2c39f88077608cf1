//! # Core Library
//!
//! Configuration, error handling, and shared DTOs for the Lenzu gateway.

pub mod config;
pub mod dto;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
