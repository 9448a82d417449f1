//! Common types and utilities shared across all crates

pub mod config;
pub mod error;
pub mod relay;
pub mod types;

pub use config::*;
pub use error::{GatewayError, GatewayResult, RelayError, Result};
pub use relay::*;
pub use types::*;
