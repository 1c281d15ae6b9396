//! HAL Mock Common Library
//!
//! Shared data model, configuration and error types for the HAL mock
//! conformance runner.

pub mod config;
pub mod error;
pub mod types;

pub use config::{HarnessConfig, MatchMode, MultiGroupPolicy, TransportKind};
pub use error::{Error, Result};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
