//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (worker cap, Tor endpoints, user-agent pool)
//! - CLI option types and parsing

mod constants;
mod types;

pub use constants::*;
pub use types::{LogLevel, Opt};
