//! Drover Common - Shared types for the agent runtime
//!
//! This crate provides the error type, agent profile / connection
//! configuration structs, constants and small utilities used across
//! all Drover components.

pub mod config;
pub mod constants;
pub mod error;
pub mod utils;

// Re-export commonly used items
pub use config::{AgentProfile, ConnectionSettings, ReplenishConfig, TaskConfig};
pub use constants::*;
pub use error::{DroverError, Result};
pub use utils::{env_credential, store_env_credential};
