//! Connection abstraction over external providers
//!
//! A connection adapts one external provider (LLM, social platform,
//! blockchain network) to a uniform surface: a static table of
//! registered [`Action`]s, a credential setup step, a side-effect-free
//! liveness check, and the actual dispatch. Concrete providers live
//! behind this trait; the rest of the runtime never sees provider
//! details.

pub mod openai;
pub mod registry;

pub use openai::OpenAiConnection;
pub use registry::{ConnectionRegistry, ConnectionStatus};

use crate::actions::Action;
use async_trait::async_trait;
use drover_common::{DroverError, Result};
use serde_json::{Map, Value};

/// One external provider behind a uniform, capability-polymorphic
/// surface. Implementations must be safe to call concurrently: the
/// scheduler and one-shot CLI dispatches may overlap, and credentials
/// are re-read per call rather than cached.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Unique name within the registry (e.g., "openai", "twitter")
    fn name(&self) -> &str;

    /// Whether this provider generates text for other tasks to consume
    fn is_llm_provider(&self) -> bool {
        false
    }

    /// Actions registered at construction; immutable for the life of
    /// the connection
    fn actions(&self) -> &[Action];

    /// One-time interactive credential setup. Returns `Ok(false)` when
    /// the operator declines to overwrite an existing configuration;
    /// never silently clobbers stored credentials.
    async fn configure(&self) -> Result<bool>;

    /// Lightweight liveness/credential check against the real
    /// provider. Must not fail: every problem collapses to `false`,
    /// with `verbose` controlling whether diagnostics are emitted.
    /// Used as a pre-flight gate before every dispatched action.
    async fn is_configured(&self, verbose: bool) -> bool;

    /// Invoke a registered action. Side effects are provider-specific
    /// and must be assumed non-idempotent; callers never blindly retry.
    async fn perform_action(&self, action: &str, args: &Map<String, Value>) -> Result<Value>;

    /// Look up a registered action by name
    fn find_action(&self, action: &str) -> Result<&Action> {
        self.actions()
            .iter()
            .find(|a| a.name == action)
            .ok_or_else(|| DroverError::UnknownAction {
                connection: self.name().to_string(),
                action: action.to_string(),
            })
    }
}
