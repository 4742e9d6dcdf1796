//! Drover Core - Agent orchestration engine
//!
//! The pieces, leaves first: [`actions`] describes named, parameterized
//! operations with a validation contract; [`connections`] wraps
//! heterogeneous external providers behind one capability-polymorphic
//! trait and dispatches validated actions through a registry; [`state`]
//! carries transient per-run data between iterations; [`scheduler`]
//! runs the weighted, cooldown-gated agent loop with isolated-failure
//! recovery.

pub mod actions;
pub mod connections;
pub mod scheduler;
pub mod state;

pub use actions::{Action, ParamKind, Parameter, ValidationIssue};
pub use connections::{Connection, ConnectionRegistry, ConnectionStatus};
pub use scheduler::{AgentLoop, IterationOutcome, LoopConfig, SkipReason};
pub use state::AgentState;
