//! Connection registry and action dispatch
//!
//! The registry owns every connection for the life of the process and
//! is the single dispatch path for both the scheduler and one-shot
//! callers: resolve connection, gate on configuration, resolve action,
//! validate arguments, invoke. Any step's failure short-circuits the
//! rest.

use crate::connections::Connection;
use drover_common::{DroverError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A connection's name annotated with its live configuration status
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub name: String,
    pub configured: bool,
    pub is_llm_provider: bool,
}

/// Owning map from connection name to connection, built once at agent
/// startup and passed by reference wherever dispatch is needed
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Box<dyn Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-constructed connections
    pub fn from_connections(connections: Vec<Box<dyn Connection>>) -> Result<Self> {
        let mut registry = Self::new();
        for connection in connections {
            registry.register(connection)?;
        }
        Ok(registry)
    }

    /// Add a connection; names must be unique
    pub fn register(&mut self, connection: Box<dyn Connection>) -> Result<()> {
        let name = connection.name().to_string();
        debug!("Registering connection: {}", name);
        if self.connections.contains_key(&name) {
            return Err(DroverError::Config(format!(
                "connection '{}' registered twice",
                name
            )));
        }
        self.connections.insert(name, connection);
        Ok(())
    }

    /// Resolve a connection by name
    pub fn get(&self, name: &str) -> Result<&dyn Connection> {
        self.connections
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| DroverError::UnknownConnection(name.to_string()))
    }

    /// Registered connection names, sorted for stable listings
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All connections annotated with their configured status. Pure
    /// read apart from each connection's own liveness probe.
    pub async fn list(&self) -> Vec<ConnectionStatus> {
        let mut statuses = Vec::with_capacity(self.connections.len());
        for name in self.names() {
            let connection = &self.connections[name];
            statuses.push(ConnectionStatus {
                name: name.to_string(),
                configured: connection.is_configured(false).await,
                is_llm_provider: connection.is_llm_provider(),
            });
        }
        statuses
    }

    /// The dispatch entry point used by the scheduler and by external
    /// one-shot callers, with identical validation and error semantics
    /// in both paths.
    pub async fn perform(
        &self,
        connection_name: &str,
        action_name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value> {
        let connection = self.get(connection_name)?;

        if !connection.is_configured(false).await {
            warn!(
                connection = connection_name,
                action = action_name,
                "refusing dispatch: connection not configured"
            );
            return Err(DroverError::NotConfigured(connection_name.to_string()));
        }

        let action = connection.find_action(action_name)?;
        let issues = action.validate(args);
        if !issues.is_empty() {
            return Err(DroverError::Validation(
                issues.iter().map(ToString::to_string).collect(),
            ));
        }

        debug!(
            connection = connection_name,
            action = action_name,
            "dispatching action"
        );
        connection.perform_action(action_name, args).await
    }
}
