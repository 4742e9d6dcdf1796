//! Agent profile and connection configuration types
//!
//! An agent profile is a declarative JSON record: identity (name, bio,
//! traits), the schedulable tasks with their selection weights and
//! action bindings, loop timing, and one opaque configuration block per
//! provider connection. The core passes each block through to the
//! matching connection untouched.

use crate::constants::{DEFAULT_ID_FIELD, DEFAULT_LOOP_DELAY_SECS};
use crate::error::{DroverError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Declarative description of one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Agent name
    pub name: String,

    /// Persona lines fed to text-generation prompts
    #[serde(default)]
    pub bio: Vec<String>,

    /// Behavioral traits (e.g., "curious", "sarcastic")
    #[serde(default)]
    pub traits: Vec<String>,

    /// Example outputs in the agent's voice
    #[serde(default)]
    pub examples: Vec<String>,

    /// Schedulable tasks with selection weights and action bindings
    pub tasks: Vec<TaskConfig>,

    /// Seconds to sleep after an iteration that performed an action
    #[serde(default = "default_loop_delay")]
    pub loop_delay: u64,

    /// Optional named multipliers applied by providers (e.g., quieter
    /// posting at night); opaque to the core
    #[serde(default)]
    pub time_based_multipliers: HashMap<String, f64>,

    /// How to refill the reaction queue when it runs empty
    #[serde(default)]
    pub replenish: Option<ReplenishConfig>,

    /// One opaque configuration block per provider connection
    #[serde(default, rename = "config")]
    pub connections: Vec<ConnectionSettings>,
}

fn default_loop_delay() -> u64 {
    DEFAULT_LOOP_DELAY_SECS
}

/// One schedulable unit: a weight for random selection plus the
/// connection/action it dispatches to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task name (e.g., "post-message", "reply", "like")
    pub name: String,

    /// Non-negative selection weight; zero means never selected
    pub weight: f64,

    /// Connection that handles this task's action
    pub connection: String,

    /// Action name on that connection
    pub action: String,

    /// Static arguments passed on every dispatch
    #[serde(default)]
    pub args: Map<String, Value>,

    /// Whether each run consumes one item from the reaction queue,
    /// merged into the arguments
    #[serde(default)]
    pub uses_queue: bool,

    /// Minimum seconds between two executions of this task
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
}

/// Action used to refill the reaction queue, and the field that
/// identifies items for dedup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishConfig {
    pub connection: String,
    pub action: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

/// Opaque provider configuration block; everything except the name is
/// passed through to the connection that claims it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Provider name this block belongs to
    pub name: String,

    /// Provider-specific options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl AgentProfile {
    /// Load a profile from a JSON file, with actionable error messages
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DroverError::Profile(format!(
                "could not read agent file at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    /// Parse a profile from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            DroverError::Profile(format!(
                "agent file is missing a required field or malformed: {}",
                e
            ))
        })
    }

    /// Find the configuration block for one connection, if present
    pub fn connection_settings(&self, name: &str) -> Option<&ConnectionSettings> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Names of every connection referenced by a task or the replenish
    /// block, deduplicated in first-seen order
    pub fn referenced_connections(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in self
            .tasks
            .iter()
            .map(|t| t.connection.as_str())
            .chain(self.replenish.iter().map(|r| r.connection.as_str()))
        {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "starter",
        "bio": ["An example agent that posts and replies."],
        "traits": ["curious", "friendly"],
        "tasks": [
            {"name": "post-message", "weight": 1,
             "connection": "social", "action": "post",
             "cooldown_secs": 5400},
            {"name": "reply", "weight": 3,
             "connection": "social", "action": "reply",
             "uses_queue": true}
        ],
        "loop_delay": 900,
        "replenish": {"connection": "social", "action": "read-timeline",
                      "args": {"count": 10}},
        "config": [
            {"name": "social", "timeline_read_count": 10},
            {"name": "openai", "model": "gpt-3.5-turbo"}
        ]
    }"#;

    #[test]
    fn parses_full_profile() {
        let profile = AgentProfile::from_json(SAMPLE).unwrap();
        assert_eq!(profile.name, "starter");
        assert_eq!(profile.loop_delay, 900);
        assert_eq!(profile.tasks.len(), 2);
        assert_eq!(profile.tasks[0].cooldown_secs, Some(5400));
        assert!(profile.tasks[1].uses_queue);

        let replenish = profile.replenish.as_ref().unwrap();
        assert_eq!(replenish.id_field, "id");
        assert_eq!(replenish.args["count"], 10);

        let social = profile.connection_settings("social").unwrap();
        assert_eq!(social.options["timeline_read_count"], 10);
        assert!(profile.connection_settings("missing").is_none());
    }

    #[test]
    fn missing_field_is_reported() {
        let err = AgentProfile::from_json(r#"{"name": "broken"}"#).unwrap_err();
        assert!(matches!(err, DroverError::Profile(_)));
        assert!(err.to_string().contains("missing a required field"));
    }

    #[test]
    fn loop_delay_defaults_when_absent() {
        let profile = AgentProfile::from_json(
            r#"{"name": "bare", "tasks": []}"#,
        )
        .unwrap();
        assert_eq!(profile.loop_delay, DEFAULT_LOOP_DELAY_SECS);
        assert!(profile.connections.is_empty());
    }

    #[test]
    fn referenced_connections_dedupes() {
        let profile = AgentProfile::from_json(SAMPLE).unwrap();
        assert_eq!(profile.referenced_connections(), vec!["social"]);
    }
}
