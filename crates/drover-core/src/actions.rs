//! Action descriptors and argument validation
//!
//! Every connection registers the actions it supports as [`Action`]
//! values at construction time; the declared parameter list is the
//! single source of truth for required/optional fields and types.
//! Validation happens centrally in the registry before any provider is
//! invoked, never ad hoc inside a provider.

use serde_json::{Map, Value};
use std::fmt;

/// Declared type of an action parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// Whether `value` is, or can be coerced to, this kind. Coercion
    /// runs both ways between strings and scalars: one-shot CLI
    /// invocations supply numeric arguments as text, and parse bare
    /// numerals meant for string parameters into numbers.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => {
                matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
            }
            ParamKind::Integer => match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                Value::String(s) => s.trim().parse::<i64>().is_ok(),
                _ => false,
            },
            ParamKind::Number => match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            ParamKind::Boolean => match value {
                Value::Bool(_) => true,
                Value::String(s) => matches!(s.trim(), "true" | "false"),
                _ => false,
            },
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        };
        write!(f, "{}", name)
    }
}

/// One declared parameter of an action
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub required: bool,
    pub kind: ParamKind,
    pub description: String,
}

/// A named, parameterized operation exposed by a connection.
/// Created once during connection registration, immutable thereafter.
#[derive(Debug, Clone)]
pub struct Action {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

/// One validation failure; the registry treats any non-empty list as a
/// hard rejection with no partial execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required parameter was not supplied
    Missing { parameter: String },
    /// A supplied value cannot be coerced to the declared kind
    TypeMismatch {
        parameter: String,
        expected: ParamKind,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Missing { parameter } => {
                write!(f, "missing required parameter: {}", parameter)
            }
            ValidationIssue::TypeMismatch {
                parameter,
                expected,
            } => write!(f, "parameter '{}' expects a {}", parameter, expected),
        }
    }
}

impl Action {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Action {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a required parameter. Parameter names are unique within an
    /// action; registering a duplicate is a programming error.
    pub fn param(
        self,
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
    ) -> Self {
        self.push_param(name.into(), true, kind, description.into())
    }

    /// Add an optional parameter
    pub fn optional_param(
        self,
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
    ) -> Self {
        self.push_param(name.into(), false, kind, description.into())
    }

    fn push_param(
        mut self,
        name: String,
        required: bool,
        kind: ParamKind,
        description: String,
    ) -> Self {
        debug_assert!(
            !self.parameters.iter().any(|p| p.name == name),
            "duplicate parameter '{}' on action '{}'",
            name,
            self.name
        );
        self.parameters.push(Parameter {
            name,
            required,
            kind,
            description,
        });
        self
    }

    /// Check `args` against the declared parameters. Returns one issue
    /// per missing required parameter and per type mismatch; keys in
    /// `args` that are not declared are ignored for forward
    /// compatibility. An empty result means the call may proceed.
    pub fn validate(&self, args: &Map<String, Value>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for param in &self.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        issues.push(ValidationIssue::Missing {
                            parameter: param.name.clone(),
                        });
                    }
                }
                Some(value) => {
                    if !param.kind.accepts(value) {
                        issues.push(ValidationIssue::TypeMismatch {
                            parameter: param.name.clone(),
                            expected: param.kind,
                        });
                    }
                }
            }
        }
        issues
    }

    /// One-line usage string for CLI listings, e.g. `<prompt> [model]`
    pub fn usage(&self) -> String {
        self.parameters
            .iter()
            .map(|p| {
                if p.required {
                    format!("<{}>", p.name)
                } else {
                    format!("[{}]", p.name)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn reply_action() -> Action {
        Action::new("reply", "Reply to a message")
            .param("message_id", ParamKind::String, "Target message")
            .param("message", ParamKind::String, "Reply text")
            .param("count", ParamKind::Integer, "How many")
            .optional_param("model", ParamKind::String, "Override model")
    }

    #[test]
    fn every_missing_required_parameter_is_reported() {
        let action = reply_action();
        // Strict subset of the required set: two of three missing
        let issues = action.validate(&args(json!({"message": "hi"})));
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&ValidationIssue::Missing {
            parameter: "message_id".to_string()
        }));
        assert!(issues.contains(&ValidationIssue::Missing {
            parameter: "count".to_string()
        }));

        // Empty args reports all three
        let issues = action.validate(&Map::new());
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn type_mismatch_names_parameter_and_expected_kind() {
        let action = reply_action();
        let issues = action.validate(&args(json!({
            "message_id": "42", "message": "hi", "count": [1, 2]
        })));
        assert_eq!(
            issues,
            vec![ValidationIssue::TypeMismatch {
                parameter: "count".to_string(),
                expected: ParamKind::Integer,
            }]
        );
        assert!(issues[0].to_string().contains("integer"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let action = reply_action();
        let issues = action.validate(&args(json!({
            "message_id": "42", "message": "hi", "count": 3,
            "someday_flag": true
        })));
        assert!(issues.is_empty());
    }

    #[test]
    fn string_renditions_coerce_for_cli_callers() {
        let action = Action::new("check", "")
            .param("count", ParamKind::Integer, "")
            .param("ratio", ParamKind::Number, "")
            .param("dry_run", ParamKind::Boolean, "");
        let issues = action.validate(&args(json!({
            "count": "7", "ratio": "0.5", "dry_run": "true"
        })));
        assert!(issues.is_empty());

        let issues = action.validate(&args(json!({
            "count": "seven", "ratio": "0.5", "dry_run": "maybe"
        })));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn scalars_coerce_for_string_parameters() {
        // A CLI caller writing prompt=42 hands us a JSON number; string
        // parameters take any scalar, but not composites
        let action = Action::new("check", "").param("prompt", ParamKind::String, "");
        assert!(action.validate(&args(json!({"prompt": 42}))).is_empty());
        assert!(action.validate(&args(json!({"prompt": true}))).is_empty());
        assert_eq!(
            action.validate(&args(json!({"prompt": ["a", "b"]}))),
            vec![ValidationIssue::TypeMismatch {
                parameter: "prompt".to_string(),
                expected: ParamKind::String,
            }]
        );
    }

    #[test]
    fn null_counts_as_absent() {
        let action = reply_action();
        let issues = action.validate(&args(json!({
            "message_id": null, "message": "hi", "count": 1
        })));
        assert_eq!(
            issues,
            vec![ValidationIssue::Missing {
                parameter: "message_id".to_string()
            }]
        );
    }

    #[test]
    fn usage_marks_optional_parameters() {
        assert_eq!(
            reply_action().usage(),
            "<message_id> <message> <count> [model]"
        );
    }
}
