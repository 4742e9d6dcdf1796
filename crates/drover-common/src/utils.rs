//! Small shared utilities
//!
//! Credential helpers read the `.env` file on every call instead of
//! caching, so rotating a key externally takes effect without a restart.

use crate::error::{DroverError, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Default credentials file, relative to the working directory
pub const ENV_FILE: &str = ".env";

/// Look up a credential: process environment first, then a fresh parse
/// of the `.env` file. Empty values count as absent.
pub fn env_credential(key: &str) -> Option<String> {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            return Some(value);
        }
    }
    env_file_credential(ENV_FILE, key)
}

/// Parse `path` as an env file and return the value for `key`, without
/// touching the process environment
pub fn env_file_credential(path: impl AsRef<Path>, key: &str) -> Option<String> {
    let iter = dotenvy::from_path_iter(path.as_ref()).ok()?;
    for entry in iter {
        if let Ok((k, v)) = entry {
            if k == key && !v.is_empty() {
                return Some(v);
            }
        }
    }
    None
}

/// Write `key=value` into the env file, replacing an existing line for
/// the same key and preserving everything else
pub fn store_env_credential(path: impl AsRef<Path>, key: &str, value: &str) -> Result<()> {
    let path = path.as_ref();
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(DroverError::Io(e)),
    };

    let mut out = String::new();
    let mut replaced = false;
    for line in existing.lines() {
        let is_target = line
            .split_once('=')
            .is_some_and(|(k, _)| k.trim() == key);
        if is_target {
            if !replaced {
                writeln!(out, "{}={}", key, value).expect("write to String");
                replaced = true;
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    if !replaced {
        writeln!(out, "{}={}", key, value).expect("write to String");
    }

    std::fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        store_env_credential(&path, "API_KEY", "first").unwrap();
        assert_eq!(
            env_file_credential(&path, "API_KEY").as_deref(),
            Some("first")
        );

        // Overwriting replaces the line in place
        store_env_credential(&path, "API_KEY", "second").unwrap();
        store_env_credential(&path, "OTHER", "kept").unwrap();
        assert_eq!(
            env_file_credential(&path, "API_KEY").as_deref(),
            Some("second")
        );
        assert_eq!(env_file_credential(&path, "OTHER").as_deref(), Some("kept"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("API_KEY=").count(), 1);
    }

    #[test]
    fn missing_file_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        assert!(env_file_credential(&path, "API_KEY").is_none());

        store_env_credential(&path, "A", "1").unwrap();
        assert!(env_file_credential(&path, "B").is_none());
    }
}
