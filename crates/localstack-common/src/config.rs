//! Settings for the container runtime driver.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_DOCKER_BINARY, DEFAULT_PULL_TIMEOUT_SECS};
use crate::error::{HarnessError, Result};

/// Environment variable overriding the docker binary.
pub const DOCKER_BINARY_ENV: &str = "LOCALSTACK_TESTKIT_DOCKER";
/// Environment variable overriding the host used in endpoints.
pub const HOST_OVERRIDE_ENV: &str = "TESTCONTAINERS_HOST_OVERRIDE";
/// Environment variable overriding the per-command timeout, in seconds.
pub const COMMAND_TIMEOUT_ENV: &str = "LOCALSTACK_TESTKIT_COMMAND_TIMEOUT";
/// Environment variable overriding the image pull timeout, in seconds.
pub const PULL_TIMEOUT_ENV: &str = "LOCALSTACK_TESTKIT_PULL_TIMEOUT";

/// Root settings for talking to the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Docker binary name or path.
    pub docker_binary: String,
    /// Host name reported in endpoints instead of the detected one.
    pub host_override: Option<String>,
    /// Timeout for a single runtime command, in seconds.
    pub command_timeout_secs: u64,
    /// Timeout for pulling a missing image, in seconds.
    pub pull_timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
            host_override: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            pull_timeout_secs: DEFAULT_PULL_TIMEOUT_SECS,
        }
    }
}

impl HarnessConfig {
    /// Builds settings from the process environment.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(binary) = lookup(DOCKER_BINARY_ENV).filter(|v| !v.trim().is_empty()) {
            config.docker_binary = binary;
        }
        config.host_override = lookup(HOST_OVERRIDE_ENV).filter(|v| !v.trim().is_empty());
        if let Some(secs) = positive_secs(lookup(COMMAND_TIMEOUT_ENV)) {
            config.command_timeout_secs = secs;
        }
        if let Some(secs) = positive_secs(lookup(PULL_TIMEOUT_ENV)) {
            config.pull_timeout_secs = secs;
        }
        config
    }

    /// Loads settings from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Returns the timeout for pulling a missing image.
    #[must_use]
    pub const fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }
}

fn positive_secs(value: Option<String>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_docker_on_path() {
        let config = HarnessConfig::default();
        assert_eq!(config.docker_binary, "docker");
        assert!(config.host_override.is_none());
        assert_eq!(config.command_timeout(), Duration::from_secs(60));
        assert_eq!(config.pull_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn lookup_overrides_every_field() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (DOCKER_BINARY_ENV, "/usr/local/bin/podman"),
            (HOST_OVERRIDE_ENV, "docker.internal"),
            (COMMAND_TIMEOUT_ENV, "15"),
            (PULL_TIMEOUT_ENV, "1800"),
        ]));
        assert_eq!(config.docker_binary, "/usr/local/bin/podman");
        assert_eq!(config.host_override.as_deref(), Some("docker.internal"));
        assert_eq!(config.command_timeout_secs, 15);
        assert_eq!(config.pull_timeout_secs, 1800);
    }

    #[test]
    fn blank_or_invalid_values_keep_defaults() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (DOCKER_BINARY_ENV, "  "),
            (HOST_OVERRIDE_ENV, ""),
            (COMMAND_TIMEOUT_ENV, "soon"),
            (PULL_TIMEOUT_ENV, "0"),
        ]));
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn load_reads_partial_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("testkit.json");
        std::fs::write(&path, r#"{ "host_override": "10.0.0.5" }"#).expect("write");

        let config = HarnessConfig::load(&path).expect("load");
        assert_eq!(config.host_override.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.docker_binary, "docker");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = HarnessConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    #[test]
    fn load_malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ nope").expect("write");
        let err = HarnessConfig::load(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Serialization { .. }));
    }
}
