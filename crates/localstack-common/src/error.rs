//! Unified error type for the localstack-testkit workspace.
//!
//! Configuration and merge never fail; every variant here is raised by
//! validation, accessors on a container handle, or the runtime driver.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The builder configuration is incomplete or malformed.
    #[error("invalid configuration: {message}")]
    ConfigurationInvalid {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An endpoint was requested before a host port mapping exists.
    #[error("endpoint unavailable: {message}")]
    EndpointUnavailable {
        /// Why no endpoint could be produced.
        message: String,
    },

    /// The default region was queried but never configured.
    #[error("default region was never configured")]
    RegionUnset,

    /// The wait strategy gave up before the container reported readiness.
    #[error("container did not become ready within {timeout:?}")]
    ReadinessTimeout {
        /// Overall timeout of the wait strategy.
        timeout: Duration,
    },

    /// A container runtime command ran but reported failure.
    #[error("{command} failed: {message}")]
    Command {
        /// Command description, e.g. `docker start`.
        command: String,
        /// Captured diagnostic output or exit status.
        message: String,
    },

    /// A container runtime command could not be spawned.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        /// Command description.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A container runtime command did not finish in time.
    #[error("{command} timed out after {timeout:?}")]
    CommandTimeout {
        /// Command description.
        command: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl HarnessError {
    /// Shorthand for a [`HarnessError::ConfigurationInvalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
        }
    }

    /// Shorthand for a [`HarnessError::EndpointUnavailable`].
    pub fn endpoint_unavailable(message: impl Into<String>) -> Self {
        Self::EndpointUnavailable {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_timeout_message_names_duration() {
        let err = HarnessError::ReadinessTimeout {
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "container did not become ready within 3s");
    }

    #[test]
    fn invalid_shorthand_builds_configuration_error() {
        let err = HarnessError::invalid("services were never set");
        assert!(matches!(err, HarnessError::ConfigurationInvalid { .. }));
        assert_eq!(
            err.to_string(),
            "invalid configuration: services were never set"
        );
    }
}
