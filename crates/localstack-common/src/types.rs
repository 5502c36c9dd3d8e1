//! Domain primitive types used across the workspace.

use std::fmt;

/// Identifier the container runtime assigned to a created container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a unique container name such as `localstack-1b4e28ba`.
#[must_use]
pub fn generate_container_name() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", crate::constants::CONTAINER_NAME_PREFIX, &uuid[..8])
}

/// Lifecycle state of a container handle.
///
/// `NotStarted -> Starting -> Polling -> Ready` on success, `Polling ->
/// Failed` when the wait strategy gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// The handle exists but nothing was created in the runtime yet.
    NotStarted,
    /// The runtime is creating and launching the process.
    Starting,
    /// The process runs and the wait strategy is polling it.
    Polling,
    /// Every readiness condition held.
    Ready,
    /// The process was stopped or removed.
    Stopped,
    /// Start or readiness polling failed.
    Failed,
}

impl ContainerState {
    /// Returns whether the runtime holds a live process for this state.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Polling | Self::Ready)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::Starting => write!(f, "starting"),
            Self::Polling => write!(f, "polling"),
            Self::Ready => write!(f, "ready"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Publishes a container port on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortBinding {
    /// Port inside the container.
    pub container_port: u16,
    /// Fixed host port, or `None` to let the runtime pick a free one.
    pub host_port: Option<u16>,
}

impl PortBinding {
    /// Binds `container_port` to a runtime-assigned host port.
    #[must_use]
    pub const fn dynamic(container_port: u16) -> Self {
        Self {
            container_port,
            host_port: None,
        }
    }

    /// Binds `container_port` to a fixed host port.
    #[must_use]
    pub const fn fixed(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port: Some(host_port),
        }
    }

    /// Renders the binding as a docker `--publish` argument.
    #[must_use]
    pub fn publish_arg(&self) -> String {
        match self.host_port {
            Some(host) => format!("{host}:{}", self.container_port),
            None => self.container_port.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_prefixed_and_unique() {
        let a = generate_container_name();
        let b = generate_container_name();
        assert!(a.starts_with("localstack-"));
        assert_eq!(a.len(), "localstack-".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn only_polling_and_ready_count_as_running() {
        assert!(ContainerState::Ready.is_running());
        assert!(ContainerState::Polling.is_running());
        assert!(!ContainerState::NotStarted.is_running());
        assert!(!ContainerState::Stopped.is_running());
        assert!(!ContainerState::Failed.is_running());
    }

    #[test]
    fn publish_arg_for_dynamic_and_fixed_bindings() {
        assert_eq!(PortBinding::dynamic(4566).publish_arg(), "4566");
        assert_eq!(PortBinding::fixed(4566, 14566).publish_arg(), "14566:4566");
    }

    #[test]
    fn state_display_is_kebab_case() {
        assert_eq!(ContainerState::NotStarted.to_string(), "not-started");
        assert_eq!(ContainerState::Ready.to_string(), "ready");
    }
}
