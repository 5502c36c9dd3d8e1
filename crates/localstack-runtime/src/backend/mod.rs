//! Container runtime abstraction.

pub mod docker;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use localstack_common::config::HarnessConfig;
use localstack_common::error::Result;
use localstack_common::types::ContainerId;

use crate::logs::LogOutput;
use crate::resource::ResourceConfig;

pub use docker::DockerCliRuntime;

/// Platform-agnostic container runtime.
///
/// Implementors own every process and network side effect. All methods
/// may suspend while the runtime does the actual work.
#[async_trait]
pub trait ContainerRuntime: Send + Sync + fmt::Debug {
    /// Creates a container from the given configuration without starting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    async fn create(&self, config: &ResourceConfig) -> Result<ContainerId>;

    /// Starts a previously created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    async fn start(&self, id: &ContainerId) -> Result<()>;

    /// Stops a running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    async fn stop(&self, id: &ContainerId) -> Result<()>;

    /// Removes a container and its anonymous volumes. Removing a container
    /// that no longer exists succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the container exists but cannot be removed.
    async fn remove(&self, id: &ContainerId) -> Result<()>;

    /// Returns everything the container has written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if logs cannot be retrieved.
    async fn logs(&self, id: &ContainerId) -> Result<LogOutput>;

    /// Returns the host port bound to `container_port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or the port is
    /// not published.
    async fn mapped_port(&self, id: &ContainerId, container_port: u16) -> Result<u16>;

    /// Returns the host name under which published ports are reachable.
    fn host(&self) -> String;

    /// Returns whether this runtime is usable on the current machine.
    fn is_available(&self) -> bool;
}

/// Creates the default runtime: the docker CLI, configured from the
/// process environment.
#[must_use]
pub fn detect_runtime() -> Arc<dyn ContainerRuntime> {
    Arc::new(DockerCliRuntime::new(HarnessConfig::from_env()))
}

/// Information about the current platform and runtime availability.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    /// Host operating system name.
    pub os: String,
    /// Host CPU architecture.
    pub arch: String,
    /// Docker binary that would be used.
    pub docker_binary: String,
    /// Whether that binary resolves on this machine.
    pub docker_available: bool,
    /// Host name endpoints would use.
    pub host: String,
}

/// Returns information about the current platform and runtime.
#[must_use]
pub fn platform_info(config: &HarnessConfig) -> PlatformInfo {
    let runtime = DockerCliRuntime::new(config.clone());
    PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        docker_binary: config.docker_binary.clone(),
        docker_available: runtime.is_available(),
        host: runtime.host(),
    }
}
