//! Lifecycle handle for one container created from a [`ResourceConfig`].

use std::collections::BTreeMap;
use std::sync::Arc;

use localstack_common::error::{HarnessError, Result};
use localstack_common::types::{ContainerId, ContainerState};

use crate::backend::ContainerRuntime;
use crate::logs::LogOutput;
use crate::resource::ResourceConfig;

/// A container instance with its configuration and runtime state.
///
/// Nothing touches the runtime until [`Container::start`]. The handle is
/// single-owner: whoever holds it is responsible for calling
/// [`Container::dispose`].
#[derive(Debug)]
pub struct Container {
    runtime: Arc<dyn ContainerRuntime>,
    config: ResourceConfig,
    id: Option<ContainerId>,
    state: ContainerState,
    host: Option<String>,
    ports: BTreeMap<u16, u16>,
    created_at: String,
}

impl Container {
    /// Creates a handle in the `NotStarted` state.
    #[must_use]
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ResourceConfig) -> Self {
        Self {
            runtime,
            config,
            id: None,
            state: ContainerState::NotStarted,
            host: None,
            ports: BTreeMap::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Returns the runtime id, once the container was created.
    #[must_use]
    pub const fn id(&self) -> Option<&ContainerId> {
        self.id.as_ref()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    /// Returns the configuration the container is created from.
    #[must_use]
    pub const fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Returns the RFC 3339 timestamp at which the handle was built.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Creates (first time only) and starts the container, then blocks on
    /// the wait strategy.
    ///
    /// Calling `start` on a container that is already running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the runtime error if creation or start fails, and the wait
    /// strategy's error, unchanged, if readiness is never reached. Either
    /// way the state becomes `Failed`.
    pub async fn start(&mut self) -> Result<()> {
        if self.state.is_running() {
            tracing::debug!(id = ?self.id, state = %self.state, "container already running");
            return Ok(());
        }

        self.state = ContainerState::Starting;
        match self.launch().await {
            Ok(()) => {
                self.state = ContainerState::Ready;
                tracing::info!(
                    id = ?self.id,
                    host = ?self.host,
                    ports = ?self.ports,
                    created_at = %self.created_at,
                    "container ready"
                );
                Ok(())
            }
            Err(e) => {
                self.state = ContainerState::Failed;
                tracing::warn!(id = ?self.id, error = %e, "container failed to start");
                Err(e)
            }
        }
    }

    async fn launch(&mut self) -> Result<()> {
        let id = if let Some(id) = &self.id {
            id.clone()
        } else {
            let id = self.runtime.create(&self.config).await?;
            self.id = Some(id.clone());
            id
        };

        self.runtime.start(&id).await?;

        self.ports.clear();
        for binding in self.config.port_bindings() {
            let host_port = self
                .runtime
                .mapped_port(&id, binding.container_port)
                .await?;
            let _ = self.ports.insert(binding.container_port, host_port);
        }
        self.host = Some(self.runtime.host());

        self.state = ContainerState::Polling;
        if let Some(strategy) = self.config.wait_strategy() {
            strategy.wait_until_ready(self.runtime.as_ref(), &id).await?;
        }
        Ok(())
    }

    /// Stops the container process. The container can be started again
    /// afterwards.
    ///
    /// A container whose start failed or was abandoned mid-poll may still
    /// be running, so every created container that is not already stopped
    /// is stopped in the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to stop the process.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(id) = &self.id {
            if !matches!(self.state, ContainerState::Stopped | ContainerState::NotStarted) {
                self.runtime.stop(id).await?;
                tracing::debug!(id = %id, from = %self.state, "container stopped");
            }
            self.state = ContainerState::Stopped;
        }
        self.ports.clear();
        Ok(())
    }

    /// Stops and removes the container. Safe to call repeatedly and on a
    /// container that was never started.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to remove the process.
    pub async fn dispose(&mut self) -> Result<()> {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.runtime.remove(&id).await {
                self.id = Some(id);
                return Err(e);
            }
            self.state = ContainerState::Stopped;
        }
        self.ports.clear();
        self.host = None;
        Ok(())
    }

    /// Returns everything the container has written so far. A container
    /// that was never created has no output.
    ///
    /// # Errors
    ///
    /// Returns an error if logs cannot be retrieved.
    pub async fn logs(&self) -> Result<LogOutput> {
        match &self.id {
            Some(id) => self.runtime.logs(id).await,
            None => Ok(LogOutput::default()),
        }
    }

    /// Returns the host name published ports are reachable on.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::EndpointUnavailable`] before the container
    /// was started.
    pub fn hostname(&self) -> Result<&str> {
        match (&self.host, self.state.is_running()) {
            (Some(host), true) => Ok(host),
            _ => Err(self.not_running()),
        }
    }

    /// Returns the host port bound to `container_port`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::EndpointUnavailable`] before the container
    /// was started or when `container_port` was never bound.
    pub fn mapped_port(&self, container_port: u16) -> Result<u16> {
        if !self.state.is_running() {
            return Err(self.not_running());
        }
        self.ports.get(&container_port).copied().ok_or_else(|| {
            HarnessError::endpoint_unavailable(format!(
                "container port {container_port} is not bound to a host port"
            ))
        })
    }

    fn not_running(&self) -> HarnessError {
        HarnessError::endpoint_unavailable(format!(
            "container is {}; start it before asking for endpoints",
            self.state
        ))
    }
}
