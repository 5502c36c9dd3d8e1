//! Scripted in-process runtime for tests.
//!
//! No process is spawned. Each `logs` call on a running container reveals
//! one more chunk of the configured log script, so readiness polling can be
//! exercised deterministically.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use localstack_common::error::{HarnessError, Result};
use localstack_common::types::ContainerId;

use super::ContainerRuntime;
use crate::logs::LogOutput;
use crate::resource::ResourceConfig;

/// First host port handed out for dynamic bindings.
const FIRST_DYNAMIC_PORT: u16 = 49152;

/// A runtime call recorded by [`MemoryRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// `create` returned this id.
    Create(ContainerId),
    /// `start` was called.
    Start(ContainerId),
    /// `stop` was called.
    Stop(ContainerId),
    /// `remove` was called.
    Remove(ContainerId),
}

#[derive(Debug)]
struct MemoryContainer {
    config: ResourceConfig,
    running: bool,
    ports: BTreeMap<u16, u16>,
    revealed: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    next_port: u16,
    containers: BTreeMap<ContainerId, MemoryContainer>,
    calls: Vec<RuntimeCall>,
}

/// In-memory [`ContainerRuntime`] with scripted output.
#[derive(Debug)]
pub struct MemoryRuntime {
    host: String,
    fixed_ports: BTreeMap<u16, u16>,
    script: Vec<String>,
    fail_start: bool,
    state: Mutex<MemoryState>,
}

impl MemoryRuntime {
    /// Creates a runtime reporting `localhost` and an empty log script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: "localhost".into(),
            fixed_ports: BTreeMap::new(),
            script: Vec::new(),
            fail_start: false,
            state: Mutex::new(MemoryState {
                next_port: FIRST_DYNAMIC_PORT,
                ..MemoryState::default()
            }),
        }
    }

    /// Sets the host name reported to callers.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Maps a dynamically bound container port to a known host port.
    #[must_use]
    pub fn with_port_mapping(mut self, container_port: u16, host_port: u16) -> Self {
        let _ = self.fixed_ports.insert(container_port, host_port);
        self
    }

    /// Sets the stdout chunks revealed one per `logs` call.
    #[must_use]
    pub fn with_log_script<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Makes every `start` call fail.
    #[must_use]
    pub const fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Returns every lifecycle call made so far, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn calls(&self) -> Result<Vec<RuntimeCall>> {
        Ok(self.lock()?.calls.clone())
    }

    /// Returns the configuration a container was created with.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn created_config(&self, id: &ContainerId) -> Result<Option<ResourceConfig>> {
        Ok(self.lock()?.containers.get(id).map(|c| c.config.clone()))
    }

    /// Returns the number of containers that exist (created, not removed).
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn container_count(&self) -> Result<usize> {
        Ok(self.lock()?.containers.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| HarnessError::Command {
            command: "memory runtime".into(),
            message: "state lock poisoned".into(),
        })
    }
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: &ContainerId) -> HarnessError {
    HarnessError::NotFound {
        kind: "container",
        id: id.to_string(),
    }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
    async fn create(&self, config: &ResourceConfig) -> Result<ContainerId> {
        if config.image().is_none_or(|image| image.trim().is_empty()) {
            return Err(HarnessError::invalid("an image reference is required"));
        }
        let mut state = self.lock()?;
        state.next_id += 1;
        let id = ContainerId::new(format!("mem-{:04}", state.next_id));
        let _ = state.containers.insert(
            id.clone(),
            MemoryContainer {
                config: config.clone(),
                running: false,
                ports: BTreeMap::new(),
                revealed: 0,
            },
        );
        state.calls.push(RuntimeCall::Create(id.clone()));
        Ok(id)
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        state.calls.push(RuntimeCall::Start(id.clone()));
        if self.fail_start {
            return Err(HarnessError::Command {
                command: "memory start".into(),
                message: format!("scripted start failure for {id}"),
            });
        }
        let container = state.containers.get_mut(id).ok_or_else(|| not_found(id))?;
        container.ports.clear();
        for binding in container.config.port_bindings() {
            let host_port = match binding.host_port {
                Some(port) => port,
                None => match self.fixed_ports.get(&binding.container_port) {
                    Some(port) => *port,
                    None => {
                        let port = state.next_port;
                        state.next_port = state.next_port.saturating_add(1);
                        port
                    }
                },
            };
            let _ = container.ports.insert(binding.container_port, host_port);
        }
        container.running = true;
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<()> {
        let mut state = self.lock()?;
        state.calls.push(RuntimeCall::Stop(id.clone()));
        let container = state.containers.get_mut(id).ok_or_else(|| not_found(id))?;
        container.running = false;
        container.ports.clear();
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        let mut state = self.lock()?;
        state.calls.push(RuntimeCall::Remove(id.clone()));
        let _ = state.containers.remove(id);
        Ok(())
    }

    async fn logs(&self, id: &ContainerId) -> Result<LogOutput> {
        let mut state = self.lock()?;
        let container = state.containers.get_mut(id).ok_or_else(|| not_found(id))?;
        if container.running && container.revealed < self.script.len() {
            container.revealed += 1;
        }
        Ok(LogOutput {
            stdout: self.script[..container.revealed].concat(),
            stderr: String::new(),
        })
    }

    async fn mapped_port(&self, id: &ContainerId, container_port: u16) -> Result<u16> {
        let state = self.lock()?;
        let container = state.containers.get(id).ok_or_else(|| not_found(id))?;
        container
            .ports
            .get(&container_port)
            .copied()
            .ok_or_else(|| HarnessError::NotFound {
                kind: "port mapping",
                id: format!("{id}:{container_port}"),
            })
    }

    fn host(&self) -> String {
        self.host.clone()
    }

    fn is_available(&self) -> bool {
        true
    }
}
