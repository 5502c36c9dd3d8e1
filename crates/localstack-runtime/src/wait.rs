//! Wait strategies: poll readiness conditions until they hold or time out.
//!
//! A condition only answers "is it ready now?". Polling cadence, retries
//! and the overall deadline belong to [`WaitStrategy`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use localstack_common::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_STARTUP_TIMEOUT};
use localstack_common::error::{HarnessError, Result};
use localstack_common::types::ContainerId;

use crate::backend::ContainerRuntime;

/// A readiness condition evaluated against a running container.
///
/// Implementations must be stateless between calls: the strategy may call
/// them any number of times and may abandon a call mid-flight.
#[async_trait]
pub trait WaitUntil: Send + Sync {
    /// Returns `Ok(true)` once the container satisfies the condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    async fn until(&self, runtime: &dyn ContainerRuntime, id: &ContainerId) -> Result<bool>;
}

/// Ordered set of readiness conditions plus the polling policy.
#[derive(Clone)]
pub struct WaitStrategy {
    conditions: Vec<Arc<dyn WaitUntil>>,
    poll_interval: Duration,
    timeout: Duration,
}

impl WaitStrategy {
    /// Creates a strategy with no conditions and the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Appends a condition. Conditions are awaited in insertion order.
    #[must_use]
    pub fn add_condition(mut self, condition: impl WaitUntil + 'static) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// Sets the delay between two polls of the same condition.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the overall deadline for all conditions together.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the delay between polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the overall deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of registered conditions.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Polls every condition until all of them hold.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ReadinessTimeout`] once the deadline passes,
    /// or the first error a condition reports.
    pub async fn wait_until_ready(
        &self,
        runtime: &dyn ContainerRuntime,
        id: &ContainerId,
    ) -> Result<()> {
        tracing::debug!(
            id = %id,
            conditions = self.conditions.len(),
            timeout = ?self.timeout,
            "waiting for container readiness"
        );
        tokio::time::timeout(self.timeout, self.poll_all(runtime, id))
            .await
            .map_err(|_| HarnessError::ReadinessTimeout {
                timeout: self.timeout,
            })?
    }

    async fn poll_all(&self, runtime: &dyn ContainerRuntime, id: &ContainerId) -> Result<()> {
        for (index, condition) in self.conditions.iter().enumerate() {
            let mut attempt: u32 = 0;
            loop {
                attempt = attempt.saturating_add(1);
                if condition.until(runtime, id).await? {
                    tracing::debug!(id = %id, condition = index, attempt, "condition satisfied");
                    break;
                }
                tracing::trace!(id = %id, condition = index, attempt, "condition not met yet");
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Ok(())
    }
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitStrategy")
            .field("conditions", &self.conditions.len())
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Two strategies are equal when they share the same condition instances
/// and policy.
impl PartialEq for WaitStrategy {
    fn eq(&self, other: &Self) -> bool {
        self.poll_interval == other.poll_interval
            && self.timeout == other.timeout
            && self.conditions.len() == other.conditions.len()
            && self
                .conditions
                .iter()
                .zip(&other.conditions)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}
