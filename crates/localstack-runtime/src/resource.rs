//! Runtime-level description of a container to create.
//!
//! A [`ResourceConfig`] is a plain value. Layering one on top of another
//! with [`ResourceConfig::combine`] never mutates either input.

use std::collections::BTreeMap;
use std::time::Duration;

use localstack_common::types::PortBinding;

use crate::wait::WaitStrategy;

/// Image, environment, labels, port bindings and wait strategy of a
/// container. Every field may be left unset so partial configurations can
/// be merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceConfig {
    image: Option<String>,
    name: Option<String>,
    environment: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
    port_bindings: Vec<PortBinding>,
    wait_strategy: Option<WaitStrategy>,
}

impl ResourceConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `new` over `old`.
    ///
    /// Image, name and wait strategy from `new` win when set. Environment
    /// and labels merge key by key with `new` winning. Port bindings merge
    /// by container port with `new` winning, keeping first-seen order.
    #[must_use]
    pub fn combine(old: &Self, new: &Self) -> Self {
        let mut environment = old.environment.clone();
        environment.extend(new.environment.clone());

        let mut labels = old.labels.clone();
        labels.extend(new.labels.clone());

        let mut port_bindings = old.port_bindings.clone();
        for binding in &new.port_bindings {
            match port_bindings
                .iter_mut()
                .find(|b| b.container_port == binding.container_port)
            {
                Some(existing) => *existing = *binding,
                None => port_bindings.push(*binding),
            }
        }

        Self {
            image: new.image.clone().or_else(|| old.image.clone()),
            name: new.name.clone().or_else(|| old.name.clone()),
            environment,
            labels,
            port_bindings,
            wait_strategy: new
                .wait_strategy
                .clone()
                .or_else(|| old.wait_strategy.clone()),
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the container name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets one environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.environment.insert(key.into(), value.into());
        self
    }

    /// Sets one label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds or replaces the binding for `binding.container_port`.
    #[must_use]
    pub fn with_port_binding(self, binding: PortBinding) -> Self {
        let delta = Self {
            port_bindings: vec![binding],
            ..Self::default()
        };
        Self::combine(&self, &delta)
    }

    /// Sets the wait strategy.
    #[must_use]
    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.wait_strategy = Some(strategy);
        self
    }

    /// Returns the image reference.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Returns the container name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns all environment variables, sorted by key.
    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Returns a single environment variable.
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }

    /// Returns all labels, sorted by key.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Returns the port bindings in registration order.
    #[must_use]
    pub fn port_bindings(&self) -> &[PortBinding] {
        &self.port_bindings
    }

    /// Returns whether a binding exists for `container_port`.
    #[must_use]
    pub fn binds_port(&self, container_port: u16) -> bool {
        self.port_bindings
            .iter()
            .any(|b| b.container_port == container_port)
    }

    /// Returns the wait strategy.
    #[must_use]
    pub const fn wait_strategy(&self) -> Option<&WaitStrategy> {
        self.wait_strategy.as_ref()
    }

    /// Returns the configured readiness deadline, if any strategy is set.
    #[must_use]
    pub fn startup_timeout(&self) -> Option<Duration> {
        self.wait_strategy.as_ref().map(WaitStrategy::timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_values_win_for_scalars() {
        let old = ResourceConfig::new().with_image("a:1").with_name("first");
        let new = ResourceConfig::new().with_image("a:2");
        let merged = ResourceConfig::combine(&old, &new);
        assert_eq!(merged.image(), Some("a:2"));
        assert_eq!(merged.name(), Some("first"));
    }

    #[test]
    fn environment_merges_key_by_key() {
        let old = ResourceConfig::new().with_env("A", "1").with_env("B", "1");
        let new = ResourceConfig::new().with_env("B", "2").with_env("C", "2");
        let merged = ResourceConfig::combine(&old, &new);
        assert_eq!(merged.env("A"), Some("1"));
        assert_eq!(merged.env("B"), Some("2"));
        assert_eq!(merged.env("C"), Some("2"));
    }

    #[test]
    fn port_bindings_replace_by_container_port() {
        let config = ResourceConfig::new()
            .with_port_binding(PortBinding::dynamic(4566))
            .with_port_binding(PortBinding::dynamic(4572))
            .with_port_binding(PortBinding::fixed(4566, 14566));
        assert_eq!(
            config.port_bindings(),
            &[PortBinding::fixed(4566, 14566), PortBinding::dynamic(4572)]
        );
        assert!(config.binds_port(4572));
        assert!(!config.binds_port(4576));
    }

    #[test]
    fn combine_with_itself_is_identity() {
        let config = ResourceConfig::new()
            .with_image("localstack/localstack:1.3.1")
            .with_env("USE_SSL", "false")
            .with_label("managed", "true")
            .with_port_binding(PortBinding::dynamic(4566))
            .with_wait_strategy(WaitStrategy::new());
        assert_eq!(ResourceConfig::combine(&config, &config), config);
    }

    #[test]
    fn combine_leaves_inputs_untouched() {
        let old = ResourceConfig::new().with_env("A", "1");
        let new = ResourceConfig::new().with_env("A", "2");
        let _ = ResourceConfig::combine(&old, &new);
        assert_eq!(old.env("A"), Some("1"));
        assert_eq!(new.env("A"), Some("2"));
    }

    #[test]
    fn startup_timeout_follows_wait_strategy() {
        assert!(ResourceConfig::new().startup_timeout().is_none());
        let config = ResourceConfig::new()
            .with_wait_strategy(WaitStrategy::new().with_timeout(Duration::from_secs(9)));
        assert_eq!(config.startup_timeout(), Some(Duration::from_secs(9)));
    }
}
