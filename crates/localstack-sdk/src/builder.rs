//! Fluent API for configuring LocalStack containers.
//!
//! Every `with_*` call leaves the builder it was called on untouched and
//! returns a new one wrapping `combine(current, delta)`, where `delta`
//! carries only the field being set plus any environment variable or port
//! binding mirroring it.

use std::sync::Arc;
use std::time::Duration;

use localstack_common::constants::{
    DEFAULT_EXTERNAL_PORT_END, DEFAULT_EXTERNAL_PORT_START, DEFAULT_REGION, LOCALSTACK_IMAGE,
    LOCALSTACK_PORT, MANAGED_LABEL, env,
};
use localstack_common::error::{HarnessError, Result};
use localstack_common::types::PortBinding;
use localstack_runtime::backend::{self, ContainerRuntime};
use localstack_runtime::resource::ResourceConfig;
use localstack_runtime::wait::WaitStrategy;

use crate::config::LocalStackConfiguration;
use crate::container::LocalStackContainer;
use crate::readiness::UntilReady;
use crate::service::{ServiceDescriptor, ServiceSet};

/// Builder for a LocalStack container.
///
/// ```rust
/// use localstack_sdk::builder::LocalStackBuilder;
/// use localstack_sdk::service::ServiceDescriptor;
///
/// let builder = LocalStackBuilder::new()
///     .with_services([ServiceDescriptor::S3, ServiceDescriptor::DYNAMODB])
///     .with_default_region("eu-central-1");
/// assert!(builder.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LocalStackBuilder {
    configuration: LocalStackConfiguration,
}

impl LocalStackBuilder {
    /// Creates a builder with the LocalStack defaults applied.
    ///
    /// Services are left unset: call [`Self::with_services`], possibly with
    /// no arguments, before building.
    #[must_use]
    pub fn new() -> Self {
        Self::from_configuration(LocalStackConfiguration::new()).init()
    }

    /// Wraps an existing configuration without applying defaults.
    #[must_use]
    pub const fn from_configuration(configuration: LocalStackConfiguration) -> Self {
        Self { configuration }
    }

    /// Returns the configuration accumulated so far.
    #[must_use]
    pub const fn configuration(&self) -> &LocalStackConfiguration {
        &self.configuration
    }

    fn init(self) -> Self {
        self.with_image(LOCALSTACK_IMAGE)
            .with_external_service_port_start(DEFAULT_EXTERNAL_PORT_START)
            .with_external_service_port_end(DEFAULT_EXTERNAL_PORT_END)
            .with_environment(env::USE_SSL, "false")
            .with_default_region(DEFAULT_REGION)
            .with_port_binding(LOCALSTACK_PORT, None)
            .with_label(MANAGED_LABEL, "true")
            .with_wait_strategy(WaitStrategy::new().add_condition(UntilReady))
    }

    fn merge(&self, delta: &LocalStackConfiguration) -> Self {
        Self {
            configuration: self.configuration.merge(delta),
        }
    }

    fn merge_resource(&self, resource: ResourceConfig) -> Self {
        self.merge(&LocalStackConfiguration::for_resource(resource))
    }

    /// Enables services. Services enabled by earlier calls stay enabled.
    ///
    /// With no services this only marks the service list as configured
    /// (empty), so the builder passes validation.
    #[must_use]
    pub fn with_services<I>(&self, services: I) -> Self
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        let services: ServiceSet = services.into_iter().collect();
        if services.is_empty() {
            if self.configuration.services().is_some() {
                return self.clone();
            }
            return self.merge(&LocalStackConfiguration::for_services(services));
        }
        tracing::debug!(services = %services.joined_names(), "enabling localstack services");
        self.merge(&LocalStackConfiguration::for_services(services))
            .mirror_services()
    }

    /// Publishes the fixed port of every enabled service, now and for
    /// services enabled later. Turning it off does not unpublish ports
    /// that were already bound.
    #[must_use]
    pub fn with_service_port_exposure(&self, enabled: bool) -> Self {
        self.merge(&LocalStackConfiguration::for_service_port_exposure(enabled))
            .mirror_services()
    }

    fn mirror_services(self) -> Self {
        let Some(services) = self.configuration.services() else {
            return self;
        };
        let mut resource = ResourceConfig::new();
        if !services.is_empty() {
            resource = resource.with_env(env::SERVICES, services.joined_names());
        }
        if self.configuration.exposes_service_ports() {
            let current = self.configuration.resource();
            for port in services.iter().filter_map(ServiceDescriptor::port) {
                if !current.binds_port(port) {
                    resource = resource.with_port_binding(PortBinding::dynamic(port));
                }
            }
        }
        self.merge_resource(resource)
    }

    /// Sets the region LocalStack reports.
    #[must_use]
    pub fn with_default_region(&self, region: impl Into<String>) -> Self {
        let region = region.into();
        self.merge(&LocalStackConfiguration::for_default_region(region.clone()))
            .with_environment(env::DEFAULT_REGION, region)
    }

    /// Sets the first port of the external service port range.
    #[must_use]
    pub fn with_external_service_port_start(&self, port: impl Into<String>) -> Self {
        let port = port.into();
        self.merge(&LocalStackConfiguration::for_external_service_port_start(port.clone()))
            .with_environment(env::EXTERNAL_SERVICE_PORTS_START, port)
    }

    /// Sets the last port of the external service port range.
    #[must_use]
    pub fn with_external_service_port_end(&self, port: impl Into<String>) -> Self {
        let port = port.into();
        self.merge(&LocalStackConfiguration::for_external_service_port_end(port.clone()))
            .with_environment(env::EXTERNAL_SERVICE_PORTS_END, port)
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(&self, image: impl Into<String>) -> Self {
        self.merge_resource(ResourceConfig::new().with_image(image))
    }

    /// Sets the container name. A unique name is generated otherwise.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        self.merge_resource(ResourceConfig::new().with_name(name))
    }

    /// Sets one environment variable in the container.
    #[must_use]
    pub fn with_environment(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.merge_resource(ResourceConfig::new().with_env(key, value))
    }

    /// Sets one container label.
    #[must_use]
    pub fn with_label(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.merge_resource(ResourceConfig::new().with_label(key, value))
    }

    /// Publishes `container_port` on `host_port`, or on a free host port
    /// when `host_port` is `None`.
    #[must_use]
    pub fn with_port_binding(&self, container_port: u16, host_port: Option<u16>) -> Self {
        self.merge_resource(ResourceConfig::new().with_port_binding(PortBinding {
            container_port,
            host_port,
        }))
    }

    /// Replaces the wait strategy.
    #[must_use]
    pub fn with_wait_strategy(&self, strategy: WaitStrategy) -> Self {
        self.merge_resource(ResourceConfig::new().with_wait_strategy(strategy))
    }

    /// Sets how long `start` waits for readiness.
    #[must_use]
    pub fn with_startup_timeout(&self, timeout: Duration) -> Self {
        self.with_wait_strategy(self.current_wait_strategy().with_timeout(timeout))
    }

    /// Sets the delay between two readiness polls.
    #[must_use]
    pub fn with_poll_interval(&self, interval: Duration) -> Self {
        self.with_wait_strategy(self.current_wait_strategy().with_poll_interval(interval))
    }

    fn current_wait_strategy(&self) -> WaitStrategy {
        self.configuration
            .resource()
            .wait_strategy()
            .cloned()
            .unwrap_or_default()
    }

    /// Checks that the configuration can produce a container.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationInvalid`] if services were
    /// never set, the image is missing, or the external port range is not
    /// a valid range of ports.
    pub fn validate(&self) -> Result<()> {
        let config = &self.configuration;
        if config.services().is_none() {
            return Err(HarnessError::invalid(
                "services were never set; call with_services, with no arguments for none",
            ));
        }
        if config.resource().image().is_none_or(|image| image.trim().is_empty()) {
            return Err(HarnessError::invalid("an image reference is required"));
        }

        let start = config
            .external_service_port_start()
            .map(|p| parse_port(env::EXTERNAL_SERVICE_PORTS_START, p))
            .transpose()?;
        let end = config
            .external_service_port_end()
            .map(|p| parse_port(env::EXTERNAL_SERVICE_PORTS_END, p))
            .transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(HarnessError::invalid(format!(
                    "external service port range {start}-{end} is empty"
                )));
            }
        }
        Ok(())
    }

    /// Validates and creates a not-yet-started container on the default
    /// docker runtime.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Self::validate`].
    pub fn build(self) -> Result<LocalStackContainer> {
        self.build_with_runtime(backend::detect_runtime())
    }

    /// Validates and creates a not-yet-started container on `runtime`.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Self::validate`].
    pub fn build_with_runtime(self, runtime: Arc<dyn ContainerRuntime>) -> Result<LocalStackContainer> {
        self.validate()?;
        tracing::debug!(
            image = self.configuration.resource().image().unwrap_or_default(),
            services = ?self.configuration.services().map(ServiceSet::joined_names),
            "building localstack container"
        );
        Ok(LocalStackContainer::new(self.configuration, runtime))
    }
}

impl Default for LocalStackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| HarnessError::invalid(format!("{key} must be a port number, got {value:?}")))
}
