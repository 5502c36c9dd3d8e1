//! Immutable LocalStack configuration and its merge.
//!
//! Every field is optional: `None` means "unset, inherit from the merge
//! partner". `Some` of an empty value is a different state, which matters
//! for `services`: an explicitly empty set passes validation, an unset one
//! does not.

use localstack_runtime::resource::ResourceConfig;

use crate::service::ServiceSet;

/// Desired state of a LocalStack container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalStackConfiguration {
    resource: ResourceConfig,
    services: Option<ServiceSet>,
    default_region: Option<String>,
    external_service_port_start: Option<String>,
    external_service_port_end: Option<String>,
    expose_service_ports: Option<bool>,
}

impl LocalStackConfiguration {
    /// Creates a configuration with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta carrying only runtime-level settings.
    #[must_use]
    pub fn for_resource(resource: ResourceConfig) -> Self {
        Self {
            resource,
            ..Self::default()
        }
    }

    /// Delta carrying only a service set.
    #[must_use]
    pub fn for_services(services: ServiceSet) -> Self {
        Self {
            services: Some(services),
            ..Self::default()
        }
    }

    /// Delta carrying only the default region.
    #[must_use]
    pub fn for_default_region(region: impl Into<String>) -> Self {
        Self {
            default_region: Some(region.into()),
            ..Self::default()
        }
    }

    /// Delta carrying only the first external service port.
    #[must_use]
    pub fn for_external_service_port_start(port: impl Into<String>) -> Self {
        Self {
            external_service_port_start: Some(port.into()),
            ..Self::default()
        }
    }

    /// Delta carrying only the last external service port.
    #[must_use]
    pub fn for_external_service_port_end(port: impl Into<String>) -> Self {
        Self {
            external_service_port_end: Some(port.into()),
            ..Self::default()
        }
    }

    /// Delta carrying only the per-service port exposure switch.
    #[must_use]
    pub fn for_service_port_exposure(enabled: bool) -> Self {
        Self {
            expose_service_ports: Some(enabled),
            ..Self::default()
        }
    }

    /// Returns `combine(self, delta)`.
    #[must_use]
    pub fn merge(&self, delta: &Self) -> Self {
        combine(self, delta)
    }

    /// Returns the runtime-level settings.
    #[must_use]
    pub const fn resource(&self) -> &ResourceConfig {
        &self.resource
    }

    /// Returns the enabled services, or `None` if never set.
    #[must_use]
    pub const fn services(&self) -> Option<&ServiceSet> {
        self.services.as_ref()
    }

    /// Returns the default region, or `None` if never set.
    #[must_use]
    pub fn default_region(&self) -> Option<&str> {
        self.default_region.as_deref()
    }

    /// Returns the first external service port, as configured.
    #[must_use]
    pub fn external_service_port_start(&self) -> Option<&str> {
        self.external_service_port_start.as_deref()
    }

    /// Returns the last external service port, as configured.
    #[must_use]
    pub fn external_service_port_end(&self) -> Option<&str> {
        self.external_service_port_end.as_deref()
    }

    /// Returns whether per-service ports are published. Unset means no.
    #[must_use]
    pub fn exposes_service_ports(&self) -> bool {
        self.expose_service_ports.unwrap_or(false)
    }
}

/// Merges `new` over `old` without touching either.
///
/// Scalar fields take `new`'s value when it is set and keep `old`'s
/// otherwise. `services` is the union of both sets in first-seen order.
/// The resource configuration merges with [`ResourceConfig::combine`].
#[must_use]
pub fn combine(old: &LocalStackConfiguration, new: &LocalStackConfiguration) -> LocalStackConfiguration {
    let services = match (&old.services, &new.services) {
        (Some(old), Some(new)) => Some(old.union(new)),
        (None, Some(new)) => Some(new.clone()),
        (old, None) => old.clone(),
    };

    LocalStackConfiguration {
        resource: ResourceConfig::combine(&old.resource, &new.resource),
        services,
        default_region: pick(old.default_region.as_ref(), new.default_region.as_ref()),
        external_service_port_start: pick(
            old.external_service_port_start.as_ref(),
            new.external_service_port_start.as_ref(),
        ),
        external_service_port_end: pick(
            old.external_service_port_end.as_ref(),
            new.external_service_port_end.as_ref(),
        ),
        expose_service_ports: new.expose_service_ports.or(old.expose_service_ports),
    }
}

fn pick<T: Clone>(old: Option<&T>, new: Option<&T>) -> Option<T> {
    new.or(old).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceDescriptor;

    fn services(list: &[ServiceDescriptor]) -> ServiceSet {
        list.iter().cloned().collect()
    }

    #[test]
    fn scalar_fields_take_the_newer_value() {
        let a = LocalStackConfiguration::for_default_region("x");
        let b = LocalStackConfiguration::for_default_region("y");
        assert_eq!(combine(&a, &b).default_region(), Some("y"));
    }

    #[test]
    fn unset_fields_inherit_the_older_value() {
        let a = LocalStackConfiguration::for_default_region("x");
        let b = LocalStackConfiguration::new();
        assert_eq!(combine(&a, &b).default_region(), Some("x"));
        assert_eq!(combine(&b, &a).default_region(), Some("x"));
    }

    #[test]
    fn empty_string_is_a_set_value() {
        let a = LocalStackConfiguration::for_default_region("x");
        let b = LocalStackConfiguration::for_default_region("");
        assert_eq!(combine(&a, &b).default_region(), Some(""));
    }

    #[test]
    fn services_are_unioned_not_replaced() {
        let a = LocalStackConfiguration::for_services(services(&[ServiceDescriptor::S3]));
        let b = LocalStackConfiguration::for_services(services(&[ServiceDescriptor::SQS]));
        let merged = combine(&a, &b);
        assert_eq!(
            merged.services(),
            Some(&services(&[ServiceDescriptor::S3, ServiceDescriptor::SQS]))
        );
    }

    #[test]
    fn services_union_does_not_duplicate() {
        let a = LocalStackConfiguration::for_services(services(&[ServiceDescriptor::S3]));
        let merged = combine(&a, &a.clone());
        assert_eq!(merged.services().map(ServiceSet::len), Some(1));
    }

    #[test]
    fn empty_service_set_differs_from_unset() {
        let unset = LocalStackConfiguration::new();
        let empty = LocalStackConfiguration::for_services(ServiceSet::new());
        assert!(unset.services().is_none());
        assert_eq!(combine(&unset, &empty).services(), Some(&ServiceSet::new()));
        assert_eq!(combine(&empty, &unset).services(), Some(&ServiceSet::new()));
    }

    #[test]
    fn combine_with_itself_is_identity() {
        let a = combine(
            &LocalStackConfiguration::for_services(services(&[
                ServiceDescriptor::S3,
                ServiceDescriptor::DYNAMODB,
            ])),
            &LocalStackConfiguration::for_resource(
                ResourceConfig::new().with_image("localstack/localstack:1.3.1"),
            ),
        )
        .merge(&LocalStackConfiguration::for_default_region("eu-west-1"))
        .merge(&LocalStackConfiguration::for_external_service_port_start("4510"))
        .merge(&LocalStackConfiguration::for_service_port_exposure(true));

        assert_eq!(combine(&a, &a), a);
        assert_eq!(combine(&LocalStackConfiguration::new(), &LocalStackConfiguration::new()), LocalStackConfiguration::new());
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let a = LocalStackConfiguration::for_default_region("x");
        let b = LocalStackConfiguration::for_default_region("y");
        let _ = a.merge(&b);
        assert_eq!(a.default_region(), Some("x"));
        assert_eq!(b.default_region(), Some("y"));
    }

    #[test]
    fn service_port_exposure_defaults_off() {
        assert!(!LocalStackConfiguration::new().exposes_service_ports());
        let on = LocalStackConfiguration::for_service_port_exposure(true);
        assert!(on.exposes_service_ports());
        assert!(!combine(&on, &LocalStackConfiguration::for_service_port_exposure(false))
            .exposes_service_ports());
    }
}
