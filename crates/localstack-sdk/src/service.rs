//! LocalStack sub-services that can be enabled individually.
//!
//! The well-known services are constants on [`ServiceDescriptor`] and are
//! also reachable by name through the read-only [`ServiceCatalog`]. Any
//! other service LocalStack understands can be described with
//! [`ServiceDescriptor::new`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use localstack_common::error::{HarnessError, Result};

/// One emulated service: its symbolic name and, for the legacy
/// per-service listeners, a fixed container port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceDescriptor {
    name: Cow<'static, str>,
    port: Option<u16>,
}

impl ServiceDescriptor {
    /// Amazon API Gateway.
    pub const API_GATEWAY: Self = Self::known("apigateway", 4567);
    /// Amazon S3.
    pub const S3: Self = Self::known("s3", 4572);
    /// Amazon DynamoDB.
    pub const DYNAMODB: Self = Self::known("dynamodb", 4569);
    /// Amazon SQS.
    pub const SQS: Self = Self::known("sqs", 4576);
    /// Amazon SNS.
    pub const SNS: Self = Self::known("sns", 4575);
    /// Amazon CloudWatch Logs.
    pub const CLOUDWATCH_LOGS: Self = Self::known("logs", 4586);

    const fn known(name: &'static str, port: u16) -> Self {
        Self {
            name: Cow::Borrowed(name),
            port: Some(port),
        }
    }

    /// Describes a service that is not in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationInvalid`] unless `name` is a
    /// non-empty token of lowercase letters, digits and `-`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(HarnessError::invalid(format!(
                "service name {name:?} must be a non-empty lowercase token"
            )));
        }
        Ok(Self {
            name: Cow::Owned(name),
            port: None,
        })
    }

    /// Returns a copy listening on a fixed container port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Returns the symbolic name, e.g. `dynamodb`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fixed container port, if the service has one.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves catalog names first, then falls back to a port-less custom
/// descriptor.
impl FromStr for ServiceDescriptor {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ServiceCatalog::global()
            .lookup(s)
            .cloned()
            .map_or_else(|| Self::new(s), Ok)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

static CATALOG: LazyLock<ServiceCatalog> = LazyLock::new(|| {
    ServiceCatalog::from_descriptors([
        ServiceDescriptor::API_GATEWAY,
        ServiceDescriptor::S3,
        ServiceDescriptor::DYNAMODB,
        ServiceDescriptor::SQS,
        ServiceDescriptor::SNS,
        ServiceDescriptor::CLOUDWATCH_LOGS,
    ])
});

/// Read-only table of well-known services, keyed by symbolic name.
#[derive(Debug)]
pub struct ServiceCatalog {
    by_name: BTreeMap<String, ServiceDescriptor>,
}

impl ServiceCatalog {
    fn from_descriptors(descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        Self {
            by_name: descriptors
                .into_iter()
                .map(|d| (d.name().to_string(), d))
                .collect(),
        }
    }

    /// Returns the process-wide catalog.
    #[must_use]
    pub fn global() -> &'static Self {
        &CATALOG
    }

    /// Finds a well-known service by symbolic name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.by_name.get(name)
    }

    /// Iterates the catalog in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.by_name.values()
    }

    /// Returns the number of catalogued services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Set of services, unique by name, iterated in first-seen order.
///
/// Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct ServiceSet(Vec<ServiceDescriptor>);

impl ServiceSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a service unless one with the same name is present. Returns
    /// whether it was added.
    pub fn insert(&mut self, service: ServiceDescriptor) -> bool {
        if self.contains(service.name()) {
            return false;
        }
        self.0.push(service);
        true
    }

    /// Returns the receiver's services followed by the unseen ones of
    /// `other`, in their order.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for service in &other.0 {
            let _ = merged.insert(service.clone());
        }
        merged
    }

    /// Returns whether a service with `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|s| s.name() == name)
    }

    /// Iterates the services in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.0.iter()
    }

    /// Returns the number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the names comma-joined, e.g. `s3,dynamodb,sqs`.
    #[must_use]
    pub fn joined_names(&self) -> String {
        self.0
            .iter()
            .map(ServiceDescriptor::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl PartialEq for ServiceSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|s| other.contains(s.name()))
    }
}

impl Eq for ServiceSet {}

impl FromIterator<ServiceDescriptor> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = ServiceDescriptor>>(iter: I) -> Self {
        let mut set = Self::new();
        for service in iter {
            let _ = set.insert(service);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ServiceSet {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
