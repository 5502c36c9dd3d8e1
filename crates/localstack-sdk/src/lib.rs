//! # localstack-sdk
//!
//! Disposable LocalStack containers for integration tests.
//!
//! Entry points:
//! - [`LocalStackBuilder`](builder::LocalStackBuilder): immutable, fluent configuration.
//! - [`LocalStackContainer`](container::LocalStackContainer): started instance with
//!   endpoint, credentials and region.
//! - [`ServiceDescriptor`](service::ServiceDescriptor): the services LocalStack can emulate.
//!
//! # Example
//!
//! ```rust,no_run
//! use localstack_sdk::builder::LocalStackBuilder;
//! use localstack_sdk::service::ServiceDescriptor;
//!
//! # async fn run() -> localstack_common::error::Result<()> {
//! let mut localstack = LocalStackBuilder::new()
//!     .with_services([ServiceDescriptor::S3, ServiceDescriptor::SQS])
//!     .build()?;
//! localstack.start().await?;
//! println!("AWS_ENDPOINT_URL={}", localstack.endpoint()?);
//! localstack.dispose().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod config;
pub mod container;
pub mod readiness;
pub mod service;

pub use builder::LocalStackBuilder;
pub use container::LocalStackContainer;
pub use service::ServiceDescriptor;
