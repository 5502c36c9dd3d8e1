//! Container runtime driver for the localstack-testkit workspace.
//!
//! Everything here is generic over the image being run: the LocalStack
//! specifics live in `localstack-sdk`, which only supplies a resource
//! configuration and a readiness condition.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod backend;
pub mod container;
pub mod logs;
pub mod resource;
pub mod wait;
