//! machine-provider-aws: reconciliation core for AWS-backed Machines
//!
//! This crate locates the EC2 instances backing a Machine, repairs their
//! identity tags, tracks provider status conditions, derives node addresses
//! and keeps classic / target-group load balancer memberships in sync.
//! The outer reconcile loop and the concrete AWS client live elsewhere;
//! the client is consumed through the [`cloud::CloudClient`] trait.

pub mod cloud;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod telemetry;

pub use crate::config::ActuatorConfig;
pub use crate::error::{Error, MultiError, Result};
