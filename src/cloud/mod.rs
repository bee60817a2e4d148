//! Cloud provider seam
//!
//! The concrete AWS client is owned by the embedding controller. This module
//! defines the provider data the reconciliation core reads (instances, tags,
//! network interfaces, load balancers, target groups) and the
//! [`CloudClient`] trait through which every provider call is made.

mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

pub use types::*;

/// ELBv2 error code for a target that is not registered / does not exist
pub const ERR_CODE_INVALID_TARGET: &str = "InvalidTarget";
/// ELBv2 error code for a target group that no longer exists
pub const ERR_CODE_TARGET_GROUP_NOT_FOUND: &str = "TargetGroupNotFound";

/// Failure reported by the provider API
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct CloudError {
    pub code: String,
    pub message: String,
}

impl CloudError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn has_code(&self, codes: &[&str]) -> bool {
        codes.contains(&self.code.as_str())
    }
}

pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// Compute and load-balancer API operations consumed by the core.
///
/// Implementations handle authentication, region selection and rate-limit
/// backoff. Calls are awaited one at a time by the reconciliation pass.
#[async_trait]
pub trait CloudClient: Send + Sync {
    async fn describe_instances(&self, query: &InstanceQuery) -> CloudResult<Vec<Reservation>>;

    /// Add or replace tags; never removes tags that are not listed
    async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> CloudResult<()>;

    async fn delete_tags(&self, resource_ids: &[String], tags: &[Tag]) -> CloudResult<()>;

    async fn terminate_instances(
        &self,
        instance_ids: &[String],
    ) -> CloudResult<Vec<InstanceStateChange>>;

    /// Classic ELB registration by instance id
    async fn register_instances_with_load_balancer(
        &self,
        load_balancer_name: &str,
        instance_ids: &[String],
    ) -> CloudResult<()>;

    async fn describe_load_balancers(&self, names: &[String]) -> CloudResult<Vec<LoadBalancer>>;

    async fn describe_target_groups(&self, load_balancer_arn: &str)
        -> CloudResult<Vec<TargetGroup>>;

    async fn register_targets(&self, target_group_arn: &str, targets: &[Target])
        -> CloudResult<()>;

    async fn deregister_targets(
        &self,
        target_group_arn: &str,
        targets: &[Target],
    ) -> CloudResult<()>;
}
