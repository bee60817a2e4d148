//! Resource types read by the AWS machine provider
//!
//! The Machine and Infrastructure resources are owned by the machine API and
//! the cluster config operator; only the fields the provider consumes are
//! modelled here.

pub mod infrastructure;
mod machine;
pub mod provider;
pub mod types;

pub use infrastructure::{AwsResourceTag, Infrastructure, InfrastructureSpec, InfrastructureStatus};
pub use machine::{
    Machine, MachineSpec, MachineStatus, ProviderSpec, MACHINE_CLUSTER_ID_LABEL,
    UPSTREAM_MACHINE_CLUSTER_ID_LABEL,
};
pub use provider::{
    AwsLoadBalancerType, AwsMachineProviderCondition, AwsMachineProviderConfig,
    AwsMachineProviderStatus, ConditionStatus, ConditionType, LoadBalancerReference,
    TagSpecification,
};
pub use types::*;
