use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tag key prefix asserting cluster ownership: `kubernetes.io/cluster/<id>`
pub const CLUSTER_TAG_PREFIX: &str = "kubernetes.io/cluster/";
/// Value of the cluster-ownership tag
pub const CLUSTER_TAG_OWNED: &str = "owned";
/// Reserved tag holding the Machine name
pub const NAME_TAG_KEY: &str = "Name";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn name(machine_name: &str) -> Self {
        Self::new(NAME_TAG_KEY, machine_name)
    }

    pub fn cluster_owned(cluster_id: &str) -> Self {
        Self::new(cluster_tag_key(cluster_id), CLUSTER_TAG_OWNED)
    }
}

pub fn cluster_tag_key(cluster_id: &str) -> String {
    format!("{CLUSTER_TAG_PREFIX}{cluster_id}")
}

/// EC2 instance lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkInterfaceStatus {
    Available,
    Associated,
    Attaching,
    InUse,
    Detaching,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default)]
    pub status: Option<NetworkInterfaceStatus>,
    #[serde(default)]
    pub private_ip_addresses: Vec<String>,
    #[serde(default)]
    pub ipv6_addresses: Vec<String>,
}

impl NetworkInterface {
    pub fn is_in_use(&self) -> bool {
        self.status == Some(NetworkInterfaceStatus::InUse)
    }
}

/// Provider view of a virtual machine.
///
/// Fields the provider may omit are optional; the core validates the ones
/// it depends on instead of trusting the response shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: Option<String>,
    pub state: Option<InstanceState>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    pub private_ip_address: Option<String>,
    pub public_ip_address: Option<String>,
    pub private_dns_name: Option<String>,
    pub public_dns_name: Option<String>,
    pub launch_time: Option<DateTime<Utc>>,
}

impl Instance {
    /// Instance id; a provider response without one is reported as not found
    pub fn id(&self) -> Result<&str> {
        self.instance_id
            .as_deref()
            .ok_or_else(|| Error::NotFound("instance has nil ID".to_string()))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    /// Match instances carrying tag `key` with any of `values`
    pub fn tag(key: &str, values: Vec<String>) -> Self {
        Self {
            name: format!("tag:{key}"),
            values,
        }
    }

    /// Match instances owned by the given cluster
    pub fn cluster(cluster_id: &str) -> Self {
        Self::tag(
            &cluster_tag_key(cluster_id),
            vec![CLUSTER_TAG_OWNED.to_string()],
        )
    }
}

/// describe-instances selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstanceQuery {
    Ids(Vec<String>),
    Filters(Vec<Filter>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStateChange {
    pub instance_id: String,
    pub previous_state: Option<InstanceState>,
    pub current_state: Option<InstanceState>,
}

/// Target-group based (ELBv2) load balancer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub name: String,
    pub arn: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Instance,
    Ip,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub arn: String,
    pub target_type: TargetType,
}

/// A member of a target group, addressed the way the group expects
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Instance { instance_id: String },
    Ip { address: String },
}

impl Target {
    pub fn by_instance(instance: &Instance) -> Result<Self> {
        Ok(Target::Instance {
            instance_id: instance.id()?.to_string(),
        })
    }

    pub fn by_ip(instance: &Instance) -> Result<Self> {
        let address = instance.private_ip_address.as_ref().ok_or_else(|| {
            Error::NotFound(format!(
                "instance {} has no private IP address",
                instance.instance_id.as_deref().unwrap_or_default()
            ))
        })?;
        Ok(Target::Ip {
            address: address.clone(),
        })
    }

    /// Build the target matching the group's addressing model
    pub fn for_group(group: &TargetGroup, instance: &Instance) -> Result<Self> {
        match group.target_type {
            TargetType::Instance => Self::by_instance(instance),
            TargetType::Ip => Self::by_ip(instance),
        }
    }

    /// Identifier sent to the provider
    pub fn id(&self) -> &str {
        match self {
            Target::Instance { instance_id } => instance_id,
            Target::Ip { address } => address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance {
            instance_id: Some("i-0abc".to_string()),
            private_ip_address: Some("10.0.0.7".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_for_instance_group_uses_id() {
        let group = TargetGroup {
            arn: "arn:tg/a".to_string(),
            target_type: TargetType::Instance,
        };
        let target = Target::for_group(&group, &instance()).unwrap();
        assert_eq!(
            target,
            Target::Instance {
                instance_id: "i-0abc".to_string()
            }
        );
        assert_eq!(target.id(), "i-0abc");
    }

    #[test]
    fn test_target_for_ip_group_uses_private_ip() {
        let group = TargetGroup {
            arn: "arn:tg/b".to_string(),
            target_type: TargetType::Ip,
        };
        let target = Target::for_group(&group, &instance()).unwrap();
        assert_eq!(target.id(), "10.0.0.7");
    }

    #[test]
    fn test_target_by_ip_requires_private_ip() {
        let mut inst = instance();
        inst.private_ip_address = None;
        let err = Target::by_ip(&inst).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_instance_id_missing() {
        let inst = Instance::default();
        let err = inst.id().unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_cluster_filter() {
        let filter = Filter::cluster("c1");
        assert_eq!(filter.name, "tag:kubernetes.io/cluster/c1");
        assert_eq!(filter.values, vec!["owned".to_string()]);
    }

    #[test]
    fn test_state_serde_matches_provider_names() {
        let state: InstanceState = serde_json::from_str("\"shutting-down\"").unwrap();
        assert_eq!(state, InstanceState::ShuttingDown);
        assert_eq!(state.to_string(), "shutting-down");
    }
}
