//! The Machine resource as seen by the AWS provider
//!
//! Only the name, the cluster-ID labels and the opaque provider payloads are
//! read here; the rest of the resource belongs to the machine API.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::NodeAddress;

/// Label identifying the cluster a Machine belongs to
pub const MACHINE_CLUSTER_ID_LABEL: &str = "machine.openshift.io/cluster-api-cluster";

/// Pre-rename cluster label, still accepted when resolving the cluster ID
pub const UPSTREAM_MACHINE_CLUSTER_ID_LABEL: &str = "sigs.k8s.io/cluster-api-cluster";

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "machine.openshift.io",
    version = "v1beta1",
    kind = "Machine",
    namespaced,
    status = "MachineStatus",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    #[serde(default)]
    pub provider_spec: ProviderSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

/// Opaque provider configuration, decoded by the provider
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProviderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<NodeAddress>,
}

impl Machine {
    /// Cluster ID from the primary label, falling back to the upstream label
    pub fn cluster_id(&self) -> Option<&str> {
        let labels = self.labels();
        labels
            .get(MACHINE_CLUSTER_ID_LABEL)
            .or_else(|| labels.get(UPSTREAM_MACHINE_CLUSTER_ID_LABEL))
            .map(String::as_str)
    }

    /// Cluster ID or a validation error naming the Machine
    pub fn require_cluster_id(&self) -> Result<&str> {
        self.cluster_id().ok_or_else(|| {
            Error::ValidationError(format!(
                "unable to get cluster ID for machine: {:?}",
                self.name_any()
            ))
        })
    }

    /// A Machine must carry a non-empty primary cluster-ID label
    pub fn validate(&self) -> Result<()> {
        match self.labels().get(MACHINE_CLUSTER_ID_LABEL) {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err(Error::ValidationError(format!(
                "{}: missing {:?} label",
                self.name_any(),
                MACHINE_CLUSTER_ID_LABEL
            ))),
        }
    }
}
