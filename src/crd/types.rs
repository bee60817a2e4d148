//! Shared types for the Machine status

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum NodeAddressType {
    Hostname,
    #[serde(rename = "InternalIP")]
    InternalIp,
    #[serde(rename = "ExternalIP")]
    ExternalIp,
    #[serde(rename = "InternalDNS")]
    InternalDns,
    #[serde(rename = "ExternalDNS")]
    ExternalDns,
}

impl NodeAddressType {
    /// Name used by the core/v1 NodeAddress type
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeAddressType::Hostname => "Hostname",
            NodeAddressType::InternalIp => "InternalIP",
            NodeAddressType::ExternalIp => "ExternalIP",
            NodeAddressType::InternalDns => "InternalDNS",
            NodeAddressType::ExternalDns => "ExternalDNS",
        }
    }
}

/// Address at which a node is reachable
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub type_: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    pub fn new(type_: NodeAddressType, address: impl Into<String>) -> Self {
        Self {
            type_,
            address: address.into(),
        }
    }
}

impl From<NodeAddress> for k8s_openapi::api::core::v1::NodeAddress {
    fn from(addr: NodeAddress) -> Self {
        Self {
            type_: addr.type_.as_str().to_string(),
            address: addr.address,
        }
    }
}
