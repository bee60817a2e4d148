//! AWS provider spec and status payloads
//!
//! These travel inside the Machine as opaque JSON (`spec.providerSpec.value`
//! and `status.providerStatus`). The helpers at the bottom of this module
//! encode and decode them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;

pub const MACHINE_CREATION_SUCCEEDED_REASON: &str = "MachineCreationSucceeded";
pub const MACHINE_CREATION_FAILED_REASON: &str = "MachineCreationFailed";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Tags requested at instance launch; decoded here but never reconciled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagSpecification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<LoadBalancerReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagSpecification {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AwsLoadBalancerType {
    /// Classic ELB, members registered by instance id
    Classic,
    /// NLB/ALB, members registered into target groups
    Network,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoadBalancerReference {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: AwsLoadBalancerType,
}

impl AwsMachineProviderConfig {
    pub fn load_balancer_names(&self, type_: AwsLoadBalancerType) -> Vec<String> {
        self.load_balancers
            .iter()
            .filter(|lb| lb.type_ == type_)
            .map(|lb| lb.name.clone())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineProviderStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<AwsMachineProviderCondition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConditionType {
    MachineCreation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineProviderCondition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probe_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Encode a provider spec into the Machine's opaque payload.
///
/// `None` encodes as an empty payload.
pub fn raw_extension_from_provider_spec(
    spec: Option<&AwsMachineProviderConfig>,
) -> Result<Option<serde_json::Value>> {
    to_raw(spec)
}

pub fn raw_extension_from_provider_status(
    status: Option<&AwsMachineProviderStatus>,
) -> Result<Option<serde_json::Value>> {
    to_raw(status)
}

/// Decode a provider spec; an absent payload yields the default spec
pub fn provider_spec_from_raw_extension(
    raw: Option<&serde_json::Value>,
) -> Result<AwsMachineProviderConfig> {
    let spec = from_raw(raw)?;
    trace!("Got provider spec from raw extension: {:?}", spec);
    Ok(spec)
}

pub fn provider_status_from_raw_extension(
    raw: Option<&serde_json::Value>,
) -> Result<AwsMachineProviderStatus> {
    let status = from_raw(raw)?;
    trace!("Got provider status from raw extension: {:?}", status);
    Ok(status)
}

fn to_raw<T: Serialize>(value: Option<&T>) -> Result<Option<serde_json::Value>> {
    value
        .map(serde_json::to_value)
        .transpose()
        .map_err(Into::into)
}

fn from_raw<T>(raw: Option<&serde_json::Value>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match raw {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(v) => Ok(T::deserialize(v)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn test_provider_spec_decodes_from_payload() {
        let raw = json!({
            "instanceType": "m6i.large",
            "tags": [{"name": "team", "value": "infra"}],
            "loadBalancers": [
                {"name": "api-int", "type": "network"},
                {"name": "legacy", "type": "classic"}
            ]
        });
        let spec = provider_spec_from_raw_extension(Some(&raw)).unwrap();
        assert_eq!(spec.instance_type.as_deref(), Some("m6i.large"));
        assert_eq!(spec.tags[0].name, "team");
        assert_eq!(
            spec.load_balancer_names(AwsLoadBalancerType::Network),
            vec!["api-int".to_string()]
        );
        assert_eq!(
            spec.load_balancer_names(AwsLoadBalancerType::Classic),
            vec!["legacy".to_string()]
        );
    }

    #[test]
    fn test_absent_payload_decodes_to_default() {
        assert_eq!(
            provider_spec_from_raw_extension(None).unwrap(),
            AwsMachineProviderConfig::default()
        );
        assert_eq!(
            provider_status_from_raw_extension(Some(&serde_json::Value::Null)).unwrap(),
            AwsMachineProviderStatus::default()
        );
    }

    #[test]
    fn test_none_encodes_to_empty_payload() {
        assert!(raw_extension_from_provider_spec(None).unwrap().is_none());
        assert!(raw_extension_from_provider_status(None).unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_serialization_error() {
        let raw = json!({"loadBalancers": "not-a-list"});
        let err = provider_spec_from_raw_extension(Some(&raw)).unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[test]
    fn test_status_payload_keeps_conditions() {
        let status = AwsMachineProviderStatus {
            instance_id: Some("i-1".to_string()),
            instance_state: Some("running".to_string()),
            conditions: vec![AwsMachineProviderCondition {
                type_: ConditionType::MachineCreation,
                status: ConditionStatus::True,
                reason: MACHINE_CREATION_SUCCEEDED_REASON.to_string(),
                message: "Machine successfully created".to_string(),
                last_probe_time: None,
                last_transition_time: None,
            }],
        };
        let raw = raw_extension_from_provider_status(Some(&status)).unwrap().unwrap();
        assert_eq!(raw["conditions"][0]["type"], "MachineCreation");
        assert_eq!(raw["conditions"][0]["status"], "True");
        assert_eq!(
            provider_status_from_raw_extension(Some(&raw)).unwrap(),
            status
        );
    }
}
