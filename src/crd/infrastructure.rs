//! Cluster-wide Infrastructure resource (config.openshift.io)
//!
//! Only the AWS resource-tag lists are modelled. The `spec` list is
//! authoritative; the status list is what the installer recorded.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Infrastructure",
    status = "InfrastructureStatus",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {
    #[serde(default)]
    pub platform_spec: PlatformSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct PlatformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsPlatformSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsPlatformSpec {
    #[serde(default)]
    pub resource_tags: Vec<AwsResourceTag>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_status: Option<PlatformStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct PlatformStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsPlatformStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsPlatformStatus {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub resource_tags: Vec<AwsResourceTag>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct AwsResourceTag {
    pub key: String,
    /// Empty in the `spec` list means "remove this tag"
    #[serde(default)]
    pub value: String,
}

impl AwsResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Infrastructure {
    pub fn spec_resource_tags(&self) -> &[AwsResourceTag] {
        self.spec
            .platform_spec
            .aws
            .as_ref()
            .map(|aws| aws.resource_tags.as_slice())
            .unwrap_or_default()
    }

    pub fn status_resource_tags(&self) -> &[AwsResourceTag] {
        self.status
            .as_ref()
            .and_then(|s| s.platform_status.as_ref())
            .and_then(|p| p.aws.as_ref())
            .map(|aws| aws.resource_tags.as_slice())
            .unwrap_or_default()
    }
}
