//! Instance tag reconciliation
//!
//! Every instance carries two identity tags: `Name=<machine>` and
//! `kubernetes.io/cluster/<cluster-id>=owned`. On top of those the cluster
//! Infrastructure resource contributes user tags to add/update or delete.
//! A single pass issues at most one mutating call: identity and
//! added/updated tags first, deletions only once nothing else is pending.

use std::collections::BTreeMap;

use kube::ResourceExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::cloud::{CloudClient, Instance, Tag, NAME_TAG_KEY};
use crate::crd::{Infrastructure, Machine};
use crate::error::{Error, Result};

static TAG_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_.:/=+\-@]{1,128}$").expect("valid tag key regex"));

static TAG_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_.:/=+\-@]{0,256}$").expect("valid tag value regex"));

static KUBERNETES_NAMESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]*\.)?kubernetes\.io/").expect("valid namespace regex"));

static OPENSHIFT_NAMESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]*\.)?openshift\.io/").expect("valid namespace regex"));

/// Validate a user-supplied tag
pub fn validate_user_tag(key: &str, value: &str) -> Result<()> {
    if !TAG_KEY_REGEX.is_match(key) {
        return Err(Error::ValidationError(
            "key has invalid characters or length".to_string(),
        ));
    }
    if key.eq_ignore_ascii_case(NAME_TAG_KEY) {
        return Err(Error::ValidationError(
            "key cannot be customized by user".to_string(),
        ));
    }
    if !TAG_VALUE_REGEX.is_match(value) {
        return Err(Error::ValidationError(
            "value has invalid characters or length".to_string(),
        ));
    }
    if KUBERNETES_NAMESPACE_REGEX.is_match(key) {
        return Err(Error::ValidationError(
            "key is in the kubernetes.io namespace".to_string(),
        ));
    }
    if OPENSHIFT_NAMESPACE_REGEX.is_match(key) {
        return Err(Error::ValidationError(
            "key is in the openshift.io namespace".to_string(),
        ));
    }
    Ok(())
}

/// User tags to converge an instance towards.
///
/// `update` and `delete` never share a key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DesiredTags {
    pub update: BTreeMap<String, String>,
    pub delete: BTreeMap<String, String>,
}

impl DesiredTags {
    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.delete.is_empty()
    }
}

/// Merge the Infrastructure spec and status tag lists.
///
/// Tags from both lists are validated (invalid ones are skipped with a
/// warning); an empty spec value requests deletion. Keys present only in
/// status are adopted with their status value. When both lists carry a key with
/// different values `spec` wins.
pub fn fetch_infra_resource_tags(infra: Option<&Infrastructure>) -> DesiredTags {
    let mut desired = DesiredTags::default();
    let Some(infra) = infra else {
        return desired;
    };

    for tag in infra.spec_resource_tags() {
        if let Err(e) = validate_user_tag(&tag.key, &tag.value) {
            warn!("validation failed for tag({}:{}): {}", tag.key, tag.value, e);
            continue;
        }
        if tag.value.is_empty() {
            desired.delete.insert(tag.key.clone(), String::new());
            continue;
        }
        desired.update.insert(tag.key.clone(), tag.value.clone());
    }

    for tag in infra.status_resource_tags() {
        if desired.delete.contains_key(&tag.key) {
            continue;
        }
        if let Err(e) = validate_user_tag(&tag.key, &tag.value) {
            warn!("validation failed for status tag({}:{}): {}", tag.key, tag.value, e);
            continue;
        }
        match desired.update.get(&tag.key) {
            None => {
                info!(
                    "tag {} exists only in infra.Status, considering for update",
                    tag.key
                );
                desired.update.insert(tag.key.clone(), tag.value.clone());
            }
            Some(value) if *value != tag.value => {
                warn!(
                    "value for tag {} differs in infra.Status({}) and infra.Spec({}), value in infra.Spec considered",
                    tag.key, tag.value, value
                );
            }
            Some(_) => {}
        }
    }

    desired
}

/// Tags that must be present with an exact value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityTagRequirements {
    required: Vec<Tag>,
}

impl IdentityTagRequirements {
    pub fn new(required: Vec<Tag>) -> Self {
        Self { required }
    }

    /// Cluster-ownership and `Name` tags for the Machine
    pub fn for_machine(machine: &Machine) -> Result<Self> {
        let cluster_id = machine.require_cluster_id()?;
        Ok(Self::new(vec![
            Tag::cluster_owned(cluster_id),
            Tag::name(&machine.name_any()),
        ]))
    }

    pub fn tags(&self) -> &[Tag] {
        &self.required
    }

    /// Whether `key` is owned by one of the required tags
    pub fn covers(&self, key: &str) -> bool {
        self.required.iter().any(|req| req.key == key)
    }

    pub fn is_satisfied_by(&self, existing: &[Tag]) -> bool {
        self.required.iter().all(|req| existing.contains(req))
    }
}

/// Mutation issued by [`correct_existing_tags`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagUpdate {
    Unchanged,
    Created(Vec<Tag>),
    Deleted(Vec<Tag>),
}

/// Bring the instance tags in line with the identity tags and `desired`.
#[instrument(skip_all, fields(machine = %machine.name_any(), instance_id = ?instance.instance_id))]
pub async fn correct_existing_tags(
    client: &dyn CloudClient,
    machine: &Machine,
    instance: &Instance,
    desired: &DesiredTags,
) -> Result<TagUpdate> {
    let instance_id = instance.instance_id.as_deref().ok_or_else(|| {
        Error::ValidationError(format!("unexpected nil found in instance: {instance:?}"))
    })?;
    let identity = IdentityTagRequirements::for_machine(machine)?;

    // Identity keys are only ever written from the Machine itself
    let mut pending = desired.update.clone();
    pending.retain(|key, _| !identity.covers(key));
    for tag in &instance.tags {
        if pending.get(&tag.key) == Some(&tag.value) {
            pending.remove(&tag.key);
        }
    }

    let mut tags_to_add: Vec<Tag> = pending
        .into_iter()
        .map(|(key, value)| Tag::new(key, value))
        .collect();
    if !identity.is_satisfied_by(&instance.tags) {
        tags_to_add.extend(identity.tags().iter().cloned());
    }

    let resources = [instance_id.to_string()];

    if !tags_to_add.is_empty() {
        info!(
            "updating Tags for machine: {}; instanceID: {}, tags: {:?}",
            machine.name_any(),
            instance_id,
            tags_to_add
        );
        client.create_tags(&resources, &tags_to_add).await?;
        return Ok(TagUpdate::Created(tags_to_add));
    }

    let tags_to_delete: Vec<Tag> = desired
        .delete
        .iter()
        .filter(|(key, _)| !identity.covers(key))
        .map(|(key, value)| Tag::new(key, value))
        .collect();

    if !tags_to_delete.is_empty() {
        info!(
            "deleting Tags for machine: {}; instanceID: {}, tags: {:?}",
            machine.name_any(),
            instance_id,
            tags_to_delete
        );
        client.delete_tags(&resources, &tags_to_delete).await?;
        return Ok(TagUpdate::Deleted(tags_to_delete));
    }

    Ok(TagUpdate::Unchanged)
}
