//! Instance discovery and lifecycle-state filtering
//!
//! Instances are found by their `Name` tag and the cluster-ownership tag.
//! Instances outside the requested lifecycle states are logged and skipped
//! rather than failing the lookup.

use kube::ResourceExt;
use tracing::{debug, error, info, instrument, warn};

use crate::cloud::{
    CloudClient, Filter, Instance, InstanceQuery, InstanceState, InstanceStateChange,
    NAME_TAG_KEY,
};
use crate::crd::Machine;
use crate::error::{Error, Result};

/// States in which an instance still "exists": anything but terminated
pub fn existing_instance_states() -> Vec<InstanceState> {
    vec![
        InstanceState::Running,
        InstanceState::Pending,
        InstanceState::Stopped,
        InstanceState::Stopping,
        InstanceState::ShuttingDown,
    ]
}

/// States used to detect a stopped machine
pub fn stopped_instance_states() -> Vec<InstanceState> {
    vec![InstanceState::Stopped, InstanceState::Stopping]
}

/// Check that the instance is in one of `allowed`; an empty list allows any state.
pub fn instance_has_allowed_state(instance: &Instance, allowed: &[InstanceState]) -> Result<()> {
    let instance_id = instance.id()?;
    let actual = instance.state.ok_or_else(|| {
        Error::NotFound(format!("instance {instance_id} has nil state"))
    })?;

    if allowed.is_empty() || allowed.contains(&actual) {
        return Ok(());
    }

    Err(Error::InvalidInstanceState {
        instance_id: instance_id.to_string(),
        actual,
        allowed: allowed.to_vec(),
    })
}

/// Keep only the running instances
pub fn get_running_from_instances(instances: &[Instance]) -> Vec<Instance> {
    instances
        .iter()
        .filter(|i| i.state == Some(InstanceState::Running))
        .cloned()
        .collect()
}

/// All instances tagged for this Machine and cluster whose state is in `state_filter`
#[instrument(skip(client, machine, state_filter), fields(machine = %machine.name_any()))]
pub async fn get_instances(
    client: &dyn CloudClient,
    machine: &Machine,
    state_filter: &[InstanceState],
) -> Result<Vec<Instance>> {
    let cluster_id = machine.require_cluster_id()?;
    let machine_name = machine.name_any();

    let query = InstanceQuery::Filters(vec![
        Filter::tag(NAME_TAG_KEY, vec![machine_name.clone()]),
        Filter::cluster(cluster_id),
    ]);
    let reservations = client.describe_instances(&query).await?;

    let mut instances = Vec::new();
    for instance in reservations.into_iter().flat_map(|r| r.instances) {
        match instance_has_allowed_state(&instance, state_filter) {
            Ok(()) => instances.push(instance),
            Err(e) => warn!("Excluding instance matching {}: {}", machine_name, e),
        }
    }

    debug!("Found {} instances for machine {}", instances.len(), machine_name);
    Ok(instances)
}

/// All non-terminated instances for the Machine
pub async fn get_existing_instances(
    client: &dyn CloudClient,
    machine: &Machine,
) -> Result<Vec<Instance>> {
    get_instances(client, machine, &existing_instance_states()).await
}

/// Stopped or stopping instances for the Machine
pub async fn get_stopped_instances(
    client: &dyn CloudClient,
    machine: &Machine,
) -> Result<Vec<Instance>> {
    get_instances(client, machine, &stopped_instance_states()).await
}

/// The single instance with the given id.
///
/// The provider must return exactly one reservation holding exactly one
/// instance. The instance is returned only when its state passes the filter.
#[instrument(skip(client, state_filter))]
pub async fn get_instance_by_id(
    client: &dyn CloudClient,
    id: &str,
    state_filter: &[InstanceState],
) -> Result<Instance> {
    if id.is_empty() {
        return Err(Error::ValidationError("instance-id not specified".to_string()));
    }

    let mut reservations = client
        .describe_instances(&InstanceQuery::Ids(vec![id.to_string()]))
        .await?;

    if reservations.len() != 1 {
        return Err(Error::NotFound(format!(
            "found {} reservations for instance-id {}",
            reservations.len(),
            id
        )));
    }
    let mut instances = reservations.remove(0).instances;
    if instances.len() != 1 {
        return Err(Error::NotFound(format!(
            "found {} instances for instance-id {}",
            instances.len(),
            id
        )));
    }

    let instance = instances.remove(0);
    instance_has_allowed_state(&instance, state_filter)?;
    Ok(instance)
}

pub async fn get_existing_instance_by_id(client: &dyn CloudClient, id: &str) -> Result<Instance> {
    get_instance_by_id(client, id, &existing_instance_states()).await
}

/// Terminate all given instances with a single request
#[instrument(skip(client, instances), fields(count = instances.len()))]
pub async fn terminate_instances(
    client: &dyn CloudClient,
    instances: &[Instance],
) -> Result<Vec<InstanceStateChange>> {
    let mut instance_ids = Vec::with_capacity(instances.len());
    for instance in instances {
        let id = instance.id()?;
        info!(
            instance_id = %id,
            state = ?instance.state,
            launch_time = ?instance.launch_time,
            "Cleaning up extraneous instance for machine"
        );
        instance_ids.push(id.to_string());
    }
    if instance_ids.is_empty() {
        return Ok(Vec::new());
    }

    for id in &instance_ids {
        info!("Terminating {} instance", id);
    }

    client
        .terminate_instances(&instance_ids)
        .await
        .map_err(|e| {
            error!("Error terminating instances: {}", e);
            Error::from(e)
        })
}
