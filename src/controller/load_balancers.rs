//! Load balancer attachment
//!
//! Classic load balancers register members by instance id. Target-group
//! based balancers register either by instance id or by private IP,
//! depending on each group's target type. Per-balancer and per-group
//! failures are collected into a [`MultiError`] instead of aborting the batch.

use tracing::{debug, error, info, instrument};

use crate::cloud::{
    CloudClient, Instance, Target, TargetGroup, TargetType, ERR_CODE_INVALID_TARGET,
    ERR_CODE_TARGET_GROUP_NOT_FOUND,
};
use crate::crd::{AwsLoadBalancerType, AwsMachineProviderConfig};
use crate::error::{Error, MultiError, Result};

/// Register `instance` with every named classic load balancer
#[instrument(skip(client, instance), fields(instance_id = ?instance.instance_id))]
pub async fn register_with_classic_load_balancers(
    client: &dyn CloudClient,
    names: &[String],
    instance: &Instance,
) -> Result<()> {
    let instance_id = instance.id()?.to_string();
    debug!("Updating classic load balancer registration for {}", instance_id);

    let mut errs = MultiError::new();
    for name in names {
        if let Err(e) = client
            .register_instances_with_load_balancer(name, std::slice::from_ref(&instance_id))
            .await
        {
            error!(load_balancer = %name, "Failed to register instance {}: {}", instance_id, e);
            errs.push(name.as_str(), e);
        }
    }
    errs.into_result()
}

/// Resolve load balancer names to all of their target groups.
///
/// Any describe failure aborts the whole resolution. An empty name list
/// resolves to nothing without calling the provider, which would otherwise
/// describe every load balancer in the account.
pub async fn gather_load_balancer_target_groups(
    client: &dyn CloudClient,
    names: &[String],
) -> Result<Vec<TargetGroup>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let load_balancers = client.describe_load_balancers(names).await.map_err(|e| {
        error!("Failed to describe load balancers {:?}: {}", names, e);
        e
    })?;

    let mut target_groups = Vec::new();
    for lb in &load_balancers {
        debug!("Retrieving target groups for load balancer {}", lb.name);
        let groups = client.describe_target_groups(&lb.arn).await.map_err(|e| {
            error!("Failed to retrieve target groups for {:?}: {}", lb.name, e);
            e
        })?;
        target_groups.extend(groups);
    }
    Ok(target_groups)
}

/// Register `instance` with every target group of the named balancers
#[instrument(skip(client, instance), fields(instance_id = ?instance.instance_id))]
pub async fn register_with_network_load_balancers(
    client: &dyn CloudClient,
    names: &[String],
    instance: &Instance,
) -> Result<()> {
    let instance_id = instance.id()?;
    debug!("Updating network load balancer registration for {}", instance_id);
    let target_groups = gather_load_balancer_target_groups(client, names).await?;

    let mut errs = MultiError::new();
    for group in &target_groups {
        let target = match Target::for_group(group, instance) {
            Ok(target) => target,
            Err(e) => {
                errs.push(group.arn.as_str(), e);
                continue;
            }
        };
        debug!(
            "Registering {} with target group {} as {:?}",
            instance_id, group.arn, group.target_type
        );
        if let Err(e) = client
            .register_targets(&group.arn, std::slice::from_ref(&target))
            .await
        {
            error!(
                "Failed to register instance {:?} with target group {:?}: {}",
                instance_id, group.arn, e
            );
            errs.push(group.arn.as_str(), e);
        }
    }
    errs.into_result()
}

/// Remove the instance's private IP from every IP-typed target group of the
/// named balancers.
///
/// Instance-typed groups drop terminated instances on their own and are left
/// alone. Targets or groups that are already gone count as removed.
#[instrument(skip(client, instance), fields(instance_id = ?instance.instance_id))]
pub async fn deregister_network_load_balancers(
    client: &dyn CloudClient,
    names: &[String],
    instance: &Instance,
) -> Result<()> {
    let instance_id = instance.instance_id.as_deref().unwrap_or_default();
    let target = match Target::by_ip(instance) {
        Ok(target) => target,
        Err(_) => {
            debug!("Instance {:?} does not have private ip, skipping...", instance_id);
            return Ok(());
        }
    };

    debug!("Removing network load balancer registration for {:?}", instance_id);
    let target_groups = gather_load_balancer_target_groups(client, names).await?;

    let mut errs = MultiError::new();
    for group in target_groups
        .iter()
        .filter(|g| g.target_type == TargetType::Ip)
    {
        debug!(
            "Unregistering instance {:?} registered by ip from target group {}",
            instance_id, group.arn
        );
        match client
            .deregister_targets(&group.arn, std::slice::from_ref(&target))
            .await
        {
            Ok(()) => {}
            Err(e) if e.has_code(&[ERR_CODE_INVALID_TARGET, ERR_CODE_TARGET_GROUP_NOT_FOUND]) => {
                debug!("Target group {} already released {:?}: {}", group.arn, instance_id, e);
            }
            Err(e) => {
                error!(
                    "Failed to unregister instance {:?} from target group {:?}: {}",
                    instance_id, group.arn, e
                );
                errs.push(group.arn.as_str(), e);
            }
        }
    }
    errs.into_result()
}

/// Register the instance with every load balancer listed in the provider spec.
///
/// Classic balancers go first; a classic failure stops before the network
/// balancers are touched.
pub async fn register_with_load_balancers(
    client: &dyn CloudClient,
    provider_config: &AwsMachineProviderConfig,
    instance: &Instance,
) -> Result<()> {
    let classic = provider_config.load_balancer_names(AwsLoadBalancerType::Classic);
    let network = provider_config.load_balancer_names(AwsLoadBalancerType::Network);
    if classic.is_empty() && network.is_empty() {
        debug!("No load balancers to register");
        return Ok(());
    }

    if !classic.is_empty() {
        register_with_classic_load_balancers(client, &classic, instance)
            .await
            .map_err(|e| wrap("register", "classic", e))?;
    }
    if !network.is_empty() {
        register_with_network_load_balancers(client, &network, instance)
            .await
            .map_err(|e| wrap("register", "network", e))?;
    }

    info!(
        classic = classic.len(),
        network = network.len(),
        "Registered instance {:?} with load balancers",
        instance.instance_id
    );
    Ok(())
}

/// Detach the instance from the IP-typed target groups of the network
/// balancers listed in the provider spec
pub async fn deregister_from_load_balancers(
    client: &dyn CloudClient,
    provider_config: &AwsMachineProviderConfig,
    instance: &Instance,
) -> Result<()> {
    let network = provider_config.load_balancer_names(AwsLoadBalancerType::Network);
    if network.is_empty() {
        return Ok(());
    }
    deregister_network_load_balancers(client, &network, instance)
        .await
        .map_err(|e| wrap("deregister", "network", e))
}

fn wrap(action: &'static str, generation: &'static str, source: Error) -> Error {
    Error::LoadBalancer {
        action,
        generation,
        source: Box::new(source),
    }
}
