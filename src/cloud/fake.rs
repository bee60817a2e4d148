//! Scripted in-memory [`CloudClient`] that records every call

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    DescribeInstances(InstanceQuery),
    CreateTags {
        resource_ids: Vec<String>,
        tags: Vec<Tag>,
    },
    DeleteTags {
        resource_ids: Vec<String>,
        tags: Vec<Tag>,
    },
    TerminateInstances(Vec<String>),
    RegisterInstancesWithLoadBalancer {
        load_balancer: String,
        instance_ids: Vec<String>,
    },
    DescribeLoadBalancers(Vec<String>),
    DescribeTargetGroups(String),
    RegisterTargets {
        target_group_arn: String,
        targets: Vec<Target>,
    },
    DeregisterTargets {
        target_group_arn: String,
        targets: Vec<Target>,
    },
}

impl Call {
    fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Call::DescribeInstances(_) | Call::DescribeLoadBalancers(_) | Call::DescribeTargetGroups(_)
        )
    }
}

#[derive(Default)]
pub(crate) struct FakeCloud {
    pub reservations: Vec<Reservation>,
    pub describe_instances_error: Option<CloudError>,
    pub tag_error: Option<CloudError>,
    pub terminate_error: Option<CloudError>,
    pub load_balancers: Vec<LoadBalancer>,
    pub describe_load_balancers_error: Option<CloudError>,
    /// Target groups keyed by load balancer ARN
    pub target_groups: HashMap<String, Vec<TargetGroup>>,
    pub describe_target_groups_errors: HashMap<String, CloudError>,
    /// Registration failures keyed by classic load balancer name or target group ARN
    pub register_errors: HashMap<String, CloudError>,
    /// Deregistration failures keyed by target group ARN
    pub deregister_errors: HashMap<String, CloudError>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(instances: Vec<Instance>) -> Self {
        Self {
            reservations: vec![Reservation { instances }],
            ..Default::default()
        }
    }

    /// One network load balancer `name` whose target groups are `groups`
    pub fn add_network_load_balancer(&mut self, name: &str, groups: Vec<TargetGroup>) {
        let arn = format!("arn:aws:elasticloadbalancing:lb/{name}");
        self.load_balancers.push(LoadBalancer {
            name: name.to_string(),
            arn: arn.clone(),
        });
        self.target_groups.insert(arn, groups);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CloudClient for FakeCloud {
    async fn describe_instances(&self, query: &InstanceQuery) -> CloudResult<Vec<Reservation>> {
        self.record(Call::DescribeInstances(query.clone()));
        match &self.describe_instances_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.reservations.clone()),
        }
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> CloudResult<()> {
        self.record(Call::CreateTags {
            resource_ids: resource_ids.to_vec(),
            tags: tags.to_vec(),
        });
        self.tag_error.clone().map_or(Ok(()), Err)
    }

    async fn delete_tags(&self, resource_ids: &[String], tags: &[Tag]) -> CloudResult<()> {
        self.record(Call::DeleteTags {
            resource_ids: resource_ids.to_vec(),
            tags: tags.to_vec(),
        });
        self.tag_error.clone().map_or(Ok(()), Err)
    }

    async fn terminate_instances(
        &self,
        instance_ids: &[String],
    ) -> CloudResult<Vec<InstanceStateChange>> {
        self.record(Call::TerminateInstances(instance_ids.to_vec()));
        if let Some(e) = &self.terminate_error {
            return Err(e.clone());
        }
        Ok(instance_ids
            .iter()
            .map(|id| InstanceStateChange {
                instance_id: id.clone(),
                previous_state: Some(InstanceState::Running),
                current_state: Some(InstanceState::ShuttingDown),
            })
            .collect())
    }

    async fn register_instances_with_load_balancer(
        &self,
        load_balancer_name: &str,
        instance_ids: &[String],
    ) -> CloudResult<()> {
        self.record(Call::RegisterInstancesWithLoadBalancer {
            load_balancer: load_balancer_name.to_string(),
            instance_ids: instance_ids.to_vec(),
        });
        self.register_errors
            .get(load_balancer_name)
            .cloned()
            .map_or(Ok(()), Err)
    }

    async fn describe_load_balancers(&self, names: &[String]) -> CloudResult<Vec<LoadBalancer>> {
        self.record(Call::DescribeLoadBalancers(names.to_vec()));
        if let Some(e) = &self.describe_load_balancers_error {
            return Err(e.clone());
        }
        Ok(self
            .load_balancers
            .iter()
            .filter(|lb| names.contains(&lb.name))
            .cloned()
            .collect())
    }

    async fn describe_target_groups(
        &self,
        load_balancer_arn: &str,
    ) -> CloudResult<Vec<TargetGroup>> {
        self.record(Call::DescribeTargetGroups(load_balancer_arn.to_string()));
        if let Some(e) = self.describe_target_groups_errors.get(load_balancer_arn) {
            return Err(e.clone());
        }
        Ok(self
            .target_groups
            .get(load_balancer_arn)
            .cloned()
            .unwrap_or_default())
    }

    async fn register_targets(
        &self,
        target_group_arn: &str,
        targets: &[Target],
    ) -> CloudResult<()> {
        self.record(Call::RegisterTargets {
            target_group_arn: target_group_arn.to_string(),
            targets: targets.to_vec(),
        });
        self.register_errors
            .get(target_group_arn)
            .cloned()
            .map_or(Ok(()), Err)
    }

    async fn deregister_targets(
        &self,
        target_group_arn: &str,
        targets: &[Target],
    ) -> CloudResult<()> {
        self.record(Call::DeregisterTargets {
            target_group_arn: target_group_arn.to_string(),
            targets: targets.to_vec(),
        });
        self.deregister_errors
            .get(target_group_arn)
            .cloned()
            .map_or(Ok(()), Err)
    }
}
