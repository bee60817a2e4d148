//! Machine reconciliation against EC2 instances
//! This module contains instance lookup, tag reconciliation, status
//! conditions, node addresses and load balancer attachment.

pub mod addresses;
pub mod conditions;
pub mod instances;
pub mod load_balancers;
pub mod tags;

pub use addresses::{extract_node_addresses, extract_node_addresses_with_config};
pub use conditions::{
    condition_failed, condition_success, find_provider_condition, set_provider_condition,
};
pub use instances::{
    existing_instance_states, get_existing_instance_by_id, get_existing_instances,
    get_instance_by_id, get_instances, get_running_from_instances, get_stopped_instances,
    instance_has_allowed_state, stopped_instance_states, terminate_instances,
};
pub use load_balancers::{
    deregister_from_load_balancers, deregister_network_load_balancers,
    gather_load_balancer_target_groups, register_with_classic_load_balancers,
    register_with_load_balancers, register_with_network_load_balancers,
};
pub use tags::{
    correct_existing_tags, fetch_infra_resource_tags, validate_user_tag, DesiredTags,
    IdentityTagRequirements, TagUpdate,
};
