//! Node address extraction
//!
//! Produces the ordered address list published on the Machine status:
//! interface IPs, then the public IP, then DNS names.

use std::net::IpAddr;

use crate::cloud::Instance;
use crate::config::ActuatorConfig;
use crate::crd::{NodeAddress, NodeAddressType};
use crate::error::{Error, Result};

/// Extract the node addresses of `instance`.
///
/// `domain_names` are extra suffixes appended to the first label of the
/// private DNS name to form additional internal-DNS aliases.
pub fn extract_node_addresses(
    instance: Option<&Instance>,
    domain_names: &[String],
) -> Result<Vec<NodeAddress>> {
    let instance = instance.ok_or_else(|| {
        Error::ValidationError("nil instance passed to extract_node_addresses".to_string())
    })?;
    let instance_id = instance.instance_id.as_deref().unwrap_or_default();

    let mut addresses = Vec::new();

    for interface in instance.network_interfaces.iter().filter(|ni| ni.is_in_use()) {
        // IPv6 is reported as InternalIP, matching the cloud-provider convention
        for addr in interface.ipv6_addresses.iter().filter(|a| !a.is_empty()) {
            let ip = parse_ip(instance_id, "IPv6", addr)?;
            addresses.push(NodeAddress::new(NodeAddressType::InternalIp, ip));
        }
        for addr in interface.private_ip_addresses.iter().filter(|a| !a.is_empty()) {
            let ip = parse_ip(instance_id, "private", addr)?;
            addresses.push(NodeAddress::new(NodeAddressType::InternalIp, ip));
        }
    }

    if let Some(public_ip) = non_empty(&instance.public_ip_address) {
        let ip = parse_ip(instance_id, "public", public_ip)?;
        addresses.push(NodeAddress::new(NodeAddressType::ExternalIp, ip));
    }

    if let Some(private_dns) = non_empty(&instance.private_dns_name) {
        addresses.push(NodeAddress::new(NodeAddressType::InternalDns, private_dns));
        addresses.push(NodeAddress::new(NodeAddressType::Hostname, private_dns));

        let host = private_dns.split('.').next().unwrap_or(private_dns);
        for domain in domain_names {
            let alias = format!("{host}.{domain}");
            if alias != private_dns {
                addresses.push(NodeAddress::new(NodeAddressType::InternalDns, alias));
            }
        }
    }

    if let Some(public_dns) = non_empty(&instance.public_dns_name) {
        addresses.push(NodeAddress::new(NodeAddressType::ExternalDns, public_dns));
    }

    Ok(addresses)
}

/// [`extract_node_addresses`] using the configured DNS suffixes
pub fn extract_node_addresses_with_config(
    instance: Option<&Instance>,
    config: &ActuatorConfig,
) -> Result<Vec<NodeAddress>> {
    extract_node_addresses(instance, &config.internal_dns_suffixes)
}

fn parse_ip(instance_id: &str, kind: &'static str, addr: &str) -> Result<String> {
    addr.parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| Error::InvalidAddress {
            instance_id: instance_id.to_string(),
            kind,
            address: addr.to_string(),
        })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
