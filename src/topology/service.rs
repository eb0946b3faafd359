//! Running services.
//!
//! A service is a scaled instance of one compute unit, bound to the
//! cluster, the shared security boundary, and the private subnets.
//! Discovery is part of the service's construction input rather than a
//! patch applied afterwards; the declared result carries at most one
//! registry linkage.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::graph::{reference, Resource, ResourceGraph};
use crate::naming::IdRegistry;

use super::cluster::Cluster;
use super::compute::ComputeUnit;
use super::discovery::DiscoveryEntry;
use super::network::{Network, SecurityBoundary};

/// Construction input for one service declaration.
pub struct ServiceSpec<'a> {
    pub name: &'a str,
    pub cluster: &'a Cluster,
    pub compute_unit: &'a ComputeUnit,
    pub network: &'a Network,
    pub security: &'a SecurityBoundary,
    pub desired_count: u32,
    pub health_check_grace_period_seconds: u32,
    pub discovery: Option<&'a DiscoveryEntry>,
}

/// A declared service, addressed by its logical id.
#[derive(Debug, Clone)]
pub struct Service {
    pub logical_id: String,
}

/// Declare a service from its spec.
pub fn declare(
    graph: &mut ResourceGraph,
    registry: &mut IdRegistry,
    spec: &ServiceSpec<'_>,
) -> Result<Service> {
    let logical_id = format!("{}Service", registry.register(spec.name)?);
    debug!(service = %spec.name, id = %logical_id, "declaring service");

    let mut properties = json!({
        "Cluster": reference(&spec.cluster.logical_id),
        "TaskDefinition": reference(&spec.compute_unit.logical_id),
        "DesiredCount": spec.desired_count,
        "LaunchType": "EC2",
        "HealthCheckGracePeriodSeconds": spec.health_check_grace_period_seconds,
        "NetworkConfiguration": {
            "AwsvpcConfiguration": {
                "SecurityGroups": [spec.security.group_id],
                "Subnets": spec.network.private_subnet_ids,
            }
        },
    });

    if let Some(entry) = spec.discovery {
        properties["ServiceRegistries"] = json!([entry.registry_linkage()]);
    }

    graph.add(&logical_id, Resource::new("AWS::ECS::Service", properties))?;

    Ok(Service { logical_id })
}
