//! Topology assembly.
//!
//! One linear leaf-to-root pass over the configuration: imported network
//! and security boundary, log sink, cluster and capacity, discovery
//! namespace, then per service the compute unit, its containers, and the
//! service declaration with optional discovery binding, and finally the
//! load balancer front for the externally facing service. The first
//! error aborts assembly; retry and rollback belong to the deployment
//! engine.

pub mod balancer;
pub mod cluster;
pub mod compute;
pub mod discovery;
pub mod logging;
pub mod network;
pub mod service;

pub use balancer::{LoadBalancerFront, DNS_OUTPUT};
pub use cluster::Cluster;
pub use compute::{resolve_image, ComputeUnit, ComputeUnitBuilder};
pub use discovery::{DiscoveryEntry, DiscoveryNamespace};
pub use logging::LogSink;
pub use network::{Network, SecurityBoundary};
pub use service::{Service, ServiceSpec};

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{ServiceConfig, TopologyConfig};
use crate::error::{Error, Result};
use crate::graph::ResourceGraph;
use crate::naming::IdRegistry;

/// Builds the full resource graph for one topology.
pub struct TopologyBuilder {
    config: TopologyConfig,
    graph: ResourceGraph,
    registry: IdRegistry,
}

impl TopologyBuilder {
    /// Validate the configuration and prepare an empty graph.
    pub fn new(config: TopologyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            graph: ResourceGraph::new(),
            registry: IdRegistry::new(),
        })
    }

    /// Assemble the topology in one pass and return the finished graph.
    pub fn build(mut self) -> Result<Topology> {
        let config = self.config.clone();

        let network = Network::import(&config.network);
        let security = SecurityBoundary::import(&config.security_group_id);

        let log_sink = LogSink::declare(&mut self.graph, &config.logging)?;
        let cluster = Cluster::declare(&mut self.graph)?;
        cluster.add_capacity(&mut self.graph, &network, &security, &config.capacity)?;
        let namespace =
            DiscoveryNamespace::declare(&mut self.graph, &config.namespace, &network)?;

        let mut services: BTreeMap<String, Service> = BTreeMap::new();
        for service_config in &config.services {
            let service = self.declare_service(
                &log_sink,
                &cluster,
                &namespace,
                &network,
                &security,
                service_config,
            )?;
            services.insert(service_config.name.clone(), service);
        }

        let (container_name, container_port) = balancer_target(&config)?;
        let target = services
            .get(&config.load_balancer.target_service)
            .ok_or_else(|| {
                Error::Config(format!(
                    "loadBalancer.targetService '{}' was not declared",
                    config.load_balancer.target_service
                ))
            })?;
        balancer::declare_front(
            &mut self.graph,
            &config.load_balancer,
            &network,
            &security,
            target,
            &container_name,
            container_port,
        )?;

        self.graph.validate_references()?;
        info!(
            resources = self.graph.len(),
            services = services.len(),
            "topology assembled"
        );

        Ok(Topology { graph: self.graph })
    }

    fn declare_service(
        &mut self,
        log_sink: &LogSink,
        cluster: &Cluster,
        namespace: &DiscoveryNamespace,
        network: &Network,
        security: &SecurityBoundary,
        config: &ServiceConfig,
    ) -> Result<Service> {
        let mut unit = ComputeUnitBuilder::new(&mut self.registry, &config.name, log_sink)?;
        for volume in &config.volumes {
            unit.add_volume(volume);
        }
        for container in &config.containers {
            unit.add_container(&mut self.registry, container)?;
        }
        let compute_unit = unit.declare(&mut self.graph)?;

        let entry = match &config.discovery {
            Some(name) => Some(namespace.bind(&mut self.graph, &mut self.registry, name)?),
            None => None,
        };

        service::declare(
            &mut self.graph,
            &mut self.registry,
            &ServiceSpec {
                name: &config.name,
                cluster,
                compute_unit: &compute_unit,
                network,
                security,
                desired_count: config.desired_count,
                health_check_grace_period_seconds: config.health_check_grace_period_seconds,
                discovery: entry.as_ref(),
            },
        )
    }
}

/// The container the load balancer forwards to: the target service's
/// first container with a port mapping.
fn balancer_target(config: &TopologyConfig) -> Result<(String, u16)> {
    let target = config
        .services
        .iter()
        .find(|service| service.name == config.load_balancer.target_service)
        .ok_or_else(|| {
            Error::Config(format!(
                "loadBalancer.targetService '{}' is not a declared service",
                config.load_balancer.target_service
            ))
        })?;
    target
        .containers
        .iter()
        .find_map(|container| {
            container
                .port_mappings
                .first()
                .map(|port| (container.name.clone(), *port))
        })
        .ok_or_else(|| {
            Error::Config(format!(
                "loadBalancer.targetService '{}' has no container with a port mapping",
                target.name
            ))
        })
}

/// The finished topology: a validated resource graph ready for
/// synthesis.
#[derive(Debug)]
pub struct Topology {
    graph: ResourceGraph,
}

impl Topology {
    #[must_use]
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Emit the template document for the deployment engine.
    pub fn synthesize(&self) -> Result<serde_json::Value> {
        self.graph.synthesize()
    }
}
