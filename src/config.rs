//! Topology configuration.
//!
//! Externalized configuration surface for the topology: network
//! identifiers, capacity, logging, per-service containers with
//! environment maps and secret references, and the load balancer front.
//! Loaded from a YAML file and validated before any resource is declared.
//!
//! Database credentials and similar sensitive values never appear here as
//! literals. They are declared as references into an external secret
//! store and resolved at deploy time by the deployment engine.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main topology configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyConfig {
    /// Externally owned network to deploy into
    pub network: NetworkConfig,

    /// Externally owned security group shared by all services
    pub security_group_id: String,

    /// Cluster compute capacity
    pub capacity: CapacityConfig,

    /// Shared log sink configuration
    pub logging: LoggingConfig,

    /// Private DNS namespace for service discovery
    pub namespace: String,

    /// Services in declaration order
    pub services: Vec<ServiceConfig>,

    /// Public entry point
    pub load_balancer: LoadBalancerConfig,
}

/// Identifiers of the imported network. Never created or destroyed by
/// this crate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub vpc_id: String,
    pub availability_zones: Vec<String>,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
}

/// Instance pool backing the cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityConfig {
    pub instance_type: String,
    pub instance_count: u32,
}

/// Shared log group settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub group_name: String,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_stream_prefix")]
    pub stream_prefix: String,
}

/// One service: a task definition with one or more containers, run on
/// the cluster, optionally registered for discovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub name: String,

    /// Discovery name under the shared namespace. Omit to skip discovery.
    #[serde(default)]
    pub discovery: Option<String>,

    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    #[serde(default = "default_grace_period_seconds")]
    pub health_check_grace_period_seconds: u32,

    /// Named shared volumes available to this service's containers
    #[serde(default)]
    pub volumes: Vec<String>,

    pub containers: Vec<ContainerConfig>,
}

/// One container inside a task definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfig {
    pub name: String,

    /// Logical image name resolved against the external image registry,
    /// e.g. `ch04/todoapi`
    pub image: String,

    #[serde(default = "default_memory_limit_mib")]
    pub memory_limit_mib: u32,

    /// Flat string environment, no nesting
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Environment entries injected from the external secret store
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretRef>,

    #[serde(default)]
    pub port_mappings: Vec<u16>,

    #[serde(default)]
    pub mount_points: Vec<MountPointConfig>,
}

/// Reference into the external secret store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Secret name in the store, e.g. `todo/db`
    pub secret: String,
    /// Key within the secret
    pub key: String,
}

/// Shared-volume mount point inside a container.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountPointConfig {
    pub container_path: String,
    pub source_volume: String,

    #[serde(default)]
    pub read_only: bool,
}

/// Public load balancer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerConfig {
    pub name: String,
    pub target_group_name: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    #[serde(default = "default_deregistration_delay_seconds")]
    pub deregistration_delay_seconds: u32,

    /// Name of the service the target group forwards to
    pub target_service: String,
}

fn default_retention_days() -> u32 {
    14
}

fn default_stream_prefix() -> String {
    "ecs".to_string()
}

fn default_desired_count() -> u32 {
    1
}

fn default_grace_period_seconds() -> u32 {
    300
}

fn default_memory_limit_mib() -> u32 {
    512
}

fn default_http_port() -> u16 {
    80
}

fn default_deregistration_delay_seconds() -> u32 {
    30
}

impl TopologyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a deployable topology.
    pub fn validate(&self) -> Result<()> {
        if self.network.vpc_id.trim().is_empty() {
            return Err(Error::Config("network.vpcId must not be empty".into()));
        }
        if self.network.availability_zones.is_empty() {
            return Err(Error::Config(
                "network.availabilityZones must not be empty".into(),
            ));
        }
        let zones = self.network.availability_zones.len();
        if self.network.public_subnet_ids.len() != zones
            || self.network.private_subnet_ids.len() != zones
        {
            return Err(Error::Config(format!(
                "expected {zones} public and private subnet ids, one per availability zone"
            )));
        }
        if self.security_group_id.trim().is_empty() {
            return Err(Error::Config("securityGroupId must not be empty".into()));
        }
        if self.capacity.instance_type.trim().is_empty() {
            return Err(Error::Config("capacity.instanceType must not be empty".into()));
        }
        if self.capacity.instance_count == 0 {
            return Err(Error::Config("capacity.instanceCount must be at least 1".into()));
        }
        if self.logging.group_name.trim().is_empty() {
            return Err(Error::Config("logging.groupName must not be empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".into()));
        }
        if self.services.is_empty() {
            return Err(Error::Config("at least one service is required".into()));
        }

        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(Error::Config("service name must not be empty".into()));
            }
            if service.containers.is_empty() {
                return Err(Error::Config(format!(
                    "service '{}' declares no containers",
                    service.name
                )));
            }
            let duplicates = self
                .services
                .iter()
                .filter(|other| other.name == service.name)
                .count();
            if duplicates > 1 {
                return Err(Error::Config(format!(
                    "service '{}' is declared more than once",
                    service.name
                )));
            }
        }

        let target = self
            .services
            .iter()
            .find(|service| service.name == self.load_balancer.target_service)
            .ok_or_else(|| {
                Error::Config(format!(
                    "loadBalancer.targetService '{}' is not a declared service",
                    self.load_balancer.target_service
                ))
            })?;
        if !target
            .containers
            .iter()
            .any(|container| !container.port_mappings.is_empty())
        {
            return Err(Error::Config(format!(
                "loadBalancer.targetService '{}' has no container with a port mapping",
                target.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r"
network:
  vpcId: vpc-12345678
  availabilityZones: [ap-northeast-1a]
  publicSubnetIds: [subnet-aaaaaaaa]
  privateSubnetIds: [subnet-bbbbbbbb]
securityGroupId: sg-123456789abcdef01
capacity:
  instanceType: t2.micro
  instanceCount: 1
logging:
  groupName: ecs/sample
namespace: sample
services:
  - name: web
    containers:
      - name: web
        image: sample/web
        portMappings: [80]
loadBalancer:
  name: sample
  targetGroupName: sampletarget
  targetService: web
"
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.logging.retention_days, 14);
        assert_eq!(config.logging.stream_prefix, "ecs");
        let service = &config.services[0];
        assert_eq!(service.desired_count, 1);
        assert_eq!(service.health_check_grace_period_seconds, 300);
        assert_eq!(service.containers[0].memory_limit_mib, 512);
        assert_eq!(config.load_balancer.port, 80);
        assert_eq!(config.load_balancer.deregistration_delay_seconds, 30);
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.capacity.instance_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_missing_availability_zones() {
        let mut config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.network.availability_zones.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_subnet_zone_mismatch() {
        let mut config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.network.private_subnet_ids.push("subnet-cccccccc".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_target_service() {
        let mut config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.load_balancer.target_service = "missing".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_target_service_without_ports() {
        let mut config: TopologyConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.services[0].containers[0].port_mappings.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.yaml");
        std::fs::write(&path, minimal_yaml()).unwrap();

        let config = TopologyConfig::from_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.namespace, "sample");
    }
}
