//! Compute units: task definitions and their containers.
//!
//! A compute unit bundles one or more containers scheduled together with
//! one network interface per unit. Shared volumes must be declared on
//! the unit before a container may mount them; the builder rejects a
//! mount against an undeclared volume instead of letting the deployment
//! engine discover it later.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::ContainerConfig;
use crate::error::{Error, Result};
use crate::graph::{Resource, ResourceGraph};
use crate::naming::IdRegistry;

use super::logging::LogSink;

/// Resolve a logical image name to a container image handle.
///
/// The image lives in an externally hosted registry; the handle is a
/// URI expression the deployment engine resolves against the owning
/// account. Resolving the same name twice yields the same handle; two
/// names that collapse to the same identifier are rejected up front.
pub fn resolve_image(registry: &mut IdRegistry, name: &str) -> Result<Value> {
    registry.register(name)?;
    Ok(json!({
        "Fn::Sub": format!(
            "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.amazonaws.com/{name}:latest"
        )
    }))
}

/// A declared task definition, addressed by its logical id.
#[derive(Debug, Clone)]
pub struct ComputeUnit {
    pub logical_id: String,
}

/// Builder for one task definition.
#[derive(Debug)]
pub struct ComputeUnitBuilder {
    family: String,
    logical_id: String,
    log_driver: Value,
    volumes: Vec<String>,
    containers: Vec<Value>,
}

impl ComputeUnitBuilder {
    pub fn new(registry: &mut IdRegistry, name: &str, log_sink: &LogSink) -> Result<Self> {
        let base = registry.register(name)?;
        Ok(Self {
            family: name.to_string(),
            logical_id: format!("{base}TaskDef"),
            log_driver: log_sink.driver(),
            volumes: Vec::new(),
            containers: Vec::new(),
        })
    }

    /// Declare a named shared volume (local driver, task scope).
    pub fn add_volume(&mut self, name: &str) -> &mut Self {
        self.volumes.push(name.to_string());
        self
    }

    /// Add a container. Mount points are checked against the volumes
    /// declared so far.
    pub fn add_container(
        &mut self,
        registry: &mut IdRegistry,
        config: &ContainerConfig,
    ) -> Result<&mut Self> {
        for mount in &config.mount_points {
            if !self.volumes.iter().any(|name| *name == mount.source_volume) {
                return Err(Error::UnknownVolume {
                    container: config.name.clone(),
                    volume: mount.source_volume.clone(),
                    family: self.family.clone(),
                });
            }
        }

        let image = resolve_image(registry, &config.image)?;
        debug!(container = %config.name, image = %config.image, family = %self.family, "adding container");

        let mut definition = Map::new();
        definition.insert("Name".to_string(), json!(config.name));
        definition.insert("Image".to_string(), image);
        definition.insert("Memory".to_string(), json!(config.memory_limit_mib));
        definition.insert("Essential".to_string(), json!(true));

        if !config.environment.is_empty() {
            let environment: Vec<Value> = config
                .environment
                .iter()
                .map(|(name, value)| json!({ "Name": name, "Value": value }))
                .collect();
            definition.insert("Environment".to_string(), json!(environment));
        }

        if !config.secrets.is_empty() {
            let secrets: Vec<Value> = config
                .secrets
                .iter()
                .map(|(name, secret)| {
                    json!({
                        "Name": name,
                        "ValueFrom": format!("{}:{}::", secret.secret, secret.key),
                    })
                })
                .collect();
            definition.insert("Secrets".to_string(), json!(secrets));
        }

        if !config.port_mappings.is_empty() {
            let ports: Vec<Value> = config
                .port_mappings
                .iter()
                .map(|port| json!({ "ContainerPort": port }))
                .collect();
            definition.insert("PortMappings".to_string(), json!(ports));
        }

        if !config.mount_points.is_empty() {
            let mounts: Vec<Value> = config
                .mount_points
                .iter()
                .map(|mount| {
                    json!({
                        "ContainerPath": mount.container_path,
                        "SourceVolume": mount.source_volume,
                        "ReadOnly": mount.read_only,
                    })
                })
                .collect();
            definition.insert("MountPoints".to_string(), json!(mounts));
        }

        definition.insert("LogConfiguration".to_string(), self.log_driver.clone());

        self.containers.push(Value::Object(definition));
        Ok(self)
    }

    /// Declare the finished task definition in the graph.
    pub fn declare(self, graph: &mut ResourceGraph) -> Result<ComputeUnit> {
        let mut properties = Map::new();
        properties.insert("Family".to_string(), json!(self.family));
        properties.insert("NetworkMode".to_string(), json!("awsvpc"));
        properties.insert("RequiresCompatibilities".to_string(), json!(["EC2"]));
        properties.insert(
            "ContainerDefinitions".to_string(),
            json!(self.containers),
        );

        if !self.volumes.is_empty() {
            let volumes: Vec<Value> = self
                .volumes
                .iter()
                .map(|name| {
                    json!({
                        "Name": name,
                        "DockerVolumeConfiguration": { "Driver": "local", "Scope": "task" },
                    })
                })
                .collect();
            properties.insert("Volumes".to_string(), json!(volumes));
        }

        graph.add(
            &self.logical_id,
            Resource::new("AWS::ECS::TaskDefinition", Value::Object(properties)),
        )?;

        Ok(ComputeUnit {
            logical_id: self.logical_id,
        })
    }
}
