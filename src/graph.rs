//! Resource graph and template synthesis.
//!
//! Declarations accumulate in insertion order and are emitted as one
//! CloudFormation-style template. Every `Ref` / `Fn::GetAtt` target and
//! every explicit dependency is checked against the graph before
//! synthesis, so a missing prerequisite fails here instead of inside the
//! external deployment engine.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Teardown behavior recorded on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
}

/// A single logical resource declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Resource type, e.g. `AWS::ECS::Service`.
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(rename = "Properties")]
    pub properties: Value,

    /// Explicit ordering edges beyond what property references imply.
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    #[must_use]
    pub fn new(kind: &str, properties: Value) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
        }
    }

    #[must_use]
    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }
}

/// A named template output.
#[derive(Debug, Clone)]
pub struct Output {
    pub name: String,
    pub value: Value,
    pub description: Option<String>,
}

/// `{"Ref": id}` expression.
#[must_use]
pub fn reference(id: &str) -> Value {
    json!({ "Ref": id })
}

/// `{"Fn::GetAtt": [id, attribute]}` expression.
#[must_use]
pub fn get_att(id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

/// Ordered collection of resource declarations plus named outputs.
///
/// Insertion order is preserved so synthesized templates are
/// deterministic and read leaf to root, the order the builder declared
/// them in.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    resources: Vec<(String, Resource)>,
    outputs: Vec<Output>,
}

impl ResourceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration under `id`. Logical ids are unique per graph.
    pub fn add(&mut self, id: &str, resource: Resource) -> Result<()> {
        if self.contains(id) {
            return Err(Error::DuplicateResource { id: id.to_string() });
        }
        self.resources.push((id.to_string(), resource));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.resources.iter().any(|(existing, _)| existing == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, resource)| resource)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|(existing, _)| existing == id)
            .map(|(_, resource)| resource)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of declarations of the given resource type.
    #[must_use]
    pub fn count_of_kind(&self, kind: &str) -> usize {
        self.resources
            .iter()
            .filter(|(_, resource)| resource.kind == kind)
            .count()
    }

    /// Logical ids of declarations of the given resource type, in
    /// insertion order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn add_output(&mut self, name: &str, value: Value, description: Option<&str>) {
        self.outputs.push(Output {
            name: name.to_string(),
            value,
            description: description.map(str::to_string),
        });
    }

    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|output| output.name == name)
    }

    /// Validate every reference, then emit the template document.
    pub fn synthesize(&self) -> Result<Value> {
        self.validate_references()?;

        let mut resources = Map::new();
        for (id, resource) in &self.resources {
            resources.insert(id.clone(), serde_json::to_value(resource)?);
        }

        let mut outputs = Map::new();
        for output in &self.outputs {
            let mut entry = Map::new();
            if let Some(description) = &output.description {
                entry.insert("Description".to_string(), json!(description));
            }
            entry.insert("Value".to_string(), output.value.clone());
            outputs.insert(output.name.clone(), Value::Object(entry));
        }

        Ok(json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": resources,
            "Outputs": outputs,
        }))
    }

    /// Check that every `Ref`, `Fn::GetAtt`, and `DependsOn` target is
    /// declared. Pseudo parameters (`AWS::Region` and friends) are owned
    /// by the deployment engine and skipped.
    pub fn validate_references(&self) -> Result<()> {
        for (id, resource) in &self.resources {
            let mut targets = Vec::new();
            collect_reference_targets(&resource.properties, &mut targets);
            targets.extend(resource.depends_on.iter().cloned());
            for target in targets {
                self.check_target(&target, id)?;
            }
        }
        for output in &self.outputs {
            let mut targets = Vec::new();
            collect_reference_targets(&output.value, &mut targets);
            for target in targets {
                self.check_target(&target, &output.name)?;
            }
        }
        Ok(())
    }

    fn check_target(&self, target: &str, referenced_by: &str) -> Result<()> {
        if target.starts_with("AWS::") || self.contains(target) {
            return Ok(());
        }
        Err(Error::UnknownResource {
            id: target.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }
}

fn collect_reference_targets(value: &Value, targets: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    targets.push(target.clone());
                    return;
                }
                if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(target)) = parts.first() {
                        targets.push(target.clone());
                    }
                    return;
                }
            }
            for nested in map.values() {
                collect_reference_targets(nested, targets);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_reference_targets(item, targets);
            }
        }
        _ => {}
    }
}
