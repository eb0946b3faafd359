//! Private DNS service discovery.
//!
//! One private namespace per topology; every discovery entry is a
//! sibling A record under it. Entries carry an explicit delete policy so
//! topology teardown removes the registration instead of orphaning it.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::graph::{get_att, DeletionPolicy, Resource, ResourceGraph};
use crate::naming::IdRegistry;

use super::network::Network;

const NAMESPACE_ID: &str = "PrivateDnsNamespace";

/// DNS record time-to-live for discovery entries, in seconds.
const DNS_TTL: &str = "60";

/// The topology's single private DNS namespace.
#[derive(Debug, Clone)]
pub struct DiscoveryNamespace {
    logical_id: String,
}

impl DiscoveryNamespace {
    pub fn declare(graph: &mut ResourceGraph, name: &str, network: &Network) -> Result<Self> {
        debug!(namespace = %name, "declaring private DNS namespace");
        graph.add(
            NAMESPACE_ID,
            Resource::new(
                "AWS::ServiceDiscovery::PrivateDnsNamespace",
                json!({
                    "Name": name,
                    "Vpc": network.vpc_id,
                }),
            ),
        )?;
        Ok(Self {
            logical_id: NAMESPACE_ID.to_string(),
        })
    }

    /// Declare a discovery entry for `name` under this namespace.
    ///
    /// The entry publishes an A record with a short TTL and relies on a
    /// custom health check with a single-failure threshold, so an
    /// unhealthy task drops out of DNS on the first miss.
    pub fn bind(
        &self,
        graph: &mut ResourceGraph,
        registry: &mut IdRegistry,
        name: &str,
    ) -> Result<DiscoveryEntry> {
        let logical_id = format!("{}ServiceDiscovery", registry.register(name)?);
        debug!(entry = %name, id = %logical_id, "declaring discovery entry");
        graph.add(
            &logical_id,
            Resource::new(
                "AWS::ServiceDiscovery::Service",
                json!({
                    "Name": name,
                    "DnsConfig": {
                        "NamespaceId": get_att(&self.logical_id, "Id"),
                        "DnsRecords": [
                            { "Type": "A", "TTL": DNS_TTL },
                        ],
                    },
                    "HealthCheckCustomConfig": {
                        "FailureThreshold": 1,
                    },
                }),
            )
            .with_deletion_policy(DeletionPolicy::Delete),
        )?;
        Ok(DiscoveryEntry { logical_id })
    }
}

/// A declared discovery entry.
#[derive(Debug, Clone)]
pub struct DiscoveryEntry {
    pub logical_id: String,
}

impl DiscoveryEntry {
    /// Registry linkage element for the owning service declaration.
    #[must_use]
    pub fn registry_linkage(&self) -> serde_json::Value {
        json!({ "RegistryArn": get_att(&self.logical_id, "Arn") })
    }
}
