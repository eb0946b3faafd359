//! Imported network and security boundary.
//!
//! Both are owned and managed outside this crate. Importing them only
//! captures their identifiers for wiring; no resource is declared and
//! teardown never touches them.

use crate::config::NetworkConfig;

/// Externally owned VPC with its subnets grouped by tier.
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc_id: String,
    pub availability_zones: Vec<String>,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
}

impl Network {
    #[must_use]
    pub fn import(config: &NetworkConfig) -> Self {
        Self {
            vpc_id: config.vpc_id.clone(),
            availability_zones: config.availability_zones.clone(),
            public_subnet_ids: config.public_subnet_ids.clone(),
            private_subnet_ids: config.private_subnet_ids.clone(),
        }
    }
}

/// Externally owned security group shared by every service.
#[derive(Debug, Clone)]
pub struct SecurityBoundary {
    pub group_id: String,
}

impl SecurityBoundary {
    #[must_use]
    pub fn import(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
        }
    }
}
