//! Container cluster and its compute capacity.

use serde_json::json;
use tracing::debug;

use crate::config::CapacityConfig;
use crate::error::Result;
use crate::graph::{reference, Resource, ResourceGraph};

use super::network::{Network, SecurityBoundary};

const CLUSTER_ID: &str = "Cluster";
const LAUNCH_CONFIG_ID: &str = "ClusterLaunchConfig";
const CAPACITY_ID: &str = "ClusterCapacity";

/// Amazon-managed ECS-optimized AMI, resolved by the deployment engine
/// at apply time.
const ECS_OPTIMIZED_AMI: &str =
    "{{resolve:ssm:/aws/service/ecs/optimized-ami/amazon-linux-2/recommended/image_id}}";

/// The cluster hosting every service in the topology.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub logical_id: String,
}

impl Cluster {
    pub fn declare(graph: &mut ResourceGraph) -> Result<Self> {
        debug!("declaring cluster");
        graph.add(CLUSTER_ID, Resource::new("AWS::ECS::Cluster", json!({})))?;
        Ok(Self {
            logical_id: CLUSTER_ID.to_string(),
        })
    }

    /// Attach an EC2 instance pool to the cluster. Instances join the
    /// cluster through user data and live in the private subnets behind
    /// the shared security boundary.
    pub fn add_capacity(
        &self,
        graph: &mut ResourceGraph,
        network: &Network,
        security: &SecurityBoundary,
        config: &CapacityConfig,
    ) -> Result<()> {
        debug!(
            instance_type = %config.instance_type,
            instance_count = config.instance_count,
            "attaching cluster capacity"
        );

        let join_cluster = json!({
            "Fn::Base64": {
                "Fn::Join": ["", [
                    "#!/bin/bash\necho ECS_CLUSTER=",
                    reference(&self.logical_id),
                    " >> /etc/ecs/ecs.config",
                ]]
            }
        });

        graph.add(
            LAUNCH_CONFIG_ID,
            Resource::new(
                "AWS::AutoScaling::LaunchConfiguration",
                json!({
                    "ImageId": ECS_OPTIMIZED_AMI,
                    "InstanceType": config.instance_type,
                    "SecurityGroups": [security.group_id],
                    "UserData": join_cluster,
                }),
            ),
        )?;

        let count = config.instance_count.to_string();
        graph.add(
            CAPACITY_ID,
            Resource::new(
                "AWS::AutoScaling::AutoScalingGroup",
                json!({
                    "LaunchConfigurationName": reference(LAUNCH_CONFIG_ID),
                    "MinSize": count,
                    "MaxSize": count,
                    "DesiredCapacity": count,
                    "VPCZoneIdentifier": network.private_subnet_ids,
                    "AvailabilityZones": network.availability_zones,
                }),
            ),
        )?;

        Ok(())
    }
}
