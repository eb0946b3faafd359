//! Public load balancer front.
//!
//! One internet-facing load balancer with one listener and one target
//! group, forwarding to a single service's containers on a fixed port.
//! Attaching the front edits the target service declaration (its
//! load-balancer binding and an ordering edge on the listener), since the
//! front is declared after the services it sits in front of.

use serde_json::json;
use tracing::debug;

use crate::config::LoadBalancerConfig;
use crate::error::{Error, Result};
use crate::graph::{get_att, reference, Resource, ResourceGraph};

use super::network::{Network, SecurityBoundary};
use super::service::Service;

const ALB_ID: &str = "Alb";
const LISTENER_ID: &str = "AlbListener";
const TARGET_GROUP_ID: &str = "AlbTargetGroup";

/// Name of the template output carrying the public DNS name.
pub const DNS_OUTPUT: &str = "LoadBalancerDNS";

/// The declared public entry point.
#[derive(Debug, Clone)]
pub struct LoadBalancerFront {
    pub logical_id: String,
}

/// Declare the front and wire it to `target`'s container `container_name`
/// on `container_port`.
pub fn declare_front(
    graph: &mut ResourceGraph,
    config: &LoadBalancerConfig,
    network: &Network,
    security: &SecurityBoundary,
    target: &Service,
    container_name: &str,
    container_port: u16,
) -> Result<LoadBalancerFront> {
    debug!(
        name = %config.name,
        target = %target.logical_id,
        port = config.port,
        "declaring load balancer front"
    );

    graph.add(
        ALB_ID,
        Resource::new(
            "AWS::ElasticLoadBalancingV2::LoadBalancer",
            json!({
                "Name": config.name,
                "Type": "application",
                "Scheme": "internet-facing",
                "Subnets": network.public_subnet_ids,
                "SecurityGroups": [security.group_id],
            }),
        ),
    )?;

    graph.add(
        TARGET_GROUP_ID,
        Resource::new(
            "AWS::ElasticLoadBalancingV2::TargetGroup",
            json!({
                "Name": config.target_group_name,
                "Port": config.port,
                "Protocol": "HTTP",
                "TargetType": "ip",
                "VpcId": network.vpc_id,
                "TargetGroupAttributes": [
                    {
                        "Key": "deregistration_delay.timeout_seconds",
                        "Value": config.deregistration_delay_seconds.to_string(),
                    },
                ],
            }),
        ),
    )?;

    graph.add(
        LISTENER_ID,
        Resource::new(
            "AWS::ElasticLoadBalancingV2::Listener",
            json!({
                "LoadBalancerArn": reference(ALB_ID),
                "Port": config.port,
                "Protocol": "HTTP",
                "DefaultActions": [
                    { "Type": "forward", "TargetGroupArn": reference(TARGET_GROUP_ID) },
                ],
            }),
        ),
    )?;

    let service = graph
        .get_mut(&target.logical_id)
        .ok_or_else(|| Error::UnknownResource {
            id: target.logical_id.clone(),
            referenced_by: ALB_ID.to_string(),
        })?;
    service.properties["LoadBalancers"] = json!([
        {
            "TargetGroupArn": reference(TARGET_GROUP_ID),
            "ContainerName": container_name,
            "ContainerPort": container_port,
        },
    ]);
    // the service cannot register targets until the listener exists
    service.depends_on.push(LISTENER_ID.to_string());

    graph.add_output(
        DNS_OUTPUT,
        get_att(ALB_ID, "DNSName"),
        Some("Public DNS name of the load balancer"),
    );

    Ok(LoadBalancerFront {
        logical_id: ALB_ID.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    fn sample_network() -> Network {
        Network::import(&NetworkConfig {
            vpc_id: "vpc-12345678".to_string(),
            availability_zones: vec!["ap-northeast-1a".to_string()],
            public_subnet_ids: vec!["subnet-aaaaaaaa".to_string()],
            private_subnet_ids: vec!["subnet-bbbbbbbb".to_string()],
        })
    }

    fn sample_config() -> LoadBalancerConfig {
        LoadBalancerConfig {
            name: "todo".to_string(),
            target_group_name: "todotarget".to_string(),
            port: 80,
            deregistration_delay_seconds: 30,
            target_service: "web".to_string(),
        }
    }

    #[test]
    fn wires_listener_target_group_and_service() {
        let mut graph = ResourceGraph::new();
        graph
            .add("WebService", Resource::new("AWS::ECS::Service", json!({})))
            .unwrap();

        let front = declare_front(
            &mut graph,
            &sample_config(),
            &sample_network(),
            &SecurityBoundary::import("sg-123456789abcdef01"),
            &Service {
                logical_id: "WebService".to_string(),
            },
            "nginx-nuxt",
            80,
        )
        .unwrap();
        assert_eq!(front.logical_id, "Alb");

        let service = graph.get("WebService").unwrap();
        assert_eq!(
            service.properties["LoadBalancers"][0]["ContainerName"],
            "nginx-nuxt"
        );
        assert_eq!(service.depends_on, vec!["AlbListener".to_string()]);

        let target_group = graph.get("AlbTargetGroup").unwrap();
        assert_eq!(
            target_group.properties["TargetGroupAttributes"][0]["Value"],
            "30"
        );

        let output = graph.output(DNS_OUTPUT).unwrap();
        assert_eq!(output.value["Fn::GetAtt"][0], "Alb");

        graph.validate_references().unwrap();
    }

    #[test]
    fn fails_when_target_service_is_missing() {
        let mut graph = ResourceGraph::new();
        let err = declare_front(
            &mut graph,
            &sample_config(),
            &sample_network(),
            &SecurityBoundary::import("sg-123456789abcdef01"),
            &Service {
                logical_id: "WebService".to_string(),
            },
            "nginx-nuxt",
            80,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownResource { .. }));
    }
}
