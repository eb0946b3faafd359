//! End-to-end topology tests
//!
//! Builds the shipped sample topology (api, api-nginx, web behind one
//! public load balancer) from `config/topology.yaml` and checks the
//! declared graph, the discovery wiring, and the synthesized template.

use std::path::PathBuf;

use topology::topology::DNS_OUTPUT;
use topology::{Error, Topology, TopologyBuilder, TopologyConfig};

/// Path to the shipped sample configuration
fn sample_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/topology.yaml")
}

fn sample_config() -> TopologyConfig {
    TopologyConfig::from_file(sample_config_path()).expect("sample config should parse")
}

fn build_sample() -> Topology {
    TopologyBuilder::new(sample_config())
        .expect("sample config should validate")
        .build()
        .expect("sample topology should build")
}

#[test]
fn sample_config_loads_and_validates() {
    let config = sample_config();
    config.validate().unwrap();

    assert_eq!(config.namespace, "todocdk");
    assert_eq!(config.services.len(), 3);
    assert_eq!(config.capacity.instance_count, 4);
}

#[test]
fn builds_expected_resource_counts() {
    let topology = build_sample();
    let graph = topology.graph();

    assert_eq!(
        graph.count_of_kind("AWS::ServiceDiscovery::PrivateDnsNamespace"),
        1,
        "exactly one namespace per topology"
    );
    assert_eq!(
        graph.count_of_kind("AWS::ServiceDiscovery::Service"),
        3,
        "one discovery entry per service"
    );
    assert_eq!(graph.count_of_kind("AWS::ECS::Cluster"), 1);
    assert_eq!(graph.count_of_kind("AWS::ECS::TaskDefinition"), 3);
    assert_eq!(graph.count_of_kind("AWS::ECS::Service"), 3);
    assert_eq!(
        graph.count_of_kind("AWS::ElasticLoadBalancingV2::LoadBalancer"),
        1
    );
    assert_eq!(graph.count_of_kind("AWS::Logs::LogGroup"), 1);

    let output = graph.output(DNS_OUTPUT).expect("DNS output should exist");
    assert_eq!(output.value["Fn::GetAtt"][0], "Alb");
}

#[test]
fn logical_ids_follow_the_naming_rules() {
    let topology = build_sample();
    let graph = topology.graph();

    assert_eq!(
        graph.ids_of_kind("AWS::ECS::TaskDefinition"),
        vec!["ApiTaskDef", "ApinginxTaskDef", "WebTaskDef"]
    );
    assert_eq!(
        graph.ids_of_kind("AWS::ECS::Service"),
        vec!["ApiService", "ApinginxService", "WebService"]
    );
    assert_eq!(
        graph.ids_of_kind("AWS::ServiceDiscovery::Service"),
        vec![
            "ApiServiceDiscovery",
            "ApinginxServiceDiscovery",
            "WebServiceDiscovery"
        ]
    );
}

#[test]
fn each_service_carries_exactly_one_registry_linkage() {
    let topology = build_sample();
    let graph = topology.graph();

    for (service_id, discovery_id) in [
        ("ApiService", "ApiServiceDiscovery"),
        ("ApinginxService", "ApinginxServiceDiscovery"),
        ("WebService", "WebServiceDiscovery"),
    ] {
        let service = graph.get(service_id).unwrap();
        let registries = service.properties["ServiceRegistries"]
            .as_array()
            .unwrap_or_else(|| panic!("{service_id} should have registry linkages"));
        assert_eq!(registries.len(), 1);
        assert_eq!(
            registries[0]["RegistryArn"]["Fn::GetAtt"][0],
            discovery_id,
            "{service_id} should reference {discovery_id}"
        );
    }
}

#[test]
fn services_run_in_private_subnets_behind_the_shared_boundary() {
    let topology = build_sample();
    let service = topology.graph().get("ApiService").unwrap();

    let network = &service.properties["NetworkConfiguration"]["AwsvpcConfiguration"];
    assert_eq!(network["Subnets"][0], "subnet-cccccccc");
    assert_eq!(network["SecurityGroups"][0], "sg-xxxxxxxxxxxxxxxxxx");

    let alb = topology.graph().get("Alb").unwrap();
    assert_eq!(alb.properties["Scheme"], "internet-facing");
    assert_eq!(alb.properties["Subnets"][0], "subnet-aaaaaaaa");
}

#[test]
fn balancer_targets_the_web_container_port() {
    let topology = build_sample();
    let graph = topology.graph();

    let web = graph.get("WebService").unwrap();
    let balancers = web.properties["LoadBalancers"].as_array().unwrap();
    assert_eq!(balancers.len(), 1);
    assert_eq!(balancers[0]["ContainerName"], "nginx-nuxt");
    assert_eq!(balancers[0]["ContainerPort"], 80);
    assert!(web.depends_on.contains(&"AlbListener".to_string()));

    // only the externally facing service is fronted
    for service_id in ["ApiService", "ApinginxService"] {
        let service = graph.get(service_id).unwrap();
        assert!(service.properties.get("LoadBalancers").is_none());
    }
}

#[test]
fn synthesized_template_resolves_and_holds_no_credentials() {
    let topology = build_sample();
    let template = topology.synthesize().unwrap();

    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(
        template["Resources"]["WebService"]["Type"],
        "AWS::ECS::Service"
    );
    assert_eq!(
        template["Resources"]["WebService"]["DependsOn"][0],
        "AlbListener"
    );

    let api_container =
        &template["Resources"]["ApiTaskDef"]["Properties"]["ContainerDefinitions"][0];
    let secrets = api_container["Secrets"].as_array().unwrap();
    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets[0]["Name"], "TODO_MASTER_URL");
    assert_eq!(secrets[0]["ValueFrom"], "todo/db:masterUrl::");

    // credentials only ever appear as secret-store references
    let rendered = serde_json::to_string(&template).unwrap();
    assert!(!rendered.contains("rds.amazonaws.com"));
    assert!(!rendered.to_lowercase().contains("password"));
}

#[test]
fn shared_volume_is_declared_and_mounted() {
    let topology = build_sample();
    let web = topology.graph().get("WebTaskDef").unwrap();

    assert_eq!(web.properties["Volumes"][0]["Name"], "assets");
    assert_eq!(
        web.properties["Volumes"][0]["DockerVolumeConfiguration"]["Scope"],
        "task"
    );

    let containers = web.properties["ContainerDefinitions"].as_array().unwrap();
    assert_eq!(containers.len(), 2);
    for container in containers {
        assert_eq!(container["MountPoints"][0]["SourceVolume"], "assets");
    }
}

#[test]
fn mount_against_undeclared_volume_is_rejected() {
    let mut config = sample_config();
    let web = config
        .services
        .iter_mut()
        .find(|service| service.name == "web")
        .unwrap();
    web.volumes.clear();

    let err = TopologyBuilder::new(config).unwrap().build().unwrap_err();
    match err {
        Error::UnknownVolume { volume, family, .. } => {
            assert_eq!(volume, "assets");
            assert_eq!(family, "web");
        }
        other => panic!("expected UnknownVolume, got {other:?}"),
    }
}

#[test]
fn colliding_display_names_are_rejected() {
    let mut config = sample_config();
    let mut shadow = config.services[0].clone();
    // collapses to the same logical id as the existing 'api' service
    shadow.name = "Api!".to_string();
    shadow.discovery = None;
    config.services.push(shadow);

    let err = TopologyBuilder::new(config).unwrap().build().unwrap_err();
    match err {
        Error::DuplicateIdentifier { id, .. } => assert_eq!(id, "Api"),
        other => panic!("expected DuplicateIdentifier, got {other:?}"),
    }
}
