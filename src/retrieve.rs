use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Namespace, Pod, ResourceQuota, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, instrument};

use crate::error::InspectError;
use crate::model::{
    Condition, ContainerSummary, DeploymentSummary, NamespaceSummary, PodSummary, PortSummary,
    ServicePortSummary, ServiceSummary, api_time,
};

/// Desired replica count the API server assumes when a deployment omits it.
const DEFAULT_REPLICAS: i32 = 1;

#[instrument(skip(client))]
pub async fn pod_details(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<PodSummary, InspectError> {
    let namespace = require_namespace(namespace, "pod")?;
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod = pods.get(name).await.map_err(InspectError::Api)?;
    debug!("fetched pod");

    let status = pod.status.as_ref();
    let conditions = status
        .and_then(|status| status.conditions.as_deref())
        .unwrap_or(&[])
        .iter()
        .map(|condition| Condition {
            type_: condition.type_.clone(),
            status: condition.status.clone(),
            last_transition_time: api_time(condition.last_transition_time.as_ref()),
            reason: condition.reason.clone().unwrap_or_default(),
            message: condition.message.clone().unwrap_or_default(),
        })
        .collect();
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .map(|container| container_summary(container, true))
                .collect()
        })
        .unwrap_or_default();

    Ok(PodSummary {
        name: pod.name_any(),
        namespace: pod.namespace().unwrap_or_default(),
        creation_time: api_time(pod.metadata.creation_timestamp.as_ref()),
        phase: status
            .and_then(|status| status.phase.clone())
            .unwrap_or_default(),
        ip: status
            .and_then(|status| status.pod_ip.clone())
            .unwrap_or_default(),
        conditions,
        containers,
    })
}

#[instrument(skip(client))]
pub async fn deployment_details(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<DeploymentSummary, InspectError> {
    let namespace = require_namespace(namespace, "deployment")?;
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = deployments.get(name).await.map_err(InspectError::Api)?;
    debug!("fetched deployment");

    let spec = deployment.spec.as_ref();
    let status = deployment.status.as_ref();
    let containers = spec
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod_spec| {
            pod_spec
                .containers
                .iter()
                .map(|container| container_summary(container, false))
                .collect()
        })
        .unwrap_or_default();

    Ok(DeploymentSummary {
        name: deployment.name_any(),
        namespace: deployment.namespace().unwrap_or_default(),
        creation_time: api_time(deployment.metadata.creation_timestamp.as_ref()),
        replicas: spec
            .and_then(|spec| spec.replicas)
            .unwrap_or(DEFAULT_REPLICAS),
        available_replicas: status
            .and_then(|status| status.available_replicas)
            .unwrap_or(0),
        ready_replicas: status
            .and_then(|status| status.ready_replicas)
            .unwrap_or(0),
        updated_replicas: status
            .and_then(|status| status.updated_replicas)
            .unwrap_or(0),
        strategy: spec
            .and_then(|spec| spec.strategy.as_ref())
            .and_then(|strategy| strategy.type_.clone())
            .unwrap_or_default(),
        selector: spec
            .map(|spec| selector_string(&spec.selector))
            .unwrap_or_default(),
        containers,
    })
}

#[instrument(skip(client))]
pub async fn namespace_details(
    client: &Client,
    name: &str,
) -> Result<NamespaceSummary, InspectError> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let namespace = namespaces.get(name).await.map_err(InspectError::Api)?;
    debug!("fetched namespace");

    Ok(NamespaceSummary {
        name: namespace.name_any(),
        creation_time: api_time(namespace.metadata.creation_timestamp.as_ref()),
        status: namespace
            .status
            .as_ref()
            .and_then(|status| status.phase.clone())
            .unwrap_or_default(),
        labels: namespace.labels().clone(),
        annotations: namespace.annotations().clone(),
        resource_quota: first_resource_quota(client, name).await,
    })
}

#[instrument(skip(client))]
pub async fn service_details(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<ServiceSummary, InspectError> {
    let namespace = require_namespace(namespace, "service")?;
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let service = services.get(name).await.map_err(InspectError::Api)?;
    debug!("fetched service");

    let spec = service.spec.as_ref();
    let ports = spec
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or(&[])
        .iter()
        .map(|port| ServicePortSummary {
            name: port.name.clone().unwrap_or_default(),
            protocol: port.protocol.clone().unwrap_or_default(),
            port: port.port,
            target_port: port
                .target_port
                .as_ref()
                .map(int_or_string)
                .unwrap_or_default(),
            node_port: port.node_port.unwrap_or(0),
        })
        .collect();

    Ok(ServiceSummary {
        name: service.name_any(),
        namespace: service.namespace().unwrap_or_default(),
        creation_time: api_time(service.metadata.creation_timestamp.as_ref()),
        labels: service.labels().clone(),
        type_: spec
            .and_then(|spec| spec.type_.clone())
            .unwrap_or_default(),
        cluster_ip: spec
            .and_then(|spec| spec.cluster_ip.clone())
            .unwrap_or_default(),
        external_ips: spec
            .and_then(|spec| spec.external_ips.clone())
            .unwrap_or_default(),
        load_balancer_ip: spec
            .and_then(|spec| spec.load_balancer_ip.clone())
            .unwrap_or_default(),
        ports,
        selector: spec
            .and_then(|spec| spec.selector.clone())
            .unwrap_or_default(),
        session_affinity: spec
            .and_then(|spec| spec.session_affinity.clone())
            .unwrap_or_default(),
    })
}

/// Name of the first resource quota in `namespace`, or empty when there is none
/// or the quota list cannot be read.
async fn first_resource_quota(client: &Client, namespace: &str) -> String {
    let quotas: Api<ResourceQuota> = Api::namespaced(client.clone(), namespace);
    match quotas.list(&ListParams::default()).await {
        Ok(list) => list
            .items
            .first()
            .map(ResourceExt::name_any)
            .unwrap_or_default(),
        Err(error) => {
            debug!(%error, "resource quota lookup failed");
            String::new()
        }
    }
}

fn require_namespace<'a>(
    namespace: &'a str,
    resource: &'static str,
) -> Result<&'a str, InspectError> {
    let namespace = namespace.trim();
    if namespace.is_empty() {
        return Err(InspectError::MissingNamespace(resource));
    }
    Ok(namespace)
}

fn container_summary(container: &Container, with_host_port: bool) -> ContainerSummary {
    let ports = container
        .ports
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|port| PortSummary {
            name: port.name.clone().unwrap_or_default(),
            protocol: port.protocol.clone().unwrap_or_default(),
            container_port: port.container_port,
            host_port: with_host_port.then(|| port.host_port.unwrap_or(0)),
        })
        .collect();

    ContainerSummary {
        name: container.name.clone(),
        ports,
    }
}

pub(crate) fn selector_string(selector: &LabelSelector) -> String {
    let mut terms = selector
        .match_labels
        .as_ref()
        .map(|labels| {
            labels
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    for requirement in selector.match_expressions.as_deref().unwrap_or(&[]) {
        let values = requirement.values.as_deref().unwrap_or(&[]).join(",");
        let term = if values.is_empty() {
            format!("{} {}", requirement.key, requirement.operator)
        } else {
            format!("{} {} ({values})", requirement.key, requirement.operator)
        };
        terms.push(term);
    }

    terms.join(",")
}

fn int_or_string(value: &IntOrString) -> String {
    match value {
        IntOrString::Int(port) => port.to_string(),
        IntOrString::String(name) => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        deployment_details, namespace_details, pod_details, selector_string, service_details,
    };
    use crate::error::InspectError;
    use crate::testing::{Exchange, list_body, mock_client};
    use chrono::{TimeZone, Utc};
    use http::Method;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
    use serde_json::json;
    use std::collections::BTreeMap;

    const POD_PATH: &str = "/api/v1/namespaces/default/pods/web-0";
    const DEPLOYMENT_PATH: &str = "/apis/apps/v1/namespaces/default/deployments/web";

    fn pod_json() -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web-0",
                "namespace": "default",
                "creationTimestamp": "2024-05-01T12:00:00Z"
            },
            "spec": {
                "containers": [
                    {
                        "name": "app",
                        "ports": [
                            { "name": "http", "containerPort": 8080, "protocol": "TCP" },
                            { "name": "metrics", "containerPort": 9090, "hostPort": 9090, "protocol": "TCP" }
                        ]
                    },
                    { "name": "sidecar" }
                ]
            },
            "status": {
                "phase": "Running",
                "podIP": "10.0.0.7",
                "conditions": [
                    { "type": "Initialized", "status": "True", "lastTransitionTime": "2024-05-01T12:00:01Z" },
                    { "type": "Ready", "status": "False", "reason": "ContainersNotReady", "message": "sidecar not ready" },
                    { "type": "PodScheduled", "status": "True" }
                ]
            }
        })
    }

    #[tokio::test]
    async fn pod_details_copy_conditions_and_ports_in_order() {
        let (client, server) = mock_client();
        let server = server.serve(vec![Exchange::get(POD_PATH, pod_json())]);

        let pod = pod_details(&client, "default", "web-0").await.unwrap();
        drop(client);
        server.await.unwrap().assert_no_more_requests().await;

        assert_eq!(pod.name, "web-0");
        assert_eq!(pod.phase, "Running");
        assert_eq!(pod.ip, "10.0.0.7");
        assert_eq!(
            pod.creation_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );

        let types = pod
            .conditions
            .iter()
            .map(|condition| condition.type_.as_str())
            .collect::<Vec<_>>();
        assert_eq!(types, ["Initialized", "Ready", "PodScheduled"]);
        assert_eq!(pod.conditions[1].reason, "ContainersNotReady");
        assert_eq!(pod.conditions[2].message, "");

        assert_eq!(pod.containers.len(), 2);
        assert_eq!(pod.containers[0].ports.len(), 2);
        assert_eq!(pod.containers[0].ports[0].host_port, Some(0));
        assert_eq!(pod.containers[0].ports[1].host_port, Some(9090));
        assert!(pod.containers[1].ports.is_empty());
    }

    #[tokio::test]
    async fn missing_pod_is_an_error() {
        let (client, server) = mock_client();
        let server = server.serve(vec![Exchange::not_found(
            Method::GET,
            POD_PATH,
            "pods",
            "web-0",
        )]);

        let error = pod_details(&client, "default", "web-0").await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(error, InspectError::Api(_)));
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn empty_namespace_is_rejected_without_a_request() {
        let (client, server) = mock_client();

        let error = service_details(&client, "  ", "web").await.unwrap_err();
        drop(client);
        server.assert_no_more_requests().await;

        assert!(matches!(error, InspectError::MissingNamespace("service")));
    }

    #[tokio::test]
    async fn deployment_without_replicas_reports_default() {
        let (client, server) = mock_client();
        let server = server.serve(vec![Exchange::get(
            DEPLOYMENT_PATH,
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": { "name": "web", "namespace": "default" },
                "spec": {
                    "selector": { "matchLabels": { "tier": "front", "app": "web" } },
                    "strategy": { "type": "RollingUpdate" },
                    "template": {
                        "spec": {
                            "containers": [
                                { "name": "app", "ports": [{ "containerPort": 80, "protocol": "TCP" }] }
                            ]
                        }
                    }
                },
                "status": { "availableReplicas": 1, "readyReplicas": 1, "updatedReplicas": 1 }
            }),
        )]);

        let deployment = deployment_details(&client, "default", "web").await.unwrap();
        server.await.unwrap();

        assert_eq!(deployment.replicas, 1);
        assert_eq!(deployment.ready_replicas, 1);
        assert_eq!(deployment.strategy, "RollingUpdate");
        assert_eq!(deployment.selector, "app=web,tier=front");
        assert_eq!(deployment.containers.len(), 1);
        assert_eq!(deployment.containers[0].ports[0].container_port, 80);
        assert_eq!(deployment.containers[0].ports[0].host_port, None);
    }

    #[tokio::test]
    async fn namespace_without_quota_has_empty_quota_name() {
        let (client, server) = mock_client();
        let server = server.serve(vec![
            Exchange::get(
                "/api/v1/namespaces/team-a",
                json!({
                    "apiVersion": "v1",
                    "kind": "Namespace",
                    "metadata": {
                        "name": "team-a",
                        "labels": { "owner": "team-a" },
                        "annotations": { "note": "sandbox" }
                    },
                    "status": { "phase": "Active" }
                }),
            ),
            Exchange::get(
                "/api/v1/namespaces/team-a/resourcequotas",
                list_body("v1", "ResourceQuota", vec![]),
            ),
        ]);

        let namespace = namespace_details(&client, "team-a").await.unwrap();
        server.await.unwrap();

        assert_eq!(namespace.status, "Active");
        assert_eq!(namespace.labels.get("owner").map(String::as_str), Some("team-a"));
        assert_eq!(namespace.annotations.len(), 1);
        assert_eq!(namespace.resource_quota, "");
    }

    #[tokio::test]
    async fn namespace_quota_lookup_failure_is_not_an_error() {
        let (client, server) = mock_client();
        let server = server.serve(vec![
            Exchange::get(
                "/api/v1/namespaces/team-b",
                json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": { "name": "team-b" } }),
            ),
            Exchange::forbidden("/api/v1/namespaces/team-b/resourcequotas"),
        ]);

        let namespace = namespace_details(&client, "team-b").await.unwrap();
        server.await.unwrap();

        assert_eq!(namespace.resource_quota, "");
        assert_eq!(namespace.status, "");
    }

    #[tokio::test]
    async fn namespace_reports_first_quota() {
        let (client, server) = mock_client();
        let server = server.serve(vec![
            Exchange::get(
                "/api/v1/namespaces/team-c",
                json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": { "name": "team-c" } }),
            ),
            Exchange::get(
                "/api/v1/namespaces/team-c/resourcequotas",
                list_body(
                    "v1",
                    "ResourceQuota",
                    vec![
                        json!({ "apiVersion": "v1", "kind": "ResourceQuota", "metadata": { "name": "compute" } }),
                        json!({ "apiVersion": "v1", "kind": "ResourceQuota", "metadata": { "name": "storage" } }),
                    ],
                ),
            ),
        ]);

        let namespace = namespace_details(&client, "team-c").await.unwrap();
        server.await.unwrap();

        assert_eq!(namespace.resource_quota, "compute");
    }

    #[tokio::test]
    async fn service_details_render_target_ports_as_strings() {
        let (client, server) = mock_client();
        let server = server.serve(vec![Exchange::get(
            "/api/v1/namespaces/default/services/web",
            json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": { "name": "web", "namespace": "default", "labels": { "app": "web" } },
                "spec": {
                    "type": "NodePort",
                    "clusterIP": "10.96.0.10",
                    "externalIPs": ["192.0.2.1"],
                    "ports": [
                        { "name": "http", "port": 80, "targetPort": 8080, "nodePort": 30080, "protocol": "TCP" },
                        { "name": "admin", "port": 81, "targetPort": "admin", "protocol": "TCP" }
                    ],
                    "selector": { "app": "web" },
                    "sessionAffinity": "None"
                }
            }),
        )]);

        let service = service_details(&client, "default", "web").await.unwrap();
        server.await.unwrap();

        assert_eq!(service.type_, "NodePort");
        assert_eq!(service.external_ips, ["192.0.2.1"]);
        assert_eq!(service.load_balancer_ip, "");
        assert_eq!(service.ports[0].target_port, "8080");
        assert_eq!(service.ports[0].node_port, 30080);
        assert_eq!(service.ports[1].target_port, "admin");
        assert_eq!(service.ports[1].node_port, 0);
        assert_eq!(service.session_affinity, "None");
    }

    #[test]
    fn selector_renders_labels_then_expressions() {
        let selector = LabelSelector {
            match_labels: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
            match_expressions: Some(vec![
                LabelSelectorRequirement {
                    key: "tier".to_string(),
                    operator: "In".to_string(),
                    values: Some(vec!["front".to_string(), "edge".to_string()]),
                },
                LabelSelectorRequirement {
                    key: "canary".to_string(),
                    operator: "DoesNotExist".to_string(),
                    values: None,
                },
            ]),
        };
        assert_eq!(
            selector_string(&selector),
            "app=web,tier In (front,edge),canary DoesNotExist"
        );
        assert_eq!(selector_string(&LabelSelector::default()), "");
    }
}
