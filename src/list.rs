use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use kube::api::ListParams;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, instrument};

use crate::error::InspectError;
use crate::model::{
    DeploymentRow, ListedResource, NamespaceRow, PodRow, ResourceKind, ServiceRow, age_at,
    api_time,
};

/// Lists every requested kind in `namespace`, one request per kind, kind-major.
#[instrument(skip(client))]
pub async fn list_resources(
    client: &Client,
    namespace: &str,
    kinds: &[ResourceKind],
) -> Result<Vec<ListedResource>, InspectError> {
    let mut resources = Vec::new();
    for &kind in kinds {
        let listed = match kind {
            ResourceKind::Pods => {
                listed::<Pod>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::Deployments => {
                listed::<Deployment>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::Services => {
                listed::<Service>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::StatefulSets => {
                listed::<StatefulSet>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::DaemonSets => {
                listed::<DaemonSet>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::Jobs => {
                listed::<Job>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::CronJobs => {
                listed::<CronJob>(Api::namespaced(client.clone(), namespace), kind).await?
            }
            ResourceKind::Namespaces => {
                listed::<Namespace>(Api::all(client.clone()), kind).await?
            }
        };
        debug!(%kind, count = listed.len(), "listed resources");
        resources.extend(listed);
    }
    Ok(resources)
}

pub async fn list_deployments(
    client: &Client,
    namespace: &str,
) -> Result<Vec<DeploymentRow>, InspectError> {
    list_deployments_at(client, namespace, Utc::now()).await
}

pub async fn list_namespaces(client: &Client) -> Result<Vec<NamespaceRow>, InspectError> {
    list_namespaces_at(client, Utc::now()).await
}

pub async fn list_pods(client: &Client, namespace: &str) -> Result<Vec<PodRow>, InspectError> {
    list_pods_at(client, namespace, Utc::now()).await
}

pub async fn list_services(
    client: &Client,
    namespace: &str,
) -> Result<Vec<ServiceRow>, InspectError> {
    list_services_at(client, namespace, Utc::now()).await
}

async fn list_deployments_at(
    client: &Client,
    namespace: &str,
    now: DateTime<Utc>,
) -> Result<Vec<DeploymentRow>, InspectError> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let list = deployments
        .list(&ListParams::default())
        .await
        .map_err(InspectError::Api)?;

    let rows = list
        .into_iter()
        .map(|deployment| {
            let desired = deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.replicas)
                .unwrap_or(1);
            let ready = deployment
                .status
                .as_ref()
                .and_then(|status| status.ready_replicas)
                .unwrap_or(0);

            DeploymentRow {
                name: deployment.name_any(),
                namespace: deployment.namespace().unwrap_or_default(),
                ready,
                desired,
                age_seconds: age_of(&deployment, now),
            }
        })
        .collect();
    Ok(rows)
}

async fn list_namespaces_at(
    client: &Client,
    now: DateTime<Utc>,
) -> Result<Vec<NamespaceRow>, InspectError> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let list = namespaces
        .list(&ListParams::default())
        .await
        .map_err(InspectError::Api)?;

    let rows = list
        .into_iter()
        .map(|namespace| NamespaceRow {
            name: namespace.name_any(),
            status: namespace
                .status
                .as_ref()
                .and_then(|status| status.phase.clone())
                .unwrap_or_default(),
            age_seconds: age_of(&namespace, now),
        })
        .collect();
    Ok(rows)
}

async fn list_pods_at(
    client: &Client,
    namespace: &str,
    now: DateTime<Utc>,
) -> Result<Vec<PodRow>, InspectError> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods
        .list(&ListParams::default())
        .await
        .map_err(InspectError::Api)?;

    let rows = list
        .into_iter()
        .map(|pod| {
            let statuses = pod
                .status
                .as_ref()
                .and_then(|status| status.container_statuses.as_deref())
                .unwrap_or(&[]);
            let ready = statuses.iter().filter(|container| container.ready).count();
            let restarts = statuses
                .iter()
                .map(|container| container.restart_count)
                .sum();

            PodRow {
                name: pod.name_any(),
                namespace: pod.namespace().unwrap_or_default(),
                phase: pod
                    .status
                    .as_ref()
                    .and_then(|status| status.phase.clone())
                    .unwrap_or_default(),
                ready,
                total: statuses.len(),
                restarts,
                age_seconds: age_of(&pod, now),
            }
        })
        .collect();
    Ok(rows)
}

async fn list_services_at(
    client: &Client,
    namespace: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ServiceRow>, InspectError> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let list = services
        .list(&ListParams::default())
        .await
        .map_err(InspectError::Api)?;

    let rows = list
        .into_iter()
        .map(|service| {
            let spec = service.spec.as_ref();
            let ports = spec
                .and_then(|spec| spec.ports.as_deref())
                .unwrap_or(&[])
                .iter()
                .map(|port| {
                    let protocol = port.protocol.as_deref().unwrap_or("TCP");
                    format!("{}/{protocol}", port.port)
                })
                .collect::<Vec<_>>()
                .join(",");

            ServiceRow {
                name: service.name_any(),
                namespace: service.namespace().unwrap_or_default(),
                type_: spec
                    .and_then(|spec| spec.type_.clone())
                    .unwrap_or_default(),
                cluster_ip: spec
                    .and_then(|spec| spec.cluster_ip.clone())
                    .unwrap_or_default(),
                ports,
                age_seconds: age_of(&service, now),
            }
        })
        .collect();
    Ok(rows)
}

async fn listed<K>(api: Api<K>, kind: ResourceKind) -> Result<Vec<ListedResource>, InspectError>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let list = api
        .list(&ListParams::default())
        .await
        .map_err(InspectError::Api)?;

    Ok(list
        .into_iter()
        .map(|object| ListedResource {
            kind,
            name: object.name_any(),
            namespace: object.namespace().unwrap_or_default(),
            created_at: api_time(object.meta().creation_timestamp.as_ref()),
        })
        .collect())
}

fn age_of<K: Resource>(object: &K, now: DateTime<Utc>) -> i64 {
    age_at(api_time(object.meta().creation_timestamp.as_ref()), now)
}
