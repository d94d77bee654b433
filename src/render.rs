use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::model::{
    ContainerSummary, DeploymentRow, DeploymentSummary, ListedResource, NamespaceRow,
    NamespaceSummary, PodRow, PodSummary, ServiceRow, ServiceSummary, format_age,
};

const SEPARATOR: &str = "-----------------------------------";

pub fn write_pod_details<W: Write>(out: &mut W, pod: &PodSummary) -> io::Result<()> {
    writeln!(out, "Name: {}", pod.name)?;
    writeln!(out, "Namespace: {}", pod.namespace)?;
    writeln!(out, "Creation Time: {}", timestamp(pod.creation_time))?;
    writeln!(out, "Phase: {}", pod.phase)?;
    writeln!(out, "IP: {}", pod.ip)?;

    writeln!(out, "Conditions:")?;
    for condition in &pod.conditions {
        writeln!(out, "\tType: {}", condition.type_)?;
        writeln!(out, "\tStatus: {}", condition.status)?;
        writeln!(
            out,
            "\tLast Transition Time: {}",
            timestamp(condition.last_transition_time)
        )?;
        writeln!(out, "\tReason: {}", condition.reason)?;
        writeln!(out, "\tMessage: {}", condition.message)?;
    }

    writeln!(out, "Container Details:")?;
    write_containers(out, &pod.containers)?;
    writeln!(out, "{SEPARATOR}")
}

pub fn write_deployment_details<W: Write>(
    out: &mut W,
    deployment: &DeploymentSummary,
) -> io::Result<()> {
    writeln!(out, "Name: {}", deployment.name)?;
    writeln!(out, "Namespace: {}", deployment.namespace)?;
    writeln!(out, "Creation Time: {}", timestamp(deployment.creation_time))?;
    writeln!(out, "Replicas: {}", deployment.replicas)?;
    writeln!(out, "Available Replicas: {}", deployment.available_replicas)?;
    writeln!(out, "Ready Replicas: {}", deployment.ready_replicas)?;
    writeln!(out, "Updated Replicas: {}", deployment.updated_replicas)?;
    writeln!(out, "Strategy: {}", deployment.strategy)?;
    writeln!(out, "Selector: {}", deployment.selector)?;

    writeln!(out, "Containers:")?;
    write_containers(out, &deployment.containers)?;
    writeln!(out, "{SEPARATOR}")
}

pub fn write_namespace_details<W: Write>(
    out: &mut W,
    namespace: &NamespaceSummary,
) -> io::Result<()> {
    writeln!(out, "Name: {}", namespace.name)?;
    writeln!(out, "Creation Time: {}", timestamp(namespace.creation_time))?;
    writeln!(out, "Status: {}", namespace.status)?;
    writeln!(out, "Labels: {}", key_values(&namespace.labels))?;
    writeln!(out, "Annotations: {}", key_values(&namespace.annotations))?;
    writeln!(out, "Resource Quota: {}", namespace.resource_quota)?;
    writeln!(out, "{SEPARATOR}")
}

pub fn write_service_details<W: Write>(out: &mut W, service: &ServiceSummary) -> io::Result<()> {
    writeln!(out, "Service Name: {}", service.name)?;
    writeln!(out, "Namespace: {}", service.namespace)?;
    writeln!(out, "Creation Time: {}", timestamp(service.creation_time))?;
    writeln!(out, "Labels: {}", key_values(&service.labels))?;
    writeln!(out, "Type: {}", service.type_)?;
    writeln!(out, "Cluster IP: {}", service.cluster_ip)?;
    writeln!(out, "External IPs: {}", service.external_ips.join(","))?;
    writeln!(out, "LoadBalancer IP: {}", service.load_balancer_ip)?;

    writeln!(out, "Ports:")?;
    for port in &service.ports {
        writeln!(out, "  - Name: {}", port.name)?;
        writeln!(out, "    Protocol: {}", port.protocol)?;
        writeln!(out, "    Port: {}", port.port)?;
        writeln!(out, "    Target Port: {}", port.target_port)?;
        writeln!(out, "    Node Port: {}", port.node_port)?;
    }

    writeln!(out, "Selector: {}", key_values(&service.selector))?;
    writeln!(out, "Session Affinity: {}", service.session_affinity)?;
    writeln!(out, "{SEPARATOR}")
}

pub fn write_resource_table<W: Write>(out: &mut W, resources: &[ListedResource]) -> io::Result<()> {
    write_table(
        out,
        &["RESOURCE TYPE", "NAME", "NAMESPACE", "CREATED AT"],
        resources.iter().map(|resource| {
            vec![
                resource.kind.kind().to_string(),
                resource.name.clone(),
                resource.namespace.clone(),
                resource.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        }),
    )
}

pub fn write_deployment_table<W: Write>(out: &mut W, rows: &[DeploymentRow]) -> io::Result<()> {
    write_table(
        out,
        &["DEPLOYMENT", "NAMESPACE", "READY", "AGE"],
        rows.iter().map(|row| {
            vec![
                row.name.clone(),
                row.namespace.clone(),
                format!("{}/{}", row.ready, row.desired),
                format_age(row.age_seconds),
            ]
        }),
    )
}

pub fn write_namespace_table<W: Write>(out: &mut W, rows: &[NamespaceRow]) -> io::Result<()> {
    write_table(
        out,
        &["NAMESPACE-NAME", "STATUS", "AGE"],
        rows.iter().map(|row| {
            vec![
                row.name.clone(),
                row.status.clone(),
                format_age(row.age_seconds),
            ]
        }),
    )
}

pub fn write_pod_table<W: Write>(out: &mut W, rows: &[PodRow]) -> io::Result<()> {
    write_table(
        out,
        &["POD", "NAMESPACE", "READY", "STATUS", "RESTARTS", "AGE"],
        rows.iter().map(|row| {
            vec![
                row.name.clone(),
                row.namespace.clone(),
                format!("{}/{}", row.ready, row.total),
                row.phase.clone(),
                row.restarts.to_string(),
                format_age(row.age_seconds),
            ]
        }),
    )
}

pub fn write_service_table<W: Write>(out: &mut W, rows: &[ServiceRow]) -> io::Result<()> {
    write_table(
        out,
        &["SERVICE", "NAMESPACE", "TYPE", "CLUSTER IP", "PORTS", "AGE"],
        rows.iter().map(|row| {
            vec![
                row.name.clone(),
                row.namespace.clone(),
                row.type_.clone(),
                row.cluster_ip.clone(),
                row.ports.clone(),
                format_age(row.age_seconds),
            ]
        }),
    )
}

fn write_containers<W: Write>(out: &mut W, containers: &[ContainerSummary]) -> io::Result<()> {
    for container in containers {
        writeln!(out, "\tContainer Name: {}", container.name)?;
        writeln!(out, "\tPorts:")?;
        for port in &container.ports {
            writeln!(out, "\t\tPort Name: {}", port.name)?;
            writeln!(out, "\t\tProtocol: {}", port.protocol)?;
            writeln!(out, "\t\tContainer Port: {}", port.container_port)?;
            if let Some(host_port) = port.host_port {
                writeln!(out, "\t\tHost Port: {host_port}")?;
            }
        }
    }
    Ok(())
}

fn write_table<W, I>(out: &mut W, headers: &[&str], rows: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut table = TabWriter::new(out).padding(3);
    writeln!(table, "{}", headers.join("\t"))?;
    for row in rows {
        writeln!(table, "{}", row.join("\t"))?;
    }
    table.flush()
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

fn key_values(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
