use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Pods,
    Deployments,
    Services,
    StatefulSets,
    DaemonSets,
    Jobs,
    CronJobs,
    Namespaces,
}

impl ResourceKind {
    pub const ALL: [Self; 8] = [
        Self::Pods,
        Self::Deployments,
        Self::Services,
        Self::StatefulSets,
        Self::DaemonSets,
        Self::Jobs,
        Self::CronJobs,
        Self::Namespaces,
    ];

    /// Kinds shown by `show all` when no `--kind` filter is given.
    pub const OVERVIEW: [Self; 2] = [Self::Deployments, Self::Services];

    /// The API `kind` tag.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Pods => "Pod",
            Self::Deployments => "Deployment",
            Self::Services => "Service",
            Self::StatefulSets => "StatefulSet",
            Self::DaemonSets => "DaemonSet",
            Self::Jobs => "Job",
            Self::CronJobs => "CronJob",
            Self::Namespaces => "Namespace",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "po" | "pod" | "pods" => Some(Self::Pods),
            "deploy" | "deployment" | "deployments" | "dp" => Some(Self::Deployments),
            "svc" | "service" | "services" => Some(Self::Services),
            "sts" | "statefulset" | "statefulsets" => Some(Self::StatefulSets),
            "ds" | "daemonset" | "daemonsets" | "daemon-set" | "daemon-sets" => {
                Some(Self::DaemonSets)
            }
            "job" | "jobs" => Some(Self::Jobs),
            "cj" | "cronjob" | "cronjobs" | "cron-job" | "cron-jobs" => Some(Self::CronJobs),
            "ns" | "namespace" | "namespaces" => Some(Self::Namespaces),
            _ => None,
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::Pods => "po",
            Self::Deployments => "deploy",
            Self::Services => "svc",
            Self::StatefulSets => "sts",
            Self::DaemonSets => "ds",
            Self::Jobs => "job",
            Self::CronJobs => "cj",
            Self::Namespaces => "ns",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub creation_time: DateTime<Utc>,
    pub phase: String,
    pub ip: String,
    pub conditions: Vec<Condition>,
    pub containers: Vec<ContainerSummary>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Condition {
    pub type_: String,
    pub status: String,
    pub last_transition_time: DateTime<Utc>,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContainerSummary {
    pub name: String,
    pub ports: Vec<PortSummary>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PortSummary {
    pub name: String,
    pub protocol: String,
    pub container_port: i32,
    /// Only pods report host ports; pod templates leave this empty.
    pub host_port: Option<i32>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub creation_time: DateTime<Utc>,
    pub replicas: i32,
    pub available_replicas: i32,
    pub ready_replicas: i32,
    pub updated_replicas: i32,
    pub strategy: String,
    pub selector: String,
    pub containers: Vec<ContainerSummary>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct NamespaceSummary {
    pub name: String,
    pub creation_time: DateTime<Utc>,
    pub status: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub resource_quota: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ServiceSummary {
    pub name: String,
    pub namespace: String,
    pub creation_time: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
    pub type_: String,
    pub cluster_ip: String,
    pub external_ips: Vec<String>,
    pub load_balancer_ip: String,
    pub ports: Vec<ServicePortSummary>,
    pub selector: BTreeMap<String, String>,
    pub session_affinity: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ServicePortSummary {
    pub name: String,
    pub protocol: String,
    pub port: i32,
    pub target_port: String,
    pub node_port: i32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ListedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct DeploymentRow {
    pub name: String,
    pub namespace: String,
    pub ready: i32,
    pub desired: i32,
    pub age_seconds: i64,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct NamespaceRow {
    pub name: String,
    pub status: String,
    pub age_seconds: i64,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodRow {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub ready: usize,
    pub total: usize,
    pub restarts: i32,
    pub age_seconds: i64,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ServiceRow {
    pub name: String,
    pub namespace: String,
    pub type_: String,
    pub cluster_ip: String,
    pub ports: String,
    pub age_seconds: i64,
}

/// Converts an API timestamp, mapping absent values to the Unix epoch.
pub fn api_time(time: Option<&Time>) -> DateTime<Utc> {
    time.and_then(|time| {
        DateTime::from_timestamp(time.0.as_second(), time.0.subsec_nanosecond() as u32)
    })
    .unwrap_or_default()
}

/// Whole seconds between `created` and `now`, rounded to the nearest second.
pub fn age_at(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - created).num_milliseconds().max(0);
    (millis + 500) / 1_000
}

pub fn format_age(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{days}d{hours}h{minutes}m{secs}s")
    } else if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}
