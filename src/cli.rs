use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::ResourceKind;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kuba",
    version,
    about = "Inspect Kubernetes workloads and create resources from manifests."
)]
pub struct CliArgs {
    /// kubeconfig context to use instead of the current one
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// tracing filter (for example: warn,kuba=debug)
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List resources as a table
    Show {
        #[command(subcommand)]
        target: ShowTarget,
    },
    /// Print the details of a single resource
    Details {
        #[command(subcommand)]
        target: DetailsTarget,
    },
    /// Create the resource described by a manifest file
    Apply(ApplyArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ShowTarget {
    /// Deployments and services (or the kinds given with --kind) in a namespace
    All {
        #[command(flatten)]
        scope: NamespaceArg,

        /// Kinds to list, in order (for example: --kind deploy --kind svc)
        #[arg(long = "kind", value_name = "KIND", value_parser = parse_kind)]
        kinds: Vec<ResourceKind>,
    },
    /// Deployments in a namespace
    #[command(alias = "deployments")]
    Deploy {
        #[command(flatten)]
        scope: NamespaceArg,
    },
    /// All namespaces in the cluster
    #[command(alias = "ns")]
    Namespaces,
    /// Pods in a namespace
    #[command(alias = "po")]
    Pods {
        #[command(flatten)]
        scope: NamespaceArg,
    },
    /// Services in a namespace
    #[command(alias = "svc")]
    Services {
        #[command(flatten)]
        scope: NamespaceArg,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum DetailsTarget {
    /// Details of a pod
    Pod {
        #[command(flatten)]
        scope: NamespaceArg,

        /// Pod name (eg: --p=pod-name)
        #[arg(long = "p", value_name = "NAME")]
        name: String,
    },
    /// Details of a deployment
    Deployment {
        #[command(flatten)]
        scope: NamespaceArg,

        /// Deployment name (eg: --d=deployment-name)
        #[arg(long = "d", value_name = "NAME")]
        name: String,
    },
    /// Details of a namespace (the one given with --ns)
    Namespace {
        #[command(flatten)]
        scope: NamespaceArg,
    },
    /// Details of a service
    Service {
        #[command(flatten)]
        scope: NamespaceArg,

        /// Service name (eg: --s=service-name)
        #[arg(long = "s", value_name = "NAME")]
        name: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Manifest to create (a single YAML or JSON document)
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    #[command(flatten)]
    pub scope: NamespaceArg,
}

#[derive(Debug, Clone, Default, Args)]
pub struct NamespaceArg {
    /// Namespace to use (defaults to the configured or kubeconfig namespace)
    #[arg(long = "ns", value_name = "NAMESPACE")]
    pub namespace: Option<String>,
}

fn parse_kind(token: &str) -> Result<ResourceKind, String> {
    ResourceKind::from_token(token).ok_or_else(|| {
        let known = ResourceKind::ALL
            .iter()
            .map(|kind| kind.short_token())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown kind '{token}' (expected one of: {known})")
    })
}
