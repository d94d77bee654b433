mod apply;
mod cli;
mod config;
mod error;
mod k8s;
mod list;
mod model;
mod render;
mod retrieve;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use apply::Applier;
use clap::Parser;
use cli::{CliArgs, Command, DetailsTarget, ShowTarget};
use config::Settings;
use error::InspectError;
use k8s::KubeGateway;
use model::ResourceKind;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();
    let settings = Settings::discover()?;
    init_tracing(settings.resolve_log_filter(args.log_filter.as_deref()));
    if let Some(source) = &settings.source {
        debug!(%source, "loaded config");
    }

    match run(&args, &settings).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CommandError::Inspect(inspect)) => {
            debug!(
                error = ?inspect,
                not_found = inspect.is_not_found(),
                conflict = inspect.is_conflict(),
                "command failed"
            );
            eprintln!("error: {}", error_chain(&inspect));
            Ok(ExitCode::FAILURE)
        }
        Err(CommandError::Output(output)) if output.kind() == io::ErrorKind::BrokenPipe => {
            Ok(ExitCode::SUCCESS)
        }
        Err(CommandError::Output(output)) => Err(output).context("failed to write output"),
    }
}

/// Installs a compact stderr subscriber; an unparsable filter falls back to `info`.
fn init_tracing(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

enum CommandError {
    Inspect(InspectError),
    Output(io::Error),
}

impl From<InspectError> for CommandError {
    fn from(error: InspectError) -> Self {
        Self::Inspect(error)
    }
}

impl From<io::Error> for CommandError {
    fn from(error: io::Error) -> Self {
        Self::Output(error)
    }
}

async fn run(args: &CliArgs, settings: &Settings) -> Result<(), CommandError> {
    let gateway = KubeGateway::connect(settings.resolve_context(args.context.as_deref())).await?;
    let client = gateway.client();
    let resolve_namespace =
        |flag: Option<&str>| settings.resolve_namespace(flag, gateway.default_namespace());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::Show { target } => match target {
            ShowTarget::All { scope, kinds } => {
                let kinds = if kinds.is_empty() {
                    ResourceKind::OVERVIEW.to_vec()
                } else {
                    kinds.clone()
                };
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let resources = list::list_resources(&client, &namespace, &kinds).await?;
                render::write_resource_table(&mut out, &resources)?;
            }
            ShowTarget::Deploy { scope } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let rows = list::list_deployments(&client, &namespace).await?;
                render::write_deployment_table(&mut out, &rows)?;
            }
            ShowTarget::Namespaces => {
                let rows = list::list_namespaces(&client).await?;
                render::write_namespace_table(&mut out, &rows)?;
            }
            ShowTarget::Pods { scope } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let rows = list::list_pods(&client, &namespace).await?;
                render::write_pod_table(&mut out, &rows)?;
            }
            ShowTarget::Services { scope } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let rows = list::list_services(&client, &namespace).await?;
                render::write_service_table(&mut out, &rows)?;
            }
        },
        Command::Details { target } => match target {
            DetailsTarget::Pod { scope, name } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let pod = retrieve::pod_details(&client, &namespace, name).await?;
                render::write_pod_details(&mut out, &pod)?;
            }
            DetailsTarget::Deployment { scope, name } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let deployment = retrieve::deployment_details(&client, &namespace, name).await?;
                render::write_deployment_details(&mut out, &deployment)?;
            }
            DetailsTarget::Namespace { scope } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let details = retrieve::namespace_details(&client, &namespace).await?;
                render::write_namespace_details(&mut out, &details)?;
            }
            DetailsTarget::Service { scope, name } => {
                let namespace = resolve_namespace(scope.namespace.as_deref());
                let service = retrieve::service_details(&client, &namespace, name).await?;
                render::write_service_details(&mut out, &service)?;
            }
        },
        Command::Apply(apply) => {
            let applied = Applier::new(client)
                .default_namespace(resolve_namespace(None))
                .apply_file(&apply.file, apply.scope.namespace.as_deref())
                .await?;
            writeln!(out, "{} created: {}", applied.kind, applied.name)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
