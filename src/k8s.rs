use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::error::InspectError;

/// An authenticated cluster connection and the namespace its configuration defaults to.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    default_namespace: String,
}

impl KubeGateway {
    /// Connects using the kubeconfig (optionally a specific context), falling back to
    /// in-cluster configuration when no kubeconfig exists.
    pub async fn connect(context: Option<&str>) -> Result<Self, InspectError> {
        let kubeconfig = Kubeconfig::read().ok();

        let config = if let Some(kubeconfig) = kubeconfig.clone() {
            let options = KubeConfigOptions {
                context: context.map(str::to_string),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|error| InspectError::Config(Box::new(error)))?
        } else {
            if let Some(context) = context {
                return Err(InspectError::Config(
                    format!("kubeconfig not found; cannot select context '{context}'").into(),
                ));
            }
            Config::infer()
                .await
                .map_err(|error| InspectError::Config(Box::new(error)))?
        };

        let cluster = config.cluster_url.to_string();
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config).map_err(InspectError::Client)?;

        let context = context
            .map(str::to_string)
            .or_else(|| kubeconfig.and_then(|cfg| cfg.current_context))
            .unwrap_or_else(|| "in-cluster".to_string());
        debug!(%context, %cluster, %default_namespace, "connected");

        Ok(Self {
            client,
            default_namespace,
        })
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }
}
