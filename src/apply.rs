//! Creating cluster objects from single-document manifests.

use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Namespace, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

use crate::error::InspectError;

type CreateFuture = BoxFuture<'static, Result<String, InspectError>>;

/// Decodes a manifest into its typed object and creates it, yielding the created name.
pub type CreateFn = fn(Client, String, Value) -> CreateFuture;

/// Typed API objects a manifest can be decoded into and created as.
pub trait ManifestObject:
    k8s_openapi::Resource
    + k8s_openapi::Metadata<Ty = ObjectMeta>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
}

impl<K> ManifestObject for K where
    K: k8s_openapi::Resource
        + k8s_openapi::Metadata<Ty = ObjectMeta>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static
{
}

/// Outcome of a successful create.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Applied {
    pub kind: String,
    pub name: String,
}

/// Maps a manifest `kind` to the create call for that kind.
#[derive(Clone, Default)]
pub struct KindRegistry {
    creators: BTreeMap<&'static str, CreateFn>,
}

impl KindRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry
            .register_namespaced::<Deployment>()
            .register_namespaced::<Service>()
            .register_namespaced::<StatefulSet>()
            .register_namespaced::<DaemonSet>()
            .register_namespaced::<Job>()
            .register_namespaced::<CronJob>()
            .register_cluster::<Namespace>();
        registry
    }

    pub fn register_namespaced<K>(&mut self) -> &mut Self
    where
        K: ManifestObject<Scope = NamespaceResourceScope>,
    {
        self.register(K::KIND, create_namespaced::<K>)
    }

    pub fn register_cluster<K>(&mut self) -> &mut Self
    where
        K: ManifestObject<Scope = ClusterResourceScope>,
    {
        self.register(K::KIND, create_cluster::<K>)
    }

    pub fn register(&mut self, kind: &'static str, create: CreateFn) -> &mut Self {
        self.creators.insert(kind, create);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.creators.keys().copied()
    }

    fn get(&self, kind: &str) -> Option<CreateFn> {
        self.creators.get(kind).copied()
    }
}

pub struct Applier {
    client: Client,
    registry: KindRegistry,
    default_namespace: String,
}

impl Applier {
    pub fn new(client: Client) -> Self {
        Self::with_registry(client, KindRegistry::builtin())
    }

    pub fn with_registry(client: Client, registry: KindRegistry) -> Self {
        let default_namespace = client.default_namespace().to_string();
        Self {
            client,
            registry,
            default_namespace,
        }
    }

    /// Namespace for manifests that name none, instead of the client's default.
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    pub async fn apply_file(
        &self,
        path: &Path,
        namespace: Option<&str>,
    ) -> Result<Applied, InspectError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InspectError::Read {
                path: path.display().to_string(),
                source,
            })?;
        self.apply_str(&content, namespace).await
    }

    /// Creates the single object described by `manifest`.
    ///
    /// The target namespace is `namespace` when given, else the manifest's own
    /// `metadata.namespace`, else the applier's default namespace. Cluster-scoped
    /// kinds ignore it.
    pub async fn apply_str(
        &self,
        manifest: &str,
        namespace: Option<&str>,
    ) -> Result<Applied, InspectError> {
        let document = single_document(manifest)?;
        let kind = document
            .get("kind")
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or(InspectError::MissingKind)?
            .to_string();
        let Some(create) = self.registry.get(&kind) else {
            let supported = self.registry.kinds().collect::<Vec<_>>();
            debug!(%kind, ?supported, "no create call registered for kind");
            return Err(InspectError::UnsupportedKind(kind));
        };

        let namespace = namespace
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| {
                document
                    .pointer("/metadata/namespace")
                    .and_then(Value::as_str)
                    .filter(|value| !value.is_empty())
            })
            .unwrap_or(self.default_namespace.as_str())
            .to_string();
        debug!(%kind, %namespace, "creating object from manifest");

        let name = create(self.client.clone(), namespace, document).await?;
        info!(%kind, %name, "created");
        Ok(Applied { kind, name })
    }
}

/// The one non-empty document in `manifest`; empty documents such as a trailing
/// `---` are skipped.
fn single_document(manifest: &str) -> Result<Value, InspectError> {
    let mut found = None;
    for document in serde_yaml::Deserializer::from_str(manifest) {
        let value = Value::deserialize(document).map_err(InspectError::Parse)?;
        if value.is_null() {
            continue;
        }
        if found.replace(value).is_some() {
            return Err(InspectError::MultipleDocuments);
        }
    }
    found.ok_or(InspectError::EmptyManifest)
}

fn create_namespaced<K>(client: Client, namespace: String, document: Value) -> CreateFuture
where
    K: ManifestObject<Scope = NamespaceResourceScope>,
{
    async move {
        let object = decode::<K>(document)?;
        let api: Api<K> = Api::namespaced(client, &namespace);
        let created = api
            .create(&PostParams::default(), &object)
            .await
            .map_err(InspectError::Create)?;
        Ok(created.name_any())
    }
    .boxed()
}

fn create_cluster<K>(client: Client, _namespace: String, document: Value) -> CreateFuture
where
    K: ManifestObject<Scope = ClusterResourceScope>,
{
    async move {
        let object = decode::<K>(document)?;
        let api: Api<K> = Api::all(client);
        let created = api
            .create(&PostParams::default(), &object)
            .await
            .map_err(InspectError::Create)?;
        Ok(created.name_any())
    }
    .boxed()
}

fn decode<K>(document: Value) -> Result<K, InspectError>
where
    K: k8s_openapi::Resource + DeserializeOwned,
{
    serde_json::from_value(document).map_err(|source| InspectError::Decode {
        kind: K::KIND.to_string(),
        source,
    })
}
