//! Resource adapters implementing the uniform CRUD contract
//!
//! One adapter per resource kind, each bound to a single cluster through the
//! session state it was created with. The manifest-driven kinds (Deployment,
//! Service, Job, ConfigMap, Secret) share one generic implementation,
//! [`CrudClient`]; Pod, Event, and Namespace have their own contracts layered
//! on the same trait.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::session::SessionState;
use crate::{Error, Result};

pub mod deployment;
pub mod event;
pub mod job;
pub mod namespace;
pub mod pod;

pub use deployment::DeploymentStatus;
pub use event::{EventClient, EventInfo, EventSelector};
pub use namespace::NamespaceClient;
pub use pod::{ContainerInfo, PodClient, PodInfo};

/// Namespace targeted when a manifest carries none
const DEFAULT_NAMESPACE: &str = "default";

/// Uniform contract every resource adapter satisfies
///
/// All operations are synchronous remote calls with no retry; cancellation is
/// the caller's concern (drop the future or wrap it in a timeout). Every
/// entry point checks the adapter's inherited error state first and
/// short-circuits with the deferred error before any remote work.
#[async_trait]
pub trait ResourceClient: Send + Sync + std::fmt::Debug {
    /// Record a failure on this adapter; the first recorded error is sticky
    fn set_err(&mut self, err: Error);

    /// Parse `manifest` and submit the object to the cluster
    ///
    /// The target namespace is the manifest's `metadata.namespace`
    /// (`default` when absent). Fails with `ManifestParse` on malformed
    /// input and `RemoteApi` on submission failure.
    async fn create(&self, manifest: &str) -> Result<()>;

    /// Parse `manifest` and replace the live object with it
    ///
    /// Full-object replace; there are no merge-patch semantics.
    async fn update(&self, manifest: &str) -> Result<()>;

    /// Remove the named object from the given namespace
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;

    /// Fetch the named object and return its canonical JSON snapshot
    ///
    /// The snapshot reflects the live object, not the manifest it was
    /// created from.
    async fn get(&self, namespace: &str, name: &str) -> Result<String>;
}

/// Generic adapter for the manifest-driven resource kinds
///
/// One implementation covers every kind whose adapter is "parse the manifest,
/// call the namespaced API" — the per-kind aliases below pin the resource
/// type.
#[derive(Clone, Debug)]
pub struct CrudClient<K> {
    state: SessionState,
    _kind: PhantomData<K>,
}

/// Deployment adapter
pub type DeploymentClient = CrudClient<Deployment>;
/// Service adapter
pub type ServiceClient = CrudClient<Service>;
/// Job adapter
pub type JobClient = CrudClient<Job>;
/// ConfigMap adapter
pub type ConfigMapClient = CrudClient<ConfigMap>;
/// Secret adapter
pub type SecretClient = CrudClient<Secret>;

impl<K> CrudClient<K> {
    pub(crate) fn new(state: SessionState) -> Self {
        Self {
            state,
            _kind: PhantomData,
        }
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    /// The deferred error, if one is recorded
    pub fn err(&self) -> Option<&Error> {
        self.state.err()
    }
}

#[async_trait]
impl<K> ResourceClient for CrudClient<K>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + fmt::Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
    K::DynamicType: Default,
{
    fn set_err(&mut self, err: Error) {
        self.state.record_err(err);
    }

    async fn create(&self, manifest: &str) -> Result<()> {
        let client = self.state.client()?;
        let obj: K = parse_manifest(manifest)?;
        let api: Api<K> = Api::namespaced(client.clone(), &target_namespace(&obj));
        api.create(&PostParams::default(), &obj).await?;
        Ok(())
    }

    async fn update(&self, manifest: &str) -> Result<()> {
        let client = self.state.client()?;
        let obj: K = parse_manifest(manifest)?;
        let api: Api<K> = Api::namespaced(client.clone(), &target_namespace(&obj));
        api.replace(&obj.name_any(), &PostParams::default(), &obj)
            .await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let client = self.state.client()?;
        let api: Api<K> = Api::namespaced(client.clone(), namespace);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<K> = Api::namespaced(client.clone(), namespace);
        let obj = api.get(name).await?;
        to_snapshot(&obj)
    }
}

/// Parse a YAML (or JSON — YAML is a superset) manifest into a typed object
pub(crate) fn parse_manifest<K: DeserializeOwned>(manifest: &str) -> Result<K> {
    serde_yaml::from_str(manifest).map_err(|e| Error::manifest_parse(e.to_string()))
}

/// Serialize a live object into its canonical JSON snapshot
pub(crate) fn to_snapshot<T: Serialize>(obj: &T) -> Result<String> {
    serde_json::to_string(obj).map_err(|e| Error::serialization(e.to_string()))
}

/// Namespace a manifest targets: its own, or `default` when unset
fn target_namespace<K: Resource>(obj: &K) -> String
where
    K::DynamicType: Default,
{
    obj.namespace()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

/// Render a Kubernetes timestamp in the projection layout, empty when unset
pub(crate) fn format_time(
    time: Option<&k8s_openapi::apimachinery::pkg::apis::meta::v1::Time>,
) -> String {
    time.map(|t| t.0.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
