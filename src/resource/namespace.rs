//! Namespace operations
//!
//! Namespaces get a deliberately narrower contract than the manifest-driven
//! kinds: creation takes a bare name and synthesizes a minimal object, there
//! is no update, and status is just the phase string.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, DeleteParams, PostParams};
use kube::core::ObjectMeta;

use super::{to_snapshot, ResourceClient};
use crate::session::SessionState;
use crate::{Error, Result};

/// Namespace adapter
///
/// Namespaces are cluster-scoped, so the `namespace` argument of the generic
/// contract is ignored by `delete` and `get`; the `name` argument selects the
/// namespace itself.
#[derive(Clone, Debug)]
pub struct NamespaceClient {
    state: SessionState,
}

impl NamespaceClient {
    pub(crate) fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// The deferred error, if one is recorded
    pub fn err(&self) -> Option<&Error> {
        self.state.err()
    }

    /// Phase of the named namespace (`Active` or `Terminating`)
    pub async fn get_status(&self, name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<Namespace> = Api::all(client.clone());
        let namespace = api.get(name).await?;
        Ok(namespace
            .status
            .and_then(|status| status.phase)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ResourceClient for NamespaceClient {
    fn set_err(&mut self, err: Error) {
        self.state.record_err(err);
    }

    /// Create a namespace from a bare *name*, not a manifest
    ///
    /// A minimal object is synthesized around the trimmed input.
    async fn create(&self, input: &str) -> Result<()> {
        let client = self.state.client()?;
        let name = input.trim();
        if name.is_empty() {
            return Err(Error::manifest_parse("namespace name is empty"));
        }

        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let api: Api<Namespace> = Api::all(client.clone());
        api.create(&PostParams::default(), &namespace).await?;
        Ok(())
    }

    async fn update(&self, _manifest: &str) -> Result<()> {
        Err(Error::NotImplemented("namespace update"))
    }

    async fn delete(&self, _namespace: &str, name: &str) -> Result<()> {
        let client = self.state.client()?;
        let api: Api<Namespace> = Api::all(client.clone());
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn get(&self, _namespace: &str, name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<Namespace> = Api::all(client.clone());
        let namespace = api.get(name).await?;
        to_snapshot(&namespace)
    }
}
