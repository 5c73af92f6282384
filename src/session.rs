//! Per-lookup cluster session with sticky deferred-error state
//!
//! A [`Session`] is a transient value created by every registry lookup. It is
//! a two-state machine: `Ready` (bound to a connection) or `Errored`
//! (terminal). Lookup failures land in the `Errored` state instead of failing
//! the lookup call, which keeps call chains fluent:
//!
//! ```no_run
//! # async fn run(registry: multikube::registry::ClientRegistry) -> multikube::Result<()> {
//! let status = registry
//!     .session("prod")
//!     .deployments()
//!     .get_status("default", "web")
//!     .await?; // an unknown cluster surfaces here, not at session()
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use kube::Client;

use crate::config::ClusterHandle;
use crate::resource::{
    ConfigMapClient, CrudClient, DeploymentClient, EventClient, JobClient, NamespaceClient,
    PodClient, ResourceClient, SecretClient, ServiceClient,
};
use crate::{Error, Result};

/// Connection state carried by a session and by every adapter derived from it
///
/// `Errored` is terminal and holds no connection at all: an operation that
/// short-circuits on a deferred error *cannot* reach the network, by
/// construction. A fresh session must be obtained from the registry to retry.
#[derive(Clone)]
pub enum SessionState {
    /// Connection available, no failure recorded
    Ready(ClusterHandle),
    /// Sticky failure; every operation returns a clone of this error
    Errored(Error),
}

impl SessionState {
    /// The API client, or a clone of the deferred error
    ///
    /// Every adapter entry point calls this first, so the sticky error
    /// short-circuits before any remote work.
    pub fn client(&self) -> Result<&Client> {
        match self {
            Self::Ready(handle) => Ok(handle.client()),
            Self::Errored(err) => Err(err.clone()),
        }
    }

    /// The recorded error, if any
    pub fn err(&self) -> Option<&Error> {
        match self {
            Self::Ready(_) => None,
            Self::Errored(err) => Some(err),
        }
    }

    /// Record a failure; the first recorded error wins
    pub fn record_err(&mut self, err: Error) {
        if matches!(self, Self::Ready(_)) {
            *self = Self::Errored(err);
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(handle) => f
                .debug_tuple("Ready")
                .field(&handle.authority().endpoint)
                .finish(),
            Self::Errored(err) => f.debug_tuple("Errored").field(err).finish(),
        }
    }
}

/// Tag identifying one of the managed resource kinds
///
/// Used as the generic dispatch key and as the human-readable token in
/// `UnknownResourceKind` errors. The string forms are the wire-stable tags
/// (`deployment`, `service`, `job`, `configMap`, `event`, `pod`, `secret`,
/// `namespace`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// apps/v1 Deployment
    Deployment,
    /// core/v1 Service
    Service,
    /// batch/v1 Job
    Job,
    /// core/v1 ConfigMap
    ConfigMap,
    /// core/v1 Event
    Event,
    /// core/v1 Pod
    Pod,
    /// core/v1 Secret
    Secret,
    /// core/v1 Namespace
    Namespace,
}

impl ResourceKind {
    /// Every kind the dispatch layer knows about
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Deployment,
        ResourceKind::Service,
        ResourceKind::Job,
        ResourceKind::ConfigMap,
        ResourceKind::Event,
        ResourceKind::Pod,
        ResourceKind::Secret,
        ResourceKind::Namespace,
    ];

    /// The dispatch tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::Job => "job",
            Self::ConfigMap => "configMap",
            Self::Event => "event",
            Self::Pod => "pod",
            Self::Secret => "secret",
            Self::Namespace => "namespace",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "deployment" => Ok(Self::Deployment),
            "service" => Ok(Self::Service),
            "job" => Ok(Self::Job),
            "configMap" => Ok(Self::ConfigMap),
            "event" => Ok(Self::Event),
            "pod" => Ok(Self::Pod),
            "secret" => Ok(Self::Secret),
            "namespace" => Ok(Self::Namespace),
            other => Err(Error::UnknownResourceKind(other.to_string())),
        }
    }
}

/// Handle for resource operations against one cluster
///
/// Obtained from [`crate::registry::ClientRegistry::session`]; short-lived and
/// cheap, meant to be created per call chain and discarded.
///
/// Every accessor snapshots the session's state at the moment it is called:
/// a later [`Session::set_err`] does not affect adapters that already exist,
/// and adapters created afterwards inherit the error.
#[derive(Clone, Debug)]
pub struct Session {
    cluster: String,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(cluster: impl Into<String>, state: SessionState) -> Self {
        Self {
            cluster: cluster.into(),
            state,
        }
    }

    /// Name of the cluster this session was requested for
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// The deferred error, if one is recorded
    pub fn err(&self) -> Option<&Error> {
        self.state.err()
    }

    /// Record a failure on this session; the first recorded error is sticky
    pub fn set_err(&mut self, err: Error) {
        self.state.record_err(err);
    }

    /// Deployment operations
    pub fn deployments(&self) -> DeploymentClient {
        CrudClient::new(self.state.clone())
    }

    /// Service operations
    pub fn services(&self) -> ServiceClient {
        CrudClient::new(self.state.clone())
    }

    /// Job operations
    pub fn jobs(&self) -> JobClient {
        CrudClient::new(self.state.clone())
    }

    /// ConfigMap operations
    pub fn config_maps(&self) -> ConfigMapClient {
        CrudClient::new(self.state.clone())
    }

    /// Secret operations
    pub fn secrets(&self) -> SecretClient {
        CrudClient::new(self.state.clone())
    }

    /// Pod operations
    pub fn pods(&self) -> PodClient {
        PodClient::new(self.state.clone())
    }

    /// Event operations
    pub fn events(&self) -> EventClient {
        EventClient::new(self.state.clone())
    }

    /// Namespace operations
    pub fn namespaces(&self) -> NamespaceClient {
        NamespaceClient::new(self.state.clone())
    }

    /// Adapter for `kind` behind the uniform CRUD contract
    ///
    /// Builds a fresh adapter on every call — dispatch is a pure function of
    /// the session with no caching, so the adapter always reflects the
    /// session's error state at the moment of the call.
    pub fn resource(&self, kind: ResourceKind) -> Box<dyn ResourceClient> {
        match kind {
            ResourceKind::Deployment => Box::new(self.deployments()),
            ResourceKind::Service => Box::new(self.services()),
            ResourceKind::Job => Box::new(self.jobs()),
            ResourceKind::ConfigMap => Box::new(self.config_maps()),
            ResourceKind::Event => Box::new(self.events()),
            ResourceKind::Pod => Box::new(self.pods()),
            ResourceKind::Secret => Box::new(self.secrets()),
            ResourceKind::Namespace => Box::new(self.namespaces()),
        }
    }

    /// String-tag entry point for generic dispatch
    ///
    /// A tag outside the fixed kind set fails with `UnknownResourceKind` and
    /// never yields an adapter.
    pub fn resource_by_tag(&self, tag: &str) -> Result<Box<dyn ResourceClient>> {
        Ok(self.resource(tag.parse()?))
    }
}
