//! Multikube - uniform Kubernetes resource operations across many clusters
//!
//! Multikube wraps one authenticated [`kube::Client`] per named cluster and
//! exposes the same small CRUD surface for every resource kind it manages
//! (deployments, services, jobs, config maps, secrets, pods, events,
//! namespaces).
//!
//! # Architecture
//!
//! - A [`registry::ClientRegistry`] is populated once at startup from one or
//!   more kubeconfig sources and owns the connection handles for the process
//!   lifetime.
//! - Each lookup yields a short-lived [`session::Session`]. A failed lookup
//!   does not fail the call: the session carries a deferred error instead, so
//!   call chains stay fluent and the error surfaces from the final operation.
//! - Resource adapters are obtained from the session either through typed
//!   accessors ([`session::Session::deployments`] etc.) or through generic
//!   dispatch on a [`session::ResourceKind`] tag.
//!
//! # Modules
//!
//! - [`registry`] - cluster name to connection handle mapping
//! - [`session`] - per-lookup handle with sticky deferred-error state
//! - [`resource`] - per-kind adapters implementing the CRUD contract
//! - [`config`] - kubeconfig loading and connection handle construction
//! - [`error`] - error types
//!
//! # Example
//!
//! ```no_run
//! use multikube::registry::{BuildPolicy, ClientRegistry, KubeconfigPath};
//! use multikube::resource::ResourceClient;
//!
//! # async fn run() -> multikube::Result<()> {
//! let registry = ClientRegistry::from_kubeconfig_paths(
//!     &[KubeconfigPath::new("prod", "/etc/kube/prod.yaml")],
//!     BuildPolicy::FailFast,
//! )
//! .await?;
//!
//! let manifest = std::fs::read_to_string("deployment.yaml").unwrap();
//! registry.session("prod").deployments().create(&manifest).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod registry;
pub mod resource;
pub mod session;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Cluster name used by the single-cluster convenience constructor
pub const DEFAULT_CLUSTER_NAME: &str = "default";

/// Kubeconfig location used by the single-cluster convenience constructor
pub const DEFAULT_KUBECONFIG_PATH: &str = "/root/kubeconfig";

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for unit tests
    //!
    //! The offline handles are bound to a port nothing listens on: usable for
    //! constructing sessions and adapters, and any operation that actually
    //! reaches for the network fails fast with a transport error instead of
    //! hanging.

    use crate::config::{AuthoritySource, ClusterHandle};
    use crate::session::SessionState;

    pub fn offline_handle(endpoint: &str) -> ClusterHandle {
        let config = kube::Config::new("http://127.0.0.1:1".parse().unwrap());
        let client = kube::Client::try_from(config).unwrap();
        ClusterHandle::new(
            client,
            AuthoritySource {
                endpoint: endpoint.to_string(),
                user: "test".to_string(),
            },
        )
    }

    pub fn offline_state() -> SessionState {
        SessionState::Ready(offline_handle("http://127.0.0.1:1/"))
    }

    pub fn errored_state() -> SessionState {
        SessionState::Errored(crate::Error::UnknownCluster("test".to_string()))
    }
}
