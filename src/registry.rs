//! Cluster client registry
//!
//! Maps cluster names to authenticated connection handles. The registry is
//! populated once at startup (registration takes `&mut self`, so concurrent
//! population is a compile error, not a data race) and is read-only
//! afterwards — put it behind an `Arc` to share across tasks.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{AuthoritySource, ClientBuilder, ClusterHandle, KubeconfigClientBuilder};
use crate::session::{Session, SessionState};
use crate::{Error, Result, DEFAULT_CLUSTER_NAME, DEFAULT_KUBECONFIG_PATH};

/// A cluster's kubeconfig location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KubeconfigPath {
    /// Name the cluster is registered under
    pub cluster_name: String,
    /// Kubeconfig file to build the connection from
    pub path: PathBuf,
}

impl KubeconfigPath {
    /// Pair a cluster name with its kubeconfig file
    pub fn new(cluster_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            path: path.into(),
        }
    }
}

/// A cluster's pre-resolved client configuration
#[derive(Debug)]
pub struct NamedConfig {
    /// Name the cluster is registered under
    pub cluster_name: String,
    /// Ready-to-use client configuration
    pub config: kube::Config,
}

impl NamedConfig {
    /// Pair a cluster name with a pre-resolved configuration
    pub fn new(cluster_name: impl Into<String>, config: kube::Config) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            config,
        }
    }
}

/// How bulk registry construction treats a source that fails to build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Stop at the first bad source and fail construction
    #[default]
    FailFast,
    /// Log the failure and continue with the remaining sources
    SkipFailed,
}

/// Registry of named cluster connections
///
/// Owns one [`ClusterHandle`] per cluster for the process lifetime. Lookups
/// never fail: an unknown name yields a [`Session`] carrying a deferred
/// `UnknownCluster` error, so call chains stay fluent and the error surfaces
/// from the final operation.
#[derive(Default, Debug)]
pub struct ClientRegistry {
    clusters: HashMap<String, ClusterHandle>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster connection under `name`
    ///
    /// Duplicate names are allowed and the last registration wins; the
    /// overwrite is logged so a misconfigured fleet is visible.
    pub fn register(&mut self, name: impl Into<String>, handle: ClusterHandle) {
        let name = name.into();
        let endpoint = handle.authority().endpoint.clone();
        if self.clusters.insert(name.clone(), handle).is_some() {
            warn!(cluster = %name, "duplicate cluster registration, overwriting previous handle");
        }
        info!(cluster = %name, endpoint = %endpoint, "registered cluster");
    }

    /// Session for the named cluster
    ///
    /// An unknown name returns an errored session rather than failing here.
    pub fn session(&self, name: &str) -> Session {
        match self.clusters.get(name) {
            Some(handle) => Session::new(name, SessionState::Ready(handle.clone())),
            None => Session::new(
                name,
                SessionState::Errored(Error::UnknownCluster(name.to_string())),
            ),
        }
    }

    /// External identity of the named cluster's connection
    pub fn authority(&self, name: &str) -> Option<&AuthoritySource> {
        self.clusters.get(name).map(ClusterHandle::authority)
    }

    /// Names of every registered cluster
    pub fn clusters(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    /// Number of registered clusters
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if no cluster is registered
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Single-cluster registry from the fixed default kubeconfig location
    pub async fn from_default_kubeconfig() -> Result<Self> {
        let paths = [KubeconfigPath::new(
            DEFAULT_CLUSTER_NAME,
            DEFAULT_KUBECONFIG_PATH,
        )];
        Self::from_kubeconfig_paths(&paths, BuildPolicy::FailFast).await
    }

    /// Build a registry from kubeconfig files
    pub async fn from_kubeconfig_paths(
        paths: &[KubeconfigPath],
        policy: BuildPolicy,
    ) -> Result<Self> {
        Self::from_kubeconfig_paths_with(&KubeconfigClientBuilder::default(), paths, policy).await
    }

    /// Build a registry from kubeconfig files through a custom builder
    pub async fn from_kubeconfig_paths_with(
        builder: &dyn ClientBuilder,
        paths: &[KubeconfigPath],
        policy: BuildPolicy,
    ) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::config_build("no kubeconfig paths provided"));
        }

        let mut registry = Self::new();
        for source in paths {
            match builder.from_kubeconfig_file(&source.path).await {
                Ok(handle) => registry.register(&source.cluster_name, handle),
                Err(err) => match policy {
                    BuildPolicy::FailFast => return Err(err),
                    BuildPolicy::SkipFailed => {
                        warn!(
                            cluster = %source.cluster_name,
                            error = %err,
                            "skipping cluster with unusable kubeconfig"
                        );
                    }
                },
            }
        }
        Ok(registry)
    }

    /// Build a registry from pre-resolved client configurations
    pub async fn from_configs(configs: Vec<NamedConfig>, policy: BuildPolicy) -> Result<Self> {
        Self::from_configs_with(&KubeconfigClientBuilder::default(), configs, policy).await
    }

    /// Build a registry from pre-resolved configurations through a custom builder
    pub async fn from_configs_with(
        builder: &dyn ClientBuilder,
        configs: Vec<NamedConfig>,
        policy: BuildPolicy,
    ) -> Result<Self> {
        if configs.is_empty() {
            return Err(Error::config_build("no cluster configurations provided"));
        }

        let mut registry = Self::new();
        for source in configs {
            match builder.from_config(source.config).await {
                Ok(handle) => registry.register(&source.cluster_name, handle),
                Err(err) => match policy {
                    BuildPolicy::FailFast => return Err(err),
                    BuildPolicy::SkipFailed => {
                        warn!(
                            cluster = %source.cluster_name,
                            error = %err,
                            "skipping cluster with unusable configuration"
                        );
                    }
                },
            }
        }
        Ok(registry)
    }
}
