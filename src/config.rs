//! Kubeconfig loading and connection handle construction
//!
//! Builds one authenticated [`ClusterHandle`] per cluster from a kubeconfig
//! file or a pre-resolved [`kube::Config`]. The [`ClientBuilder`] trait is the
//! seam between registry construction and the kube client machinery, enabling
//! mocking in tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::{Error, Result};

/// Default connection timeout for cluster clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for cluster clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// External identity of a connection: which endpoint it talks to, as whom
///
/// Captured once when the handle is built; the user is the kubeconfig's
/// current-context user and is empty for pre-resolved configs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthoritySource {
    /// API server endpoint the handle is bound to
    pub endpoint: String,
    /// Kubeconfig user the credentials belong to
    pub user: String,
}

/// Authenticated connection to one cluster
///
/// Immutable after creation. Cloning is cheap ([`kube::Client`] is itself a
/// shared handle), so the registry hands out clones to every session it
/// creates for the cluster.
#[derive(Clone)]
pub struct ClusterHandle {
    client: Client,
    authority: AuthoritySource,
}

impl std::fmt::Debug for ClusterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `kube::Client` is not `Debug`; elide it.
        f.debug_struct("ClusterHandle")
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl ClusterHandle {
    /// Wrap an already-built client together with its external identity
    pub fn new(client: Client, authority: AuthoritySource) -> Self {
        Self { client, authority }
    }

    /// The underlying API client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Endpoint and user this handle authenticates as
    pub fn authority(&self) -> &AuthoritySource {
        &self.authority
    }
}

/// Trait for building cluster connection handles
///
/// Abstracts kube client creation so registry construction can be unit tested
/// with a mock instead of real kubeconfig files.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClientBuilder: Send + Sync {
    /// Build a handle from a kubeconfig file on disk
    async fn from_kubeconfig_file(&self, path: &Path) -> Result<ClusterHandle>;

    /// Build a handle from a pre-resolved client configuration
    async fn from_config(&self, config: Config) -> Result<ClusterHandle>;
}

/// Production [`ClientBuilder`] backed by kube's kubeconfig machinery
///
/// Applies connect/read timeouts to every client it builds so no remote call
/// can block past the transport bounds.
#[derive(Clone, Debug)]
pub struct KubeconfigClientBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for KubeconfigClientBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl KubeconfigClientBuilder {
    /// Override the default transport timeouts
    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    fn handle_from_config(&self, mut config: Config, user: String) -> Result<ClusterHandle> {
        config.connect_timeout = Some(self.connect_timeout);
        config.read_timeout = Some(self.read_timeout);

        let authority = AuthoritySource {
            endpoint: config.cluster_url.to_string(),
            user,
        };
        let client = Client::try_from(config)
            .map_err(|e| Error::config_build(format!("failed to create client: {}", e)))?;

        debug!(endpoint = %authority.endpoint, user = %authority.user, "built cluster client");
        Ok(ClusterHandle::new(client, authority))
    }
}

#[async_trait]
impl ClientBuilder for KubeconfigClientBuilder {
    async fn from_kubeconfig_file(&self, path: &Path) -> Result<ClusterHandle> {
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            Error::config_build(format!("failed to read kubeconfig {}: {}", path.display(), e))
        })?;
        let user = current_context_user(&kubeconfig);

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                Error::config_build(format!(
                    "failed to load kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;

        self.handle_from_config(config, user)
    }

    async fn from_config(&self, config: Config) -> Result<ClusterHandle> {
        // Pre-resolved configs carry no kubeconfig context, so no user name.
        self.handle_from_config(config, String::new())
    }
}

/// User named by the kubeconfig's current context, or empty
fn current_context_user(kubeconfig: &Kubeconfig) -> String {
    let Some(current) = kubeconfig.current_context.as_deref() else {
        return String::new();
    };
    kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == current)
        .and_then(|c| c.context.as_ref())
        .and_then(|c| c.user.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: https://10.0.0.1:6443
contexts:
- name: test
  context:
    cluster: test
    user: deployer
current-context: test
users:
- name: deployer
  user:
    token: not-a-real-token
"#;

    fn offline_config() -> Config {
        Config::new("https://10.0.0.1:6443".parse().unwrap())
    }

    #[tokio::test]
    async fn missing_kubeconfig_file_is_a_config_build_error() {
        let builder = KubeconfigClientBuilder::default();
        let err = builder
            .from_kubeconfig_file(Path::new("/nonexistent/kubeconfig"))
            .await
            .unwrap_err();
        match err {
            Error::ConfigBuild(msg) => assert!(msg.contains("/nonexistent/kubeconfig")),
            other => panic!("Expected ConfigBuild, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn kubeconfig_file_yields_handle_with_authority() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KUBECONFIG.as_bytes()).unwrap();

        let builder = KubeconfigClientBuilder::default();
        let handle = builder.from_kubeconfig_file(file.path()).await.unwrap();

        assert_eq!(
            handle.authority().endpoint.trim_end_matches('/'),
            "https://10.0.0.1:6443"
        );
        assert_eq!(handle.authority().user, "deployer");
    }

    #[tokio::test]
    async fn prebuilt_config_yields_handle_without_user() {
        let builder = KubeconfigClientBuilder::default();
        let handle = builder.from_config(offline_config()).await.unwrap();

        assert!(handle.authority().endpoint.starts_with("https://10.0.0.1:6443"));
        assert_eq!(handle.authority().user, "");
    }

    #[test]
    fn current_context_user_handles_missing_context() {
        let kubeconfig = Kubeconfig::default();
        assert_eq!(current_context_user(&kubeconfig), "");
    }
}
