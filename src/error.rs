//! Error types for multikube operations

use thiserror::Error;

/// Main error type for multikube operations
///
/// Every variant carries owned data, so the type is `Clone`: a handle that
/// recorded a deferred error returns the same error from each subsequent
/// operation without re-contacting the cluster.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubeconfig could not be read or a client could not be built from it
    #[error("config build error: {0}")]
    ConfigBuild(String),

    /// Session lookup for a cluster name that was never registered
    #[error("unknown cluster {0:?}")]
    UnknownCluster(String),

    /// Generic dispatch on a tag outside the fixed resource kind set
    #[error("unknown resource kind {0:?}")]
    UnknownResourceKind(String),

    /// Manifest text could not be parsed into the adapter's resource type
    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    /// The remote API reported that the named object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote API call failure other than a missing object
    #[error("kubernetes error: {0}")]
    RemoteApi(String),

    /// A live object could not be serialized into its snapshot form
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reserved operation that this resource kind does not support
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl Error {
    /// Create a config build error with the given message
    pub fn config_build(msg: impl Into<String>) -> Self {
        Self::ConfigBuild(msg.into())
    }

    /// Create a manifest parse error with the given message
    pub fn manifest_parse(msg: impl Into<String>) -> Self {
        Self::ManifestParse(msg.into())
    }

    /// Create a remote API error with the given message
    pub fn remote_api(msg: impl Into<String>) -> Self {
        Self::RemoteApi(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// True if this error reports a missing remote object
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => Self::NotFound(resp.message),
            other => Self::RemoteApi(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: a lookup miss names the missing cluster
    ///
    /// The session facade records an UnknownCluster error instead of failing
    /// the lookup call; when the caller finally checks, the message must say
    /// which name was wrong.
    #[test]
    fn story_unknown_cluster_identifies_missing_name() {
        let err = Error::UnknownCluster("staging-eu".to_string());
        assert!(err.to_string().contains("staging-eu"));

        match err {
            Error::UnknownCluster(name) => assert_eq!(name, "staging-eu"),
            _ => panic!("Expected UnknownCluster variant"),
        }
    }

    /// Story: remote 404s surface as the NotFound sub-kind
    ///
    /// Delete-then-get flows rely on distinguishing "the object is gone"
    /// from other remote failures.
    #[test]
    fn story_remote_404_maps_to_not_found() {
        let resp = kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "deployments.apps \"web\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        };
        let err: Error = kube::Error::Api(resp).into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("web"));
    }

    /// Story: non-404 API failures stay in the remote family
    #[test]
    fn story_remote_conflict_maps_to_remote_api() {
        let resp = kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "deployments.apps \"web\" already exists".to_string(),
            reason: "AlreadyExists".to_string(),
            code: 409,
        };
        let err: Error = kube::Error::Api(resp).into();
        assert!(!err.is_not_found());
        match &err {
            Error::RemoteApi(msg) => assert!(msg.contains("already exists")),
            _ => panic!("Expected RemoteApi variant"),
        }
    }

    /// Story: deferred errors clone without losing their message
    ///
    /// A sticky handle hands out clones of the recorded error, so the clone
    /// must be indistinguishable from the original.
    #[test]
    fn story_clone_preserves_deferred_error() {
        let err = Error::ConfigBuild("bad certificate data".to_string());
        let clone = err.clone();
        assert_eq!(err.to_string(), clone.to_string());
    }

    /// Story: error constructors accept both String and &str
    #[test]
    fn story_error_construction_ergonomics() {
        let path = "/etc/kube/missing.yaml";
        let err = Error::config_build(format!("cannot read {}", path));
        assert!(err.to_string().contains(path));

        let err = Error::manifest_parse("unexpected key");
        assert!(err.to_string().contains("manifest parse error"));
    }
}
