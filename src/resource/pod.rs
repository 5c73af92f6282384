//! Pod listing, log retrieval, and the reserved write surface

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerState, ContainerStatus, Pod};
use kube::api::{Api, ListParams, LogParams};
use serde::{Deserialize, Serialize};

use super::{to_snapshot, ResourceClient};
use crate::session::SessionState;
use crate::{Error, Result};

/// Identity, network, and runtime summary of one pod
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PodInfo {
    /// Pod name
    pub name: String,
    /// Lifecycle phase (`Pending`, `Running`, ...)
    pub phase: String,
    /// IP of the node hosting the pod
    pub host_ip: String,
    /// IP assigned to the pod
    pub pod_ip: String,
    /// When the pod was scheduled; empty while pending
    pub start_time: String,
    /// Runtime state of each container
    pub containers: Vec<ContainerInfo>,
}

/// Runtime state of one container within a pod
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ContainerInfo {
    /// Container name
    pub name: String,
    /// State label: `running`, `waiting`, `terminated`, or `unknown`
    pub state: String,
    /// Whether the container passes readiness
    pub ready: bool,
    /// Times the container has restarted
    pub restart_count: i32,
    /// Image reference the container runs
    pub image: String,
    /// Resolved image digest
    pub image_id: String,
    /// Runtime container identifier
    pub container_id: String,
}

/// Pod adapter
///
/// Pods are observed, not managed: `create`/`update`/`delete` are reserved
/// and fail with `NotImplemented` so no caller can mistake them for writes
/// that happened.
#[derive(Clone, Debug)]
pub struct PodClient {
    state: SessionState,
}

impl PodClient {
    pub(crate) fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// The deferred error, if one is recorded
    pub fn err(&self) -> Option<&Error> {
        self.state.err()
    }

    /// List every pod in `namespace` with per-container runtime detail
    pub async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>> {
        let client = self.state.client()?;
        let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let pods = api.list(&ListParams::default()).await?;
        Ok(pods.items.iter().map(project_pod).collect())
    }

    /// Raw log text for the named pod, with per-line timestamps
    pub async fn get_logs(&self, namespace: &str, pod_name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let params = LogParams {
            timestamps: true,
            ..Default::default()
        };
        Ok(api.logs(pod_name, &params).await?)
    }
}

#[async_trait]
impl ResourceClient for PodClient {
    fn set_err(&mut self, err: Error) {
        self.state.record_err(err);
    }

    async fn create(&self, _manifest: &str) -> Result<()> {
        Err(Error::NotImplemented("pod create"))
    }

    async fn update(&self, _manifest: &str) -> Result<()> {
        Err(Error::NotImplemented("pod update"))
    }

    async fn delete(&self, _namespace: &str, _name: &str) -> Result<()> {
        Err(Error::NotImplemented("pod delete"))
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let pod = api.get(name).await?;
        to_snapshot(&pod)
    }
}

fn project_pod(pod: &Pod) -> PodInfo {
    let mut info = PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        ..Default::default()
    };
    let Some(status) = pod.status.as_ref() else {
        return info;
    };

    info.phase = status.phase.clone().unwrap_or_default();
    info.host_ip = status.host_ip.clone().unwrap_or_default();
    info.pod_ip = status.pod_ip.clone().unwrap_or_default();
    info.start_time = super::format_time(status.start_time.as_ref());
    info.containers = status
        .container_statuses
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(project_container)
        .collect();
    info
}

fn project_container(status: &ContainerStatus) -> ContainerInfo {
    ContainerInfo {
        name: status.name.clone(),
        state: state_label(status.state.as_ref()).to_string(),
        ready: status.ready,
        restart_count: status.restart_count,
        image: status.image.clone(),
        image_id: status.image_id.clone(),
        container_id: status.container_id.clone().unwrap_or_default(),
    }
}

/// One-word label for a container state object
fn state_label(state: Option<&ContainerState>) -> &'static str {
    match state {
        Some(s) if s.running.is_some() => "running",
        Some(s) if s.terminated.is_some() => "terminated",
        Some(s) if s.waiting.is_some() => "waiting",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{errored_state, offline_state};
    use super::*;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::api::core::v1::{ContainerStateRunning, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    /// Story: pod writes are reserved, never silent no-ops
    ///
    /// A caller invoking a reserved operation must learn it did nothing.
    #[tokio::test]
    async fn story_pod_writes_always_fail_not_implemented() {
        let client = PodClient::new(offline_state());

        for err in [
            client.create("anything").await.unwrap_err(),
            client.update("anything").await.unwrap_err(),
            client.delete("default", "web-0").await.unwrap_err(),
        ] {
            match err {
                Error::NotImplemented(op) => assert!(op.starts_with("pod ")),
                other => panic!("Expected NotImplemented, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn reads_short_circuit_on_deferred_error() {
        let client = PodClient::new(errored_state());
        for err in [
            client.list_pods("default").await.unwrap_err(),
            client.get_logs("default", "web-0").await.unwrap_err(),
            client.get("default", "web-0").await.unwrap_err(),
        ] {
            match err {
                Error::UnknownCluster(name) => assert_eq!(name, "test"),
                other => panic!("Expected deferred error, got {:?}", other),
            }
        }
    }

    #[test]
    fn pod_projection_captures_identity_and_containers() {
        let pod = Pod {
            metadata: kube::core::ObjectMeta {
                name: Some("web-0".to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                host_ip: Some("10.0.0.5".to_string()),
                pod_ip: Some("172.16.3.9".to_string()),
                start_time: Some(Time(Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 11).unwrap())),
                container_statuses: Some(vec![ContainerStatus {
                    name: "web".to_string(),
                    ready: true,
                    restart_count: 2,
                    image: "nginx:1.27".to_string(),
                    image_id: "sha256:abc".to_string(),
                    container_id: Some("containerd://def".to_string()),
                    state: Some(ContainerState {
                        running: Some(ContainerStateRunning::default()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let info = project_pod(&pod);
        assert_eq!(info.name, "web-0");
        assert_eq!(info.phase, "Running");
        assert_eq!(info.host_ip, "10.0.0.5");
        assert_eq!(info.pod_ip, "172.16.3.9");
        assert_eq!(info.start_time, "2024-03-05 07:09:11");
        assert_eq!(info.containers.len(), 1);

        let container = &info.containers[0];
        assert_eq!(container.state, "running");
        assert!(container.ready);
        assert_eq!(container.restart_count, 2);
        assert_eq!(container.container_id, "containerd://def");
    }

    #[test]
    fn pending_pod_projects_empty_runtime_fields() {
        let pod = Pod {
            metadata: kube::core::ObjectMeta {
                name: Some("web-1".to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: Some("Pending".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let info = project_pod(&pod);
        assert_eq!(info.start_time, "");
        assert!(info.containers.is_empty());
    }

    #[test]
    fn container_state_labels() {
        assert_eq!(state_label(None), "unknown");
        assert_eq!(state_label(Some(&ContainerState::default())), "unknown");

        let running = ContainerState {
            running: Some(ContainerStateRunning::default()),
            ..Default::default()
        };
        assert_eq!(state_label(Some(&running)), "running");
    }
}
