//! Deployment status projection and image trigger
//!
//! Extends the generic [`DeploymentClient`] with the deployment-specific
//! reads and writes: a condensed status view and the image-retarget operation
//! used to roll a deployment forward or back.

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use serde::{Deserialize, Serialize};

use super::{format_time, DeploymentClient};
use crate::{Error, Result};

/// Condensed view of a deployment's rollout state
///
/// Replica counters plus the most recent condition. "Most recent" is the last
/// element of the condition list exactly as the API returned it; the list is
/// not re-sorted by timestamp. A deployment with no conditions yet leaves the
/// condition fields empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DeploymentStatus {
    /// Desired replicas
    pub replicas: i32,
    /// Replicas updated to the latest pod template
    pub updated_replicas: i32,
    /// Replicas passing readiness
    pub ready_replicas: i32,
    /// Replicas available to serve
    pub available_replicas: i32,
    /// Replicas not yet available
    pub unavailable_replicas: i32,
    /// Type of the most recent condition (e.g. `Available`)
    pub condition_type: String,
    /// Status of the most recent condition (`True`/`False`/`Unknown`)
    pub condition_status: String,
    /// When the most recent condition was last updated
    pub last_update_time: String,
    /// Machine-readable reason for the most recent condition
    pub reason: String,
    /// Human-readable message for the most recent condition
    pub message: String,
}

impl DeploymentClient {
    /// Fetch the deployment and project its rollout status
    pub async fn get_status(&self, namespace: &str, name: &str) -> Result<DeploymentStatus> {
        let client = self.state().client()?;
        let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
        let deployment = api.get(name).await?;
        Ok(project_status(&deployment))
    }

    /// Repoint the deployment's first container at `image:tag`
    ///
    /// Fetches the live object, rewrites the image reference, and replaces
    /// the whole object. Covers both forward rolls and rollbacks; the rollout
    /// itself is the controller's business.
    pub async fn set_image(
        &self,
        namespace: &str,
        name: &str,
        image: &str,
        tag: &str,
    ) -> Result<()> {
        let client = self.state().client()?;
        let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
        let mut deployment = api.get(name).await?;

        let container = deployment
            .spec
            .as_mut()
            .and_then(|spec| spec.template.spec.as_mut())
            .and_then(|pod| pod.containers.first_mut())
            .ok_or_else(|| {
                Error::remote_api(format!(
                    "deployment {}/{} has no containers",
                    namespace, name
                ))
            })?;
        container.image = Some(format!("{}:{}", image, tag));

        api.replace(name, &PostParams::default(), &deployment)
            .await?;
        Ok(())
    }
}

fn project_status(deployment: &Deployment) -> DeploymentStatus {
    let mut out = DeploymentStatus::default();
    let Some(status) = deployment.status.as_ref() else {
        return out;
    };

    out.replicas = status.replicas.unwrap_or_default();
    out.updated_replicas = status.updated_replicas.unwrap_or_default();
    out.ready_replicas = status.ready_replicas.unwrap_or_default();
    out.available_replicas = status.available_replicas.unwrap_or_default();
    out.unavailable_replicas = status.unavailable_replicas.unwrap_or_default();

    if let Some(condition) = status.conditions.as_ref().and_then(|c| c.last()) {
        out.condition_type = condition.type_.clone();
        out.condition_status = condition.status.clone();
        out.last_update_time = format_time(condition.last_update_time.as_ref());
        out.reason = condition.reason.clone().unwrap_or_default();
        out.message = condition.message.clone().unwrap_or_default();
    }

    out
}

#[cfg(test)]
mod tests {
    use crate::test_support::errored_state;
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentCondition, DeploymentStatus as RemoteStatus};

    fn condition(type_: &str, status: &str, reason: &str) -> DeploymentCondition {
        DeploymentCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            message: Some(format!("{} message", reason)),
            ..Default::default()
        }
    }

    fn deployment_with_status(status: RemoteStatus) -> Deployment {
        Deployment {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Story: the most recent condition is the last list element
    ///
    /// The API appends conditions; the projection picks the final entry even
    /// when an earlier entry looks "newer" by name.
    #[test]
    fn story_projection_takes_last_condition_not_first() {
        let deployment = deployment_with_status(RemoteStatus {
            replicas: Some(3),
            updated_replicas: Some(3),
            ready_replicas: Some(2),
            available_replicas: Some(2),
            unavailable_replicas: Some(1),
            conditions: Some(vec![
                condition("Progressing", "True", "NewReplicaSetAvailable"),
                condition("Available", "True", "MinimumReplicasAvailable"),
            ]),
            ..Default::default()
        });

        let projected = project_status(&deployment);
        assert_eq!(projected.replicas, 3);
        assert_eq!(projected.ready_replicas, 2);
        assert_eq!(projected.unavailable_replicas, 1);
        assert_eq!(projected.condition_type, "Available");
        assert_eq!(projected.condition_status, "True");
        assert_eq!(projected.reason, "MinimumReplicasAvailable");
        assert_eq!(projected.message, "MinimumReplicasAvailable message");
    }

    #[test]
    fn projection_of_missing_conditions_is_defaulted() {
        let deployment = deployment_with_status(RemoteStatus {
            replicas: Some(1),
            ..Default::default()
        });

        let projected = project_status(&deployment);
        assert_eq!(projected.replicas, 1);
        assert_eq!(projected.condition_type, "");
        assert_eq!(projected.last_update_time, "");
    }

    #[test]
    fn projection_of_missing_status_is_defaulted() {
        let projected = project_status(&Deployment::default());
        assert_eq!(projected, DeploymentStatus::default());
    }

    #[tokio::test]
    async fn status_and_image_calls_short_circuit_on_deferred_error() {
        let client = DeploymentClient::new(errored_state());

        let status_err = client.get_status("default", "web").await.unwrap_err();
        let image_err = client
            .set_image("default", "web", "nginx", "1.28")
            .await
            .unwrap_err();
        for err in [status_err, image_err] {
            match err {
                Error::UnknownCluster(name) => assert_eq!(name, "test"),
                other => panic!("Expected deferred error, got {:?}", other),
            }
        }
    }
}
