//! Job status passthrough

use k8s_openapi::api::batch::v1::{Job, JobStatus};
use kube::api::Api;

use super::JobClient;
use crate::Result;

impl JobClient {
    /// Fetch the job and return its raw remote status
    ///
    /// No projection: callers get the full `JobStatus` structure as the API
    /// reported it (a job created moments ago may have an empty one).
    pub async fn get_status(&self, namespace: &str, name: &str) -> Result<JobStatus> {
        let client = self.state().client()?;
        let api: Api<Job> = Api::namespaced(client.clone(), namespace);
        let job = api.get(name).await?;
        Ok(job.status.unwrap_or_default())
    }
}
