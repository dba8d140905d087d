//! Persistence of install/upgrade jobs per tenant.
//!
//! A thin wrapper over `Map2<InstallJob>` keyed by `(tenantId, jobId)`; every write
//! commits eagerly so job progress is visible to any other gateway instance polling it.

use std::sync::Arc;

use super::error::DomainError;
use super::model::InstallJob;
use super::replicated_map::Map2;

pub struct JobStore {
    jobs: Arc<dyn Map2<InstallJob>>,
}

impl JobStore {
    pub fn new(jobs: Arc<dyn Map2<InstallJob>>) -> Self {
        Self { jobs }
    }

    pub async fn get(&self, tenant_id: &str, job_id: &str) -> Option<InstallJob> {
        self.jobs.get(tenant_id, job_id).await
    }

    pub async fn put(&self, job: &InstallJob) {
        self.jobs.put(&job.tenant_id, &job.id, job.clone()).await;
    }

    pub async fn list_for_tenant(&self, tenant_id: &str) -> Vec<InstallJob> {
        self.jobs.list_tenant(tenant_id).await.into_iter().map(|(_, job)| job).collect()
    }

    /// Deletes a job. Fails `User` unless the job is complete.
    pub async fn delete(&self, tenant_id: &str, job_id: &str) -> Result<(), DomainError> {
        let job = self
            .jobs
            .get(tenant_id, job_id)
            .await
            .ok_or_else(|| DomainError::not_found(format!("install job '{job_id}' not found")))?;
        if !job.complete {
            return Err(DomainError::user(format!("install job '{job_id}' is still in progress")));
        }
        self.jobs.remove(tenant_id, job_id).await;
        Ok(())
    }
}
