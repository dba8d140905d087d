use std::sync::Arc;

use async_trait::async_trait;

use crate::contract::client::TenantLifecycleApi;
use crate::contract::error::LifecycleError;
use crate::domain::model::{InstallJob, InstallOptions, InterfaceDescriptor, InterfaceType, ModuleDescriptor, Tenant, TenantDescriptor, TenantModuleDescriptor};
use crate::domain::service::Service;

/// In-process `TenantLifecycleApi`, delegating straight to the domain `Service`.
/// The shape other modules see through the client hub in a single-process
/// deployment.
pub struct LocalTenantLifecycleClient {
    service: Arc<Service>,
}

impl LocalTenantLifecycleClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TenantLifecycleApi for LocalTenantLifecycleClient {
    async fn insert(&self, tenant: Tenant) -> Result<String, LifecycleError> {
        self.service.insert(tenant).await.map_err(Into::into)
    }

    async fn update_descriptor(&self, descriptor: TenantDescriptor) {
        self.service.update_descriptor(descriptor).await;
    }

    async fn get(&self, id: &str) -> Option<Tenant> {
        self.service.get(id).await
    }

    async fn list(&self) -> Vec<Tenant> {
        self.service.list().await
    }

    async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
        self.service.delete(id).await.map_err(Into::into)
    }

    async fn enable_and_disable_module(
        &self,
        tenant_id: &str,
        options: &InstallOptions,
        module_from: Option<&str>,
        module_to: Option<&str>,
    ) -> Result<String, LifecycleError> {
        self.service.enable_and_disable_module(tenant_id, options, module_from, module_to).await.map_err(Into::into)
    }

    async fn list_interfaces(&self, tenant_id: &str, full: bool, interface_type: Option<InterfaceType>) -> Result<Vec<InterfaceDescriptor>, LifecycleError> {
        self.service.list_interfaces(tenant_id, full, interface_type).await.map_err(Into::into)
    }

    async fn list_modules_from_interface(&self, tenant_id: &str, interface_name: &str, interface_type: Option<InterfaceType>) -> Result<Vec<ModuleDescriptor>, LifecycleError> {
        self.service.list_modules_from_interface(tenant_id, interface_name, interface_type).await.map_err(Into::into)
    }

    async fn get_module_user(&self, module_id: &str) -> Vec<String> {
        self.service.get_module_user(module_id).await
    }

    async fn install_upgrade_create(
        &self,
        tenant_id: &str,
        job_id: &str,
        options: &InstallOptions,
        plan: Option<Vec<TenantModuleDescriptor>>,
    ) -> Result<InstallJob, LifecycleError> {
        self.service.install_upgrade_create(tenant_id, job_id, options, plan).await.map_err(Into::into)
    }

    async fn install_upgrade_get(&self, tenant_id: &str, job_id: &str) -> Option<InstallJob> {
        self.service.install_upgrade_get(tenant_id, job_id).await
    }

    async fn install_upgrade_list(&self, tenant_id: &str) -> Vec<InstallJob> {
        self.service.install_upgrade_list(tenant_id).await
    }

    async fn install_upgrade_delete(&self, tenant_id: &str, job_id: &str) -> Result<(), LifecycleError> {
        self.service.install_upgrade_delete(tenant_id, job_id).await.map_err(Into::into)
    }
}
