use async_trait::async_trait;

use crate::domain::model::{InstallJob, InstallOptions, InterfaceDescriptor, InterfaceType, ModuleDescriptor, Tenant, TenantDescriptor, TenantModuleDescriptor};

use super::error::LifecycleError;

/// The cross-module entry point other modules bind against through
/// `ClientHub`, exposing the same operations the REST surface does without
/// going through HTTP.
#[async_trait]
pub trait TenantLifecycleApi: Send + Sync {
    async fn insert(&self, tenant: Tenant) -> Result<String, LifecycleError>;
    async fn update_descriptor(&self, descriptor: TenantDescriptor);
    async fn get(&self, id: &str) -> Option<Tenant>;
    async fn list(&self) -> Vec<Tenant>;
    async fn delete(&self, id: &str) -> Result<(), LifecycleError>;

    async fn enable_and_disable_module(
        &self,
        tenant_id: &str,
        options: &InstallOptions,
        module_from: Option<&str>,
        module_to: Option<&str>,
    ) -> Result<String, LifecycleError>;

    async fn list_interfaces(&self, tenant_id: &str, full: bool, interface_type: Option<InterfaceType>) -> Result<Vec<InterfaceDescriptor>, LifecycleError>;

    async fn list_modules_from_interface(&self, tenant_id: &str, interface_name: &str, interface_type: Option<InterfaceType>) -> Result<Vec<ModuleDescriptor>, LifecycleError>;

    async fn get_module_user(&self, module_id: &str) -> Vec<String>;

    async fn install_upgrade_create(
        &self,
        tenant_id: &str,
        job_id: &str,
        options: &InstallOptions,
        plan: Option<Vec<TenantModuleDescriptor>>,
    ) -> Result<InstallJob, LifecycleError>;

    async fn install_upgrade_get(&self, tenant_id: &str, job_id: &str) -> Option<InstallJob>;
    async fn install_upgrade_list(&self, tenant_id: &str) -> Vec<InstallJob>;
    async fn install_upgrade_delete(&self, tenant_id: &str, job_id: &str) -> Result<(), LifecycleError>;
}
