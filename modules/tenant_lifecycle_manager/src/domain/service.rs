//! The `TenantLifecycleManager` façade: the only entry point other code calls.
//! Owns the replicated tenant map, the per-tenant cache, the install engine, the
//! hook invoker and the timer scheduler, and sequences calls across them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::cache::EnabledModuleCache;
use super::dependency_resolver;
use super::error::DomainError;
use super::hook_invoker::HookInvoker;
use super::install_engine::InstallEngine;
use super::job_store::JobStore;
use super::model::{
    InstallJob, InstallOptions, InterfaceDescriptor, InterfaceType, ModuleDescriptor, ModuleId, Tenant, TenantDescriptor, TenantModuleDescriptor,
    now_epoch_secs,
};
use super::ports::{AlwaysLeaderDiscovery, BroadcastEventBus, EventBus, InMemoryModuleManager, InMemoryTenantStore, LoggingProxy, ModuleManager, Proxy, TenantStore, TOPIC_TIMER};
use super::replicated_map::{LocalMap1, LocalMap2, Map1};
use super::timer_scheduler::TimerScheduler;
use super::version;

pub struct Service {
    tenants: Arc<dyn Map1<Tenant>>,
    store: Arc<dyn TenantStore>,
    modules: Arc<InMemoryModuleManager>,
    events: Arc<dyn EventBus>,
    cache: Arc<EnabledModuleCache>,
    hooks: Arc<HookInvoker>,
    jobs: Arc<JobStore>,
    engine: Arc<InstallEngine>,
    timers: Arc<TimerScheduler>,
}

impl Service {
    pub fn new() -> Self {
        let tenants: Arc<dyn Map1<Tenant>> = Arc::new(LocalMap1::new());
        let store: Arc<dyn TenantStore> = Arc::new(InMemoryTenantStore::new());
        let modules = Arc::new(InMemoryModuleManager::new());
        let proxy: Arc<dyn Proxy> = Arc::new(LoggingProxy);
        let discovery = Arc::new(AlwaysLeaderDiscovery);
        let events: Arc<dyn EventBus> = Arc::new(BroadcastEventBus::new());

        let modules_dyn = Arc::clone(&modules) as Arc<dyn ModuleManager>;
        let cache = Arc::new(EnabledModuleCache::new(Arc::clone(&modules_dyn)));
        let hooks = Arc::new(HookInvoker::new(Arc::clone(&proxy)));
        let jobs = Arc::new(JobStore::new(Arc::new(LocalMap2::new())));
        let engine = Arc::new(InstallEngine::new(
            Arc::clone(&modules_dyn),
            Arc::clone(&tenants),
            Arc::clone(&store),
            Arc::clone(&proxy),
            Arc::clone(&hooks),
            Arc::clone(&jobs),
            Arc::clone(&cache),
        ));
        let timers = Arc::new(TimerScheduler::new(Arc::clone(&tenants), modules_dyn, proxy, discovery));

        Self { tenants, store, modules, events, cache, hooks, jobs, engine, timers }
    }

    pub fn register_module(&self, descriptor: ModuleDescriptor) {
        self.modules.register(descriptor);
    }

    /// Arms every enabled tenant's timers. Called once at process startup, after
    /// `init` has populated the replicated map.
    pub async fn start_timers(&self) {
        for tenant in self.list().await {
            self.timers.rebuild_tenant(tenant.id()).await;
        }
    }

    pub fn shutdown_timers(&self) {
        self.timers.shutdown();
    }

    /// Populates the replicated map from the persistent store iff the map is
    /// empty — the first instance to start wins; later instances see a populated
    /// map and skip.
    pub async fn init(&self) {
        if self.tenants.keys().await.is_empty() {
            for tenant in self.store.list_tenants().await {
                let id = tenant.id().to_string();
                self.tenants.put(&id, tenant).await;
            }
        }
    }

    pub async fn insert(&self, tenant: Tenant) -> Result<String, DomainError> {
        let id = tenant.id().to_owned();
        self.tenants.add(&id, tenant.clone()).await?;
        self.store.insert(tenant).await;
        tracing::info!(tenant_id = %id, "tenant created");
        Ok(id)
    }

    pub async fn update_descriptor(&self, descriptor: TenantDescriptor) {
        let id = descriptor.id.clone();
        let tenant = match self.tenants.get(&id).await {
            Some(mut existing) => {
                existing.descriptor = descriptor.clone();
                existing
            }
            None => Tenant::new(descriptor.clone()),
        };
        self.tenants.put(&id, tenant).await;
        self.store.update_descriptor(descriptor).await;
    }

    pub async fn get(&self, id: &str) -> Option<Tenant> {
        self.tenants.get(id).await
    }

    pub async fn list(&self) -> Vec<Tenant> {
        let mut out = Vec::new();
        for key in self.tenants.keys().await {
            if let Some(tenant) = self.tenants.get(&key).await {
                out.push(tenant);
            }
        }
        out
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        if self.tenants.get(id).await.is_none() {
            return Err(DomainError::not_found(format!("tenant '{id}' not found")));
        }
        self.store.delete(id).await;
        self.tenants.remove(id).await;
        self.cache.evict(id);
        self.timers.rebuild_tenant(id).await;
        tracing::info!(tenant_id = %id, "tenant deleted");
        Ok(())
    }

    /// Enables `module_to` and/or disables `module_from` for a tenant, running the
    /// full §"call ordering" sequence. Returns the target module id, or `""` when
    /// both arguments are absent.
    pub async fn enable_and_disable_module(
        &self,
        tenant_id: &str,
        options: &InstallOptions,
        module_from: Option<&str>,
        module_to: Option<&str>,
    ) -> Result<String, DomainError> {
        let mut tenant = self
            .tenants
            .get(tenant_id)
            .await
            .ok_or_else(|| DomainError::not_found(format!("tenant '{tenant_id}' not found")))?;

        let md_from = match module_from {
            Some(id) => Some(self.modules.get(id).await?),
            None => None,
        };
        let md_to = match module_to {
            Some(id) => {
                let resolved = match self.modules.get_latest(id).await {
                    Ok(d) => d,
                    Err(_) => self.modules.get(id).await?,
                };
                Some(resolved)
            }
            None => None,
        };

        if md_from.is_none() && md_to.is_none() {
            return Ok(String::new());
        }

        if let Some(to) = &md_to {
            if tenant.enabled.contains_key(&to.id) {
                return Err(DomainError::user(format!("module '{}' already provided", to.id)));
            }
        }

        if !options.ignore_errors {
            let mut projected: HashMap<ModuleId, ModuleDescriptor> = HashMap::new();
            for id in tenant.enabled.keys() {
                if let Ok(descriptor) = self.modules.get(id).await {
                    projected.insert(id.clone(), descriptor);
                }
            }
            if let Some(from) = &md_from {
                projected.remove(&from.id);
            }
            if let Some(to) = &md_to {
                projected.insert(to.id.clone(), to.clone());
            }
            let refs: Vec<&ModuleDescriptor> = projected.values().collect();
            let failure = dependency_resolver::check_closure(&refs);
            if !failure.is_empty() {
                return Err(DomainError::user(failure.to_message()));
            }
        }

        let mut previously_enabled = Vec::new();
        for id in tenant.enabled.keys() {
            if let Ok(descriptor) = self.modules.get(id).await {
                previously_enabled.push(descriptor);
            }
        }
        let permissions_owner = previously_enabled.iter().find(|d| d.permissions_interface().is_some()).cloned();
        let purge = md_to.is_none();

        self.hooks
            .apply_module_change(tenant_id, &previously_enabled, permissions_owner.as_ref(), md_to.as_ref(), md_from.as_ref(), purge, &[])
            .await?;

        if let Some(from) = &md_from {
            tenant.enabled.remove(&from.id);
        }
        if let Some(to) = &md_to {
            tenant.enabled.insert(to.id.clone(), now_epoch_secs());
        }

        self.tenants.put(tenant_id, tenant.clone()).await;
        self.store.update_modules(tenant_id, tenant.enabled.clone()).await;
        self.cache.rebuild(&tenant).await;
        self.timers.rebuild_tenant(tenant_id).await;
        self.events.publish(TOPIC_TIMER, tenant_id.to_owned());

        tracing::info!(tenant_id, module_from = ?module_from, module_to = ?module_to, "module enablement changed");

        Ok(md_to.map(|d| d.id).unwrap_or_default())
    }

    pub async fn list_interfaces(&self, tenant_id: &str, full: bool, interface_type: Option<InterfaceType>) -> Result<Vec<InterfaceDescriptor>, DomainError> {
        let tenant = self.tenants.get(tenant_id).await.ok_or_else(|| DomainError::not_found(format!("tenant '{tenant_id}' not found")))?;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for id in tenant.enabled.keys() {
            let Ok(descriptor) = self.modules.get(id).await else { continue };
            for iface in descriptor.provides {
                if interface_type.is_some_and(|t| iface.interface_type != t) {
                    continue;
                }
                if !full && !seen.insert((iface.id.clone(), iface.version.clone())) {
                    continue;
                }
                out.push(iface);
            }
        }
        Ok(out)
    }

    pub async fn list_modules_from_interface(&self, tenant_id: &str, interface_name: &str, interface_type: Option<InterfaceType>) -> Result<Vec<ModuleDescriptor>, DomainError> {
        let tenant = self.tenants.get(tenant_id).await.ok_or_else(|| DomainError::not_found(format!("tenant '{tenant_id}' not found")))?;
        let mut out = Vec::new();
        for id in tenant.enabled.keys() {
            let Ok(descriptor) = self.modules.get(id).await else { continue };
            let provides = descriptor
                .provides
                .iter()
                .any(|iface| iface.id == interface_name && interface_type.map_or(true, |t| t == iface.interface_type));
            if provides {
                out.push(descriptor);
            }
        }
        Ok(out)
    }

    pub async fn get_module_user(&self, module_id: &str) -> Vec<String> {
        self.list().await.into_iter().filter(|t| t.enabled.contains_key(module_id)).map(|t| t.descriptor.id).collect()
    }

    /// Promotes each tenant's `okapi-*` enabled module to `running_module_id`,
    /// never downgrading: commits only when `running_module_id` is strictly newer
    /// than what is currently enabled.
    pub async fn upgrade_okapi_module(&self, running_module_id: &str) {
        let name = version::module_name(running_module_id);
        for tenant in self.list().await {
            let Some(current_id) = tenant.enabled_id_for_name(name).cloned() else { continue };
            if current_id == running_module_id || version::compare_code(running_module_id, &current_id) < 4 {
                continue;
            }
            let tenant_id = tenant.descriptor.id.clone();
            let mut updated = tenant;
            updated.enabled.remove(&current_id);
            updated.enabled.insert(running_module_id.to_owned(), now_epoch_secs());
            self.tenants.put(&tenant_id, updated.clone()).await;
            self.store.update_modules(&tenant_id, updated.enabled.clone()).await;
            tracing::info!(tenant_id = %tenant_id, module_id = running_module_id, "okapi module upgraded");
        }
    }

    pub async fn install_upgrade_create(&self, tenant_id: &str, job_id: &str, options: &InstallOptions, plan: Option<Vec<TenantModuleDescriptor>>) -> Result<InstallJob, DomainError> {
        self.engine.install_upgrade_create(tenant_id, job_id, options, plan).await
    }

    pub async fn install_upgrade_get(&self, tenant_id: &str, job_id: &str) -> Option<InstallJob> {
        self.jobs.get(tenant_id, job_id).await
    }

    pub async fn install_upgrade_list(&self, tenant_id: &str) -> Vec<InstallJob> {
        self.jobs.list_for_tenant(tenant_id).await
    }

    pub async fn install_upgrade_delete(&self, tenant_id: &str, job_id: &str) -> Result<(), DomainError> {
        self.jobs.delete(tenant_id, job_id).await
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InterfaceDescriptor, InterfaceRequirement, RoutingEntry};

    fn providing(id: &str, name: &str, iface_id: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_owned(),
            name: name.to_owned(),
            provides: vec![InterfaceDescriptor {
                id: iface_id.to_owned(),
                version: "1.0".to_owned(),
                interface_type: InterfaceType::Proxy,
                routing_entries: vec![RoutingEntry { methods: vec!["GET".to_owned()], static_path: None, delay_milliseconds: None, unit: None }],
            }],
            requires: vec![],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        }
    }

    fn diku_descriptor() -> TenantDescriptor {
        TenantDescriptor { id: "diku".to_owned(), name: "Diku".to_owned(), description: String::new() }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_tenant() {
        let service = Service::new();
        service.insert(Tenant::new(diku_descriptor())).await.unwrap();
        let result = service.insert(Tenant::new(diku_descriptor())).await;
        assert!(matches!(result, Err(DomainError::User(_))));
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn enable_then_enable_again_fails_already_provided() {
        let service = Service::new();
        service.register_module(providing("sample-module-1.0.0", "sample-module", "users"));
        service.insert(Tenant::new(diku_descriptor())).await.unwrap();

        let options = InstallOptions::default();
        service.enable_and_disable_module("diku", &options, None, Some("sample-module-1.0.0")).await.unwrap();
        let result = service.enable_and_disable_module("diku", &options, None, Some("sample-module-1.0.0")).await;
        assert!(matches!(result, Err(DomainError::User(msg)) if msg.contains("already provided")));
    }

    #[tokio::test]
    async fn enable_fails_missing_dependency_then_succeeds_once_satisfied() {
        let service = Service::new();
        service.register_module(ModuleDescriptor {
            id: "mod-A-1.0.0".to_owned(),
            name: "mod-A".to_owned(),
            provides: vec![],
            requires: vec![InterfaceRequirement { interface_id: "users".to_owned(), min_version: "1.0".to_owned() }],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        });
        service.register_module(providing("users-1.0.0", "users", "users"));
        service.insert(Tenant::new(diku_descriptor())).await.unwrap();

        let options = InstallOptions::default();
        let failure = service.enable_and_disable_module("diku", &options, None, Some("mod-A-1.0.0")).await;
        assert!(matches!(failure, Err(DomainError::User(msg)) if msg.contains("missing dependency for users")));

        service.enable_and_disable_module("diku", &options, None, Some("users-1.0.0")).await.unwrap();
        service.enable_and_disable_module("diku", &options, None, Some("mod-A-1.0.0")).await.unwrap();
        let tenant = service.get("diku").await.unwrap();
        assert!(tenant.enabled.contains_key("mod-A-1.0.0"));
        assert!(tenant.enabled.contains_key("users-1.0.0"));
    }

    #[tokio::test]
    async fn delete_evicts_cache_and_fails_for_unknown_tenant() {
        let service = Service::new();
        service.insert(Tenant::new(diku_descriptor())).await.unwrap();
        service.delete("diku").await.unwrap();
        assert!(service.get("diku").await.is_none());
        assert!(matches!(service.delete("diku").await, Err(DomainError::NotFound(_))));
    }
}
