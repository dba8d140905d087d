//! Drives an install/upgrade job's modules through `pending -> deploy -> invoke ->
//! done`/`undeploy`, per item, in plan order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::cache::EnabledModuleCache;
use super::dependency_resolver;
use super::error::DomainError;
use super::hook_invoker::HookInvoker;
use super::job_store::JobStore;
use super::model::{InstallJob, InstallOptions, JobStage, ModuleDescriptor, ModuleId, PlanAction, Tenant, TenantModuleDescriptor, now_epoch_secs};
use super::ports::{ModuleManager, Proxy, TenantStore};
use super::replicated_map::Map1;
use super::version;

pub struct InstallEngine {
    modules: Arc<dyn ModuleManager>,
    tenants: Arc<dyn Map1<Tenant>>,
    store: Arc<dyn TenantStore>,
    proxy: Arc<dyn Proxy>,
    hooks: Arc<HookInvoker>,
    jobs: Arc<JobStore>,
    cache: Arc<EnabledModuleCache>,
}

impl InstallEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        modules: Arc<dyn ModuleManager>,
        tenants: Arc<dyn Map1<Tenant>>,
        store: Arc<dyn TenantStore>,
        proxy: Arc<dyn Proxy>,
        hooks: Arc<HookInvoker>,
        jobs: Arc<JobStore>,
        cache: Arc<EnabledModuleCache>,
    ) -> Self {
        Self { modules, tenants, store, proxy, hooks, jobs, cache }
    }

    pub async fn install_upgrade_create(
        &self,
        tenant_id: &str,
        job_id: &str,
        options: &InstallOptions,
        plan: Option<Vec<TenantModuleDescriptor>>,
    ) -> Result<InstallJob, DomainError> {
        let Some(mut tenant) = self.tenants.get(tenant_id).await else {
            return Err(DomainError::not_found(format!("tenant '{tenant_id}' not found")));
        };

        let catalog = self.modules.get_modules_with_filter(options.pre_release, options.npm_snapshot, options.filter_id.as_deref()).await;
        let available: HashMap<ModuleId, ModuleDescriptor> = catalog.into_iter().map(|d| (d.id.clone(), d)).collect();

        let mut enabled: BTreeMap<ModuleId, ModuleDescriptor> =
            tenant.enabled.keys().filter_map(|id| available.get(id).map(|d| (id.clone(), d.clone()))).collect();

        let requested_plan = plan.unwrap_or_else(|| synthesize_upgrade_all(&enabled, &available));
        let enabled_hash: HashMap<ModuleId, ModuleDescriptor> = enabled.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let simulated = dependency_resolver::install_simulate(&available, &enabled_hash, &requested_plan);

        let start_date = now_epoch_secs();
        if options.simulate {
            return Ok(InstallJob { id: job_id.to_owned(), tenant_id: tenant_id.to_owned(), start_date, end_date: Some(start_date), complete: true, modules: simulated });
        }

        let mut job = InstallJob { id: job_id.to_owned(), tenant_id: tenant_id.to_owned(), start_date, end_date: None, complete: false, modules: simulated };
        self.jobs.put(&job).await;

        for idx in 0..job.modules.len() {
            let item = job.modules[idx].clone();
            if item.action == PlanAction::Conflict {
                continue;
            }

            if options.deploy && matches!(item.action, PlanAction::Enable | PlanAction::UpToDate) {
                job.modules[idx].stage = JobStage::Deploy;
                self.jobs.put(&job).await;
                if let Some(descriptor) = available.get(&item.id) {
                    if let Err(err) = self.proxy.auto_deploy(descriptor).await {
                        job.modules[idx].message = Some(err.to_string());
                        self.jobs.put(&job).await;
                        if options.ignore_errors {
                            continue;
                        }
                        break;
                    }
                }
            }

            job.modules[idx].stage = JobStage::Invoke;
            self.jobs.put(&job).await;

            let module_to = if matches!(item.action, PlanAction::Enable | PlanAction::UpToDate) { available.get(&item.id) } else { None };
            let module_from_id: Option<&str> =
                item.from.as_deref().or(if item.action == PlanAction::Disable { Some(item.id.as_str()) } else { None });
            let module_from = module_from_id.and_then(|id| available.get(id));

            let previously_enabled: Vec<ModuleDescriptor> = enabled.values().cloned().collect();
            let permissions_owner = enabled.values().find(|d| d.permissions_interface().is_some()).cloned();
            let purge = item.action == PlanAction::Disable;

            let outcome = self
                .hooks
                .apply_module_change(tenant_id, &previously_enabled, permissions_owner.as_ref(), module_to, module_from, purge, &[])
                .await;

            match outcome {
                Ok(()) => {
                    apply_to_enabled_set(&mut tenant, &mut enabled, &available, &item);
                    job.modules[idx].stage = JobStage::Done;
                }
                Err(err) => {
                    job.modules[idx].message = Some(err.to_string());
                    self.jobs.put(&job).await;
                    if !options.ignore_errors {
                        break;
                    }
                    continue;
                }
            }
            self.jobs.put(&job).await;
        }

        self.tenants.put(tenant_id, tenant.clone()).await;
        self.store.update_modules(tenant_id, tenant.enabled.clone()).await;
        self.cache.rebuild(&tenant).await;

        if options.deploy {
            self.undeploy_orphans(&available, &job).await;
        }

        job.end_date = Some(now_epoch_secs());
        job.complete = true;
        self.jobs.put(&job).await;
        Ok(job)
    }

    async fn undeploy_orphans(&self, available: &HashMap<ModuleId, ModuleDescriptor>, job: &InstallJob) {
        let disabled: Vec<&ModuleId> = job.modules.iter().filter(|m| m.action == PlanAction::Disable && m.message.is_none()).map(|m| &m.id).collect();
        if disabled.is_empty() {
            return;
        }
        let tenants = self.store.list_tenants().await;
        for id in disabled {
            let still_used = tenants.iter().any(|t| t.enabled.contains_key(id));
            if still_used {
                continue;
            }
            if let Some(descriptor) = available.get(id) {
                if let Err(err) = self.proxy.auto_undeploy(descriptor).await {
                    tracing::warn!(module_id = %id, %err, "auto-undeploy failed");
                }
            }
        }
    }
}

fn apply_to_enabled_set(tenant: &mut Tenant, enabled: &mut BTreeMap<ModuleId, ModuleDescriptor>, available: &HashMap<ModuleId, ModuleDescriptor>, item: &TenantModuleDescriptor) {
    match item.action {
        PlanAction::Enable => {
            let stale = item.from.clone().or_else(|| tenant.enabled_id_for_name(version::module_name(&item.id)).cloned());
            if let Some(stale_id) = stale {
                tenant.enabled.remove(&stale_id);
                enabled.remove(&stale_id);
            }
            tenant.enabled.insert(item.id.clone(), now_epoch_secs());
            if let Some(descriptor) = available.get(&item.id) {
                enabled.insert(item.id.clone(), descriptor.clone());
            }
        }
        PlanAction::Disable => {
            tenant.enabled.remove(&item.id);
            enabled.remove(&item.id);
        }
        PlanAction::UpToDate | PlanAction::Conflict => {}
    }
}

/// Synthesizes an "upgrade all" plan: one `enable` item per enabled module whose
/// latest available version differs from what is currently enabled.
fn synthesize_upgrade_all(enabled: &BTreeMap<ModuleId, ModuleDescriptor>, available: &HashMap<ModuleId, ModuleDescriptor>) -> Vec<TenantModuleDescriptor> {
    let mut plan = Vec::new();
    let mut seen = HashSet::new();
    for descriptor in enabled.values() {
        if !seen.insert(descriptor.name.clone()) {
            continue;
        }
        let latest = available.values().filter(|d| d.name == descriptor.name).max_by(|a, b| version::compare_module_ids(&a.id, &b.id));
        if let Some(latest) = latest {
            if latest.id != descriptor.id {
                plan.push(TenantModuleDescriptor::new(latest.id.clone(), Some(descriptor.id.clone()), PlanAction::Enable));
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InterfaceDescriptor, InterfaceRequirement, InterfaceType, RoutingEntry, TenantDescriptor};
    use crate::domain::ports::{InMemoryModuleManager, InMemoryTenantStore, LoggingProxy};
    use crate::domain::replicated_map::LocalMap1;

    fn tenant_module(id: &str, name: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_owned(),
            name: name.to_owned(),
            provides: vec![InterfaceDescriptor {
                id: "_tenant".to_owned(),
                version: "1.1".to_owned(),
                interface_type: InterfaceType::System,
                routing_entries: vec![RoutingEntry { methods: vec!["POST".to_owned()], static_path: Some("/_/tenant".to_owned()), delay_milliseconds: None, unit: None }],
            }],
            requires: vec![],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        }
    }

    fn harness() -> (InstallEngine, Arc<dyn Map1<Tenant>>, Arc<InMemoryModuleManager>, Arc<JobStore>) {
        let modules = Arc::new(InMemoryModuleManager::new());
        let tenants: Arc<dyn Map1<Tenant>> = Arc::new(LocalMap1::new());
        let store: Arc<dyn TenantStore> = Arc::new(InMemoryTenantStore::new());
        let proxy: Arc<dyn Proxy> = Arc::new(LoggingProxy);
        let hooks = Arc::new(HookInvoker::new(Arc::clone(&proxy)));
        let jobs = Arc::new(JobStore::new(Arc::new(crate::domain::replicated_map::LocalMap2::new())));
        let cache = Arc::new(EnabledModuleCache::new(Arc::clone(&modules) as Arc<dyn ModuleManager>));
        let engine = InstallEngine::new(
            Arc::clone(&modules) as Arc<dyn ModuleManager>,
            Arc::clone(&tenants),
            store,
            proxy,
            hooks,
            Arc::clone(&jobs),
            cache,
        );
        (engine, tenants, modules, jobs)
    }

    #[tokio::test]
    async fn simulate_does_not_persist_a_job() {
        let (engine, tenants, modules, jobs) = harness();
        modules.register(tenant_module("sample-module-1.0.0", "sample-module"));
        tenants.put("diku", Tenant::new(TenantDescriptor { id: "diku".to_owned(), name: "Diku".to_owned(), description: String::new() })).await;

        let options = InstallOptions { simulate: true, ..Default::default() };
        let plan = vec![TenantModuleDescriptor::new("sample-module-1.0.0".to_owned(), None, PlanAction::Enable)];
        let job = engine.install_upgrade_create("diku", "job-1", &options, Some(plan)).await.unwrap();

        assert!(job.complete);
        assert!(jobs.get("diku", "job-1").await.is_none());
    }

    #[tokio::test]
    async fn successful_enable_commits_and_completes_job() {
        let (engine, tenants, modules, jobs) = harness();
        modules.register(tenant_module("sample-module-1.0.0", "sample-module"));
        tenants.put("diku", Tenant::new(TenantDescriptor { id: "diku".to_owned(), name: "Diku".to_owned(), description: String::new() })).await;

        let options = InstallOptions::default();
        let plan = vec![TenantModuleDescriptor::new("sample-module-1.0.0".to_owned(), None, PlanAction::Enable)];
        let job = engine.install_upgrade_create("diku", "job-1", &options, Some(plan)).await.unwrap();

        assert!(job.complete);
        assert_eq!(job.modules[0].stage, JobStage::Done);
        assert!(jobs.get("diku", "job-1").await.unwrap().complete);
        let tenant = tenants.get("diku").await.unwrap();
        assert!(tenant.enabled.contains_key("sample-module-1.0.0"));
    }

    #[tokio::test]
    async fn missing_dependency_short_circuits_without_ignore_errors() {
        let (engine, tenants, modules, _jobs) = harness();
        let requiring = ModuleDescriptor {
            id: "mod-A-1.0.0".to_owned(),
            name: "mod-A".to_owned(),
            provides: vec![],
            requires: vec![InterfaceRequirement { interface_id: "users".to_owned(), min_version: "1.0".to_owned() }],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        };
        modules.register(requiring);
        tenants.put("diku", Tenant::new(TenantDescriptor { id: "diku".to_owned(), name: "Diku".to_owned(), description: String::new() })).await;

        let options = InstallOptions::default();
        let plan = vec![TenantModuleDescriptor::new("mod-A-1.0.0".to_owned(), None, PlanAction::Enable)];
        let job = engine.install_upgrade_create("diku", "job-1", &options, Some(plan)).await.unwrap();

        assert_eq!(job.modules[0].action, PlanAction::Conflict);
        let tenant = tenants.get("diku").await.unwrap();
        assert!(tenant.enabled.is_empty());
    }

    #[tokio::test]
    async fn unknown_tenant_fails_not_found() {
        let (engine, _tenants, _modules, _jobs) = harness();
        let result = engine.install_upgrade_create("ghost", "job-1", &InstallOptions::default(), Some(vec![])).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
