//! External collaborators, expressed as narrow consumer-side traits ("ports") owned
//! by this module rather than as concrete dependencies. Each comes with a default
//! in-process implementation so the module is fully runnable and testable
//! standalone; a real deployment wires production implementations through the
//! `ClientHub`.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::DomainError;
use super::model::{ModuleDescriptor, ModuleId, RoutingEntry, Tenant, TenantDescriptor};
use super::version;

/// The static module-descriptor registry. Read-only to this module.
#[async_trait]
pub trait ModuleManager: Send + Sync {
    async fn get(&self, id: &str) -> Result<ModuleDescriptor, DomainError>;
    async fn get_latest(&self, name_or_id: &str) -> Result<ModuleDescriptor, DomainError>;
    async fn get_modules_with_filter(&self, pre_release: bool, npm_snapshot: bool, filter_id: Option<&str>) -> Vec<ModuleDescriptor>;
}

/// The persistent store of tenant records. Canonical truth; the `ReplicatedMap`
/// is a hot replica of it.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn list_tenants(&self) -> Vec<Tenant>;
    async fn insert(&self, tenant: Tenant);
    async fn update_descriptor(&self, descriptor: TenantDescriptor);
    async fn update_modules(&self, id: &str, enabled: BTreeMap<ModuleId, i64>) -> bool;
    async fn delete(&self, id: &str) -> bool;
}

/// `(ModuleDescriptor, RoutingEntry, path, method, systemCall, retry?)`.
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    pub descriptor: ModuleDescriptor,
    pub routing_entry: RoutingEntry,
    pub path: String,
    pub method: String,
    pub system_call: bool,
    pub retry: bool,
}

/// The HTTP data plane in front of every module. Consumed here only for
/// system-interface calls and artifact (de)deployment.
#[async_trait]
pub trait Proxy: Send + Sync {
    async fn call_system_interface(&self, tenant_id: &str, instance: &ModuleInstance, body: serde_json::Value) -> Result<(), DomainError>;

    async fn do_call_system_interface(
        &self,
        tenant_id: &str,
        request_id: &str,
        instance: &ModuleInstance,
        inherit_context: bool,
        body: serde_json::Value,
    ) -> Result<(), DomainError>;

    async fn auto_deploy(&self, descriptor: &ModuleDescriptor) -> Result<(), DomainError>;

    async fn auto_undeploy(&self, descriptor: &ModuleDescriptor) -> Result<(), DomainError>;
}

/// Cluster leader election, consulted only by the timer scheduler at fire time.
pub trait DiscoveryManager: Send + Sync {
    fn is_leader(&self) -> bool;
}

/// Cross-process tenant-change notification. The only topic this module uses is
/// `"timer"`, whose payload is a tenant id.
pub trait EventBus: Send + Sync {
    fn publish(&self, topic: &str, payload: String);
    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<(String, String)>;
}

pub const TOPIC_TIMER: &str = "timer";

// ---------------------------------------------------------------------------
// Default in-process implementations
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryModuleManager {
    modules: RwLock<HashMap<ModuleId, ModuleDescriptor>>,
}

impl InMemoryModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: ModuleDescriptor) {
        self.modules.write().unwrap().insert(descriptor.id.clone(), descriptor);
    }
}

#[async_trait]
impl ModuleManager for InMemoryModuleManager {
    async fn get(&self, id: &str) -> Result<ModuleDescriptor, DomainError> {
        self.modules
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("module '{id}' not found")))
    }

    async fn get_latest(&self, name_or_id: &str) -> Result<ModuleDescriptor, DomainError> {
        let name = version::module_name(name_or_id);
        self.modules
            .read()
            .unwrap()
            .values()
            .filter(|d| d.name == name)
            .max_by(|a, b| version::compare_module_ids(&a.id, &b.id))
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("no module named '{name}'")))
    }

    async fn get_modules_with_filter(&self, pre_release: bool, _npm_snapshot: bool, filter_id: Option<&str>) -> Vec<ModuleDescriptor> {
        self.modules
            .read()
            .unwrap()
            .values()
            .filter(|d| pre_release || version::module_version(&d.id).map_or(true, |v| v.pre.is_empty()))
            .filter(|d| filter_id.map_or(true, |id| d.id == id))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryTenantStore {
    tenants: RwLock<HashMap<String, Tenant>>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn list_tenants(&self) -> Vec<Tenant> {
        self.tenants.read().unwrap().values().cloned().collect()
    }

    async fn insert(&self, tenant: Tenant) {
        self.tenants.write().unwrap().insert(tenant.id().to_owned(), tenant);
    }

    async fn update_descriptor(&self, descriptor: TenantDescriptor) {
        let mut guard = self.tenants.write().unwrap();
        match guard.get_mut(&descriptor.id) {
            Some(tenant) => tenant.descriptor = descriptor,
            None => {
                let id = descriptor.id.clone();
                guard.insert(id, Tenant::new(descriptor));
            }
        }
    }

    async fn update_modules(&self, id: &str, enabled: BTreeMap<ModuleId, i64>) -> bool {
        let mut guard = self.tenants.write().unwrap();
        match guard.get_mut(id) {
            Some(tenant) => {
                tenant.enabled = enabled;
                true
            }
            None => false,
        }
    }

    async fn delete(&self, id: &str) -> bool {
        self.tenants.write().unwrap().remove(id).is_some()
    }
}

/// Logs every call and always succeeds; the default standalone data plane.
#[derive(Default)]
pub struct LoggingProxy;

#[async_trait]
impl Proxy for LoggingProxy {
    async fn call_system_interface(&self, tenant_id: &str, instance: &ModuleInstance, body: serde_json::Value) -> Result<(), DomainError> {
        tracing::debug!(tenant_id, module_id = %instance.descriptor.id, path = %instance.path, method = %instance.method, %body, "system interface call");
        Ok(())
    }

    async fn do_call_system_interface(
        &self,
        tenant_id: &str,
        request_id: &str,
        instance: &ModuleInstance,
        inherit_context: bool,
        body: serde_json::Value,
    ) -> Result<(), DomainError> {
        tracing::debug!(tenant_id, request_id, module_id = %instance.descriptor.id, inherit_context, %body, "system interface call (with context)");
        Ok(())
    }

    async fn auto_deploy(&self, descriptor: &ModuleDescriptor) -> Result<(), DomainError> {
        tracing::debug!(module_id = %descriptor.id, "auto-deploy requested");
        Ok(())
    }

    async fn auto_undeploy(&self, descriptor: &ModuleDescriptor) -> Result<(), DomainError> {
        tracing::debug!(module_id = %descriptor.id, "auto-undeploy requested");
        Ok(())
    }
}

/// Always reports leadership; correct for single-node operation.
#[derive(Default)]
pub struct AlwaysLeaderDiscovery;

impl DiscoveryManager for AlwaysLeaderDiscovery {
    fn is_leader(&self) -> bool {
        true
    }
}

pub struct BroadcastEventBus {
    sender: tokio::sync::broadcast::Sender<(String, String)>,
}

impl BroadcastEventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = tokio::sync::broadcast::channel(256);
        Self { sender }
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, topic: &str, payload: String) {
        // No subscribers is a normal standalone-process state, not an error.
        let _ = self.sender.send((topic.to_owned(), payload));
    }

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<(String, String)> {
        self.sender.subscribe()
    }
}
