//! Per-tenant snapshot of resolved module descriptors, derived from a tenant's
//! enabled set. Process-local; lock-free reads of the last committed snapshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use super::model::{EnabledModuleCacheEntry, ExpandPermissions, ModuleDescriptor, Tenant, TENANT_PERMISSIONS_INTERFACE};
use super::ports::ModuleManager;
use super::version::interface_satisfies;

pub struct EnabledModuleCache {
    modules: Arc<dyn ModuleManager>,
    snapshots: RwLock<HashMap<String, EnabledModuleCacheEntry>>,
}

impl EnabledModuleCache {
    pub fn new(modules: Arc<dyn ModuleManager>) -> Self {
        Self { modules, snapshots: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, tenant_id: &str) -> Option<EnabledModuleCacheEntry> {
        self.snapshots.read().unwrap().get(tenant_id).cloned()
    }

    pub fn evict(&self, tenant_id: &str) {
        self.snapshots.write().unwrap().remove(tenant_id);
    }

    /// Looks up the full descriptor for every id in the tenant's enabled map and
    /// recomputes `expandPermissions`, then stores the result as the tenant's
    /// new committed snapshot.
    pub async fn rebuild(&self, tenant: &Tenant) -> EnabledModuleCacheEntry {
        let mut modules = Vec::with_capacity(tenant.enabled.len());
        for id in tenant.enabled.keys() {
            if let Ok(descriptor) = self.modules.get(id).await {
                modules.push(descriptor);
            }
        }

        let expand_permissions = expand_permissions_flag(&modules);
        let entry = EnabledModuleCacheEntry { modules, expand_permissions };
        self.snapshots.write().unwrap().insert(tenant.id().to_owned(), entry.clone());
        entry
    }
}

fn expand_permissions_flag(modules: &[ModuleDescriptor]) -> ExpandPermissions {
    let Some(permissions_module) = modules.iter().find_map(|m| m.interface(TENANT_PERMISSIONS_INTERFACE)) else {
        return ExpandPermissions::Unknown;
    };
    if interface_satisfies(&permissions_module.version, "1.1") {
        ExpandPermissions::True
    } else {
        ExpandPermissions::False
    }
}
