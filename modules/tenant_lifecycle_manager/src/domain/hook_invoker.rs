//! Invokes a module's `_tenant` and `_tenantPermissions` system interfaces through
//! the external proxy, and orchestrates the call ordering a single module change
//! requires.

use std::sync::Arc;

use serde_json::{Value, json};

use super::error::DomainError;
use super::model::{ModuleDescriptor, RoutingEntry, TENANT_HOOK_INTERFACE, TENANT_PERMISSIONS_INTERFACE};
use super::ports::{ModuleInstance, Proxy};
use super::version::parse_loose_version;

pub struct HookInvoker {
    proxy: Arc<dyn Proxy>,
}

impl HookInvoker {
    pub fn new(proxy: Arc<dyn Proxy>) -> Self {
        Self { proxy }
    }

    /// Calls `_tenant` on `module_to` (enable/upgrade) or `module_from` (pure
    /// disable/purge), selecting the request shape by the interface's declared
    /// version.
    pub async fn invoke_tenant_hook(
        &self,
        tenant_id: &str,
        module_to: Option<&ModuleDescriptor>,
        module_from: Option<&ModuleDescriptor>,
        purge: bool,
        parameters: &[(String, Option<String>)],
    ) -> Result<(), DomainError> {
        let target = module_to.or(module_from).ok_or_else(|| DomainError::user("tenant hook requires a target module"))?;
        let iface = target
            .interface(TENANT_HOOK_INTERFACE)
            .ok_or_else(|| DomainError::user(format!("module '{}' does not provide {TENANT_HOOK_INTERFACE}", target.id)))?;
        let version = parse_loose_version(&iface.version)
            .ok_or_else(|| DomainError::user(format!("module '{}' has an unparseable {TENANT_HOOK_INTERFACE} version", target.id)))?;

        let mut body = serde_json::Map::new();
        if let Some(to) = module_to {
            body.insert("module_to".to_owned(), json!(to.id));
        }
        if let Some(from) = module_from {
            body.insert("module_from".to_owned(), json!(from.id));
        }

        let method = if purge { "DELETE" } else { "POST" };

        match (version.major, version.minor) {
            (1, 0) => {
                if let Some(entry) = iface.routing_entries.iter().find(|e| e.accepts(method) && e.static_path.is_some()) {
                    self.call(tenant_id, target, entry, method, Value::Object(body)).await
                } else if !purge {
                    let fallback = RoutingEntry {
                        methods: vec!["POST".to_owned()],
                        static_path: Some("/_/tenant".to_owned()),
                        delay_milliseconds: None,
                        unit: None,
                    };
                    self.call(tenant_id, target, &fallback, "POST", Value::Object(body)).await
                } else {
                    Err(DomainError::user(format!("module '{}' has no routing entry for purge", target.id)))
                }
            }
            (1, 1) | (1, 2) => {
                if version.minor == 2 {
                    body.insert(
                        "parameters".to_owned(),
                        json!(
                            parameters
                                .iter()
                                .map(|(key, value)| {
                                    let mut param = serde_json::Map::new();
                                    param.insert("key".to_owned(), json!(key));
                                    if let Some(value) = value {
                                        param.insert("value".to_owned(), json!(value));
                                    }
                                    Value::Object(param)
                                })
                                .collect::<Vec<_>>()
                        ),
                    );
                }
                let entry = iface
                    .routing_entries
                    .iter()
                    .find(|e| {
                        if !e.accepts(method) {
                            return false;
                        }
                        let is_disable_path = e.static_path.as_deref() == Some("/_/tenant/disable");
                        if is_disable_path { module_to.is_none() } else { module_to.is_some() }
                    })
                    .ok_or_else(|| DomainError::user(format!("module '{}' has no matching {TENANT_HOOK_INTERFACE} routing entry", target.id)))?;
                self.call(tenant_id, target, entry, method, Value::Object(body)).await
            }
            _ => Err(DomainError::user(format!("unsupported {TENANT_HOOK_INTERFACE} interface version '{}'", iface.version))),
        }
    }

    /// POSTs `{moduleId, perms}` to `owner`'s `_tenantPermissions` interface, for
    /// the permissions of `announced`.
    pub async fn announce_permissions(&self, tenant_id: &str, owner: &ModuleDescriptor, announced: &ModuleDescriptor) -> Result<(), DomainError> {
        let iface = owner
            .interface(TENANT_PERMISSIONS_INTERFACE)
            .ok_or_else(|| DomainError::user(format!("module '{}' does not provide {TENANT_PERMISSIONS_INTERFACE}", owner.id)))?;
        let entry = iface
            .routing_entries
            .iter()
            .find(|e| e.accepts("POST"))
            .ok_or_else(|| DomainError::user(format!("module '{}' has no POST routing entry for {TENANT_PERMISSIONS_INTERFACE}", owner.id)))?;

        let version = parse_loose_version(&iface.version).unwrap_or(semver::Version::new(1, 0, 0));
        let perms = if (version.major, version.minor) >= (1, 1) { &announced.expanded_permission_sets } else { &announced.permission_sets };

        let body = json!({ "moduleId": announced.id, "perms": perms });
        self.call(tenant_id, owner, entry, "POST", body).await
    }

    /// Runs the full ordered sequence of hook calls for one module change
    /// (§"Call ordering per module change").
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_module_change(
        &self,
        tenant_id: &str,
        previously_enabled: &[ModuleDescriptor],
        permissions_owner: Option<&ModuleDescriptor>,
        module_to: Option<&ModuleDescriptor>,
        module_from: Option<&ModuleDescriptor>,
        purge: bool,
        parameters: &[(String, Option<String>)],
    ) -> Result<(), DomainError> {
        let enabling_permissions_module = module_to.is_some_and(|m| m.permissions_interface().is_some());

        if enabling_permissions_module {
            #[allow(clippy::unwrap_used)]
            let new_permissions_module = module_to.unwrap();
            self.invoke_tenant_hook(tenant_id, module_to, module_from, purge, parameters).await?;
            for other in previously_enabled {
                if other.id != new_permissions_module.id {
                    self.announce_permissions(tenant_id, new_permissions_module, other).await?;
                }
            }
            self.announce_permissions(tenant_id, new_permissions_module, new_permissions_module).await?;
        } else {
            if let (Some(owner), Some(target)) = (permissions_owner, module_to.or(module_from)) {
                self.announce_permissions(tenant_id, owner, target).await?;
            }
            self.invoke_tenant_hook(tenant_id, module_to, module_from, purge, parameters).await?;
        }
        Ok(())
    }

    async fn call(&self, tenant_id: &str, descriptor: &ModuleDescriptor, entry: &RoutingEntry, method: &str, body: Value) -> Result<(), DomainError> {
        let instance = ModuleInstance {
            descriptor: descriptor.clone(),
            routing_entry: entry.clone(),
            path: entry.static_path.clone().unwrap_or_default(),
            method: method.to_owned(),
            system_call: true,
            retry: entry.static_path.is_none(),
        };
        self.proxy.call_system_interface(tenant_id, &instance, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InterfaceDescriptor, InterfaceType};
    use crate::domain::ports::LoggingProxy;

    fn tenant_hook_module(id: &str, version: &str, path: &str, method: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_owned(),
            name: id.to_owned(),
            provides: vec![InterfaceDescriptor {
                id: TENANT_HOOK_INTERFACE.to_owned(),
                version: version.to_owned(),
                interface_type: InterfaceType::System,
                routing_entries: vec![RoutingEntry {
                    methods: vec![method.to_owned()],
                    static_path: Some(path.to_owned()),
                    delay_milliseconds: None,
                    unit: None,
                }],
            }],
            requires: vec![],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        }
    }

    #[tokio::test]
    async fn v1_0_uses_routing_entry_when_present() {
        let invoker = HookInvoker::new(Arc::new(LoggingProxy));
        let module = tenant_hook_module("mod-1.0.0", "1.0", "/_/tenant/install", "POST");
        invoker.invoke_tenant_hook("diku", Some(&module), None, false, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn v1_0_falls_back_when_no_entry_and_not_purging() {
        let invoker = HookInvoker::new(Arc::new(LoggingProxy));
        let mut module = tenant_hook_module("mod-1.0.0", "1.0", "/x", "GET");
        module.provides[0].routing_entries.clear();
        invoker.invoke_tenant_hook("diku", Some(&module), None, false, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn v1_0_purge_without_entry_fails() {
        let invoker = HookInvoker::new(Arc::new(LoggingProxy));
        let mut module = tenant_hook_module("mod-1.0.0", "1.0", "/x", "GET");
        module.provides[0].routing_entries.clear();
        let result = invoker.invoke_tenant_hook("diku", None, Some(&module), true, &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn v1_1_requires_matching_entry_no_fallback() {
        let invoker = HookInvoker::new(Arc::new(LoggingProxy));
        let mut module = tenant_hook_module("mod-1.1.0", "1.1", "/x", "GET");
        module.provides[0].routing_entries.clear();
        let result = invoker.invoke_tenant_hook("diku", Some(&module), None, false, &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unsupported_version_fails() {
        let invoker = HookInvoker::new(Arc::new(LoggingProxy));
        let module = tenant_hook_module("mod-2.0.0", "2.0", "/x", "POST");
        let result = invoker.invoke_tenant_hook("diku", Some(&module), None, false, &[]).await;
        assert!(result.is_err());
    }
}
