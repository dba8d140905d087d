//! Pure data model for tenants, module descriptors, install jobs and timers.
//!
//! None of these types carry infrastructure concerns; the `#[modkit::domain_model]`
//! attribute enforces that at compile time.

use std::collections::BTreeMap;

/// A module id of the form `name-semver[-prerelease][+build]`, e.g. `users-1.0.0`.
pub type ModuleId = String;

#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A tenant and the module ids currently enabled for it, mapped to the epoch-second
/// timestamp at which each was enabled.
#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub descriptor: TenantDescriptor,
    pub enabled: BTreeMap<ModuleId, i64>,
}

impl Tenant {
    pub fn new(descriptor: TenantDescriptor) -> Self {
        Self { descriptor, enabled: BTreeMap::new() }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// The module name portion (before the first `-<digit>`) of every enabled id.
    pub fn enabled_names(&self) -> impl Iterator<Item = &str> {
        self.enabled.keys().map(|id| super::version::module_name(id))
    }

    pub fn enabled_id_for_name(&self, name: &str) -> Option<&ModuleId> {
        self.enabled.keys().find(|id| super::version::module_name(id) == name)
    }
}

#[modkit::domain_model]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceType {
    Proxy,
    System,
    Multiple,
}

#[modkit::domain_model]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

/// A single routing entry declared on an interface.
#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    pub methods: Vec<String>,
    pub static_path: Option<String>,
    pub delay_milliseconds: Option<u64>,
    pub unit: Option<TimeUnit>,
}

impl RoutingEntry {
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub id: String,
    pub version: String,
    pub interface_type: InterfaceType,
    pub routing_entries: Vec<RoutingEntry>,
}

#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRequirement {
    pub interface_id: String,
    pub min_version: String,
}

/// Read-only to this module; owned by the external module catalog.
#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub name: String,
    pub provides: Vec<InterfaceDescriptor>,
    pub requires: Vec<InterfaceRequirement>,
    pub optional: Vec<InterfaceRequirement>,
    pub permission_sets: Vec<String>,
    pub expanded_permission_sets: Vec<String>,
}

pub const TENANT_HOOK_INTERFACE: &str = "_tenant";
pub const TENANT_PERMISSIONS_INTERFACE: &str = "_tenantPermissions";
pub const TIMER_INTERFACE: &str = "_timer";

impl ModuleDescriptor {
    pub fn interface(&self, id: &str) -> Option<&InterfaceDescriptor> {
        self.provides.iter().find(|iface| iface.id == id)
    }

    pub fn provides_tenant_hook(&self) -> bool {
        self.interface(TENANT_HOOK_INTERFACE).is_some()
    }

    pub fn permissions_interface(&self) -> Option<&InterfaceDescriptor> {
        self.interface(TENANT_PERMISSIONS_INTERFACE)
    }

    pub fn timer_interface(&self) -> Option<&InterfaceDescriptor> {
        self.interface(TIMER_INTERFACE)
    }
}

#[modkit::domain_model]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Enable,
    Disable,
    UpToDate,
    Conflict,
}

#[modkit::domain_model]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Deploy,
    Invoke,
    Undeploy,
    Done,
}

/// One item of an install/upgrade plan.
#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantModuleDescriptor {
    pub id: ModuleId,
    pub from: Option<ModuleId>,
    pub action: PlanAction,
    pub stage: JobStage,
    pub message: Option<String>,
}

impl TenantModuleDescriptor {
    pub fn new(id: ModuleId, from: Option<ModuleId>, action: PlanAction) -> Self {
        Self { id, from, action, stage: JobStage::Pending, message: None }
    }

    pub fn conflict(id: ModuleId, from: Option<ModuleId>, message: impl Into<String>) -> Self {
        Self {
            id,
            from,
            action: PlanAction::Conflict,
            stage: JobStage::Pending,
            message: Some(message.into()),
        }
    }

    pub fn failed(&self) -> bool {
        self.stage != JobStage::Done && self.message.is_some()
    }
}

#[modkit::domain_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallJob {
    pub id: String,
    pub tenant_id: String,
    pub start_date: i64,
    pub end_date: Option<i64>,
    pub complete: bool,
    pub modules: Vec<TenantModuleDescriptor>,
}

/// Options accepted by `installUpgradeCreate`.
#[modkit::domain_model]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub simulate: bool,
    pub run_async: bool,
    pub deploy: bool,
    pub ignore_errors: bool,
    pub pre_release: bool,
    pub npm_snapshot: bool,
    pub filter_id: Option<String>,
}

#[modkit::domain_model]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPermissions {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct EnabledModuleCacheEntry {
    pub modules: Vec<ModuleDescriptor>,
    pub expand_permissions: ExpandPermissions,
}

/// Identifies one armed timer: a tenant's module's Nth `_timer` routing entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerKey {
    pub tenant_id: String,
    pub module_id: ModuleId,
    pub seq: u32,
}

pub fn now_epoch_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
