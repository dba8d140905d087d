use serde::{Deserialize, Serialize};

/// `modules.tenant_lifecycle_manager.config`. Loaded leniently: an absent section
/// falls back to [`Default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TenantLifecycleManagerConfig {
    pub enabled: bool,
    /// Timers firing more often than this are clamped to it, in milliseconds.
    pub timer_min_granularity_ms: u64,
    /// Whether a tenant with no enabled `_tenantPermissions` provider is treated
    /// as `expandPermissions = unknown` (the default) or `false`.
    pub expand_permissions_default_unknown: bool,
}

impl Default for TenantLifecycleManagerConfig {
    fn default() -> Self {
        Self { enabled: true, timer_min_granularity_ms: 50, expand_permissions_default_unknown: true }
    }
}
