//! Periodic firing of `_timer` routing entries, gated by cluster leadership.
//!
//! Each armed `TimerKey` owns its own background task driven by `sleep; fire; loop`,
//! torn down via a per-key `CancellationToken` stored alongside it in the timers set —
//! not a self-rescheduling callback chain.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::model::{RoutingEntry, Tenant, TimerKey};
use super::ports::{DiscoveryManager, ModuleInstance, ModuleManager, Proxy};
use super::replicated_map::Map1;

struct Inner {
    tenants: Arc<dyn Map1<Tenant>>,
    modules: Arc<dyn ModuleManager>,
    proxy: Arc<dyn Proxy>,
    discovery: Arc<dyn DiscoveryManager>,
    timers: Mutex<HashMap<TimerKey, CancellationToken>>,
}

pub struct TimerScheduler {
    inner: Arc<Inner>,
}

impl TimerScheduler {
    pub fn new(tenants: Arc<dyn Map1<Tenant>>, modules: Arc<dyn ModuleManager>, proxy: Arc<dyn Proxy>, discovery: Arc<dyn DiscoveryManager>) -> Self {
        Self { inner: Arc::new(Inner { tenants, modules, proxy, discovery, timers: Mutex::new(HashMap::new()) }) }
    }

    pub fn armed_count(&self) -> usize {
        self.inner.timers.lock().unwrap().len()
    }

    pub fn is_armed(&self, key: &TimerKey) -> bool {
        self.inner.timers.lock().unwrap().contains_key(key)
    }

    /// Enumerates `tenant_id`'s enabled modules' `_timer` interfaces and arms any
    /// routing entry not already armed; disarms anything armed for this tenant that
    /// no longer matches.
    pub async fn rebuild_tenant(&self, tenant_id: &str) {
        let Some(tenant) = self.inner.tenants.get(tenant_id).await else {
            self.disarm_tenant(tenant_id);
            return;
        };

        let mut desired = HashSet::new();
        for module_id in tenant.enabled.keys() {
            let Ok(descriptor) = self.inner.modules.get(module_id).await else { continue };
            let Some(timer_iface) = descriptor.timer_interface() else { continue };
            for (idx, entry) in timer_iface.routing_entries.iter().enumerate() {
                let seq = idx as u32 + 1;
                if entry.static_path.is_none() {
                    continue;
                }
                let Some(delay_ms) = entry.delay_milliseconds.filter(|&d| d > 0) else { continue };
                let key = TimerKey { tenant_id: tenant_id.to_owned(), module_id: module_id.clone(), seq };
                desired.insert(key.clone());
                self.arm_if_absent(key, Duration::from_millis(delay_ms), entry.clone());
            }
        }
        self.disarm_stale(tenant_id, &desired);
    }

    pub fn shutdown(&self) {
        let mut timers = self.inner.timers.lock().unwrap();
        for (_, token) in timers.drain() {
            token.cancel();
        }
    }

    fn arm_if_absent(&self, key: TimerKey, delay: Duration, entry: RoutingEntry) {
        let mut timers = self.inner.timers.lock().unwrap();
        if timers.contains_key(&key) {
            return;
        }
        let token = CancellationToken::new();
        timers.insert(key.clone(), token.clone());
        drop(timers);
        tracing::debug!(tenant_id = %key.tenant_id, module_id = %key.module_id, seq = key.seq, ?delay, "timer armed");
        tokio::spawn(Self::run(Arc::clone(&self.inner), key, delay, entry, token));
    }

    fn disarm_tenant(&self, tenant_id: &str) {
        self.disarm_stale(tenant_id, &HashSet::new());
    }

    fn disarm_stale(&self, tenant_id: &str, desired: &HashSet<TimerKey>) {
        let mut timers = self.inner.timers.lock().unwrap();
        let stale: Vec<TimerKey> = timers.keys().filter(|k| k.tenant_id == tenant_id && !desired.contains(k)).cloned().collect();
        for key in stale {
            if let Some(token) = timers.remove(&key) {
                tracing::debug!(tenant_id = %key.tenant_id, module_id = %key.module_id, seq = key.seq, "timer disarmed");
                token.cancel();
            }
        }
    }

    async fn run(inner: Arc<Inner>, key: TimerKey, delay: Duration, entry: RoutingEntry, token: CancellationToken) {
        loop {
            tokio::select! {
                () = token.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            if !Self::still_armed(&inner, &key).await {
                inner.timers.lock().unwrap().remove(&key);
                return;
            }

            if inner.discovery.is_leader() {
                Self::fire(&inner, &key, &entry).await;
            }
        }
    }

    async fn still_armed(inner: &Inner, key: &TimerKey) -> bool {
        let Some(tenant) = inner.tenants.get(&key.tenant_id).await else { return false };
        if !tenant.enabled.contains_key(&key.module_id) {
            return false;
        }
        let Ok(descriptor) = inner.modules.get(&key.module_id).await else { return false };
        descriptor.timer_interface().is_some_and(|iface| (key.seq as usize) <= iface.routing_entries.len())
    }

    async fn fire(inner: &Inner, key: &TimerKey, entry: &RoutingEntry) {
        let descriptor = match inner.modules.get(&key.module_id).await {
            Ok(d) => d,
            Err(_) => return,
        };
        let instance = ModuleInstance {
            descriptor,
            routing_entry: entry.clone(),
            path: entry.static_path.clone().unwrap_or_default(),
            method: entry.methods.first().cloned().unwrap_or_else(|| "POST".to_owned()),
            system_call: true,
            retry: false,
        };
        if let Err(err) = inner.proxy.call_system_interface(&key.tenant_id, &instance, serde_json::Value::Null).await {
            // Firing failures are logged and ignored; the loop re-arms regardless.
            tracing::warn!(tenant_id = %key.tenant_id, module_id = %key.module_id, seq = key.seq, %err, "timer fire failed");
        }
    }
}
