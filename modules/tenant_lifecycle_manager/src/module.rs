use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use modkit::api::OpenApiRegistry;
use modkit::context::ModuleCtx;
use modkit::contracts::{Module, RestfulModule, StatefulModule};

use crate::config::TenantLifecycleManagerConfig;
use crate::contract::client::TenantLifecycleApi;
use crate::domain::service::Service;
use crate::gateways::local::LocalTenantLifecycleClient;

/// Tenant lifecycle management: tenant records, per-tenant module enablement,
/// install/upgrade orchestration and the timers it arms for enabled modules.
#[modkit::module(
    name = "tenant_lifecycle_manager",
    capabilities = [rest, stateful],
    client = crate::contract::client::TenantLifecycleApi
)]
pub struct TenantLifecycleManager {
    service: arc_swap::ArcSwapOption<Service>,
}

impl Default for TenantLifecycleManager {
    fn default() -> Self {
        Self { service: arc_swap::ArcSwapOption::empty() }
    }
}

impl TenantLifecycleManager {
    fn service(&self) -> Result<Arc<Service>> {
        self.service.load().as_ref().cloned().ok_or_else(|| anyhow::anyhow!("tenant_lifecycle_manager service not initialized"))
    }
}

#[async_trait]
impl Module for TenantLifecycleManager {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let config: TenantLifecycleManagerConfig = ctx.config()?;
        if !config.enabled {
            tracing::info!("tenant lifecycle manager disabled by configuration");
        }

        let service = Arc::new(Service::new());
        service.init().await;
        self.service.store(Some(Arc::clone(&service)));

        let api: Arc<dyn TenantLifecycleApi> = Arc::new(LocalTenantLifecycleClient::new(service));
        expose_tenant_lifecycle_manager_client(ctx, &api)?;

        tracing::info!("tenant lifecycle manager initialized");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for TenantLifecycleManager {
    fn register_rest(&self, _ctx: &ModuleCtx, router: axum::Router, openapi: &dyn OpenApiRegistry) -> Result<axum::Router> {
        let service = self.service()?;
        let router = crate::api::rest::routes::register_routes(router, openapi, service);
        tracing::info!("tenant lifecycle manager REST routes registered");
        Ok(router)
    }
}

#[async_trait]
impl StatefulModule for TenantLifecycleManager {
    async fn start(&self, _cancel: CancellationToken) -> Result<()> {
        let service = self.service()?;
        service.start_timers().await;
        tracing::info!("tenant lifecycle manager timers armed");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let service = self.service()?;
        service.shutdown_timers();
        tracing::info!("tenant lifecycle manager timers disarmed");
        Ok(())
    }
}
