use std::sync::Arc;

use axum::{http, Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use super::dto::{
    InstallJobDto, InterfaceDescriptorDto, ModuleDescriptorDto, ModuleEnablementResponse, TenantDto,
};
use super::handlers;
use crate::domain::service::Service;

/// Registers all REST routes for the tenant lifecycle manager module.
pub fn register_routes(mut router: Router, openapi: &dyn OpenApiRegistry, service: Arc<Service>) -> Router {
    router = OperationBuilder::<Missing, Missing, ()>::post("/tenants")
        .operation_id("tenant_lifecycle_manager.create_tenant")
        .summary("Create a tenant")
        .tag("tenants")
        .public()
        .handler(handlers::create_tenant)
        .json_response_with_schema::<TenantDto>(openapi, http::StatusCode::CREATED, "Tenant created")
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants")
        .operation_id("tenant_lifecycle_manager.list_tenants")
        .summary("List tenants")
        .tag("tenants")
        .public()
        .handler(handlers::list_tenants)
        .json_response_with_schema::<Vec<TenantDto>>(openapi, http::StatusCode::OK, "List of tenants")
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants/{id}")
        .operation_id("tenant_lifecycle_manager.get_tenant")
        .summary("Get a tenant")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::get_tenant)
        .json_response_with_schema::<TenantDto>(openapi, http::StatusCode::OK, "Tenant")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::put("/tenants/{id}")
        .operation_id("tenant_lifecycle_manager.update_tenant_descriptor")
        .summary("Update a tenant's descriptor")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::update_tenant_descriptor)
        .text_response(http::StatusCode::NO_CONTENT, "Updated", "text/plain")
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::delete("/tenants/{id}")
        .operation_id("tenant_lifecycle_manager.delete_tenant")
        .summary("Delete a tenant")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::delete_tenant)
        .text_response(http::StatusCode::NO_CONTENT, "Deleted", "text/plain")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::post("/tenants/{id}/modules")
        .operation_id("tenant_lifecycle_manager.enable_disable_module")
        .summary("Enable and/or disable a module for a tenant")
        .description("Runs the tenant hook / permissions-announcement sequence and persists the new enablement set.")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::enable_disable_module)
        .json_response_with_schema::<ModuleEnablementResponse>(openapi, http::StatusCode::OK, "Module enabled/disabled")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants/{id}/interfaces")
        .operation_id("tenant_lifecycle_manager.list_interfaces")
        .summary("List interfaces provided by a tenant's enabled modules")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .query_param("full", false, "Include every provider, not just the first per (interface, version)")
        .query_param("interface_type", false, "Filter by interface type")
        .handler(handlers::list_interfaces)
        .json_response_with_schema::<Vec<InterfaceDescriptorDto>>(openapi, http::StatusCode::OK, "Interfaces")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants/{id}/interfaces/{interfaceName}/modules")
        .operation_id("tenant_lifecycle_manager.list_modules_from_interface")
        .summary("List a tenant's enabled modules that provide a given interface")
        .tag("tenants")
        .public()
        .path_param("id", "Tenant id")
        .path_param("interfaceName", "Interface id")
        .query_param("interface_type", false, "Filter by interface type")
        .handler(handlers::list_modules_from_interface)
        .json_response_with_schema::<Vec<ModuleDescriptorDto>>(openapi, http::StatusCode::OK, "Modules")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/modules/{id}/users")
        .operation_id("tenant_lifecycle_manager.get_module_user")
        .summary("List the tenants that have a module enabled")
        .tag("modules")
        .public()
        .path_param("id", "Module id")
        .handler(handlers::get_module_user)
        .json_response_with_schema::<Vec<String>>(openapi, http::StatusCode::OK, "Tenant ids")
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::post("/tenants/{id}/install")
        .operation_id("tenant_lifecycle_manager.install_upgrade_create")
        .summary("Create an install/upgrade job for a tenant")
        .description("With no explicit module plan, synthesizes an upgrade-all plan. With `simulate`, returns the plan without persisting or running it.")
        .tag("install")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::install_upgrade_create)
        .json_response_with_schema::<InstallJobDto>(openapi, http::StatusCode::CREATED, "Install job")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants/{id}/install")
        .operation_id("tenant_lifecycle_manager.install_upgrade_list")
        .summary("List install/upgrade jobs for a tenant")
        .tag("install")
        .public()
        .path_param("id", "Tenant id")
        .handler(handlers::install_upgrade_list)
        .json_response_with_schema::<Vec<InstallJobDto>>(openapi, http::StatusCode::OK, "Install jobs")
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get("/tenants/{id}/install/{jobId}")
        .operation_id("tenant_lifecycle_manager.install_upgrade_get")
        .summary("Get an install/upgrade job")
        .tag("install")
        .public()
        .path_param("id", "Tenant id")
        .path_param("jobId", "Job id")
        .handler(handlers::install_upgrade_get)
        .json_response_with_schema::<InstallJobDto>(openapi, http::StatusCode::OK, "Install job")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::delete("/tenants/{id}/install/{jobId}")
        .operation_id("tenant_lifecycle_manager.install_upgrade_delete")
        .summary("Delete an install/upgrade job")
        .tag("install")
        .public()
        .path_param("id", "Tenant id")
        .path_param("jobId", "Job id")
        .handler(handlers::install_upgrade_delete)
        .text_response(http::StatusCode::NO_CONTENT, "Deleted", "text/plain")
        .error_404(openapi)
        .error_500(openapi)
        .register(router, openapi);

    router.layer(Extension(service))
}
