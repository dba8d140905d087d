use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use modkit::api::prelude::*;

use crate::domain::service::Service;

use super::dto::{
    CreateTenantRequest, EnableDisableModuleRequest, InstallJobDto, InstallJobRequest, InterfaceDescriptorDto, InterfaceListQuery, ModuleDescriptorDto, ModuleEnablementResponse,
    TenantDto, UpdateTenantDescriptorRequest,
};

pub async fn create_tenant(Extension(svc): Extension<Arc<Service>>, Json(req): Json<CreateTenantRequest>) -> ApiResult<impl IntoResponse> {
    let tenant = crate::domain::model::Tenant::from(req);
    svc.insert(tenant.clone()).await?;
    Ok((StatusCode::CREATED, Json(TenantDto::from(tenant))))
}

pub async fn list_tenants(Extension(svc): Extension<Arc<Service>>) -> ApiResult<JsonBody<Vec<TenantDto>>> {
    let tenants = svc.list().await;
    Ok(Json(tenants.into_iter().map(Into::into).collect()))
}

pub async fn get_tenant(Extension(svc): Extension<Arc<Service>>, Path(id): Path<String>) -> ApiResult<JsonBody<TenantDto>> {
    let tenant = svc.get(&id).await.ok_or_else(|| Problem::from(crate::domain::error::DomainError::not_found(format!("tenant {id} not found"))))?;
    Ok(Json(tenant.into()))
}

pub async fn update_tenant_descriptor(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTenantDescriptorRequest>,
) -> ApiResult<impl IntoResponse> {
    svc.update_descriptor(crate::domain::model::TenantDescriptor { id, name: req.name, description: req.description }).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_tenant(Extension(svc): Extension<Arc<Service>>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    svc.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enable_disable_module(
    Extension(svc): Extension<Arc<Service>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<EnableDisableModuleRequest>,
) -> ApiResult<JsonBody<ModuleEnablementResponse>> {
    let options = req.options.into();
    let module_id = svc
        .enable_and_disable_module(&tenant_id, &options, req.module_from.as_deref(), req.module_to.as_deref())
        .await?;
    Ok(Json(ModuleEnablementResponse { module_id }))
}

pub async fn list_interfaces(
    Extension(svc): Extension<Arc<Service>>,
    Path(tenant_id): Path<String>,
    Query(q): Query<InterfaceListQuery>,
) -> ApiResult<JsonBody<Vec<InterfaceDescriptorDto>>> {
    let interfaces = svc.list_interfaces(&tenant_id, q.full, q.interface_type.map(Into::into)).await?;
    Ok(Json(interfaces.into_iter().map(Into::into).collect()))
}

pub async fn list_modules_from_interface(
    Extension(svc): Extension<Arc<Service>>,
    Path((tenant_id, interface_name)): Path<(String, String)>,
    Query(q): Query<InterfaceListQuery>,
) -> ApiResult<JsonBody<Vec<ModuleDescriptorDto>>> {
    let modules = svc.list_modules_from_interface(&tenant_id, &interface_name, q.interface_type.map(Into::into)).await?;
    Ok(Json(modules.into_iter().map(Into::into).collect()))
}

pub async fn get_module_user(Extension(svc): Extension<Arc<Service>>, Path(module_id): Path<String>) -> ApiResult<JsonBody<Vec<String>>> {
    Ok(Json(svc.get_module_user(&module_id).await))
}

pub async fn install_upgrade_create(
    Extension(svc): Extension<Arc<Service>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<InstallJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let options = req.options.into();
    let job_id = uuid::Uuid::now_v7().to_string();
    let plan = req.modules.map(|items| items.into_iter().map(Into::into).collect());
    let job = svc.install_upgrade_create(&tenant_id, &job_id, &options, plan).await?;
    let dto: InstallJobDto = job.into();
    Ok((StatusCode::CREATED, Json(dto)))
}

pub async fn install_upgrade_get(Extension(svc): Extension<Arc<Service>>, Path((tenant_id, job_id)): Path<(String, String)>) -> ApiResult<JsonBody<InstallJobDto>> {
    let job = svc
        .install_upgrade_get(&tenant_id, &job_id)
        .await
        .ok_or_else(|| Problem::from(crate::domain::error::DomainError::not_found(format!("install job {job_id} not found"))))?;
    Ok(Json(job.into()))
}

pub async fn install_upgrade_list(Extension(svc): Extension<Arc<Service>>, Path(tenant_id): Path<String>) -> ApiResult<JsonBody<Vec<InstallJobDto>>> {
    let jobs = svc.install_upgrade_list(&tenant_id).await;
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

pub async fn install_upgrade_delete(Extension(svc): Extension<Arc<Service>>, Path((tenant_id, job_id)): Path<(String, String)>) -> ApiResult<impl IntoResponse> {
    svc.install_upgrade_delete(&tenant_id, &job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
