use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::model::{
    InstallJob, InstallOptions, InterfaceDescriptor, InterfaceRequirement, InterfaceType, JobStage, ModuleDescriptor, PlanAction, RoutingEntry, Tenant, TenantDescriptor,
    TenantModuleDescriptor, TimeUnit,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: Vec<String>,
}

impl From<Tenant> for TenantDto {
    fn from(t: Tenant) -> Self {
        Self { id: t.descriptor.id, name: t.descriptor.name, description: t.descriptor.description, enabled: t.enabled.into_keys().collect() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl From<CreateTenantRequest> for Tenant {
    fn from(r: CreateTenantRequest) -> Self {
        Tenant::new(TenantDescriptor { id: r.id, name: r.name, description: r.description })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTenantDescriptorRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnableDisableModuleRequest {
    pub module_from: Option<String>,
    pub module_to: Option<String>,
    #[serde(default)]
    pub options: InstallOptionsDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InstallOptionsDto {
    #[serde(default)]
    pub simulate: bool,
    #[serde(default)]
    pub run_async: bool,
    #[serde(default)]
    pub deploy: bool,
    #[serde(default)]
    pub ignore_errors: bool,
    #[serde(default)]
    pub pre_release: bool,
    #[serde(default)]
    pub npm_snapshot: bool,
    #[serde(default)]
    pub filter_id: Option<String>,
}

impl From<InstallOptionsDto> for InstallOptions {
    fn from(d: InstallOptionsDto) -> Self {
        Self {
            simulate: d.simulate,
            run_async: d.run_async,
            deploy: d.deploy,
            ignore_errors: d.ignore_errors,
            pre_release: d.pre_release,
            npm_snapshot: d.npm_snapshot,
            filter_id: d.filter_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModuleEnablementResponse {
    pub module_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstallJobRequest {
    #[serde(default)]
    pub options: InstallOptionsDto,
    #[serde(default)]
    pub modules: Option<Vec<TenantModuleDescriptorDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantModuleDescriptorDto {
    pub id: String,
    pub from: Option<String>,
    pub action: PlanActionDto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanActionDto {
    Enable,
    Disable,
    Uptodate,
    Conflict,
}

impl From<PlanAction> for PlanActionDto {
    fn from(a: PlanAction) -> Self {
        match a {
            PlanAction::Enable => Self::Enable,
            PlanAction::Disable => Self::Disable,
            PlanAction::UpToDate => Self::Uptodate,
            PlanAction::Conflict => Self::Conflict,
        }
    }
}

impl From<PlanActionDto> for PlanAction {
    fn from(a: PlanActionDto) -> Self {
        match a {
            PlanActionDto::Enable => Self::Enable,
            PlanActionDto::Disable => Self::Disable,
            PlanActionDto::Uptodate => Self::UpToDate,
            PlanActionDto::Conflict => Self::Conflict,
        }
    }
}

impl From<TenantModuleDescriptorDto> for TenantModuleDescriptor {
    fn from(d: TenantModuleDescriptorDto) -> Self {
        TenantModuleDescriptor::new(d.id, d.from, d.action.into())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStageDto {
    Pending,
    Deploy,
    Invoke,
    Undeploy,
    Done,
}

impl From<JobStage> for JobStageDto {
    fn from(s: JobStage) -> Self {
        match s {
            JobStage::Pending => Self::Pending,
            JobStage::Deploy => Self::Deploy,
            JobStage::Invoke => Self::Invoke,
            JobStage::Undeploy => Self::Undeploy,
            JobStage::Done => Self::Done,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantModuleResultDto {
    pub id: String,
    pub from: Option<String>,
    pub action: PlanActionDto,
    pub stage: JobStageDto,
    pub message: Option<String>,
}

impl From<TenantModuleDescriptor> for TenantModuleResultDto {
    fn from(d: TenantModuleDescriptor) -> Self {
        Self { id: d.id, from: d.from, action: d.action.into(), stage: d.stage.into(), message: d.message }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstallJobDto {
    pub id: String,
    pub tenant_id: String,
    pub start_date: i64,
    pub end_date: Option<i64>,
    pub complete: bool,
    pub modules: Vec<TenantModuleResultDto>,
}

impl From<InstallJob> for InstallJobDto {
    fn from(j: InstallJob) -> Self {
        Self { id: j.id, tenant_id: j.tenant_id, start_date: j.start_date, end_date: j.end_date, complete: j.complete, modules: j.modules.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceTypeDto {
    Proxy,
    System,
    Multiple,
}

impl From<InterfaceTypeDto> for InterfaceType {
    fn from(t: InterfaceTypeDto) -> Self {
        match t {
            InterfaceTypeDto::Proxy => Self::Proxy,
            InterfaceTypeDto::System => Self::System,
            InterfaceTypeDto::Multiple => Self::Multiple,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InterfaceListQuery {
    #[serde(default)]
    pub full: bool,
    #[serde(default)]
    pub interface_type: Option<InterfaceTypeDto>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnitDto {
    Seconds,
    Minutes,
    Hours,
}

impl From<TimeUnit> for TimeUnitDto {
    fn from(u: TimeUnit) -> Self {
        match u {
            TimeUnit::Seconds => Self::Seconds,
            TimeUnit::Minutes => Self::Minutes,
            TimeUnit::Hours => Self::Hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoutingEntryDto {
    pub methods: Vec<String>,
    pub static_path: Option<String>,
    pub delay_milliseconds: Option<u64>,
    pub unit: Option<TimeUnitDto>,
}

impl From<RoutingEntry> for RoutingEntryDto {
    fn from(e: RoutingEntry) -> Self {
        Self { methods: e.methods, static_path: e.static_path, delay_milliseconds: e.delay_milliseconds, unit: e.unit.map(Into::into) }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterfaceDescriptorDto {
    pub id: String,
    pub version: String,
    pub interface_type: InterfaceTypeDto,
    pub routing_entries: Vec<RoutingEntryDto>,
}

impl From<InterfaceType> for InterfaceTypeDto {
    fn from(t: InterfaceType) -> Self {
        match t {
            InterfaceType::Proxy => Self::Proxy,
            InterfaceType::System => Self::System,
            InterfaceType::Multiple => Self::Multiple,
        }
    }
}

impl From<InterfaceDescriptor> for InterfaceDescriptorDto {
    fn from(d: InterfaceDescriptor) -> Self {
        Self { id: d.id, version: d.version, interface_type: d.interface_type.into(), routing_entries: d.routing_entries.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterfaceRequirementDto {
    pub interface_id: String,
    pub min_version: String,
}

impl From<InterfaceRequirement> for InterfaceRequirementDto {
    fn from(r: InterfaceRequirement) -> Self {
        Self { interface_id: r.interface_id, min_version: r.min_version }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModuleDescriptorDto {
    pub id: String,
    pub name: String,
    pub provides: Vec<InterfaceDescriptorDto>,
    pub requires: Vec<InterfaceRequirementDto>,
    pub optional: Vec<InterfaceRequirementDto>,
}

impl From<ModuleDescriptor> for ModuleDescriptorDto {
    fn from(d: ModuleDescriptor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            provides: d.provides.into_iter().map(Into::into).collect(),
            requires: d.requires.into_iter().map(Into::into).collect(),
            optional: d.optional.into_iter().map(Into::into).collect(),
        }
    }
}
