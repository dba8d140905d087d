//! Tenant Lifecycle Manager
//!
//! Tracks which tenants exist, which modules are enabled for each, and drives
//! the install/upgrade and timer machinery that keeps that state consistent
//! with the rest of a deployment.

pub mod module;
pub use module::TenantLifecycleManager;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod contract;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;

pub use contract::client::TenantLifecycleApi;
pub use contract::error::LifecycleError;
