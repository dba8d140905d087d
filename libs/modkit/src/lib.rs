//! Core module framework: the `Module`/`RestfulModule`/`StatefulModule` contracts,
//! the per-module `ModuleCtx`, the cross-module `ClientHub`, and the RFC 9457
//! `Problem` error envelope that every module surfaces at its REST boundary.
//!
//! A module declares itself with `#[modkit::module(...)]`, which registers a
//! [`runtime::ModuleRegistration`] via `inventory`; the host binary discovers all
//! registered modules, builds a [`context::ModuleCtx`] for each, and drives them
//! through [`contracts::Module::init`], [`contracts::RestfulModule::register_rest`]
//! and [`contracts::StatefulModule::start`]/`stop` in that order.

pub mod api;
pub mod client_hub;
pub mod config;
pub mod context;
pub mod contracts;
pub mod domain;
pub mod result;
pub mod runtime;

pub use client_hub::ClientHub;
pub use context::{ModuleCtx, ModuleContextBuilder};
pub use contracts::{Module, RestfulModule, StatefulModule};
pub use domain::DomainModel;
pub use result::ApiResult;

pub use inventory;
pub use modkit_macros::{domain_model, module};
