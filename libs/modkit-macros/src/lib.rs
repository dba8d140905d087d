//! Proc-macros for the `modkit` module framework.

mod domain_model;
mod module;

use proc_macro::TokenStream;
use syn::parse_macro_input;
use syn::DeriveInput;

/// Marks a struct or enum as a pure domain model, rejecting infrastructure
/// types (`sqlx`, `axum`, `http`, ...) in its fields at compile time.
#[proc_macro_attribute]
pub fn domain_model(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    domain_model::expand_domain_model(&input).into()
}

/// Registers a `Default`-constructible struct as a process module.
///
/// ```ignore
/// #[modkit::module(name = "tenant_lifecycle_manager", deps = [], capabilities = [rest, stateful], client = crate::contract::client::TenantLifecycleApi)]
/// #[derive(Default)]
/// pub struct TenantLifecycleManagerModule { ... }
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::expand_module(attr.into(), item.into()).into()
}
