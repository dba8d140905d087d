//! Proc-macro implementation for `#[modkit::module(...)]`.
//!
//! Wires a `Default`-constructible struct into the process-wide module
//! inventory: it gets a `MODULE_NAME` constant, a `ModuleRegistration` entry
//! built from its declared `capabilities`, and — when `client = ...` is given
//! — a free `expose_<name>_client` function that registers its DI client into
//! the `ClientHub`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, Ident, ItemStruct, Lit, Token, TypePath};

struct ModuleArg {
    key: Ident,
    value: Expr,
}

impl Parse for ModuleArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let value: Expr = input.parse()?;
        Ok(ModuleArg { key, value })
    }
}

struct ModuleArgs {
    args: Punctuated<ModuleArg, Token![,]>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(ModuleArgs {
            args: Punctuated::parse_terminated(input)?,
        })
    }
}

const KNOWN_CAPABILITIES: &[&str] = &["rest", "stateful"];

pub fn expand_module(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args: ModuleArgs = match syn::parse2(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };
    let input: ItemStruct = match syn::parse2(item.clone()) {
        Ok(input) => input,
        Err(err) => {
            return syn::Error::new_spanned(
                item,
                format!("#[modkit::module] can only be applied to a struct: {err}"),
            )
            .to_compile_error();
        }
    };

    let mut name: Option<String> = None;
    let mut deps: Vec<String> = Vec::new();
    let mut capabilities: Vec<String> = Vec::new();
    let mut client: Option<TypePath> = None;

    for arg in &args.args {
        let key = arg.key.to_string();
        match key.as_str() {
            "name" => match string_lit(&arg.value) {
                Ok(s) => name = Some(s),
                Err(err) => return err.to_compile_error(),
            },
            "deps" => match string_array(&arg.value) {
                Ok(values) => deps = values,
                Err(err) => return err.to_compile_error(),
            },
            "capabilities" | "caps" => match ident_array(&arg.value) {
                Ok(values) => capabilities = values,
                Err(err) => return err.to_compile_error(),
            },
            "client" => match &arg.value {
                Expr::Path(expr_path) => {
                    client = Some(TypePath {
                        qself: expr_path.qself.clone(),
                        path: expr_path.path.clone(),
                    });
                }
                other => {
                    return syn::Error::new_spanned(other, "client must be a type path")
                        .to_compile_error();
                }
            },
            other => {
                return syn::Error::new_spanned(&arg.key, format!("unknown argument '{other}'"))
                    .to_compile_error();
            }
        }
    }

    let Some(name) = name else {
        return syn::Error::new_spanned(&input.ident, "#[modkit::module] requires `name = \"...\"`")
            .to_compile_error();
    };

    for cap in &capabilities {
        if !KNOWN_CAPABILITIES.contains(&cap.as_str()) {
            return syn::Error::new_spanned(
                &input.ident,
                format!(
                    "unknown capability '{cap}'; expected one of: {}",
                    KNOWN_CAPABILITIES.join(", ")
                ),
            )
            .to_compile_error();
        }
    }

    let struct_ident = &input.ident;

    let rest_expr = if capabilities.iter().any(|c| c == "rest") {
        quote! { Some(__instance.clone() as ::std::sync::Arc<dyn ::modkit::contracts::RestfulModule>) }
    } else {
        quote! { None }
    };
    let stateful_expr = if capabilities.iter().any(|c| c == "stateful") {
        quote! { Some(__instance.clone() as ::std::sync::Arc<dyn ::modkit::contracts::StatefulModule>) }
    } else {
        quote! { None }
    };

    let deps_tokens = deps.iter().map(|d| quote! { #d });

    let expose_fn = client.map(|client_path| {
        let fn_ident = format_ident!("expose_{}_client", sanitize_ident(&name));
        quote! {
            /// Registers this module's DI client into the `ClientHub` under its trait type.
            pub fn #fn_ident(
                ctx: &::modkit::context::ModuleCtx,
                api: &::std::sync::Arc<dyn #client_path>,
            ) -> ::anyhow::Result<()> {
                ctx.client_hub().register::<dyn #client_path>(api.clone());
                Ok(())
            }
        }
    });

    quote! {
        #input

        impl #struct_ident {
            /// The name this module registers under; also the key used to look up its
            /// optional configuration section (`modules.<name>.config`).
            pub const MODULE_NAME: &'static str = #name;
        }

        #[doc(hidden)]
        #[allow(non_upper_case_globals)]
        ::modkit::inventory::submit! {
            ::modkit::runtime::ModuleRegistration {
                name: #name,
                deps: &[#(#deps_tokens),*],
                build: || {
                    let __instance = ::std::sync::Arc::new(#struct_ident::default());
                    ::modkit::runtime::BuiltModule {
                        name: #name,
                        module: __instance.clone() as ::std::sync::Arc<dyn ::modkit::contracts::Module>,
                        rest: #rest_expr,
                        stateful: #stateful_expr,
                    }
                },
            }
        }

        #expose_fn
    }
}

fn string_lit(expr: &Expr) -> syn::Result<String> {
    if let Expr::Lit(lit) = expr
        && let Lit::Str(s) = &lit.lit
    {
        return Ok(s.value());
    }
    Err(syn::Error::new_spanned(expr, "expected a string literal"))
}

fn string_array(expr: &Expr) -> syn::Result<Vec<String>> {
    if let Expr::Array(array) = expr {
        array.elems.iter().map(string_lit).collect()
    } else {
        Err(syn::Error::new_spanned(expr, "expected an array of string literals"))
    }
}

fn ident_array(expr: &Expr) -> syn::Result<Vec<String>> {
    if let Expr::Array(array) = expr {
        array
            .elems
            .iter()
            .map(|e| match e {
                Expr::Path(p) if p.path.get_ident().is_some() => {
                    Ok(p.path.get_ident().unwrap().to_string())
                }
                other => Err(syn::Error::new_spanned(other, "expected an identifier")),
            })
            .collect()
    } else {
        Err(syn::Error::new_spanned(expr, "expected an array of identifiers"))
    }
}

fn sanitize_ident(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
