//! Type-safe API operation builder with compile-time guarantees
//!
//! This module provides a type-state builder pattern that enforces at compile time
//! that API operations cannot be registered unless both a handler and at least one
//! response are specified.

pub mod openapi_registry;
pub mod operation_builder;
pub mod problem;
pub mod response;

pub use openapi_registry::{OpenApiInfo, OpenApiRegistry, OpenApiRegistryImpl, ensure_schema};
pub use operation_builder::{Missing, OperationBuilder, OperationSpec, ParamLocation, ParamSpec, Present, ResponseSpec, state};
pub use problem::{
    APPLICATION_PROBLEM_JSON, Problem, ValidationError, bad_request, conflict, internal_error,
    not_found,
};

/// Prelude module that re-exports common API types and utilities for module authors
pub mod prelude {
    // Result type (Problem-only)
    pub use crate::result::ApiResult;

    // Problem type for error construction
    pub use super::problem::Problem;

    // Response sugar
    pub use super::response::{JsonBody, created_json, no_content, ok_json};

    // Useful axum bits (common in handlers)
    pub use axum::{Json, http::StatusCode, response::IntoResponse};
}
