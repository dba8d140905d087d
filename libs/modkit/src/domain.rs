//! Domain layer support types.
//!
//! This module provides marker traits for domain-driven design (DDD) patterns.

/// Marker trait for domain model types.
///
/// Types marked with `#[domain_model]` automatically implement this trait,
/// which gives a compile-time signal that a type is free of infrastructure
/// dependencies (no `axum`, `http`, `hyper`, raw filesystem access, etc. in its fields).
#[doc(hidden)]
pub trait DomainModel {}
