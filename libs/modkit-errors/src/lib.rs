//! Core error types for the modkit framework
//!
//! This crate provides pure data types for error handling, with no dependencies
//! on HTTP frameworks. It includes RFC 9457 Problem Details (`Problem`).
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod problem;

// Re-export commonly used types
pub use problem::{
    APPLICATION_PROBLEM_JSON, Problem, ValidationError, ValidationErrorResponse,
    ValidationViolation,
};
