use axum::http::StatusCode;
use modkit::api::problem::Problem;

use crate::domain::error::DomainError;

/// Maps the three-way domain error taxonomy onto RFC 9457 Problem Details.
pub fn domain_error_to_problem(err: DomainError, instance: &str) -> Problem {
    let trace_id = tracing::Span::current().id().map(|id| id.into_u64().to_string());

    let mut problem = match err {
        DomainError::User(msg) => Problem::new(StatusCode::BAD_REQUEST, "Invalid request", msg)
            .with_type("https://errors.hyperspot.com/TENANT_LIFECYCLE_USER_ERROR")
            .with_code("TENANT_LIFECYCLE_USER_ERROR")
            .with_instance(instance),
        DomainError::NotFound(msg) => Problem::new(StatusCode::NOT_FOUND, "Not found", msg)
            .with_type("https://errors.hyperspot.com/TENANT_LIFECYCLE_NOT_FOUND")
            .with_code("TENANT_LIFECYCLE_NOT_FOUND")
            .with_instance(instance),
        DomainError::Internal(msg) => Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", msg)
            .with_type("https://errors.hyperspot.com/TENANT_LIFECYCLE_INTERNAL_ERROR")
            .with_code("TENANT_LIFECYCLE_INTERNAL_ERROR")
            .with_instance(instance),
    };

    if let Some(trace_id) = trace_id {
        problem = problem.with_trace_id(trace_id);
    }
    problem
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(e, "/")
    }
}
