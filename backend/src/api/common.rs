//! Shared response types and error conversion for API handlers.
//!
//! Every failure leaves a handler as an `ApiError`, built from a
//! `ServiceError` by `service_error_to_http`. Error bodies have a uniform
//! shape:
//!
//! - `message`: human-readable message
//! - `errorType`: machine-readable category
//! - `details`: field-level validation failures, when applicable
//!
//! 404 responses carry no body. Internal failures are logged and reported
//! with a generic message only.

use crate::errors::{FieldViolation, ServiceError};
use crate::utils::pagination::{PageRequest, PagedList, PaginationMetadata};
use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<FieldViolation> for FieldError {
    fn from(violation: FieldViolation) -> Self {
        Self {
            field: violation.field,
            message: violation.message,
        }
    }
}

/// Simple `{ "message": ... }` success body.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// List body: `{ "items": [...], "totalCount": n }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// An error response ready to be returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Option<ErrorBody>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

impl ApiError {
    fn with_message(status: StatusCode, error_type: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(ErrorBody {
                message: message.into(),
                error_type: error_type.to_string(),
                details: None,
            }),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    match error {
        ServiceError::Validation { message, details } => ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: Some(ErrorBody {
                message,
                error_type: "validation_error".to_string(),
                details: (!details.is_empty())
                    .then(|| details.into_iter().map(FieldError::from).collect()),
            }),
        },
        ServiceError::NotFound { entity, identifier } => {
            tracing::debug!("{} '{}' not found", entity, identifier);
            ApiError {
                status: StatusCode::NOT_FOUND,
                body: None,
            }
        }
        ServiceError::AlreadyExists { entity, identifier } => ApiError::with_message(
            StatusCode::BAD_REQUEST,
            "already_exists",
            format!("{} '{}' is already taken", entity, identifier),
        ),
        ServiceError::Unauthorized { message } => {
            ApiError::with_message(StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        ServiceError::PermissionDenied { message } => {
            ApiError::with_message(StatusCode::FORBIDDEN, "permission_denied", message)
        }
        ServiceError::InvalidOperation { message } => {
            ApiError::with_message(StatusCode::BAD_REQUEST, "invalid_operation", message)
        }
        ServiceError::ExternalService { message } => {
            ApiError::with_message(StatusCode::BAD_REQUEST, "external_service_error", message)
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {:#}", source);
            ApiError::with_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error",
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            ApiError::with_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            )
        }
    }
}

/// Builds a list response with the `X-Pagination` header.
pub fn paged_response<T: Serialize>(
    page: PagedList<T>,
    request: &PageRequest,
    base_path: &str,
) -> Result<Response, ApiError> {
    let metadata = PaginationMetadata::from_paged(&page, request, base_path);
    let header = serde_json::to_string(&metadata)
        .ok()
        .and_then(|json| HeaderValue::from_str(&json).ok())
        .ok_or_else(|| {
            service_error_to_http(ServiceError::internal_error(
                "pagination header could not be encoded",
            ))
        })?;

    let body = PageBody {
        total_count: page.total_count,
        items: page.items,
    };

    Ok((
        [(HeaderName::from_static(PaginationMetadata::HEADER), header)],
        Json(body),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::not_found("User", "1"), StatusCode::NOT_FOUND),
            (
                ServiceError::already_exists("Username", "bob"),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (ServiceError::permission_denied("no"), StatusCode::FORBIDDEN),
            (
                ServiceError::invalid_operation("nope"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::external_service("down"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::internal_error("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(service_error_to_http(error).status, status);
        }
    }

    #[test]
    fn test_not_found_has_no_body() {
        assert!(
            service_error_to_http(ServiceError::not_found("User", "1"))
                .body
                .is_none()
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let error = service_error_to_http(ServiceError::Database {
            source: anyhow::anyhow!("no such table: users"),
        });
        let body = error.body.unwrap();
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_validation_details_are_forwarded() {
        let error = service_error_to_http(ServiceError::Validation {
            message: "email: Must be a valid email".into(),
            details: vec![FieldViolation {
                field: "email".into(),
                message: "Must be a valid email".into(),
            }],
        });
        let body = error.body.unwrap();
        assert_eq!(body.error_type, "validation_error");
        assert_eq!(
            body.details,
            Some(vec![FieldError {
                field: "email".into(),
                message: "Must be a valid email".into()
            }])
        );
    }
}
