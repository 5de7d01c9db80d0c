use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::logic::CrmError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid {entity} ID '{raw}'")]
    InvalidId { entity: &'static str, raw: String },
    #[error("Missing {0} ID in path")]
    MissingId(&'static str),
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
    #[error(transparent)]
    Crm(#[from] CrmError),
}

/// Body of every failed API call.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId { .. } | ApiError::MissingId(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Crm(err) => match err {
                CrmError::MissingReference { .. } | CrmError::NoFieldsToUpdate => {
                    StatusCode::BAD_REQUEST
                }
                CrmError::NotFound { .. } => StatusCode::NOT_FOUND,
                CrmError::Store(StoreError::ForeignKeyViolation(_))
                | CrmError::Store(StoreError::UniqueViolation(_)) => StatusCode::BAD_REQUEST,
                CrmError::InvalidPayload(_) | CrmError::CorruptRecord { .. } | CrmError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// The client-facing message, with store failures put into their category.
    pub fn message(&self) -> String {
        match self {
            ApiError::Crm(CrmError::Store(StoreError::ForeignKeyViolation(_))) => {
                "Invalid Foreign Key value. Please ensure that the selected Prospect or Entreprise exists."
                    .to_string()
            }
            ApiError::Crm(CrmError::Store(StoreError::UniqueViolation(detail))) => {
                format!("Database Constraint Violation: {}", detail)
            }
            other if other.status() == StatusCode::INTERNAL_SERVER_ERROR => {
                format!("Internal Server Error: {}", other)
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            log::error!("{}", message);
        } else {
            log::warn!("{} {}", status.as_u16(), message);
        }

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_violations_are_client_errors() {
        let fk = ApiError::from(CrmError::Store(StoreError::ForeignKeyViolation(
            "violates foreign key constraint".to_string(),
        )));
        assert_eq!(fk.status(), StatusCode::BAD_REQUEST);
        assert!(fk.message().starts_with("Invalid Foreign Key value."));

        let unique = ApiError::from(CrmError::Store(StoreError::UniqueViolation(
            "duplicate key value".to_string(),
        )));
        assert_eq!(unique.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unique.message(), "Database Constraint Violation: duplicate key value");
    }

    #[test]
    fn test_unexpected_errors_are_internal() {
        let not_null = ApiError::from(CrmError::Store(StoreError::NotNullViolation(
            "null value in column \"libelle\"".to_string(),
        )));
        assert_eq!(not_null.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            not_null.message(),
            "Internal Server Error: null value in column \"libelle\""
        );

        let payload = ApiError::from(CrmError::InvalidPayload("expected value".to_string()));
        assert_eq!(payload.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            ApiError::MissingId("Prospect").message(),
            "Missing Prospect ID in path"
        );
        assert_eq!(
            ApiError::from(CrmError::NoFieldsToUpdate).status(),
            StatusCode::BAD_REQUEST
        );
        let missing = ApiError::from(CrmError::NotFound {
            entity: "Tache",
            id: 3,
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message(), "Tache 3 not found");
    }
}
