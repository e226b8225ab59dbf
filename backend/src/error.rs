//! Error handling for the POS Stock Tracker
//!
//! Provides consistent error responses in English and French

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{reports::ReportError, LedgerError};
use thiserror::Error;
use validator::ValidationErrors;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for {reference}: requested {requested}, available {available}")]
    InsufficientStock {
        reference: String,
        requested: i64,
        available: i64,
    },

    // Storage errors
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: &str, message_fr: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_fr: message_fr.to_string(),
        }
    }

    /// Failures the caller may retry unchanged
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::StoreUnavailable(_) => true,
            AppError::DatabaseError(err) => is_connectivity_error(err),
            _ => false,
        }
    }
}

fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveQuantity(_) => AppError::Validation {
                field: "quantity".to_string(),
                message: err.to_string(),
                message_fr: "La quantité doit être un entier positif".to_string(),
            },
            LedgerError::NegativeUnitPrice => AppError::Validation {
                field: "unit_price".to_string(),
                message: err.to_string(),
                message_fr: "Le prix unitaire ne peut pas être négatif".to_string(),
            },
            LedgerError::UnknownKind(_) => AppError::Validation {
                field: "kind".to_string(),
                message: err.to_string(),
                message_fr: "Type de mouvement inconnu".to_string(),
            },
            LedgerError::InsufficientStock {
                reference,
                requested,
                available,
            } => AppError::InsufficientStock {
                reference,
                requested,
                available,
            },
            LedgerError::QuantityOverflow(_) => AppError::ValidationError(err.to_string()),
            LedgerError::ItemArchived(_) => AppError::NotFound("Item".to_string()),
        }
    }
}

impl AppError {
    /// Report failure attributed to the query field that produced the date
    pub fn from_report(field: &str, err: ReportError) -> Self {
        match err {
            ReportError::DateOutOfRange(_) => AppError::Validation {
                field: field.to_string(),
                message: err.to_string(),
                message_fr: "Date hors de la plage prise en charge".to_string(),
            },
            ReportError::Overflow => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::from_report("date", err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (field.to_string(), message)
            });

        match first {
            Some((field, message)) => AppError::Validation {
                message_fr: format!("Valeur invalide pour {}", field),
                field,
                message,
            },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message_en: String, message_fr: String) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message_en,
                message_fr,
                field: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_fr,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_fr: format!("Données invalides : {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_fr: format!("Un enregistrement avec ce {} existe déjà", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_fr: format!("{} non trouvé", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                reference,
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: requested {}, available {}",
                        reference, requested, available
                    ),
                    message_fr: format!(
                        "Stock insuffisant pour {} : demandé {}, disponible {}",
                        reference, requested, available
                    ),
                    field: Some("quantity".to_string()),
                },
            ),
            AppError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message_en: "The database is temporarily unavailable".to_string(),
                    message_fr: "Base de données non connectée".to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(err) if is_connectivity_error(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message_en: "The database is temporarily unavailable".to_string(),
                    message_fr: "Base de données non connectée".to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_fr: "Une erreur de base de données est survenue".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_fr: "Une erreur interne est survenue".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_fr: "Une erreur interne est survenue".to_string(),
                    field: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: error_detail,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
