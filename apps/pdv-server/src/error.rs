//! # API Error Types
//!
//! Maps domain and storage errors to HTTP responses.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error → HTTP Mapping                                 │
//! │                                                                         │
//! │  ValidationError            → 400 Bad Request                          │
//! │  Payment composition rules  → 422 Unprocessable Entity                 │
//! │  State conflicts (stock,    → 409 Conflict                             │
//! │    session, sale status)                                               │
//! │  DbError::NotFound          → 404 Not Found                            │
//! │  Everything else            → 500 Internal Server Error                │
//! │                                                                         │
//! │  Body shape (stable contract for clients):                             │
//! │    { "error": { "code": "ESTOQUE_INSUFICIENTE", "message": "..." } }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use pdv_core::{CoreError, ValidationError};
use pdv_db::{CheckoutError, DbError};

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Business rule rejected the request; nothing was committed.
    #[error(transparent)]
    Business(#[from] CoreError),

    /// Storage-level failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Business(e) => ApiError::Business(e),
            CheckoutError::Db(e) => ApiError::Db(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Business(CoreError::Validation(err))
    }
}

impl ApiError {
    /// Stable machine-readable code for clients.
    fn code(&self) -> &'static str {
        match self {
            ApiError::Business(e) => match e {
                CoreError::Validation(_) => "VALIDACAO",
                CoreError::InvalidAmount { .. } => "VALOR_INVALIDO",
                CoreError::MissingCustomer { .. } => "CLIENTE_OBRIGATORIO",
                CoreError::InsufficientCredit { .. } => "CREDITO_INSUFICIENTE",
                CoreError::LoyaltyPointsUnavailable { .. } => "PONTOS_INSUFICIENTES",
                CoreError::SaleFullyPaid => "VENDA_JA_PAGA",
                CoreError::NotFullyPaid { .. } => "PAGAMENTO_INSUFICIENTE",
                CoreError::ChangeDestinationRequired { .. } => "DESTINO_TROCO_OBRIGATORIO",
                CoreError::InsufficientStock { .. } => "ESTOQUE_INSUFICIENTE",
                CoreError::SessionClosed => "CAIXA_FECHADO",
                CoreError::SessionAlreadyOpen { .. } => "CAIXA_JA_ABERTO",
                CoreError::NegativeOpeningBalance { .. } => "SALDO_INICIAL_NEGATIVO",
                CoreError::InvalidSaleStatus { .. } => "STATUS_VENDA_INVALIDO",
            },
            ApiError::Db(e) => match e {
                DbError::NotFound { .. } => "NAO_ENCONTRADO",
                DbError::UniqueViolation { .. } => "CONFLITO",
                _ => "ERRO_INTERNO",
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Business(e) => match e {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::InvalidAmount { .. }
                | CoreError::MissingCustomer { .. }
                | CoreError::InsufficientCredit { .. }
                | CoreError::LoyaltyPointsUnavailable { .. }
                | CoreError::SaleFullyPaid
                | CoreError::NotFullyPaid { .. }
                | CoreError::ChangeDestinationRequired { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::InsufficientStock { .. }
                | CoreError::SessionClosed
                | CoreError::SessionAlreadyOpen { .. }
                | CoreError::NegativeOpeningBalance { .. }
                | CoreError::InvalidSaleStatus { .. } => StatusCode::CONFLICT,
            },
            ApiError::Db(e) => match e {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(code, %message, "Request failed");
        } else {
            warn!(code, %message, "Request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}
