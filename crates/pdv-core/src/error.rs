//! # Error Types
//!
//! Domain-specific error types for pdv-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Kinds                                     │
//! │                                                                         │
//! │  Validation errors      rejected before any side effect                │
//! │  Hard business errors   block the operation, no partial commit         │
//! │  Overridable constraint InsufficientStock: blocks unless the caller    │
//! │                         confirmed the negative-stock override          │
//! │                                                                         │
//! │  Soft warnings (fiado over-limit tiers) are NOT errors: they are       │
//! │  advisory values (FiadoRisk) recorded on the sale for audit.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the relevant numbers in each variant (on_hand/requested,
//!    limite/excesso) so the caller can decide to override, redirect
//!    payment, or abort
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Money;
use crate::types::PaymentMethod;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They should be caught
/// and translated to structured API responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payment or movement amount is zero or negative.
    #[error("Invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: Money },

    /// FIADO or CREDITO payment attempted for a walk-in sale.
    ///
    /// Both methods settle against a customer ledger, so a sale without
    /// a customer cannot use them.
    #[error("Payment method {method:?} requires a customer")]
    MissingCustomer { method: PaymentMethod },

    /// CREDITO payment exceeds the customer's store-credit balance.
    #[error("Insufficient store credit: available {available}, requested {requested}")]
    InsufficientCredit { available: Money, requested: Money },

    /// Loyalty redemption requested more points than the customer has.
    #[error("Insufficient loyalty points: available {available}, requested {requested}")]
    LoyaltyPointsUnavailable { available: i64, requested: i64 },

    /// A payment was added after the sale was already fully covered.
    #[error("Sale is already fully paid, no further payments accepted")]
    SaleFullyPaid,

    /// Finalize attempted before payments covered the total due.
    #[error("Sale is not fully paid: {remaining} remaining")]
    NotFullyPaid { remaining: Money },

    /// Payments exceed the total but no change destination was chosen.
    ///
    /// Overpayment always requires an explicit disposition (cash refund,
    /// instant transfer, or conversion to store credit).
    #[error("Change of {change} requires an explicit destination")]
    ChangeDestinationRequired { change: Money },

    /// Insufficient stock to complete a sale line.
    ///
    /// Overridable: the caller may retry with the negative-stock override
    /// flag set on the line, which is recorded for audit.
    #[error("Insufficient stock for product {product_id}: on hand {on_hand}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        on_hand: i64,
        requested: i64,
    },

    /// A cash-inclusive operation hit a closed drawer.
    #[error("Cash session is closed; cash operations require an open session")]
    SessionClosed,

    /// A second session open was attempted while one is already OPEN.
    #[error("Cash session {session_id} is already open")]
    SessionAlreadyOpen { session_id: String },

    /// Opening balance below zero.
    #[error("Opening balance must not be negative: {amount}")]
    NegativeOpeningBalance { amount: Money },

    /// Sale is not in a state that allows the requested operation
    /// (e.g. cancelling an already cancelled sale).
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements and are
/// rejected before any side effect.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unknown enum tag).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_numbers() {
        let err = CoreError::InsufficientStock {
            product_id: "prod-1".to_string(),
            on_hand: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product prod-1: on hand 3, requested 5"
        );

        let err = CoreError::InsufficientCredit {
            available: Money::from_centavos(1500),
            requested: Money::from_centavos(2000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient store credit: available R$15,00, requested R$20,00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id_sessao".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
