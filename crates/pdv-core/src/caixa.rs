//! # Cash Session Module
//!
//! Pure arithmetic for the physical drawer: running balance, manual
//! movement validation and close-time variance.
//!
//! ## Drawer Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cash Session Ledger                              │
//! │                                                                         │
//! │  ABRIR (opening balance)                                                │
//! │    │                                                                    │
//! │    ├── ENTRADA     +  cash received from sales                          │
//! │    ├── SAIDA       −  cash change handed out / refunds                  │
//! │    ├── SUPRIMENTO  +  manual cash added to the drawer                   │
//! │    └── SANGRIA     −  manual cash removed (e.g. taken to the safe)      │
//! │    │                                                                    │
//! │  FECHAR: operator counts the drawer                                     │
//! │    variance = counted − expected                                        │
//! │      > 0  sobra   (overage)                                             │
//! │      < 0  falta   (shortage)                                            │
//! │      = 0  exact   (within one centavo)                                  │
//! │                                                                         │
//! │  Only DINHEIRO touches this ledger. PIX and card never do.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashMovement, MovementKind, SessionStatus};

/// Maximum length accepted for a movement description.
pub const MAX_MOVEMENT_DESCRIPTION: usize = 200;

// =============================================================================
// Running Balance
// =============================================================================

/// Expected cash in the drawer: opening balance plus every signed movement.
///
/// ## Example
/// ```rust
/// use pdv_core::caixa::running_balance;
/// use pdv_core::money::Money;
/// # use pdv_core::types::{CashMovement, MovementKind};
/// # use chrono::Utc;
/// # fn mv(kind: MovementKind, centavos: i64) -> CashMovement {
/// #     CashMovement {
/// #         id: String::new(), session_id: String::new(), kind,
/// #         amount_centavos: centavos, payment_method: None,
/// #         description: None, created_at: Utc::now(),
/// #     }
/// # }
///
/// let movements = vec![
///     mv(MovementKind::Suprimento, 5_000),
///     mv(MovementKind::Sangria, 3_000),
/// ];
/// let balance = running_balance(Money::from_centavos(10_000), &movements);
/// assert_eq!(balance.centavos(), 12_000);
/// ```
pub fn running_balance(opening_balance: Money, movements: &[CashMovement]) -> Money {
    movements.iter().fold(opening_balance, |acc, m| {
        acc + Money::from_centavos(m.kind.signed_centavos(m.amount()))
    })
}

// =============================================================================
// Session Preconditions
// =============================================================================

/// Validates an opening balance before a session is created.
pub fn validate_opening_balance(amount: Money) -> CoreResult<()> {
    if amount.is_negative() {
        return Err(CoreError::NegativeOpeningBalance { amount });
    }
    Ok(())
}

/// Validates a manual SANGRIA/SUPRIMENTO request against the session state.
///
/// ENTRADA and SAIDA movements are produced only by the sale finalizer and
/// never arrive through this path.
pub fn validate_manual_movement(
    session_status: SessionStatus,
    kind: MovementKind,
    amount: Money,
    description: Option<&str>,
) -> CoreResult<()> {
    if session_status != SessionStatus::Open {
        return Err(CoreError::SessionClosed);
    }
    if !kind.is_manual() {
        return Err(ValidationError::InvalidFormat {
            field: "tipo".to_string(),
            reason: "only SANGRIA and SUPRIMENTO are accepted".to_string(),
        }
        .into());
    }
    if !amount.is_positive() {
        return Err(CoreError::InvalidAmount { amount });
    }
    if let Some(desc) = description {
        if desc.len() > MAX_MOVEMENT_DESCRIPTION {
            return Err(ValidationError::TooLong {
                field: "descricao".to_string(),
                max: MAX_MOVEMENT_DESCRIPTION,
            }
            .into());
        }
    }
    Ok(())
}

// =============================================================================
// Close-Time Variance
// =============================================================================

/// Outcome of closing a session against a counted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Expected balance at close time.
    pub expected: Money,
    /// What the operator counted in the drawer.
    pub counted: Money,
    /// counted − expected. Positive = sobra, negative = falta.
    pub variance: Money,
    /// Whether the count matched within the rounding tolerance.
    pub exact: bool,
}

/// Computes the close-time variance. Never rejects a mismatch: the
/// discrepancy is recorded, not blocked.
pub fn close_session(
    session_status: SessionStatus,
    expected: Money,
    counted: Money,
) -> CoreResult<CloseOutcome> {
    if session_status != SessionStatus::Open {
        return Err(CoreError::SessionClosed);
    }
    if counted.is_negative() {
        return Err(CoreError::InvalidAmount { amount: counted });
    }

    Ok(CloseOutcome {
        expected,
        counted,
        variance: counted - expected,
        exact: counted.matches_within_tolerance(expected),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn movement(kind: MovementKind, centavos: i64) -> CashMovement {
        CashMovement {
            id: "mov-1".to_string(),
            session_id: "ses-1".to_string(),
            kind,
            amount_centavos: centavos,
            payment_method: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_running_balance_signs() {
        // Opening R$100,00 + R$50,00 suprimento − R$30,00 sangria = R$120,00
        let movements = vec![
            movement(MovementKind::Suprimento, 5_000),
            movement(MovementKind::Sangria, 3_000),
        ];
        let balance = running_balance(Money::from_centavos(10_000), &movements);
        assert_eq!(balance.centavos(), 12_000);
    }

    #[test]
    fn test_running_balance_includes_sale_movements() {
        let movements = vec![
            movement(MovementKind::Entrada, 8_000),
            movement(MovementKind::Saida, 2_000),
            movement(MovementKind::Sangria, 1_000),
        ];
        let balance = running_balance(Money::from_centavos(5_000), &movements);
        assert_eq!(balance.centavos(), 10_000);
    }

    #[test]
    fn test_running_balance_no_movements() {
        let balance = running_balance(Money::from_centavos(4_200), &[]);
        assert_eq!(balance.centavos(), 4_200);
    }

    #[test]
    fn test_opening_balance_must_be_non_negative() {
        validate_opening_balance(Money::zero()).unwrap();
        validate_opening_balance(Money::from_centavos(10_000)).unwrap();

        let err = validate_opening_balance(Money::from_centavos(-1)).unwrap_err();
        assert!(matches!(err, CoreError::NegativeOpeningBalance { .. }));
    }

    #[test]
    fn test_manual_movement_requires_open_session() {
        let err = validate_manual_movement(
            SessionStatus::Closed,
            MovementKind::Sangria,
            Money::from_centavos(1_000),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed));
    }

    #[test]
    fn test_manual_movement_rejects_sale_kinds() {
        let err = validate_manual_movement(
            SessionStatus::Open,
            MovementKind::Entrada,
            Money::from_centavos(1_000),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_manual_movement_rejects_non_positive_amount() {
        let err = validate_manual_movement(
            SessionStatus::Open,
            MovementKind::Suprimento,
            Money::zero(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_manual_movement_description_length() {
        let long = "x".repeat(MAX_MOVEMENT_DESCRIPTION + 1);
        let err = validate_manual_movement(
            SessionStatus::Open,
            MovementKind::Sangria,
            Money::from_centavos(500),
            Some(&long),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        validate_manual_movement(
            SessionStatus::Open,
            MovementKind::Sangria,
            Money::from_centavos(500),
            Some("retirada para o cofre"),
        )
        .unwrap();
    }

    #[test]
    fn test_close_variance_shortage() {
        let outcome = close_session(
            SessionStatus::Open,
            Money::from_centavos(15_000),
            Money::from_centavos(14_500),
        )
        .unwrap();

        assert_eq!(outcome.variance.centavos(), -500); // falta de R$5,00
        assert!(!outcome.exact);
    }

    #[test]
    fn test_close_variance_overage() {
        let outcome = close_session(
            SessionStatus::Open,
            Money::from_centavos(15_000),
            Money::from_centavos(15_500),
        )
        .unwrap();

        assert_eq!(outcome.variance.centavos(), 500); // sobra de R$5,00
        assert!(!outcome.exact);
    }

    #[test]
    fn test_close_exact_within_tolerance() {
        let outcome = close_session(
            SessionStatus::Open,
            Money::from_centavos(15_000),
            Money::from_centavos(15_001),
        )
        .unwrap();

        assert_eq!(outcome.variance.centavos(), 1);
        assert!(outcome.exact);
    }

    #[test]
    fn test_close_requires_open_session() {
        let err = close_session(
            SessionStatus::Closed,
            Money::from_centavos(15_000),
            Money::from_centavos(15_000),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed));
    }

    #[test]
    fn test_close_rejects_negative_count() {
        let err = close_session(
            SessionStatus::Open,
            Money::from_centavos(15_000),
            Money::from_centavos(-100),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }
}
