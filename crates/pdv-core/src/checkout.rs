//! # Checkout Module
//!
//! The draft-sale aggregate: an explicit value holding cart lines,
//! discounts, partial payments and the change decision, validated as a
//! whole before a single atomic commit.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Draft Sale Lifecycle                                │
//! │                                                                         │
//! │  DraftSale::new(snapshot)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_item() × N ──► redeem_loyalty()? ──► set_manual_discount()?       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_payment() × N  ← validated per method (fiado tiers, credito cap)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remaining() == 0 and change() > 0? ──► set_change_destination()       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_for_finalize() ──► handed to the atomic finalizer            │
//! │                                                                         │
//! │  The server owns every total. Client-supplied running totals are       │
//! │  never trusted.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ChangeDestination, Customer, FiadoRisk, PaymentMethod};
use crate::{LOYALTY_POINT_VALUE, MAX_ITEM_QUANTITY};

// =============================================================================
// Customer Financial Snapshot
// =============================================================================

/// Read-only view of a customer's financial position at checkout time.
///
/// Advisory inputs for payment validation. A walk-in sale gets an all-zero
/// snapshot, which makes FIADO and CREDITO unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    /// Null = walk-in.
    pub customer_id: Option<String>,
    pub credit_limit_fiado: Money,
    pub outstanding_fiado: Money,
    pub loyalty_points: i64,
    pub store_credit: Money,
}

impl CustomerSnapshot {
    /// Snapshot for a walk-in sale: no customer, all limits at zero.
    pub fn walk_in() -> Self {
        CustomerSnapshot {
            customer_id: None,
            credit_limit_fiado: Money::zero(),
            outstanding_fiado: Money::zero(),
            loyalty_points: 0,
            store_credit: Money::zero(),
        }
    }

    /// Snapshot taken from a customer ledger row.
    pub fn from_customer(customer: &Customer) -> Self {
        CustomerSnapshot {
            customer_id: Some(customer.id.clone()),
            credit_limit_fiado: Money::from_centavos(customer.credit_limit_fiado_centavos),
            outstanding_fiado: Money::from_centavos(customer.outstanding_fiado_centavos),
            loyalty_points: customer.loyalty_points,
            store_credit: Money::from_centavos(customer.store_credit_centavos),
        }
    }

    #[inline]
    pub fn has_customer(&self) -> bool {
        self.customer_id.is_some()
    }
}

// =============================================================================
// Draft Line Item
// =============================================================================

/// A cart line with price frozen at add time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Price at time of adding (frozen). Later catalog changes do not
    /// affect this sale.
    pub unit_price: Money,
    pub quantity: i64,
    /// Operator-confirmed negative-stock override for this line.
    pub allow_negative_stock: bool,
}

impl DraftItem {
    /// unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Draft Payment
// =============================================================================

/// A payment registered against the draft, not yet committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DraftPayment {
    pub method: PaymentMethod,
    pub amount: Money,
}

// =============================================================================
// Draft Sale
// =============================================================================

/// The in-progress sale aggregate.
///
/// ## Invariants
/// - `total_due = subtotal − manual discount − loyalty discount` (≥ 0)
/// - payments accepted only while `remaining() > 0`
/// - CREDITO payments cumulatively never exceed the snapshot balance
/// - overpayment requires an explicit change destination before finalize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSale {
    customer: CustomerSnapshot,
    items: Vec<DraftItem>,
    manual_discount: Money,
    loyalty_points_used: i64,
    loyalty_discount: Money,
    payments: Vec<DraftPayment>,
    change_destination: Option<ChangeDestination>,
    fiado_risk: FiadoRisk,
}

impl DraftSale {
    /// Starts an empty draft for the given customer snapshot.
    pub fn new(customer: CustomerSnapshot) -> Self {
        DraftSale {
            customer,
            items: Vec::new(),
            manual_discount: Money::zero(),
            loyalty_points_used: 0,
            loyalty_discount: Money::zero(),
            payments: Vec::new(),
            change_destination: None,
            fiado_risk: FiadoRisk::None,
        }
    }

    // -------------------------------------------------------------------------
    // Cart construction
    // -------------------------------------------------------------------------

    /// Adds a line item with price frozen at this moment.
    pub fn add_item(&mut self, item: DraftItem) -> CoreResult<()> {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantidade".to_string(),
            }
            .into());
        }
        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantidade".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "preco_unitario".to_string(),
            }
            .into());
        }

        self.items.push(item);
        Ok(())
    }

    /// Applies a manual discount on the whole sale.
    pub fn set_manual_discount(&mut self, discount: Money) -> CoreResult<()> {
        if discount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "desconto_manual".to_string(),
            }
            .into());
        }
        self.manual_discount = discount;
        Ok(())
    }

    /// Redeems loyalty points as a discount, before payments are collected.
    ///
    /// The discount is capped at the remaining total due: a fully redeemed
    /// sale can reach zero but never go negative. Returns the discount
    /// actually applied.
    pub fn redeem_loyalty(&mut self, points: i64) -> CoreResult<Money> {
        if points < 0 {
            return Err(ValidationError::MustBePositive {
                field: "pontos_usados".to_string(),
            }
            .into());
        }
        if points == 0 {
            return Ok(Money::zero());
        }
        if points > self.customer.loyalty_points {
            return Err(CoreError::LoyaltyPointsUnavailable {
                available: self.customer.loyalty_points,
                requested: points,
            });
        }

        // Cap: the discount never exceeds what is still due
        let due_before = self.total_due() + self.loyalty_discount;
        let raw = LOYALTY_POINT_VALUE.multiply_quantity(points);
        let applied = if raw > due_before { due_before } else { raw };

        self.loyalty_points_used = points;
        self.loyalty_discount = applied;
        Ok(applied)
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Sum of line totals, before discounts.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    /// What the customer owes: subtotal − manual discount − loyalty discount,
    /// clamped at zero.
    pub fn total_due(&self) -> Money {
        (self.subtotal() - self.manual_discount - self.loyalty_discount).clamp_non_negative()
    }

    /// Sum of registered payments.
    pub fn paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// max(0, total due − paid).
    pub fn remaining(&self) -> Money {
        (self.total_due() - self.paid()).clamp_non_negative()
    }

    /// Overpayment beyond the total due, clamped at zero.
    pub fn change(&self) -> Money {
        (self.paid() - self.total_due()).clamp_non_negative()
    }

    /// Whether payments cover the total due within the rounding tolerance.
    pub fn is_fully_paid(&self) -> bool {
        self.paid().covers(self.total_due())
    }

    // -------------------------------------------------------------------------
    // Payment allocation
    // -------------------------------------------------------------------------

    /// Registers a partial payment, validating method-specific rules.
    ///
    /// Returns the FIADO risk tier for the payment (always `None` for other
    /// methods). WARNING/CRITICAL tiers are advisories: the payment is
    /// accepted and the tier recorded on the sale; only the absence of a
    /// customer is fatal for ledger-backed methods.
    pub fn add_payment(&mut self, method: PaymentMethod, amount: Money) -> CoreResult<FiadoRisk> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount { amount });
        }
        if !self.remaining().is_positive() {
            return Err(CoreError::SaleFullyPaid);
        }
        if method.requires_customer() && !self.customer.has_customer() {
            return Err(CoreError::MissingCustomer { method });
        }

        let risk = match method {
            PaymentMethod::Fiado => {
                let risk = FiadoRisk::classify(amount, self.customer.credit_limit_fiado);
                self.fiado_risk = self.fiado_risk.max(risk);
                risk
            }
            PaymentMethod::Credito => {
                // Cumulative across CREDITO payments in this draft
                let available = self.customer.store_credit - self.credito_total();
                if amount > available {
                    return Err(CoreError::InsufficientCredit {
                        available: available.clamp_non_negative(),
                        requested: amount,
                    });
                }
                FiadoRisk::None
            }
            _ => FiadoRisk::None,
        };

        self.payments.push(DraftPayment { method, amount });
        Ok(risk)
    }

    // -------------------------------------------------------------------------
    // Change disposition
    // -------------------------------------------------------------------------

    /// Chooses where the overpayment goes. CREDITO requires a customer.
    pub fn set_change_destination(&mut self, destination: ChangeDestination) -> CoreResult<()> {
        if destination == ChangeDestination::Credito && !self.customer.has_customer() {
            return Err(CoreError::MissingCustomer {
                method: PaymentMethod::Credito,
            });
        }
        self.change_destination = Some(destination);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Finalize preconditions
    // -------------------------------------------------------------------------

    /// Checks every precondition for the atomic commit.
    ///
    /// The finalizer calls this before opening its transaction; a draft
    /// that passes here can only fail on storage-side constraints
    /// (stock, session state).
    pub fn validate_for_finalize(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "itens".to_string(),
            }
            .into());
        }
        if !self.is_fully_paid() {
            return Err(CoreError::NotFullyPaid {
                remaining: self.remaining(),
            });
        }
        if self.change().is_positive() && self.change_destination.is_none() {
            return Err(CoreError::ChangeDestinationRequired {
                change: self.change(),
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Finalizer inputs
    // -------------------------------------------------------------------------

    #[inline]
    pub fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    #[inline]
    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    #[inline]
    pub fn payments(&self) -> &[DraftPayment] {
        &self.payments
    }

    #[inline]
    pub fn manual_discount(&self) -> Money {
        self.manual_discount
    }

    #[inline]
    pub fn loyalty_discount(&self) -> Money {
        self.loyalty_discount
    }

    #[inline]
    pub fn loyalty_points_used(&self) -> i64 {
        self.loyalty_points_used
    }

    #[inline]
    pub fn change_destination(&self) -> Option<ChangeDestination> {
        self.change_destination
    }

    #[inline]
    pub fn fiado_risk(&self) -> FiadoRisk {
        self.fiado_risk
    }

    /// Sum of DINHEIRO payments (moves the drawer as ENTRADA).
    pub fn cash_paid(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method.is_cash())
            .map(|p| p.amount)
            .sum()
    }

    /// Sum of FIADO payments (increases the customer's outstanding balance).
    pub fn fiado_total(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == PaymentMethod::Fiado)
            .map(|p| p.amount)
            .sum()
    }

    /// Sum of CREDITO payments (decreases the customer's store credit).
    pub fn credito_total(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == PaymentMethod::Credito)
            .map(|p| p.amount)
            .sum()
    }

    /// Cash handed back from the drawer (change with DINHEIRO destination).
    pub fn cash_change(&self) -> Money {
        match self.change_destination {
            Some(ChangeDestination::Dinheiro) => self.change(),
            _ => Money::zero(),
        }
    }

    /// Store credit generated by a CREDITO change destination.
    pub fn credit_generated(&self) -> Money {
        match self.change_destination {
            Some(ChangeDestination::Credito) => self.change(),
            _ => Money::zero(),
        }
    }

    /// Whether this sale touches physical cash at all (payments in, or
    /// change out). Cash-inclusive sales require an OPEN session.
    pub fn involves_cash(&self) -> bool {
        self.cash_paid().is_positive() || self.cash_change().is_positive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_customer() -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: Some("cli-1".to_string()),
            credit_limit_fiado: Money::from_centavos(10_000), // R$100,00
            outstanding_fiado: Money::from_centavos(2_000),
            loyalty_points: 100,
            store_credit: Money::from_centavos(5_000), // R$50,00
        }
    }

    fn draft_with_total(customer: CustomerSnapshot, total_centavos: i64) -> DraftSale {
        let mut draft = DraftSale::new(customer);
        draft
            .add_item(DraftItem {
                product_id: "prod-1".to_string(),
                name: "Arroz 5kg".to_string(),
                unit_price: Money::from_centavos(total_centavos),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        draft
    }

    #[test]
    fn test_remaining_and_change_clamp() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 8_000);

        assert_eq!(draft.remaining().centavos(), 8_000);
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(10_000))
            .unwrap();

        assert!(draft.remaining().is_zero());
        assert_eq!(draft.change().centavos(), 2_000);
        assert!(draft.is_fully_paid());
    }

    #[test]
    fn test_split_tender_accumulates() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 10_000);

        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(4_000))
            .unwrap();
        assert_eq!(draft.remaining().centavos(), 6_000);

        draft
            .add_payment(PaymentMethod::CartaoDebito, Money::from_centavos(6_000))
            .unwrap();
        assert!(draft.remaining().is_zero());
        assert!(draft.change().is_zero());
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 1_000);

        let err = draft
            .add_payment(PaymentMethod::Dinheiro, Money::zero())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));

        let err = draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(-100))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_rejects_payment_after_fully_paid() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 1_000);
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(1_000))
            .unwrap();

        let err = draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(100))
            .unwrap_err();
        assert!(matches!(err, CoreError::SaleFullyPaid));
    }

    #[test]
    fn test_fiado_requires_customer() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 1_000);
        let err = draft
            .add_payment(PaymentMethod::Fiado, Money::from_centavos(1_000))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingCustomer {
                method: PaymentMethod::Fiado
            }
        ));
    }

    #[test]
    fn test_fiado_over_limit_is_advisory_not_fatal() {
        // Limit R$100,00; paying R$110,00 fiado is WARNING but accepted
        let mut draft = draft_with_total(snapshot_with_customer(), 11_000);
        let risk = draft
            .add_payment(PaymentMethod::Fiado, Money::from_centavos(11_000))
            .unwrap();

        assert_eq!(risk, FiadoRisk::Warning);
        assert_eq!(draft.fiado_risk(), FiadoRisk::Warning);
        assert!(draft.is_fully_paid());
    }

    #[test]
    fn test_fiado_critical_tier_recorded() {
        let mut draft = draft_with_total(snapshot_with_customer(), 13_000);
        let risk = draft
            .add_payment(PaymentMethod::Fiado, Money::from_centavos(13_000))
            .unwrap();

        assert_eq!(risk, FiadoRisk::Critical);
        assert_eq!(draft.fiado_risk(), FiadoRisk::Critical);
    }

    #[test]
    fn test_credito_ceiling_enforced() {
        // Store credit R$50,00
        let mut draft = draft_with_total(snapshot_with_customer(), 10_000);

        let err = draft
            .add_payment(PaymentMethod::Credito, Money::from_centavos(6_000))
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCredit { .. }));

        // Within the balance it is fine
        draft
            .add_payment(PaymentMethod::Credito, Money::from_centavos(3_000))
            .unwrap();

        // Cumulative: another 3_000 would exceed the 5_000 balance
        let err = draft
            .add_payment(PaymentMethod::Credito, Money::from_centavos(3_000))
            .unwrap_err();
        match err {
            CoreError::InsufficientCredit { available, requested } => {
                assert_eq!(available.centavos(), 2_000);
                assert_eq!(requested.centavos(), 3_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_loyalty_discount_capped_at_total_due() {
        // 100 points × R$0,10 = R$10,00 > total R$5,00
        let mut draft = draft_with_total(snapshot_with_customer(), 500);
        let applied = draft.redeem_loyalty(100).unwrap();

        assert_eq!(applied.centavos(), 500);
        assert!(draft.total_due().is_zero());
        assert_eq!(draft.loyalty_points_used(), 100);
    }

    #[test]
    fn test_loyalty_rejects_unavailable_points() {
        let mut draft = draft_with_total(snapshot_with_customer(), 10_000);
        let err = draft.redeem_loyalty(101).unwrap_err();
        assert!(matches!(err, CoreError::LoyaltyPointsUnavailable { .. }));
    }

    #[test]
    fn test_change_destination_required() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 8_000);
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(10_000))
            .unwrap();

        let err = draft.validate_for_finalize().unwrap_err();
        assert!(matches!(err, CoreError::ChangeDestinationRequired { .. }));

        draft.set_change_destination(ChangeDestination::Dinheiro).unwrap();
        draft.validate_for_finalize().unwrap();
    }

    #[test]
    fn test_change_to_credit_requires_customer() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 8_000);
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(10_000))
            .unwrap();

        let err = draft
            .set_change_destination(ChangeDestination::Credito)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingCustomer { .. }));
    }

    #[test]
    fn test_change_to_credit_generates_ledger_amount() {
        // Total R$80,00, cash R$100,00, destination CREDITO:
        // change R$20,00 becomes store credit, nothing leaves the drawer
        let mut draft = draft_with_total(snapshot_with_customer(), 8_000);
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(10_000))
            .unwrap();
        draft.set_change_destination(ChangeDestination::Credito).unwrap();

        assert_eq!(draft.change().centavos(), 2_000);
        assert_eq!(draft.credit_generated().centavos(), 2_000);
        assert!(draft.cash_change().is_zero());
        assert_eq!(draft.cash_paid().centavos(), 10_000);
    }

    #[test]
    fn test_validate_rejects_not_fully_paid() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 8_000);
        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(5_000))
            .unwrap();

        let err = draft.validate_for_finalize().unwrap_err();
        match err {
            CoreError::NotFullyPaid { remaining } => {
                assert_eq!(remaining.centavos(), 3_000)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_one_centavo_short_counts_as_paid() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 8_000);
        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(7_999))
            .unwrap();

        // Within the rounding tolerance of one minor unit
        assert!(draft.is_fully_paid());
        draft.validate_for_finalize().unwrap();
    }

    #[test]
    fn test_empty_draft_cannot_finalize() {
        let draft = DraftSale::new(CustomerSnapshot::walk_in());
        assert!(draft.validate_for_finalize().is_err());
    }

    #[test]
    fn test_manual_discount_reduces_total_due() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 10_000);
        draft.set_manual_discount(Money::from_centavos(1_500)).unwrap();
        assert_eq!(draft.total_due().centavos(), 8_500);
    }

    #[test]
    fn test_involves_cash() {
        let mut draft = draft_with_total(CustomerSnapshot::walk_in(), 1_000);
        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(1_000))
            .unwrap();
        assert!(!draft.involves_cash());

        let mut cash_draft = draft_with_total(CustomerSnapshot::walk_in(), 1_000);
        cash_draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(1_000))
            .unwrap();
        assert!(cash_draft.involves_cash());
    }
}
