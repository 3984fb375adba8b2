//! # Domain Types
//!
//! Core domain types for the checkout and cash-drawer engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │     Payment     │   │   CashSession   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  sale_id (FK)   │   │  status         │       │
//! │  │  total_centavos │   │  method         │   │  opening balance│       │
//! │  │  change + dest  │   │  amount         │   │  variance       │       │
//! │  └────────┬────────┘   └─────────────────┘   └────────┬────────┘       │
//! │           │                                           │                 │
//! │  ┌────────┴────────┐                         ┌────────┴────────┐       │
//! │  │    SaleItem     │                         │  CashMovement   │       │
//! │  │  price snapshot │                         │  ENTRADA/SAIDA/ │       │
//! │  │  override flag  │                         │  SANGRIA/SUPRIM.│       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an `id` (UUID v4, immutable, used for relations).
//! Wire tags for enums are the business vocabulary (DINHEIRO, SANGRIA, ...)
//! so the JSON surface and the database share one spelling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a payment (or part of one) was settled.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash. The only method that moves the drawer balance.
    Dinheiro,
    /// Instant transfer.
    Pix,
    /// Credit card on external terminal.
    CartaoCredito,
    /// Debit card on external terminal.
    CartaoDebito,
    /// Store-extended credit: increases the customer's outstanding balance.
    Fiado,
    /// Store credit: decreases the customer's store-credit balance.
    Credito,
}

impl PaymentMethod {
    /// Whether this method moves physical cash through the drawer.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Dinheiro)
    }

    /// Whether this method settles against a customer ledger and therefore
    /// requires a non-null customer on the sale.
    #[inline]
    pub const fn requires_customer(&self) -> bool {
        matches!(self, PaymentMethod::Fiado | PaymentMethod::Credito)
    }

    /// Whether this method is a card payment (for session totals).
    #[inline]
    pub const fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CartaoCredito | PaymentMethod::CartaoDebito)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
///
/// Sales are committed atomically: there is no draft status in storage,
/// a sale row exists only once finalized.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Sale committed with all its monetary effects.
    Concluida,
    /// Sale cancelled; monetary effects reversed.
    Cancelada,
}

// =============================================================================
// Change Destination
// =============================================================================

/// Where overpayment (troco) goes. Mandatory whenever change exists.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeDestination {
    /// Cash handed back from the drawer (recorded as SAIDA).
    Dinheiro,
    /// Instant transfer back to the customer; no drawer effect.
    Pix,
    /// Converted to store credit for the customer; no disbursement.
    Credito,
}

// =============================================================================
// Fiado Risk
// =============================================================================

/// Credit-limit risk tier for FIADO payments.
///
/// Tiers are advisory: WARNING and CRITICAL are surfaced to the operator
/// and recorded on the sale for audit, but do not block the payment.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiadoRisk {
    /// Amount within the credit limit.
    None,
    /// Excess over the limit of up to 20%.
    Warning,
    /// Excess over the limit above 20%.
    Critical,
}

impl FiadoRisk {
    /// Classifies a FIADO payment amount against the customer's limit.
    ///
    /// `excess_percent = (amount − limit) / limit × 100`; WARNING for
    /// 0 < excess ≤ 20, CRITICAL above. A zero limit with any amount is
    /// CRITICAL (the excess is unbounded).
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::money::Money;
    /// use pdv_core::types::FiadoRisk;
    ///
    /// let limit = Money::from_centavos(10_000); // R$100,00
    /// assert_eq!(FiadoRisk::classify(Money::from_centavos(10_000), limit), FiadoRisk::None);
    /// assert_eq!(FiadoRisk::classify(Money::from_centavos(11_000), limit), FiadoRisk::Warning);
    /// assert_eq!(FiadoRisk::classify(Money::from_centavos(12_001), limit), FiadoRisk::Critical);
    /// ```
    pub fn classify(amount: Money, limit: Money) -> FiadoRisk {
        if amount <= limit {
            return FiadoRisk::None;
        }
        if !limit.is_positive() {
            return FiadoRisk::Critical;
        }

        // Integer math: excess/limit > 20% ⇔ excess × 100 > limit × 20
        let excess = amount.centavos() - limit.centavos();
        if excess * 100 > limit.centavos() * 20 {
            FiadoRisk::Critical
        } else {
            FiadoRisk::Warning
        }
    }

    /// The more severe of two tiers (a sale records its worst payment).
    #[inline]
    pub fn max(self, other: FiadoRisk) -> FiadoRisk {
        if other > self {
            other
        } else {
            self
        }
    }
}

// =============================================================================
// Movement Kind
// =============================================================================

/// Kind of cash-drawer movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Sale-derived cash in.
    Entrada,
    /// Sale-derived cash out (change disbursement, refunds).
    Saida,
    /// Manual withdrawal (e.g. paying a supplier in cash).
    Sangria,
    /// Manual deposit (e.g. extra float).
    Suprimento,
}

impl MovementKind {
    /// Signed effect of this movement on the drawer balance.
    #[inline]
    pub const fn signed_centavos(&self, amount: Money) -> i64 {
        match self {
            MovementKind::Entrada | MovementKind::Suprimento => amount.centavos(),
            MovementKind::Saida | MovementKind::Sangria => -amount.centavos(),
        }
    }

    /// Whether this kind may be recorded manually by an operator.
    /// ENTRADA/SAIDA only ever arise from sale commits.
    #[inline]
    pub const fn is_manual(&self) -> bool {
        matches!(self, MovementKind::Sangria | MovementKind::Suprimento)
    }
}

// =============================================================================
// Cash Session Status
// =============================================================================

/// Cash-session lifecycle state. At most one OPEN session exists at a time.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

// =============================================================================
// Cash Session
// =============================================================================

/// One drawer period: opened with a float, mutated by movements while OPEN,
/// closed exactly once against a blind physical count.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    pub id: String,
    pub status: SessionStatus,
    pub opening_balance_centavos: i64,
    /// Counted balance informed at close (blind count). Null while OPEN.
    pub closing_balance_centavos: Option<i64>,
    /// counted − running balance. Positive = surplus, negative = shortage.
    pub variance_centavos: Option<i64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_centavos(self.opening_balance_centavos)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// One immutable entry in a session's movement log.
///
/// Movements are totally ordered by creation timestamp; the running balance
/// is always recomputed from the log, never stored redundantly.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub kind: MovementKind,
    /// Always positive; the kind carries the sign.
    pub amount_centavos: i64,
    /// Payment method tag for sale-derived movements.
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_centavos)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction.
///
/// Invariant: `subtotal − manual discount − loyalty discount = total due`;
/// `Σ payments ≥ total due` (within one centavo); `change = Σ payments −
/// total due` when positive, else zero.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Null = walk-in customer.
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub subtotal_centavos: i64,
    pub manual_discount_centavos: i64,
    pub loyalty_discount_centavos: i64,
    pub total_centavos: i64,
    pub change_centavos: i64,
    pub change_destination: Option<ChangeDestination>,
    /// Store credit generated by a CREDITO change destination.
    pub credit_generated_centavos: i64,
    pub loyalty_points_used: i64,
    /// Worst FIADO risk tier among this sale's payments (audit).
    pub fiado_risk: FiadoRisk,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_centavos(self.total_centavos)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_centavos(self.change_centavos)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern: name and unit price are captured at sale time,
/// independent of later catalog changes.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in centavos at time of sale (frozen).
    pub unit_price_centavos: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_centavos: i64,
    /// Operator-confirmed negative-stock override, recorded for audit.
    pub negative_stock_override: bool,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_centavos(self.unit_price_centavos)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_centavos(self.line_total_centavos)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale. A sale can have multiple payments across
/// heterogeneous methods (split tender).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    /// Always positive.
    pub amount_centavos: i64,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_centavos)
    }
}

// =============================================================================
// Product (engine view)
// =============================================================================

/// The engine's view of a product: price and stock. Master-data CRUD lives
/// elsewhere; the checkout engine only reads prices and moves stock.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price_centavos: i64,
    /// May go negative only through an explicit override on a sale line.
    pub stock_quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_centavos(self.price_centavos)
    }
}

// =============================================================================
// Customer (engine view)
// =============================================================================

/// The engine's view of a customer: the financial ledger the checkout
/// validates against and mutates.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub credit_limit_fiado_centavos: i64,
    pub outstanding_fiado_centavos: i64,
    pub loyalty_points: i64,
    pub store_credit_centavos: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Availability
// =============================================================================

/// Result of a stock availability check. Pure read, no side effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockAvailability {
    pub on_hand: i64,
    pub requested: i64,
}

impl StockAvailability {
    /// Whether the requested quantity can be served without an override.
    #[inline]
    pub const fn sufficient(&self) -> bool {
        self.on_hand >= self.requested
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
