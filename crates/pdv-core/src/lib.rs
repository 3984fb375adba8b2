//! # pdv-core: Pure Business Logic for the PDV Checkout Engine
//!
//! This crate is the **heart** of the PDV (ponto de venda) engine. It
//! contains all checkout and cash-drawer business logic as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PDV Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  pdv-server (HTTP/JSON API)                     │   │
//! │  │   /api/vendas  •  /api/caixa/*  •  request/response mapping    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pdv-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  checkout │  │   caixa   │  │ validation│  │   │
//! │  │   │   Money   │  │ DraftSale │  │  balance  │  │   rules   │  │   │
//! │  │   │ tolerance │  │ payments  │  │ variance  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pdv-db (Database Layer)                      │   │
//! │  │        SQLite queries, migrations, atomic sale finalizer        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer centavo arithmetic (no floating point!)
//! - [`types`] - Domain types (Sale, Payment, CashSession, etc.)
//! - [`checkout`] - The draft-sale aggregate: payments, discounts, change
//! - [`caixa`] - Cash-session arithmetic: running balance and variance
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pdv_core::checkout::{CustomerSnapshot, DraftItem, DraftSale};
//! use pdv_core::money::Money;
//! use pdv_core::types::PaymentMethod;
//!
//! let mut draft = DraftSale::new(CustomerSnapshot::walk_in());
//! draft.add_item(DraftItem {
//!     product_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
//!     name: "Café 500g".to_string(),
//!     unit_price: Money::from_centavos(1_850),
//!     quantity: 2,
//!     allow_negative_stock: false,
//! })?;
//!
//! draft.add_payment(PaymentMethod::Dinheiro, Money::from_centavos(4_000))?;
//!
//! assert!(draft.is_fully_paid());
//! assert_eq!(draft.change().centavos(), 300); // R$3,00 back
//! # Ok::<(), pdv_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod caixa;
pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pdv_core::Money` instead of
// `use pdv_core::money::Money`

pub use checkout::{CustomerSnapshot, DraftItem, DraftPayment, DraftSale};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, ROUNDING_TOLERANCE};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Value of one loyalty point when redeemed as a discount: R$0,10.
///
/// ## Business Reason
/// Points accrue elsewhere; at checkout they only convert to discount at
/// this fixed rate. A per-store rate can be made configurable later.
pub const LOYALTY_POINT_VALUE: Money = Money::from_centavos(10);

/// Maximum quantity of a single item on a sale line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
