//! # Product Repository
//!
//! Catalog reads and the stock guard. The checkout engine never creates or
//! edits products; it reads prices and moves stock.
//!
//! ## Stock Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stock Decrement                                  │
//! │                                                                         │
//! │  Normal line:                                                           │
//! │    UPDATE products SET stock = stock − qty                              │
//! │    WHERE id = ? AND stock >= qty        ← conditional, race-safe        │
//! │    rows_affected = 0 → InsufficientStock (with on-hand count)           │
//! │                                                                         │
//! │  Override line (operator confirmed):                                    │
//! │    UPDATE products SET stock = stock − qty                              │
//! │    WHERE id = ?                         ← stock may go negative         │
//! │                                                                         │
//! │  The check and the decrement are ONE statement, so two concurrent      │
//! │  sales can never both take the last unit.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{CheckoutError, CheckoutResult, DbError, DbResult};
use pdv_core::{CoreError, Product, StockAvailability};

/// Repository for product reads and stock checks.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, price_centavos, stock_quantity, is_active,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Pure availability check: does not reserve or mutate anything.
    ///
    /// The authoritative guard is the conditional decrement inside the sale
    /// transaction; this read exists for pre-flight UI feedback.
    pub async fn check_stock(&self, id: &str, requested: i64) -> DbResult<StockAvailability> {
        let on_hand: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match on_hand {
            Some(on_hand) => Ok(StockAvailability { on_hand, requested }),
            None => Err(DbError::not_found("Product", id)),
        }
    }

    /// Inserts a product (seed data and tests).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, price_centavos, stock_quantity, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_centavos)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Stock Operations
// =============================================================================
// Used by the sale finalizer/canceller inside its transaction. Taking a
// connection (not the pool) keeps the caller in control of atomicity.

/// Decrements stock for one sale line inside an open transaction.
///
/// Without the override the decrement is conditional on sufficient stock;
/// zero rows affected means the guard rejected the line and the whole
/// transaction must roll back.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    allow_negative: bool,
) -> CheckoutResult<()> {
    let now = Utc::now();

    let result = if allow_negative {
        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND stock_quantity >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() == 0 {
        // Distinguish "missing product" from "guard rejected"
        let on_hand: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;

        return match on_hand {
            Some(on_hand) => Err(CheckoutError::Business(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                on_hand,
                requested: quantity,
            })),
            None => Err(CheckoutError::Db(DbError::not_found("Product", product_id))),
        };
    }

    debug!(product_id, quantity, allow_negative, "Stock decremented");
    Ok(())
}

/// Restores stock for one cancelled sale line inside an open transaction.
pub(crate) async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> CheckoutResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CheckoutError::Db(DbError::not_found("Product", product_id)));
    }

    debug!(product_id, quantity, "Stock restored");
    Ok(())
}
