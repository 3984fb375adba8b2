//! # Customer Repository
//!
//! Customer ledger reads for checkout and the transaction-scoped ledger
//! mutations applied by the sale finalizer.
//!
//! ## Ledger Fields
//! ```text
//! outstanding_fiado_centavos  what the customer owes the store (FIADO)
//! store_credit_centavos       what the store owes the customer (CREDITO)
//! loyalty_points              redeemable at checkout as discount
//! credit_limit_fiado_centavos advisory ceiling for FIADO risk tiers
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{CheckoutError, CheckoutResult, DbError, DbResult};
use pdv_core::{CoreError, Customer, CustomerSnapshot, Money};

/// Repository for customer ledger operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, credit_limit_fiado_centavos, outstanding_fiado_centavos,
                   loyalty_points, store_credit_centavos, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Takes the financial snapshot used by checkout validation.
    ///
    /// Errors with NotFound when the customer doesn't exist; a walk-in sale
    /// should use [`CustomerSnapshot::walk_in`] instead of calling this.
    pub async fn snapshot(&self, id: &str) -> DbResult<CustomerSnapshot> {
        let customer = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        Ok(CustomerSnapshot::from_customer(&customer))
    }

    /// Inserts a customer (seed data and tests).
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, credit_limit_fiado_centavos, outstanding_fiado_centavos,
                loyalty_points, store_credit_centavos, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.credit_limit_fiado_centavos)
        .bind(customer.outstanding_fiado_centavos)
        .bind(customer.loyalty_points)
        .bind(customer.store_credit_centavos)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Ledger Effects
// =============================================================================

/// Net ledger effect of one sale on one customer, applied atomically by the
/// finalizer (positive fields per their own direction; reversal negates).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LedgerEffect {
    /// FIADO payments: added to outstanding balance.
    pub fiado_delta: i64,
    /// CREDITO payments minus credit generated as change: subtracted from
    /// store credit when positive.
    pub store_credit_delta: i64,
    /// Loyalty points consumed: subtracted from the balance.
    pub points_delta: i64,
}

impl LedgerEffect {
    pub(crate) fn is_noop(&self) -> bool {
        self.fiado_delta == 0 && self.store_credit_delta == 0 && self.points_delta == 0
    }

    /// The inverse effect, used by cancellation.
    pub(crate) fn reversed(&self) -> Self {
        LedgerEffect {
            fiado_delta: -self.fiado_delta,
            store_credit_delta: -self.store_credit_delta,
            points_delta: -self.points_delta,
        }
    }
}

/// Applies a ledger effect inside an open transaction.
///
/// Guards against concurrent drain: the store-credit debit and the points
/// consumption re-check the balance in the WHERE clause, so a snapshot that
/// went stale between validation and commit fails cleanly instead of
/// driving a balance negative.
pub(crate) async fn apply_ledger_effect(
    conn: &mut SqliteConnection,
    customer_id: &str,
    effect: LedgerEffect,
) -> CheckoutResult<()> {
    if effect.is_noop() {
        return Ok(());
    }

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET outstanding_fiado_centavos = outstanding_fiado_centavos + ?2,
            store_credit_centavos = store_credit_centavos - ?3,
            loyalty_points = loyalty_points - ?4,
            updated_at = ?5
        WHERE id = ?1
          AND store_credit_centavos >= ?3
          AND loyalty_points >= ?4
        "#,
    )
    .bind(customer_id)
    .bind(effect.fiado_delta)
    .bind(effect.store_credit_delta)
    .bind(effect.points_delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish which guard fired
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, credit_limit_fiado_centavos, outstanding_fiado_centavos,
                   loyalty_points, store_credit_centavos, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

        let customer = match customer {
            Some(c) => c,
            None => return Err(CheckoutError::Db(DbError::not_found("Customer", customer_id))),
        };

        if customer.store_credit_centavos < effect.store_credit_delta {
            return Err(CheckoutError::Business(CoreError::InsufficientCredit {
                available: Money::from_centavos(customer.store_credit_centavos),
                requested: Money::from_centavos(effect.store_credit_delta),
            }));
        }

        return Err(CheckoutError::Business(CoreError::LoyaltyPointsUnavailable {
            available: customer.loyalty_points,
            requested: effect.points_delta,
        }));
    }

    debug!(
        customer_id,
        fiado_delta = effect.fiado_delta,
        store_credit_delta = effect.store_credit_delta,
        points_delta = effect.points_delta,
        "Customer ledger updated"
    );
    Ok(())
}
