//! # Sale Repository
//!
//! The atomic sale finalizer and its inverse, cancellation.
//!
//! ## Finalize: One Transaction, All or Nothing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sale Finalizer                                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. Cash involved? → require the OPEN session                        │
//! │    2. Per line: conditional stock decrement (guard or override)        │
//! │    3. INSERT sale (CONCLUIDA) + items + payments                       │
//! │    4. Customer ledger: fiado ↑, store credit ∓, points ↓               │
//! │    5. Drawer: ENTRADA for cash paid, SAIDA for cash change             │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any step failing rolls the WHOLE transaction back: no sale row,       │
//! │  no stock change, no ledger change, no movement.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation runs the same effects with opposite signs inside its own
//! transaction, guarded so a sale cancels at most once.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult, DbError, DbResult};
use crate::repository::caixa::insert_movement;
use crate::repository::customer::{apply_ledger_effect, LedgerEffect};
use crate::repository::stock::{decrement_stock, restore_stock};
use pdv_core::{
    CashSession, ChangeDestination, CoreError, DraftSale, Money, MovementKind, Payment,
    PaymentMethod, Sale, SaleItem, SaleStatus,
};

/// A sale with its lines and payments, as served by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
}

/// Repository for sale persistence.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Commits a validated draft atomically.
    ///
    /// ## Effects (all in one transaction)
    /// - stock decremented per line (guarded unless overridden)
    /// - sale, items and payments inserted with status CONCLUIDA
    /// - customer ledger updated (fiado, store credit, loyalty points)
    /// - ENTRADA/SAIDA drawer movements for cash paid and cash change
    ///
    /// A cash-inclusive draft requires the OPEN session; rejecting that is
    /// a business error, not a storage fault.
    pub async fn finalize(&self, draft: &DraftSale) -> CheckoutResult<SaleDetails> {
        draft.validate_for_finalize().map_err(CheckoutError::Business)?;

        let mut tx = self.pool.begin().await?;

        // Cash-inclusive sales are anchored to the open session
        let session = if draft.involves_cash() {
            Some(require_open_session(&mut tx).await?)
        } else {
            None
        };

        for item in draft.items() {
            decrement_stock(&mut tx, &item.product_id, item.quantity, item.allow_negative_stock)
                .await?;
        }

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let sale = Sale {
            id: sale_id.clone(),
            customer_id: draft.customer().customer_id.clone(),
            status: SaleStatus::Concluida,
            subtotal_centavos: draft.subtotal().centavos(),
            manual_discount_centavos: draft.manual_discount().centavos(),
            loyalty_discount_centavos: draft.loyalty_discount().centavos(),
            total_centavos: draft.total_due().centavos(),
            change_centavos: draft.change().centavos(),
            // Destination is only meaningful when change exists
            change_destination: if draft.change().is_positive() {
                draft.change_destination()
            } else {
                None
            },
            credit_generated_centavos: draft.credit_generated().centavos(),
            loyalty_points_used: draft.loyalty_points_used(),
            fiado_risk: draft.fiado_risk(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, status, subtotal_centavos, manual_discount_centavos,
                loyalty_discount_centavos, total_centavos, change_centavos,
                change_destination, credit_generated_centavos, loyalty_points_used,
                fiado_risk, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.subtotal_centavos)
        .bind(sale.manual_discount_centavos)
        .bind(sale.loyalty_discount_centavos)
        .bind(sale.total_centavos)
        .bind(sale.change_centavos)
        .bind(sale.change_destination)
        .bind(sale.credit_generated_centavos)
        .bind(sale.loyalty_points_used)
        .bind(sale.fiado_risk)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(draft.items().len());
        for draft_item in draft.items() {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: draft_item.product_id.clone(),
                name_snapshot: draft_item.name.clone(),
                unit_price_centavos: draft_item.unit_price.centavos(),
                quantity: draft_item.quantity,
                line_total_centavos: draft_item.line_total().centavos(),
                negative_stock_override: draft_item.allow_negative_stock,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name_snapshot, unit_price_centavos,
                    quantity, line_total_centavos, negative_stock_override, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_centavos)
            .bind(item.quantity)
            .bind(item.line_total_centavos)
            .bind(item.negative_stock_override)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        let mut payments = Vec::with_capacity(draft.payments().len());
        for draft_payment in draft.payments() {
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                method: draft_payment.method,
                amount_centavos: draft_payment.amount.centavos(),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO payments (id, sale_id, method, amount_centavos, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&payment.id)
            .bind(&payment.sale_id)
            .bind(payment.method)
            .bind(payment.amount_centavos)
            .bind(payment.created_at)
            .execute(&mut *tx)
            .await?;

            payments.push(payment);
        }

        if let Some(customer_id) = &sale.customer_id {
            let effect = LedgerEffect {
                fiado_delta: draft.fiado_total().centavos(),
                store_credit_delta: draft.credito_total().centavos()
                    - draft.credit_generated().centavos(),
                points_delta: draft.loyalty_points_used(),
            };
            apply_ledger_effect(&mut tx, customer_id, effect).await?;
        }

        if let Some(session) = &session {
            let cash_in = draft.cash_paid();
            if cash_in.is_positive() {
                insert_movement(
                    &mut tx,
                    &session.id,
                    MovementKind::Entrada,
                    cash_in,
                    Some(PaymentMethod::Dinheiro),
                    Some(format!("Venda {sale_id}")),
                )
                .await?;
            }

            let cash_out = draft.cash_change();
            if cash_out.is_positive() {
                insert_movement(
                    &mut tx,
                    &session.id,
                    MovementKind::Saida,
                    cash_out,
                    Some(PaymentMethod::Dinheiro),
                    Some(format!("Troco venda {sale_id}")),
                )
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            total = %sale.total(),
            change = %sale.change(),
            fiado_risk = ?sale.fiado_risk,
            "Sale finalized"
        );

        Ok(SaleDetails { sale, items, payments })
    }

    /// Gets a sale with its items and payments.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<SaleDetails>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, status, subtotal_centavos, manual_discount_centavos,
                   loyalty_discount_centavos, total_centavos, change_centavos,
                   change_destination, credit_generated_centavos, loyalty_points_used,
                   fiado_risk, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, unit_price_centavos,
                   quantity, line_total_centavos, negative_stock_override, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method, amount_centavos, created_at
            FROM payments
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleDetails { sale, items, payments }))
    }

    /// Cancels a CONCLUIDA sale, reversing every monetary effect atomically.
    ///
    /// ## Reversal
    /// - sale status → CANCELADA (guarded: cancels at most once)
    /// - stock restored per line
    /// - customer ledger effects negated
    /// - net cash refunded through the OPEN session (SAIDA), which is
    ///   therefore required when the sale moved cash
    pub async fn cancel(&self, id: &str) -> CheckoutResult<SaleDetails> {
        let details = self
            .get_details(id)
            .await?
            .ok_or_else(|| CheckoutError::Db(DbError::not_found("Sale", id)))?;

        if details.sale.status != SaleStatus::Concluida {
            return Err(CheckoutError::Business(CoreError::InvalidSaleStatus {
                sale_id: id.to_string(),
                current_status: format!("{:?}", details.sale.status).to_uppercase(),
            }));
        }

        let mut tx = self.pool.begin().await?;

        // Guarded transition: concurrent cancels race here, one wins
        let result = sqlx::query(
            r#"
            UPDATE sales SET status = 'CANCELADA'
            WHERE id = ?1 AND status = 'CONCLUIDA'
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CheckoutError::Business(CoreError::InvalidSaleStatus {
                sale_id: id.to_string(),
                current_status: "CANCELADA".to_string(),
            }));
        }

        for item in &details.items {
            restore_stock(&mut tx, &item.product_id, item.quantity).await?;
        }

        if let Some(customer_id) = &details.sale.customer_id {
            let effect = ledger_effect_of(&details).reversed();
            apply_ledger_effect(&mut tx, customer_id, effect).await?;
        }

        // Net cash the drawer owes back: cash received minus cash change
        // already handed out at sale time
        let cash_paid: i64 = details
            .payments
            .iter()
            .filter(|p| p.method.is_cash())
            .map(|p| p.amount_centavos)
            .sum();
        let cash_change = match details.sale.change_destination {
            Some(ChangeDestination::Dinheiro) => details.sale.change_centavos,
            _ => 0,
        };
        let net_cash = cash_paid - cash_change;

        if net_cash != 0 {
            let session = require_open_session(&mut tx).await?;
            let (kind, amount) = if net_cash > 0 {
                (MovementKind::Saida, Money::from_centavos(net_cash))
            } else {
                (MovementKind::Entrada, Money::from_centavos(-net_cash))
            };
            insert_movement(
                &mut tx,
                &session.id,
                kind,
                amount,
                Some(PaymentMethod::Dinheiro),
                Some(format!("Estorno venda {id}")),
            )
            .await?;
        }

        tx.commit().await?;

        info!(sale_id = %id, refunded_cash_centavos = net_cash, "Sale cancelled");

        let mut cancelled = details;
        cancelled.sale.status = SaleStatus::Cancelada;
        Ok(cancelled)
    }
}

/// Fetches the OPEN session inside a transaction or fails as a business
/// error (cash operations require an open drawer).
async fn require_open_session(conn: &mut SqliteConnection) -> CheckoutResult<CashSession> {
    let session = sqlx::query_as::<_, CashSession>(
        r#"
        SELECT id, status, opening_balance_centavos, closing_balance_centavos,
               variance_centavos, opened_at, closed_at
        FROM cash_sessions
        WHERE status = 'OPEN'
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    session.ok_or(CheckoutError::Business(CoreError::SessionClosed))
}

/// Reconstructs the ledger effect a finalized sale applied, from its
/// persisted rows.
fn ledger_effect_of(details: &SaleDetails) -> LedgerEffect {
    let fiado: i64 = details
        .payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Fiado)
        .map(|p| p.amount_centavos)
        .sum();
    let credito: i64 = details
        .payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Credito)
        .map(|p| p.amount_centavos)
        .sum();

    LedgerEffect {
        fiado_delta: fiado,
        store_credit_delta: credito - details.sale.credit_generated_centavos,
        points_delta: details.sale.loyalty_points_used,
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pdv_core::{Customer, CustomerSnapshot, DraftItem, FiadoRisk, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, id: &str, price_centavos: i64, stock: i64) {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: id.to_string(),
                sku: format!("SKU-{id}"),
                name: format!("Produto {id}"),
                price_centavos,
                stock_quantity: stock,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    async fn seed_customer(db: &Database, id: &str) {
        let now = Utc::now();
        db.customers()
            .insert(&Customer {
                id: id.to_string(),
                name: "Maria Silva".to_string(),
                credit_limit_fiado_centavos: 10_000,
                outstanding_fiado_centavos: 0,
                loyalty_points: 50,
                store_credit_centavos: 3_000,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn cash_draft(product_id: &str, price: i64, qty: i64, tendered: i64) -> DraftSale {
        let mut draft = DraftSale::new(CustomerSnapshot::walk_in());
        draft
            .add_item(DraftItem {
                product_id: product_id.to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(price),
                quantity: qty,
                allow_negative_stock: false,
            })
            .unwrap();
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(tendered))
            .unwrap();
        if draft.change().is_positive() {
            draft.set_change_destination(ChangeDestination::Dinheiro).unwrap();
        }
        draft
    }

    #[tokio::test]
    async fn test_finalize_cash_sale_moves_stock_and_drawer() {
        let db = test_db().await;
        seed_product(&db, "p1", 2_500, 10).await;
        db.caixa()
            .open_session(Money::from_centavos(10_000))
            .await
            .unwrap();

        // 2 × R$25,00 = R$50,00; pays R$60,00 cash, change R$10,00
        let draft = cash_draft("p1", 2_500, 2, 6_000);
        let details = db.sales().finalize(&draft).await.unwrap();

        assert_eq!(details.sale.status, SaleStatus::Concluida);
        assert_eq!(details.sale.total_centavos, 5_000);
        assert_eq!(details.sale.change_centavos, 1_000);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.payments.len(), 1);

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 8);

        // Drawer: 10_000 opening + 6_000 ENTRADA − 1_000 SAIDA troco
        let session = db.caixa().get_open_session().await.unwrap().unwrap();
        let balance = db.caixa().running_balance(&session).await.unwrap();
        assert_eq!(balance.centavos(), 15_000);

        let movements = db.caixa().movements(&session.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].kind, MovementKind::Entrada);
        assert_eq!(movements[1].kind, MovementKind::Saida);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 3).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let draft = cash_draft("p1", 1_000, 5, 5_000);
        let err = db.sales().finalize(&draft).await.unwrap_err();
        match err {
            CheckoutError::Business(CoreError::InsufficientStock {
                on_hand, requested, ..
            }) => {
                assert_eq!(on_hand, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing committed
        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 3);

        let session = db.caixa().get_open_session().await.unwrap().unwrap();
        assert!(db.caixa().movements(&session.id).await.unwrap().is_empty());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_negative_stock_override_allows_oversell() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 3).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let mut draft = DraftSale::new(CustomerSnapshot::walk_in());
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(1_000),
                quantity: 5,
                allow_negative_stock: true,
            })
            .unwrap();
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(5_000))
            .unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();
        assert!(details.items[0].negative_stock_override);

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, -2);
    }

    #[tokio::test]
    async fn test_cash_sale_requires_open_session() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;

        let draft = cash_draft("p1", 1_000, 1, 1_000);
        let err = db.sales().finalize(&draft).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Business(CoreError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_cashless_sale_works_without_session() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;

        let mut draft = DraftSale::new(CustomerSnapshot::walk_in());
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(1_000),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(1_000))
            .unwrap();

        db.sales().finalize(&draft).await.unwrap();
    }

    #[tokio::test]
    async fn test_fiado_sale_updates_outstanding_and_records_risk() {
        let db = test_db().await;
        seed_product(&db, "p1", 11_000, 10).await;
        seed_customer(&db, "c1").await;

        let snapshot = db.customers().snapshot("c1").await.unwrap();
        let mut draft = DraftSale::new(snapshot);
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(11_000),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        // Limit R$100,00; R$110,00 fiado → WARNING tier, still accepted
        draft
            .add_payment(PaymentMethod::Fiado, Money::from_centavos(11_000))
            .unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();
        assert_eq!(details.sale.fiado_risk, FiadoRisk::Warning);

        let customer = db.customers().get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.outstanding_fiado_centavos, 11_000);
    }

    #[tokio::test]
    async fn test_change_to_credit_grows_store_credit() {
        let db = test_db().await;
        seed_product(&db, "p1", 8_000, 10).await;
        seed_customer(&db, "c1").await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let snapshot = db.customers().snapshot("c1").await.unwrap();
        let mut draft = DraftSale::new(snapshot);
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(8_000),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(10_000))
            .unwrap();
        draft.set_change_destination(ChangeDestination::Credito).unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();
        assert_eq!(details.sale.credit_generated_centavos, 2_000);

        // Store credit 3_000 + 2_000 change = 5_000; drawer keeps all the cash
        let customer = db.customers().get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.store_credit_centavos, 5_000);

        let session = db.caixa().get_open_session().await.unwrap().unwrap();
        let balance = db.caixa().running_balance(&session).await.unwrap();
        assert_eq!(balance.centavos(), 10_000);
    }

    #[tokio::test]
    async fn test_loyalty_redemption_consumes_points() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;
        seed_customer(&db, "c1").await;

        let snapshot = db.customers().snapshot("c1").await.unwrap();
        let mut draft = DraftSale::new(snapshot);
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(1_000),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        // 30 points × R$0,10 = R$3,00 discount
        draft.redeem_loyalty(30).unwrap();
        draft
            .add_payment(PaymentMethod::Pix, Money::from_centavos(700))
            .unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();
        assert_eq!(details.sale.loyalty_discount_centavos, 300);
        assert_eq!(details.sale.total_centavos, 700);

        let customer = db.customers().get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.loyalty_points, 20);
    }

    #[tokio::test]
    async fn test_exact_payment_persists_no_change_destination() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        // Destination chosen up front, but the payment lands exact
        let mut draft = DraftSale::new(CustomerSnapshot::walk_in());
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(1_000),
                quantity: 1,
                allow_negative_stock: false,
            })
            .unwrap();
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(1_000))
            .unwrap();
        draft.set_change_destination(ChangeDestination::Dinheiro).unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();
        assert_eq!(details.sale.change_centavos, 0);
        assert!(details.sale.change_destination.is_none());
    }

    #[tokio::test]
    async fn test_close_variance_counts_sale_movements() {
        let db = test_db().await;
        seed_product(&db, "p1", 2_500, 10).await;
        db.caixa()
            .open_session(Money::from_centavos(10_000))
            .await
            .unwrap();

        // Sale adds 6_000 ENTRADA − 1_000 SAIDA troco; expected at close is
        // 10_000 + 5_000, so a matching count closes with zero variance
        let draft = cash_draft("p1", 2_500, 2, 6_000);
        db.sales().finalize(&draft).await.unwrap();

        let closed = db
            .caixa()
            .close_session(Money::from_centavos(15_000))
            .await
            .unwrap();
        assert_eq!(closed.variance_centavos, Some(0));
        assert_eq!(closed.closing_balance_centavos, Some(15_000));
    }

    #[tokio::test]
    async fn test_get_details_roundtrip() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let draft = cash_draft("p1", 1_000, 2, 2_000);
        let details = db.sales().finalize(&draft).await.unwrap();

        let fetched = db.sales().get_details(&details.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale.total_centavos, 2_000);
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.payments.len(), 1);
        assert_eq!(fetched.items[0].name_snapshot, "Produto");

        assert!(db.sales().get_details("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_reverses_stock_ledger_and_cash() {
        let db = test_db().await;
        seed_product(&db, "p1", 5_000, 10).await;
        seed_customer(&db, "c1").await;
        db.caixa()
            .open_session(Money::from_centavos(10_000))
            .await
            .unwrap();

        let snapshot = db.customers().snapshot("c1").await.unwrap();
        let mut draft = DraftSale::new(snapshot);
        draft
            .add_item(DraftItem {
                product_id: "p1".to_string(),
                name: "Produto".to_string(),
                unit_price: Money::from_centavos(5_000),
                quantity: 2,
                allow_negative_stock: false,
            })
            .unwrap();
        // Split tender: R$60,00 cash + R$40,00 fiado
        draft
            .add_payment(PaymentMethod::Dinheiro, Money::from_centavos(6_000))
            .unwrap();
        draft
            .add_payment(PaymentMethod::Fiado, Money::from_centavos(4_000))
            .unwrap();

        let details = db.sales().finalize(&draft).await.unwrap();

        let cancelled = db.sales().cancel(&details.sale.id).await.unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelada);

        // Stock back
        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);

        // Fiado debt gone
        let customer = db.customers().get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.outstanding_fiado_centavos, 0);

        // Drawer: +6_000 on sale, −6_000 on refund → back to the opening float
        let session = db.caixa().get_open_session().await.unwrap().unwrap();
        let balance = db.caixa().running_balance(&session).await.unwrap();
        assert_eq!(balance.centavos(), 10_000);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_rejected() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let draft = cash_draft("p1", 1_000, 1, 1_000);
        let details = db.sales().finalize(&draft).await.unwrap();

        db.sales().cancel(&details.sale.id).await.unwrap();
        let err = db.sales().cancel(&details.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Business(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_cash_sale_requires_open_session() {
        let db = test_db().await;
        seed_product(&db, "p1", 1_000, 10).await;
        db.caixa().open_session(Money::zero()).await.unwrap();

        let draft = cash_draft("p1", 1_000, 1, 1_000);
        let details = db.sales().finalize(&draft).await.unwrap();

        db.caixa().close_session(Money::from_centavos(1_000)).await.unwrap();

        let err = db.sales().cancel(&details.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Business(CoreError::SessionClosed)
        ));
    }
}
