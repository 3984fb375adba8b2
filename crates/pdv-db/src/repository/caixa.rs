//! # Cash Session Repository
//!
//! Persistence for the drawer: session lifecycle, the append-only movement
//! log, and the status report served by the API.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Session Lifecycle                              │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open_session(opening_balance) → CashSession { OPEN }           │
//! │         (a partial unique index enforces at most one OPEN session)     │
//! │                                                                         │
//! │  2. MOVE                                                               │
//! │     ├── add_manual_movement(SANGRIA | SUPRIMENTO)                      │
//! │     └── (ENTRADA/SAIDA rows come only from the sale finalizer)         │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close_session(counted) → variance = counted − expected         │
//! │         (variance is recorded, never blocks the close)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult, DbResult};
use pdv_core::{
    caixa, CashMovement, CashSession, CoreError, Money, MovementKind, PaymentMethod, SessionStatus,
};

/// Repository for cash-session operations.
#[derive(Debug, Clone)]
pub struct CaixaRepository {
    pool: SqlitePool,
}

/// Drawer status report for an open session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session: CashSession,
    /// Expected cash in the drawer right now.
    pub running_balance_centavos: i64,
    /// CONCLUIDA sale payments since the session opened, by method group.
    pub vendas_dinheiro_centavos: i64,
    pub vendas_pix_centavos: i64,
    pub vendas_cartao_centavos: i64,
    /// Manual drawer movements for this session.
    pub suprimentos_centavos: i64,
    pub sangrias_centavos: i64,
    /// All cash that left the drawer (SAIDA + SANGRIA).
    pub saidas_dinheiro_centavos: i64,
    /// The session's full movement log, in creation order.
    pub movements: Vec<CashMovement>,
}

impl CaixaRepository {
    /// Creates a new CaixaRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CaixaRepository { pool }
    }

    /// Gets the currently open session, if any.
    pub async fn get_open_session(&self) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT id, status, opening_balance_centavos, closing_balance_centavos,
                   variance_centavos, opened_at, closed_at
            FROM cash_sessions
            WHERE status = 'OPEN'
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT id, status, opening_balance_centavos, closing_balance_centavos,
                   variance_centavos, opened_at, closed_at
            FROM cash_sessions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Opens a new session with the given counted float.
    ///
    /// Fails with `SessionAlreadyOpen` when one exists; the partial unique
    /// index on OPEN status backstops the check under concurrency.
    pub async fn open_session(&self, opening_balance: Money) -> CheckoutResult<CashSession> {
        caixa::validate_opening_balance(opening_balance).map_err(CheckoutError::Business)?;

        if let Some(open) = self.get_open_session().await? {
            return Err(CheckoutError::Business(CoreError::SessionAlreadyOpen {
                session_id: open.id,
            }));
        }

        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            status: SessionStatus::Open,
            opening_balance_centavos: opening_balance.centavos(),
            closing_balance_centavos: None,
            variance_centavos: None,
            opened_at: Utc::now(),
            closed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, status, opening_balance_centavos, closing_balance_centavos,
                variance_centavos, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&session.id)
        .bind(session.status)
        .bind(session.opening_balance_centavos)
        .bind(session.closing_balance_centavos)
        .bind(session.variance_centavos)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&self.pool)
        .await?;

        info!(session_id = %session.id, opening_balance = %opening_balance, "Cash session opened");
        Ok(session)
    }

    /// Gets all movements for a session, in creation order.
    pub async fn movements(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, session_id, kind, amount_centavos, payment_method,
                   description, created_at
            FROM cash_movements
            WHERE session_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Expected cash in the drawer: opening balance plus all movements.
    pub async fn running_balance(&self, session: &CashSession) -> DbResult<Money> {
        let movements = self.movements(&session.id).await?;
        Ok(caixa::running_balance(session.opening_balance(), &movements))
    }

    /// Records a manual SANGRIA or SUPRIMENTO against the open session.
    pub async fn add_manual_movement(
        &self,
        kind: MovementKind,
        amount: Money,
        description: Option<String>,
    ) -> CheckoutResult<CashMovement> {
        let session = self
            .get_open_session()
            .await?
            .ok_or(CheckoutError::Business(CoreError::SessionClosed))?;

        caixa::validate_manual_movement(session.status, kind, amount, description.as_deref())
            .map_err(CheckoutError::Business)?;

        let mut conn = self.pool.acquire().await?;
        let movement =
            insert_movement(&mut conn, &session.id, kind, amount, None, description).await?;

        info!(
            session_id = %session.id,
            kind = ?kind,
            amount = %amount,
            "Manual cash movement recorded"
        );
        Ok(movement)
    }

    /// Closes the open session against a blind physical count.
    ///
    /// The variance (counted − expected) is recorded on the session; a
    /// mismatch never blocks the close.
    ///
    /// The status transition, the movement-log read and the variance write
    /// run in ONE transaction, writing first: a sale finalizing concurrently
    /// either commits its movements before the close (and is counted) or
    /// fails its own transaction. The variance can never miss a movement.
    pub async fn close_session(&self, counted: Money) -> CheckoutResult<CashSession> {
        if counted.is_negative() {
            return Err(CheckoutError::Business(CoreError::InvalidAmount {
                amount: counted,
            }));
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Guarded transition first: only an OPEN row closes, exactly once,
        // and the write locks out concurrent finalizers before we read the log
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            UPDATE cash_sessions
            SET status = 'CLOSED', closing_balance_centavos = ?1, closed_at = ?2
            WHERE status = 'OPEN'
            RETURNING id, status, opening_balance_centavos, closing_balance_centavos,
                      variance_centavos, opened_at, closed_at
            "#,
        )
        .bind(counted.centavos())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CheckoutError::Business(CoreError::SessionClosed))?;

        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, session_id, kind, amount_centavos, payment_method,
                   description, created_at
            FROM cash_movements
            WHERE session_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(&session.id)
        .fetch_all(&mut *tx)
        .await?;

        let expected = caixa::running_balance(session.opening_balance(), &movements);
        let outcome = caixa::close_session(SessionStatus::Open, expected, counted)
            .map_err(CheckoutError::Business)?;

        sqlx::query("UPDATE cash_sessions SET variance_centavos = ?2 WHERE id = ?1")
            .bind(&session.id)
            .bind(outcome.variance.centavos())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            session_id = %session.id,
            expected = %outcome.expected,
            counted = %outcome.counted,
            variance = %outcome.variance,
            "Cash session closed"
        );

        Ok(CashSession {
            variance_centavos: Some(outcome.variance.centavos()),
            ..session
        })
    }

    /// Builds the status report for an open session.
    pub async fn session_report(&self, session: &CashSession) -> DbResult<SessionReport> {
        let movements = self.movements(&session.id).await?;
        let running = caixa::running_balance(session.opening_balance(), &movements);

        let suprimentos: i64 = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Suprimento)
            .map(|m| m.amount_centavos)
            .sum();
        let sangrias: i64 = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Sangria)
            .map(|m| m.amount_centavos)
            .sum();
        let saidas: i64 = movements
            .iter()
            .filter(|m| matches!(m.kind, MovementKind::Saida | MovementKind::Sangria))
            .map(|m| m.amount_centavos)
            .sum();

        // Sale totals since the session opened, CONCLUIDA only
        let vendas_dinheiro = self
            .payment_total_since(session, &[PaymentMethod::Dinheiro])
            .await?;
        let vendas_pix = self.payment_total_since(session, &[PaymentMethod::Pix]).await?;
        let vendas_cartao = self
            .payment_total_since(
                session,
                &[PaymentMethod::CartaoCredito, PaymentMethod::CartaoDebito],
            )
            .await?;

        Ok(SessionReport {
            session: session.clone(),
            running_balance_centavos: running.centavos(),
            vendas_dinheiro_centavos: vendas_dinheiro,
            vendas_pix_centavos: vendas_pix,
            vendas_cartao_centavos: vendas_cartao,
            suprimentos_centavos: suprimentos,
            sangrias_centavos: sangrias,
            saidas_dinheiro_centavos: saidas,
            movements,
        })
    }

    async fn payment_total_since(
        &self,
        session: &CashSession,
        methods: &[PaymentMethod],
    ) -> DbResult<i64> {
        let mut total = 0i64;
        for method in methods {
            let sum: Option<i64> = sqlx::query_scalar(
                r#"
                SELECT SUM(p.amount_centavos)
                FROM payments p
                JOIN sales s ON s.id = p.sale_id
                WHERE p.method = ?1
                  AND s.status = 'CONCLUIDA'
                  AND s.created_at >= ?2
                "#,
            )
            .bind(method)
            .bind(session.opened_at)
            .fetch_one(&self.pool)
            .await?;
            total += sum.unwrap_or(0);
        }
        Ok(total)
    }
}

// =============================================================================
// Transaction-Scoped Movement Insert
// =============================================================================

/// Inserts a movement row. Shared by the manual endpoint (on a plain
/// connection) and the sale finalizer (inside its transaction).
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    session_id: &str,
    kind: MovementKind,
    amount: Money,
    payment_method: Option<PaymentMethod>,
    description: Option<String>,
) -> CheckoutResult<CashMovement> {
    let movement = CashMovement {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        kind,
        amount_centavos: amount.centavos(),
        payment_method,
        description,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, kind, amount_centavos, payment_method,
            description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(movement.kind)
    .bind(movement.amount_centavos)
    .bind(movement.payment_method)
    .bind(&movement.description)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(session_id, kind = ?kind, amount = %amount, "Cash movement inserted");
    Ok(movement)
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================
