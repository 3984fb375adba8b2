//! # Cash Drawer Endpoints
//!
//! Session lifecycle and manual movements for the physical drawer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdv_core::validation::validate_amount_reais;
use pdv_core::{CashMovement, MovementKind};
use pdv_db::SessionReport;

use crate::error::ApiError;
use crate::routes::to_reais;
use crate::state::AppState;

/// Routes under `/api/caixa`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/caixa/status", get(status))
        .route("/api/caixa/abrir", post(abrir))
        .route("/api/caixa/movimentacao", post(movimentacao))
        .route("/api/caixa/fechar", post(fechar))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    aberto: bool,
    sessao: Option<SessaoDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessaoDto {
    id: String,
    saldo_inicial: f64,
    /// Expected cash in the drawer right now.
    saldo_atual: f64,
    vendas_dinheiro: f64,
    vendas_pix: f64,
    vendas_cartao: f64,
    suprimentos: f64,
    sangrias: f64,
    saidas_dinheiro: f64,
    aberto_em: DateTime<Utc>,
    /// The session's full statement, in creation order.
    movimentacoes: Vec<MovimentacaoDto>,
}

impl From<SessionReport> for SessaoDto {
    fn from(report: SessionReport) -> Self {
        SessaoDto {
            id: report.session.id.clone(),
            saldo_inicial: to_reais(report.session.opening_balance_centavos),
            saldo_atual: to_reais(report.running_balance_centavos),
            vendas_dinheiro: to_reais(report.vendas_dinheiro_centavos),
            vendas_pix: to_reais(report.vendas_pix_centavos),
            vendas_cartao: to_reais(report.vendas_cartao_centavos),
            suprimentos: to_reais(report.suprimentos_centavos),
            sangrias: to_reais(report.sangrias_centavos),
            saidas_dinheiro: to_reais(report.saidas_dinheiro_centavos),
            aberto_em: report.session.opened_at,
            movimentacoes: report.movements.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbrirRequest {
    #[serde(alias = "saldo_inicial")]
    saldo_inicial: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovimentacaoRequest {
    tipo: MovementKind,
    valor: f64,
    descricao: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MovimentacaoDto {
    id: String,
    sessao_id: String,
    tipo: MovementKind,
    valor: f64,
    descricao: Option<String>,
    criada_em: DateTime<Utc>,
}

impl From<CashMovement> for MovimentacaoDto {
    fn from(m: CashMovement) -> Self {
        MovimentacaoDto {
            id: m.id,
            sessao_id: m.session_id,
            tipo: m.kind,
            valor: to_reais(m.amount_centavos),
            descricao: m.description,
            criada_em: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FecharRequest {
    #[serde(alias = "saldo_contado", alias = "saldoFinalInformado", alias = "saldo_final_informado")]
    saldo_contado: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessaoFechadaDto {
    id: String,
    saldo_esperado: f64,
    saldo_contado: f64,
    /// contado − esperado: positive = sobra, negative = falta.
    diferenca: f64,
    fechada_em: Option<DateTime<Utc>>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/caixa/status
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let Some(session) = state.db.caixa().get_open_session().await? else {
        return Ok(Json(StatusResponse {
            aberto: false,
            sessao: None,
        }));
    };

    let report = state.db.caixa().session_report(&session).await?;
    Ok(Json(StatusResponse {
        aberto: true,
        sessao: Some(report.into()),
    }))
}

/// POST /api/caixa/abrir
async fn abrir(
    State(state): State<AppState>,
    Json(req): Json<AbrirRequest>,
) -> Result<(StatusCode, Json<SessaoDto>), ApiError> {
    let opening = validate_amount_reais("saldoInicial", req.saldo_inicial)?;
    let session = state.db.caixa().open_session(opening).await?;
    let report = state.db.caixa().session_report(&session).await?;

    Ok((StatusCode::CREATED, Json(report.into())))
}

/// POST /api/caixa/movimentacao
async fn movimentacao(
    State(state): State<AppState>,
    Json(req): Json<MovimentacaoRequest>,
) -> Result<(StatusCode, Json<MovimentacaoDto>), ApiError> {
    let amount = validate_amount_reais("valor", req.valor)?;
    let movement = state
        .db
        .caixa()
        .add_manual_movement(req.tipo, amount, req.descricao)
        .await?;

    Ok((StatusCode::CREATED, Json(movement.into())))
}

/// POST /api/caixa/fechar
async fn fechar(
    State(state): State<AppState>,
    Json(req): Json<FecharRequest>,
) -> Result<Json<SessaoFechadaDto>, ApiError> {
    let counted = validate_amount_reais("saldoContado", req.saldo_contado)?;
    let closed = state.db.caixa().close_session(counted).await?;

    let counted_centavos = closed.closing_balance_centavos.unwrap_or_default();
    let variance_centavos = closed.variance_centavos.unwrap_or_default();

    Ok(Json(SessaoFechadaDto {
        id: closed.id,
        saldo_esperado: to_reais(counted_centavos - variance_centavos),
        saldo_contado: to_reais(counted_centavos),
        diferenca: to_reais(variance_centavos),
        fechada_em: closed.closed_at,
    }))
}

// =============================================================================
// Handler Tests
// =============================================================================
