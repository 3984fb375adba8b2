//! # Sale Endpoints
//!
//! Sale finalization, retrieval and cancellation. The server is the
//! authority on every total: requests carry product IDs and quantities,
//! never prices or computed sums.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdv_core::validation::{validate_positive_amount_reais, validate_quantity};
use pdv_core::{
    ChangeDestination, CustomerSnapshot, DraftItem, DraftSale, FiadoRisk, PaymentMethod,
    SaleStatus, ValidationError,
};
use pdv_db::{DbError, SaleDetails};

use crate::error::ApiError;
use crate::routes::to_reais;
use crate::state::AppState;

/// Routes under `/api/vendas`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vendas", post(criar_venda))
        .route("/api/vendas/{id}", get(obter_venda))
        .route("/api/vendas/{id}/cancelar", patch(cancelar_venda))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VendaRequest {
    cliente_id: Option<String>,
    itens: Vec<ItemRequest>,
    #[serde(default)]
    desconto_manual: f64,
    #[serde(default)]
    pontos_usados: i64,
    pagamentos: Vec<PagamentoRequest>,
    destino_troco: Option<ChangeDestination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRequest {
    #[serde(alias = "produto_id", alias = "idProduto", alias = "id_produto")]
    produto_id: String,
    quantidade: i64,
    #[serde(default)]
    permitir_estoque_negativo: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagamentoRequest {
    metodo: PaymentMethod,
    valor: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VendaDto {
    id: String,
    cliente_id: Option<String>,
    status: SaleStatus,
    subtotal: f64,
    desconto_manual: f64,
    desconto_fidelidade: f64,
    total: f64,
    troco: f64,
    destino_troco: Option<ChangeDestination>,
    credito_gerado: f64,
    pontos_usados: i64,
    risco_fiado: FiadoRisk,
    criada_em: DateTime<Utc>,
    itens: Vec<ItemDto>,
    pagamentos: Vec<PagamentoDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemDto {
    produto_id: String,
    nome: String,
    preco_unitario: f64,
    quantidade: i64,
    total_linha: f64,
    estoque_negativo: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PagamentoDto {
    metodo: PaymentMethod,
    valor: f64,
}

impl From<SaleDetails> for VendaDto {
    fn from(details: SaleDetails) -> Self {
        VendaDto {
            id: details.sale.id,
            cliente_id: details.sale.customer_id,
            status: details.sale.status,
            subtotal: to_reais(details.sale.subtotal_centavos),
            desconto_manual: to_reais(details.sale.manual_discount_centavos),
            desconto_fidelidade: to_reais(details.sale.loyalty_discount_centavos),
            total: to_reais(details.sale.total_centavos),
            troco: to_reais(details.sale.change_centavos),
            destino_troco: details.sale.change_destination,
            credito_gerado: to_reais(details.sale.credit_generated_centavos),
            pontos_usados: details.sale.loyalty_points_used,
            risco_fiado: details.sale.fiado_risk,
            criada_em: details.sale.created_at,
            itens: details
                .items
                .into_iter()
                .map(|i| ItemDto {
                    produto_id: i.product_id,
                    nome: i.name_snapshot,
                    preco_unitario: to_reais(i.unit_price_centavos),
                    quantidade: i.quantity,
                    total_linha: to_reais(i.line_total_centavos),
                    estoque_negativo: i.negative_stock_override,
                })
                .collect(),
            pagamentos: details
                .payments
                .into_iter()
                .map(|p| PagamentoDto {
                    metodo: p.method,
                    valor: to_reais(p.amount_centavos),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/vendas
///
/// Builds the draft server-side (catalog prices, ledger snapshot), applies
/// discounts and payments in order, then hands it to the atomic finalizer.
async fn criar_venda(
    State(state): State<AppState>,
    Json(req): Json<VendaRequest>,
) -> Result<(StatusCode, Json<VendaDto>), ApiError> {
    if req.itens.is_empty() {
        return Err(ValidationError::Required {
            field: "itens".to_string(),
        }
        .into());
    }

    let snapshot = match &req.cliente_id {
        Some(id) => state.db.customers().snapshot(id).await?,
        None => CustomerSnapshot::walk_in(),
    };

    let mut draft = DraftSale::new(snapshot);

    for item in &req.itens {
        let quantity = validate_quantity("quantidade", item.quantidade)?;

        let product = state
            .db
            .products()
            .get_by_id(&item.produto_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DbError::not_found("Product", &item.produto_id))?;

        let unit_price = product.price();
        draft.add_item(DraftItem {
            product_id: product.id,
            name: product.name,
            unit_price,
            quantity,
            allow_negative_stock: item.permitir_estoque_negativo,
        })?;
    }

    if req.desconto_manual != 0.0 {
        let discount = validate_positive_amount_reais("descontoManual", req.desconto_manual)?;
        draft.set_manual_discount(discount)?;
    }

    if req.pontos_usados != 0 {
        draft.redeem_loyalty(req.pontos_usados)?;
    }

    for payment in &req.pagamentos {
        let amount = validate_positive_amount_reais("valor", payment.valor)?;
        draft.add_payment(payment.metodo, amount)?;
    }

    if let Some(destino) = req.destino_troco {
        draft.set_change_destination(destino)?;
    }

    let details = state.db.sales().finalize(&draft).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /api/vendas/{id}
async fn obter_venda(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VendaDto>, ApiError> {
    let details = state
        .db
        .sales()
        .get_details(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", &id))?;

    Ok(Json(details.into()))
}

/// PATCH /api/vendas/{id}/cancelar
async fn cancelar_venda(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VendaDto>, ApiError> {
    let details = state.db.sales().cancel(&id).await?;
    Ok(Json(details.into()))
}

// =============================================================================
// Handler Tests
// =============================================================================
