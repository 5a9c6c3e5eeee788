// src/handlers/finance.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        ids::parse_id,
        money::{validate_amount, validate_currency},
        pagination::{OffsetPage, PageRequest},
    },
    config::AppState,
    domain::windows::{resolve_window, SummaryPreset},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::finance::{
        FinanceSummary, FinanceTransaction, NewTransaction, TransactionFilter, TransactionLinks,
        TxnDirection, TxnSource, TxnStatus, TxnType,
    },
    services::finance_service::SummaryRequest,
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionPayload {
    pub direction: TxnDirection,
    #[serde(rename = "type")]
    pub txn_type: TxnType,
    #[serde(default = "default_source")]
    pub source: TxnSource,
    #[serde(default = "default_status")]
    pub status: TxnStatus,

    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = f64, example = 120.0)]
    pub amount_gross: Decimal,

    #[validate(custom(function = "validate_amount"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 2.4)]
    pub fees: Decimal,

    /// Opcional; quando vier, precisa ser bruto - taxas.
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<f64>)]
    pub amount_net: Option<Decimal>,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "GBP")]
    pub currency: String,

    /// Padrão: agora.
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub vendor: Option<String>,

    pub booking_id: Option<Uuid>,
    pub agreement_id: Option<Uuid>,
    pub loan_id: Option<Uuid>,
    pub loan_payment_id: Option<Uuid>,
    pub recurring_charge_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
}

fn default_source() -> TxnSource {
    TxnSource::Manual
}

fn default_status() -> TxnStatus {
    TxnStatus::Paid
}

/// Janela e filtros compartilhados por listagem e resumo.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LedgerQuery {
    /// Dia inicial, inclusive. Tem precedência sobre `preset`.
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// Dia final, inclusive.
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub preset: Option<SummaryPreset>,
    #[serde(rename = "type")]
    pub txn_type: Option<TxnType>,
    pub status: Option<TxnStatus>,
    pub direction: Option<TxnDirection>,
    pub source: Option<TxnSource>,
    /// ISO 4217. No resumo, obrigatória se o período misturar moedas.
    pub currency: Option<String>,
    /// Página (1..), só na listagem.
    pub page: Option<i64>,
    /// 1..100 (padrão 25), só na listagem.
    pub limit: Option<i64>,
}

impl LedgerQuery {
    fn currency_code(&self) -> Option<String> {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase)
    }
}

// ---
// Handlers
// ---

// POST /api/finance/transactions
#[utoipa::path(
    post,
    path = "/api/finance/transactions",
    tag = "Finance",
    request_body = RecordTransactionPayload,
    responses(
        (status = 201, description = "Lançamento gravado", body = FinanceTransaction),
        (status = 400, description = "Dados inválidos"),
        (status = 422, description = "Valores inconsistentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<RecordTransactionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tx = NewTransaction {
        direction: payload.direction,
        txn_type: payload.txn_type,
        source: payload.source,
        status: payload.status,
        amount_gross: payload.amount_gross,
        fees: payload.fees,
        amount_net: payload.amount_net,
        currency: payload.currency,
        occurred_at: payload.occurred_at.unwrap_or_else(Utc::now),
        description: payload.description,
        vendor: payload.vendor,
        links: TransactionLinks {
            booking_id: payload.booking_id,
            agreement_id: payload.agreement_id,
            loan_id: payload.loan_id,
            loan_payment_id: payload.loan_payment_id,
            recurring_charge_id: payload.recurring_charge_id,
            ticket_id: payload.ticket_id,
        },
        created_by: user.0,
    };

    let saved = app_state
        .finance_service
        .record(tx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(saved)))
}

// GET /api/finance/transactions
#[utoipa::path(
    get,
    path = "/api/finance/transactions",
    tag = "Finance",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Página do razão", body = OffsetPage<FinanceTransaction>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = resolve_window(query.start_date, query.end_date, query.preset, Utc::now())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let filter = TransactionFilter {
        window,
        txn_type: query.txn_type,
        status: query.status,
        direction: query.direction,
        source: query.source,
        currency: query.currency_code(),
    };

    let page = app_state
        .finance_service
        .list(filter, PageRequest::new(query.page, query.limit))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/finance/summary
#[utoipa::path(
    get,
    path = "/api/finance/summary",
    tag = "Finance",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Receita, custos e lucro da janela", body = FinanceSummary),
        (status = 422, description = "Moedas misturadas sem filtro de moeda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = SummaryRequest {
        start_date: query.start_date,
        end_date: query.end_date,
        preset: query.preset,
        txn_type: query.txn_type,
        status: query.status,
        direction: query.direction,
        source: query.source,
        currency: query.currency_code(),
    };

    let summary = app_state
        .finance_service
        .summarize(request, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/finance/transactions/{id}
#[utoipa::path(
    get,
    path = "/api/finance/transactions/{id}",
    tag = "Finance",
    params(("id" = String, Path, description = "ID do lançamento")),
    responses(
        (status = 200, body = FinanceTransaction),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tx = app_state
        .finance_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tx)))
}

// DELETE /api/finance/transactions/{id}
#[utoipa::path(
    delete,
    path = "/api/finance/transactions/{id}",
    tag = "Finance",
    params(("id" = String, Path, description = "ID do lançamento")),
    responses(
        (status = 204, description = "Removido"),
        (status = 403, description = "Lançado por outro usuário"),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .finance_service
        .delete(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
