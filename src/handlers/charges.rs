// src/handlers/charges.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        ids::parse_id,
        money::{validate_currency, validate_positive_amount},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::recurring::{
        ChargeFrequency, ChargeStatus, NewRecurringCharge, RecurringCharge, RecurringChargePatch,
        SyncReport,
    },
};

fn default_auto_create() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChargePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub vendor: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = f64, example = 450.0)]
    pub amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "GBP")]
    pub currency: String,

    pub frequency: ChargeFrequency,

    #[schema(value_type = String, format = Date)]
    pub next_due_date: NaiveDate,

    #[serde(default = "default_auto_create")]
    pub auto_create_transaction: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChargePayload {
    #[validate(length(min = 1, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,
    pub vendor: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    pub frequency: Option<ChargeFrequency>,
    #[schema(value_type = Option<String>, format = Date)]
    pub next_due_date: Option<NaiveDate>,
    pub status: Option<ChargeStatus>,
    pub auto_create_transaction: Option<bool>,
    pub notes: Option<String>,
}

impl From<UpdateChargePayload> for RecurringChargePatch {
    fn from(p: UpdateChargePayload) -> Self {
        RecurringChargePatch {
            name: p.name,
            vendor: p.vendor,
            amount: p.amount,
            currency: p.currency,
            frequency: p.frequency,
            next_due_date: p.next_due_date,
            status: p.status,
            auto_create_transaction: p.auto_create_transaction,
            notes: p.notes,
        }
    }
}

// POST /api/recurring-charges
#[utoipa::path(
    post,
    path = "/api/recurring-charges",
    tag = "Recurring charges",
    request_body = CreateChargePayload,
    responses(
        (status = 201, body = RecurringCharge),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateChargePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let charge = app_state
        .charge_service
        .create(NewRecurringCharge {
            owner_id: user.0,
            name: payload.name.trim().to_string(),
            vendor: payload.vendor,
            amount: payload.amount,
            currency: payload.currency,
            frequency: payload.frequency,
            next_due_date: payload.next_due_date,
            auto_create_transaction: payload.auto_create_transaction,
            notes: payload.notes,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(charge)))
}

// GET /api/recurring-charges
#[utoipa::path(
    get,
    path = "/api/recurring-charges",
    tag = "Recurring charges",
    responses((status = 200, body = Vec<RecurringCharge>)),
    security(("api_jwt" = []))
)]
pub async fn list_charges(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let charges = app_state
        .charge_service
        .list(user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(charges)))
}

// PATCH /api/recurring-charges/{id}
#[utoipa::path(
    patch,
    path = "/api/recurring-charges/{id}",
    tag = "Recurring charges",
    params(("id" = String, Path, description = "ID da cobrança")),
    request_body = UpdateChargePayload,
    responses(
        (status = 200, body = RecurringCharge),
        (status = 403, description = "Cobrança de outro usuário"),
        (status = 404, description = "Cobrança não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateChargePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let charge = app_state
        .charge_service
        .update(id, payload.into(), user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(charge)))
}

// DELETE /api/recurring-charges/{id}
#[utoipa::path(
    delete,
    path = "/api/recurring-charges/{id}",
    tag = "Recurring charges",
    params(("id" = String, Path, description = "ID da cobrança")),
    responses(
        (status = 204, description = "Removida"),
        (status = 403, description = "Cobrança de outro usuário"),
        (status = 404, description = "Cobrança não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .charge_service
        .delete(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/recurring-charges/sync
#[utoipa::path(
    post,
    path = "/api/recurring-charges/sync",
    tag = "Recurring charges",
    responses((status = 200, description = "Resultado da varredura", body = SyncReport)),
    security(("api_jwt" = []))
)]
pub async fn sync_charges(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .charge_service
        .sync_due(Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}
