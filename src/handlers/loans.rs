// src/handlers/loans.rs

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
        money::{validate_currency, validate_not_negative, validate_positive, validate_positive_amount},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::loan::{Loan, LoanWithSchedule, NewLoan, OverdueSweep, PaymentInput, PaymentReceipt},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanPayload {
    #[validate(length(min = 1, message = "O credor é obrigatório."))]
    pub lender: String,

    pub vehicle_registration: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = f64, example = 12000.0)]
    pub loan_amount: Decimal,

    /// Taxa anual em %.
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 6.0)]
    pub interest_rate: Decimal,

    #[validate(range(min = 1, max = 600, message = "O prazo deve estar entre 1 e 600 meses."))]
    #[schema(example = 12)]
    pub loan_term_months: i32,

    /// Quando ausente, calculada pela tabela Price.
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<f64>)]
    pub monthly_payment: Option<Decimal>,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "GBP")]
    pub currency: String,

    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub first_payment_date: NaiveDate,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 1032.80)]
    pub amount_paid: Decimal,

    /// Padrão: hoje.
    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

// ---
// Handlers
// ---

// POST /api/loans
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "Loans",
    request_body = CreateLoanPayload,
    responses(
        (status = 201, description = "Empréstimo e cronograma criados", body = LoanWithSchedule),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateLoanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .loan_service
        .create(NewLoan {
            owner_id: user.0,
            lender: payload.lender.trim().to_string(),
            vehicle_registration: payload.vehicle_registration.map(|r| r.trim().to_uppercase()),
            loan_amount: payload.loan_amount,
            interest_rate: payload.interest_rate,
            loan_term_months: payload.loan_term_months,
            monthly_payment: payload.monthly_payment,
            currency: payload.currency,
            start_date: payload.start_date,
            first_payment_date: payload.first_payment_date,
            notes: payload.notes,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/loans
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "Loans",
    responses((status = 200, description = "Empréstimos do usuário", body = Vec<Loan>)),
    security(("api_jwt" = []))
)]
pub async fn list_loans(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let loans = app_state
        .loan_service
        .list(user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(loans)))
}

// GET /api/loans/{id}
#[utoipa::path(
    get,
    path = "/api/loans/{id}",
    tag = "Loans",
    params(("id" = String, Path, description = "ID do empréstimo")),
    responses(
        (status = 200, body = LoanWithSchedule),
        (status = 403, description = "Empréstimo de outro usuário"),
        (status = 404, description = "Empréstimo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let loan = app_state
        .loan_service
        .get(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(loan)))
}

// POST /api/loans/{id}/payments/{payment_id}
#[utoipa::path(
    post,
    path = "/api/loans/{id}/payments/{payment_id}",
    tag = "Loans",
    params(
        ("id" = String, Path, description = "ID do empréstimo"),
        ("payment_id" = String, Path, description = "ID da parcela")
    ),
    request_body = RecordPaymentPayload,
    responses(
        (status = 200, description = "Parcela baixada e espelhada no razão", body = PaymentReceipt),
        (status = 403, description = "Empréstimo de outro usuário"),
        (status = 404, description = "Parcela não encontrada"),
        (status = 409, description = "Parcela já paga")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((id, payment_id)): Path<(String, String)>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let loan_id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let payment_id =
        parse_id(&payment_id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = PaymentInput {
        amount: payload.amount_paid,
        paid_date: payload.paid_date.unwrap_or_else(|| Utc::now().date_naive()),
        payment_method: payload.payment_method,
        notes: payload.notes,
    };

    let receipt = app_state
        .loan_service
        .record_payment(loan_id, payment_id, input, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(receipt)))
}

// POST /api/loans/overdue-sweep
#[utoipa::path(
    post,
    path = "/api/loans/overdue-sweep",
    tag = "Loans",
    responses((status = 200, description = "Parcelas e empréstimos marcados", body = OverdueSweep)),
    security(("api_jwt" = []))
)]
pub async fn overdue_sweep(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let sweep = app_state
        .loan_service
        .mark_overdue(Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sweep)))
}

// DELETE /api/loans/{id}
#[utoipa::path(
    delete,
    path = "/api/loans/{id}",
    tag = "Loans",
    params(("id" = String, Path, description = "ID do empréstimo")),
    responses(
        (status = 204, description = "Removido com o cronograma"),
        (status = 403, description = "Empréstimo de outro usuário"),
        (status = 404, description = "Empréstimo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .loan_service
        .delete(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
