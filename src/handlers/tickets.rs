// src/handlers/tickets.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Days, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        ids::parse_id,
        money::{validate_amount, validate_currency},
        pagination::CursorPage,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::ticket::{NewTicket, Ticket, TicketFilter, TicketPatch, TicketStatus},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketPayload {
    #[validate(length(min = 1, message = "O número da PCN é obrigatório."))]
    pub pcn_number: String,

    #[validate(length(min = 1, message = "A placa é obrigatória."))]
    pub vehicle_registration: String,

    #[validate(length(min = 1, message = "O emissor é obrigatório."))]
    pub issuer: String,

    pub reason: Option<String>,

    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = f64, example = 130.0)]
    pub amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "GBP")]
    pub currency: String,

    #[schema(value_type = String, format = Date)]
    pub issue_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketPayload {
    pub status: Option<TicketStatus>,
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateTicketPayload> for TicketPatch {
    fn from(p: UpdateTicketPayload) -> Self {
        TicketPatch {
            status: p.status,
            amount: p.amount,
            due_date: p.due_date,
            reason: p.reason,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketListQuery {
    /// 1..50 (padrão 20)
    pub limit: Option<i64>,
    /// Valor de `nextCursor` da página anterior.
    pub cursor: Option<String>,
    pub status: Option<TicketStatus>,
    /// Busca em número da PCN, placa e emissor.
    pub search_term: Option<String>,
    /// Criados a partir deste dia (inclusive).
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Criados até este dia (inclusive).
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

impl TicketListQuery {
    fn filter(&self) -> Result<TicketFilter, AppError> {
        let created_before = match self.to {
            Some(day) => Some(
                day.checked_add_days(Days::new(1))
                    .ok_or_else(|| AppError::BusinessRule("Data fora do calendário.".into()))?
                    .and_time(NaiveTime::MIN)
                    .and_utc(),
            ),
            None => None,
        };

        Ok(TicketFilter {
            status: self.status,
            search_term: self.search_term.clone().filter(|t| !t.trim().is_empty()),
            created_from: self.from.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            created_before,
        })
    }
}

// ---
// Handlers
// ---

// POST /api/tickets
#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "Tickets",
    request_body = CreateTicketPayload,
    responses(
        (status = 201, description = "Ticket registrado", body = Ticket),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .create(NewTicket {
            pcn_number: payload.pcn_number.trim().to_string(),
            vehicle_registration: payload.vehicle_registration.trim().to_uppercase(),
            issuer: payload.issuer.trim().to_string(),
            reason: payload.reason,
            amount: payload.amount,
            currency: payload.currency,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            notes: payload.notes,
            created_by: user.0,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

// GET /api/tickets
#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    params(TicketListQuery),
    responses(
        (status = 200, description = "Página de tickets, mais novos primeiro", body = CursorPage<Ticket>),
        (status = 400, description = "Cursor ou filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<TicketListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query
        .filter()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let page = app_state
        .ticket_service
        .paginate(query.limit, query.cursor.as_deref(), filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/tickets/{id}
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 200, body = Ticket),
        (status = 404, description = "Ticket não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// PATCH /api/tickets/{id}
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = String, Path, description = "ID do ticket")),
    request_body = UpdateTicketPayload,
    responses(
        (status = 200, body = Ticket),
        (status = 404, description = "Ticket não encontrado"),
        (status = 422, description = "Patch vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .update(id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// DELETE /api/tickets/{id}
#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 204, description = "Removido"),
        (status = 403, description = "Ticket de outro usuário"),
        (status = 404, description = "Ticket não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .ticket_service
        .delete(id, user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
