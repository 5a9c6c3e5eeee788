// src/models/ticket.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::pagination::{Cursor, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Appealed,
    Paid,
    Cancelled,
}

/// Multa de estacionamento/trânsito (PCN) recebida por um veículo da frota.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,

    #[schema(example = "WM12345678")]
    pub pcn_number: String,
    #[schema(example = "AB12 CDE")]
    pub vehicle_registration: String,
    #[schema(example = "Westminster City Council")]
    pub issuer: String,
    pub reason: Option<String>,

    #[schema(example = "130.00")]
    pub amount: Decimal,
    #[schema(example = "GBP")]
    pub currency: String,
    pub status: TicketStatus,

    #[schema(value_type = String, format = Date, example = "2024-01-10")]
    pub issue_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date, example = "2024-02-07")]
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Keyed for Ticket {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub pcn_number: String,
    pub vehicle_registration: String,
    pub issuer: String,
    pub reason: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Atualização parcial: `None` mantém o valor atual da coluna.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.amount.is_none()
            && self.due_date.is_none()
            && self.reason.is_none()
            && self.notes.is_none()
    }

    /// Aplica o patch em memória, campo a campo (mesma semântica do COALESCE no SQL).
    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(amount) = self.amount {
            ticket.amount = amount;
        }
        if let Some(due_date) = self.due_date {
            ticket.due_date = Some(due_date);
        }
        if let Some(reason) = &self.reason {
            ticket.reason = Some(reason.clone());
        }
        if let Some(notes) = &self.notes {
            ticket.notes = Some(notes.clone());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub search_term: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let search_ok = self.search_term.as_deref().is_none_or(|term| {
            let term = term.to_lowercase();
            ticket.pcn_number.to_lowercase().contains(&term)
                || ticket.vehicle_registration.to_lowercase().contains(&term)
                || ticket.issuer.to_lowercase().contains(&term)
        });

        search_ok
            && self.status.is_none_or(|s| s == ticket.status)
            && self.created_from.is_none_or(|from| ticket.created_at >= from)
            && self.created_before.is_none_or(|before| ticket.created_at < before)
    }
}

/// Uma consulta keyset: filtro + posição + quantas linhas buscar.
#[derive(Debug, Clone)]
pub struct TicketQuery {
    pub filter: TicketFilter,
    pub cursor: Option<Cursor>,
    pub fetch: i64,
}
