// src/models/recurring.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "charge_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeFrequency {
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "charge_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Active,
    Paused,
    Cancelled,
}

/// Modelo de cobrança recorrente da empresa (seguro, software, aluguel de pátio...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringCharge {
    pub id: Uuid,
    pub owner_id: Uuid,

    #[schema(example = "Seguro da frota")]
    pub name: String,
    pub vendor: Option<String>,

    #[schema(example = "450.00")]
    pub amount: Decimal,
    #[schema(example = "GBP")]
    pub currency: String,
    pub frequency: ChargeFrequency,

    #[schema(value_type = String, format = Date, example = "2024-02-01")]
    pub next_due_date: NaiveDate,
    pub status: ChargeStatus,
    pub auto_create_transaction: bool,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringCharge {
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status == ChargeStatus::Active
            && self.auto_create_transaction
            && self.next_due_date <= today
    }
}

#[derive(Debug, Clone)]
pub struct NewRecurringCharge {
    pub owner_id: Uuid,
    pub name: String,
    pub vendor: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: ChargeFrequency,
    pub next_due_date: NaiveDate,
    pub auto_create_transaction: bool,
    pub notes: Option<String>,
}

/// Atualização parcial: cada campo atualizável é um `Option`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringChargePatch {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub frequency: Option<ChargeFrequency>,
    #[schema(value_type = Option<String>, format = Date)]
    pub next_due_date: Option<NaiveDate>,
    pub status: Option<ChargeStatus>,
    pub auto_create_transaction: Option<bool>,
    pub notes: Option<String>,
}

impl RecurringChargePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.vendor.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.frequency.is_none()
            && self.next_due_date.is_none()
            && self.status.is_none()
            && self.auto_create_transaction.is_none()
            && self.notes.is_none()
    }

    pub fn apply_to(&self, charge: &mut RecurringCharge) {
        if let Some(name) = &self.name {
            charge.name = name.clone();
        }
        if let Some(vendor) = &self.vendor {
            charge.vendor = Some(vendor.clone());
        }
        if let Some(amount) = self.amount {
            charge.amount = amount;
        }
        if let Some(currency) = &self.currency {
            charge.currency = currency.clone();
        }
        if let Some(frequency) = self.frequency {
            charge.frequency = frequency;
        }
        if let Some(next_due_date) = self.next_due_date {
            charge.next_due_date = next_due_date;
        }
        if let Some(status) = self.status {
            charge.status = status;
        }
        if let Some(auto) = self.auto_create_transaction {
            charge.auto_create_transaction = auto;
        }
        if let Some(notes) = &self.notes {
            charge.notes = Some(notes.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub created_count: usize,
    /// Outra varredura já tinha reivindicado o vencimento.
    pub skipped_count: usize,
    pub failed_count: usize,
}
