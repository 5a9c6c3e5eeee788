// src/models/finance.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "txn_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxnDirection {
    In,  // Entrada (receita)
    Out, // Saída (custo)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "txn_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxnType {
    Rental,
    Deposit,
    DepositRefund,
    LoanPayment,
    Maintenance,
    Insurance,
    Fuel,
    PcnFine,
    Subscription,
    Expense,
    Other,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Rental => "rental",
            TxnType::Deposit => "deposit",
            TxnType::DepositRefund => "deposit_refund",
            TxnType::LoanPayment => "loan_payment",
            TxnType::Maintenance => "maintenance",
            TxnType::Insurance => "insurance",
            TxnType::Fuel => "fuel",
            TxnType::PcnFine => "pcn_fine",
            TxnType::Subscription => "subscription",
            TxnType::Expense => "expense",
            TxnType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "txn_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxnSource {
    Booking,
    Agreement,
    Loan,
    CompanyExpense,
    RecurringCharge,
    Pcn,
    Manual,
}

impl TxnSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnSource::Booking => "booking",
            TxnSource::Agreement => "agreement",
            TxnSource::Loan => "loan",
            TxnSource::CompanyExpense => "company_expense",
            TxnSource::RecurringCharge => "recurring_charge",
            TxnSource::Pcn => "pcn",
            TxnSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "txn_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxnStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

// --- Structs ---

/// Lançamento do razão. Imutável depois de gravado; só sai por DELETE.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceTransaction {
    pub id: Uuid,

    pub direction: TxnDirection,
    #[serde(rename = "type")]
    pub txn_type: TxnType,
    pub source: TxnSource,
    pub status: TxnStatus,

    #[schema(example = "120.00")]
    pub amount_gross: Decimal,
    #[schema(example = "2.40")]
    pub fees: Decimal,
    #[schema(example = "117.60")]
    pub amount_net: Decimal,
    #[schema(example = "GBP")]
    pub currency: String,

    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub vendor: Option<String>,

    // Vínculos
    pub booking_id: Option<Uuid>,
    pub agreement_id: Option<Uuid>,
    pub loan_id: Option<Uuid>,
    pub loan_payment_id: Option<Uuid>,
    pub recurring_charge_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Entrada para `record`. `amount_net` é calculado quando vem vazio.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub direction: TxnDirection,
    pub txn_type: TxnType,
    pub source: TxnSource,
    pub status: TxnStatus,
    pub amount_gross: Decimal,
    pub fees: Decimal,
    pub amount_net: Option<Decimal>,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub links: TransactionLinks,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionLinks {
    pub booking_id: Option<Uuid>,
    pub agreement_id: Option<Uuid>,
    pub loan_id: Option<Uuid>,
    pub loan_payment_id: Option<Uuid>,
    pub recurring_charge_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
}

/// Janela semiaberta [start, end). Limite ausente = aberto daquele lado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at < e)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub window: Option<DateWindow>,
    pub txn_type: Option<TxnType>,
    pub status: Option<TxnStatus>,
    pub direction: Option<TxnDirection>,
    pub source: Option<TxnSource>,
    /// Código ISO 4217, já em maiúsculas.
    pub currency: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &FinanceTransaction) -> bool {
        self.window.is_none_or(|w| w.contains(tx.occurred_at))
            && self.txn_type.is_none_or(|t| t == tx.txn_type)
            && self.status.is_none_or(|s| s == tx.status)
            && self.direction.is_none_or(|d| d == tx.direction)
            && self.source.is_none_or(|s| s == tx.source)
            && self.currency.as_deref().is_none_or(|c| c == tx.currency)
    }
}

/// Resultado de `summarize`. Agregado no serviço, não no banco.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    /// Moeda de todos os valores do resumo. Vazia só quando não há lançamentos nem filtro.
    pub currency: Option<String>,
    pub revenue: Decimal,
    pub costs: Decimal,
    pub profit: Decimal,
    pub by_type: BTreeMap<String, Decimal>,
    pub by_source: BTreeMap<String, Decimal>,
    pub transaction_count: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
