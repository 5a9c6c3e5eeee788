// src/models/loan.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    PaidOff,
    Defaulted,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Partial,
}

/// Financiamento de um veículo da frota.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub owner_id: Uuid,

    #[schema(example = "Black Horse Finance")]
    pub lender: String,
    #[schema(example = "AB12 CDE")]
    pub vehicle_registration: Option<String>,

    #[schema(example = "12000.00")]
    pub loan_amount: Decimal,
    /// Taxa anual em %.
    #[schema(example = "6.0")]
    pub interest_rate: Decimal,
    #[schema(example = 12)]
    pub loan_term_months: i32,
    #[schema(example = "1032.80")]
    pub monthly_payment: Decimal,
    #[schema(example = "GBP")]
    pub currency: String,

    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub first_payment_date: NaiveDate,

    pub status: LoanStatus,
    pub total_paid: Decimal,
    pub remaining_balance: Decimal,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Uma parcela do cronograma.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub payment_number: i32,

    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub status: PaymentStatus,

    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub owner_id: Uuid,
    pub lender: String,
    pub vehicle_registration: Option<String>,
    pub loan_amount: Decimal,
    pub interest_rate: Decimal,
    pub loan_term_months: i32,
    /// Quando ausente, vem da fórmula de amortização.
    pub monthly_payment: Option<Decimal>,
    pub currency: String,
    pub start_date: NaiveDate,
    pub first_payment_date: NaiveDate,
    pub notes: Option<String>,
}

/// Linha do cronograma ainda não persistida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    pub payment_number: i32,
    pub due_date: NaiveDate,
    pub amount_due: Decimal,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    /// Saldo depois desta parcela.
    pub balance_after: Decimal,
}

/// Pagamento informado pelo usuário para uma parcela.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub paid_date: NaiveDate,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanWithSchedule {
    #[serde(flatten)]
    pub loan: Loan,
    pub payments: Vec<LoanPayment>,
    /// Parcelas que falharam ao gravar (lote não é abortado).
    pub schedule_failed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub loan: Loan,
    pub payment: LoanPayment,
    pub ledger_transaction_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSweep {
    pub payments_marked: u64,
    pub loans_marked: u64,
}
