// src/db/store.rs
//
// Fronteira entre serviços e persistência. Os repositórios Postgres
// implementam estes traits; os testes usam `memory::MemoryStore`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::{
        finance::{FinanceTransaction, NewTransaction, TransactionFilter},
        loan::{Loan, LoanPayment, NewLoan, OverdueSweep, PaymentInput, ScheduledInstallment},
        recurring::{NewRecurringCharge, RecurringCharge, RecurringChargePatch},
        ticket::{NewTicket, Ticket, TicketPatch, TicketQuery},
    },
};

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, ticket: &NewTicket) -> Result<Ticket, AppError>;

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError>;

    /// Até `query.fetch` linhas em (created_at DESC, id DESC), depois do cursor.
    async fn query_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, AppError>;

    async fn update_ticket(&self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, AppError>;

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// `amount_net` já conferido pelo serviço.
    async fn insert_transaction(
        &self,
        tx: &NewTransaction,
        amount_net: Decimal,
    ) -> Result<FinanceTransaction, AppError>;

    async fn find_transaction(&self, id: Uuid) -> Result<Option<FinanceTransaction>, AppError>;

    /// Página do razão mais o total de linhas que casam com o filtro.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinanceTransaction>, i64), AppError>;

    /// Todas as linhas do filtro, para agregação.
    async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinanceTransaction>, AppError>;

    async fn delete_transaction(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Resultado de uma baixa de parcela gravada numa única transação.
#[derive(Debug, Clone)]
pub struct AppliedPayment {
    pub loan: Loan,
    pub payment: LoanPayment,
    pub ledger: FinanceTransaction,
}

#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert_loan(&self, loan: &NewLoan, monthly_payment: Decimal) -> Result<Loan, AppError>;

    async fn insert_installment(
        &self,
        loan_id: Uuid,
        row: &ScheduledInstallment,
    ) -> Result<LoanPayment, AppError>;

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, AppError>;

    async fn list_loans(&self, owner_id: Uuid) -> Result<Vec<Loan>, AppError>;

    async fn list_installments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>, AppError>;

    async fn find_installment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<LoanPayment>, AppError>;

    /// Baixa a parcela, move os totais do empréstimo e grava o lançamento,
    /// tudo ou nada. `None` quando a parcela já estava quitada.
    async fn apply_payment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
        input: &PaymentInput,
        ledger: &NewTransaction,
        ledger_net: Decimal,
    ) -> Result<Option<AppliedPayment>, AppError>;

    async fn mark_overdue(&self, today: NaiveDate) -> Result<OverdueSweep, AppError>;

    async fn delete_loan(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ChargeStore: Send + Sync {
    async fn insert_charge(&self, charge: &NewRecurringCharge) -> Result<RecurringCharge, AppError>;

    async fn find_charge(&self, id: Uuid) -> Result<Option<RecurringCharge>, AppError>;

    async fn list_charges(&self, owner_id: Uuid) -> Result<Vec<RecurringCharge>, AppError>;

    async fn update_charge(
        &self,
        id: Uuid,
        patch: &RecurringChargePatch,
    ) -> Result<Option<RecurringCharge>, AppError>;

    async fn delete_charge(&self, id: Uuid) -> Result<bool, AppError>;

    /// Ativas, com lançamento automático e vencidas até `today`.
    async fn list_due_charges(&self, today: NaiveDate) -> Result<Vec<RecurringCharge>, AppError>;

    /// Reivindica o vencimento `expected_due` (avançando para `next_due`) e
    /// grava o lançamento na mesma transação. `None` = outra varredura
    /// chegou antes.
    async fn fire_charge(
        &self,
        id: Uuid,
        expected_due: NaiveDate,
        next_due: NaiveDate,
        ledger: &NewTransaction,
        ledger_net: Decimal,
    ) -> Result<Option<FinanceTransaction>, AppError>;
}
