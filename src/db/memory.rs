// src/db/memory.rs
//
// Store em memória para os testes de serviço. Reproduz a semântica dos
// repositórios Postgres (UPDATEs condicionais, cascatas, ordenação).

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::store::{AppliedPayment, ChargeStore, LedgerStore, LoanStore, TicketStore},
    models::{
        finance::{FinanceTransaction, NewTransaction, TransactionFilter},
        loan::{
            Loan, LoanPayment, LoanStatus, NewLoan, OverdueSweep, PaymentInput, PaymentStatus,
            ScheduledInstallment,
        },
        recurring::{ChargeStatus, NewRecurringCharge, RecurringCharge, RecurringChargePatch},
        ticket::{NewTicket, Ticket, TicketPatch, TicketQuery, TicketStatus},
    },
};

#[derive(Default)]
struct State {
    tickets: Vec<Ticket>,
    transactions: Vec<FinanceTransaction>,
    loans: Vec<Loan>,
    installments: Vec<LoanPayment>,
    charges: Vec<RecurringCharge>,
    fail_installments: HashSet<i32>,
    fail_charges: HashSet<Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

/// Precisão de microssegundos, como o TIMESTAMPTZ.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

fn storage_error(what: &str) -> AppError {
    AppError::DatabaseError(sqlx::Error::Protocol(format!("falha simulada: {what}")))
}

fn ledger_row(tx: &NewTransaction, amount_net: Decimal) -> FinanceTransaction {
    FinanceTransaction {
        id: Uuid::new_v4(),
        direction: tx.direction,
        txn_type: tx.txn_type,
        source: tx.source,
        status: tx.status,
        amount_gross: tx.amount_gross,
        fees: tx.fees,
        amount_net,
        currency: tx.currency.clone(),
        occurred_at: tx.occurred_at,
        description: tx.description.clone(),
        vendor: tx.vendor.clone(),
        booking_id: tx.links.booking_id,
        agreement_id: tx.links.agreement_id,
        loan_id: tx.links.loan_id,
        loan_payment_id: tx.links.loan_payment_id,
        recurring_charge_id: tx.links.recurring_charge_id,
        ticket_id: tx.links.ticket_id,
        created_by: tx.created_by,
        created_at: now(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    /// Grava um ticket com `created_at` controlado pelo teste.
    pub fn insert_ticket_at(&self, ticket: &NewTicket, created_at: DateTime<Utc>, id: Uuid) -> Ticket {
        let row = Ticket {
            id,
            pcn_number: ticket.pcn_number.clone(),
            vehicle_registration: ticket.vehicle_registration.clone(),
            issuer: ticket.issuer.clone(),
            reason: ticket.reason.clone(),
            amount: ticket.amount,
            currency: ticket.currency.clone(),
            status: TicketStatus::Open,
            issue_date: ticket.issue_date,
            due_date: ticket.due_date,
            notes: ticket.notes.clone(),
            created_by: ticket.created_by,
            created_at,
            updated_at: created_at,
        };
        self.state().tickets.push(row.clone());
        row
    }

    pub fn fail_installment(&self, payment_number: i32) {
        self.state().fail_installments.insert(payment_number);
    }

    pub fn fail_charge(&self, id: Uuid) {
        self.state().fail_charges.insert(id);
    }

    pub fn transactions(&self) -> Vec<FinanceTransaction> {
        self.state().transactions.clone()
    }

    pub fn installments(&self, loan_id: Uuid) -> Vec<LoanPayment> {
        let mut rows: Vec<_> = self
            .state()
            .installments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.payment_number);
        rows
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: &NewTicket) -> Result<Ticket, AppError> {
        Ok(self.insert_ticket_at(ticket, now(), Uuid::new_v4()))
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        Ok(self.state().tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn query_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, AppError> {
        let mut rows: Vec<Ticket> = self
            .state()
            .tickets
            .iter()
            .filter(|t| query.filter.matches(t))
            .filter(|t| query.cursor.is_none_or(|c| c.admits(t.created_at, t.id)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(query.fetch.max(0) as usize);
        Ok(rows)
    }

    async fn update_ticket(&self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, AppError> {
        let mut state = self.state();
        let Some(ticket) = state.tickets.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        patch.apply_to(ticket);
        ticket.updated_at = now();
        Ok(Some(ticket.clone()))
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        let before = state.tickets.len();
        state.tickets.retain(|t| t.id != id);
        let removed = state.tickets.len() < before;
        if removed {
            for tx in state.transactions.iter_mut().filter(|tx| tx.ticket_id == Some(id)) {
                tx.ticket_id = None;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_transaction(
        &self,
        tx: &NewTransaction,
        amount_net: Decimal,
    ) -> Result<FinanceTransaction, AppError> {
        let row = ledger_row(tx, amount_net);
        self.state().transactions.push(row.clone());
        Ok(row)
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<FinanceTransaction>, AppError> {
        Ok(self.state().transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinanceTransaction>, i64), AppError> {
        let rows = self.fetch_transactions(filter).await?;
        let total = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinanceTransaction>, AppError> {
        let mut rows: Vec<_> = self
            .state()
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.occurred_at, b.id).cmp(&(a.occurred_at, a.id)));
        Ok(rows)
    }

    async fn delete_transaction(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        let before = state.transactions.len();
        state.transactions.retain(|t| t.id != id);
        Ok(state.transactions.len() < before)
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert_loan(&self, loan: &NewLoan, monthly_payment: Decimal) -> Result<Loan, AppError> {
        let at = now();
        let row = Loan {
            id: Uuid::new_v4(),
            owner_id: loan.owner_id,
            lender: loan.lender.clone(),
            vehicle_registration: loan.vehicle_registration.clone(),
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            loan_term_months: loan.loan_term_months,
            monthly_payment,
            currency: loan.currency.clone(),
            start_date: loan.start_date,
            first_payment_date: loan.first_payment_date,
            status: LoanStatus::Active,
            total_paid: Decimal::ZERO,
            remaining_balance: loan.loan_amount,
            notes: loan.notes.clone(),
            created_at: at,
            updated_at: at,
        };
        self.state().loans.push(row.clone());
        Ok(row)
    }

    async fn insert_installment(
        &self,
        loan_id: Uuid,
        row: &ScheduledInstallment,
    ) -> Result<LoanPayment, AppError> {
        let mut state = self.state();
        if state.fail_installments.contains(&row.payment_number) {
            return Err(storage_error("insert_installment"));
        }
        if state
            .installments
            .iter()
            .any(|p| p.loan_id == loan_id && p.payment_number == row.payment_number)
        {
            return Err(storage_error("unique (loan_id, payment_number)"));
        }

        let at = now();
        let payment = LoanPayment {
            id: Uuid::new_v4(),
            loan_id,
            payment_number: row.payment_number,
            due_date: row.due_date,
            amount_due: row.amount_due,
            amount_paid: Decimal::ZERO,
            principal_amount: row.principal_amount,
            interest_amount: row.interest_amount,
            status: PaymentStatus::Pending,
            paid_date: None,
            payment_method: None,
            notes: None,
            created_at: at,
            updated_at: at,
        };
        state.installments.push(payment.clone());
        Ok(payment)
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, AppError> {
        Ok(self.state().loans.iter().find(|l| l.id == id).cloned())
    }

    async fn list_loans(&self, owner_id: Uuid) -> Result<Vec<Loan>, AppError> {
        let mut rows: Vec<_> = self
            .state()
            .loans
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn list_installments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>, AppError> {
        Ok(self.installments(loan_id))
    }

    async fn find_installment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<LoanPayment>, AppError> {
        Ok(self
            .state()
            .installments
            .iter()
            .find(|p| p.id == payment_id && p.loan_id == loan_id)
            .cloned())
    }

    async fn apply_payment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
        input: &PaymentInput,
        ledger: &NewTransaction,
        ledger_net: Decimal,
    ) -> Result<Option<AppliedPayment>, AppError> {
        // O lock cobre as três escritas, como a transação no Postgres.
        let mut state = self.state();
        let at = now();

        let Some(payment) = state
            .installments
            .iter_mut()
            .find(|p| p.id == payment_id && p.loan_id == loan_id && p.status != PaymentStatus::Paid)
        else {
            return Ok(None);
        };
        payment.amount_paid += input.amount;
        payment.status = if payment.amount_paid >= payment.amount_due {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        };
        payment.paid_date = Some(input.paid_date);
        if input.payment_method.is_some() {
            payment.payment_method = input.payment_method.clone();
        }
        if input.notes.is_some() {
            payment.notes = input.notes.clone();
        }
        payment.updated_at = at;
        let payment = payment.clone();

        let still_overdue = state
            .installments
            .iter()
            .any(|p| p.loan_id == loan_id && p.status == PaymentStatus::Overdue);

        let Some(loan) = state.loans.iter_mut().find(|l| l.id == loan_id) else {
            return Err(storage_error("loan vanished"));
        };
        let remaining = loan.remaining_balance - input.amount;
        loan.total_paid += input.amount;
        loan.remaining_balance = remaining.max(Decimal::ZERO);
        loan.status = if remaining <= Decimal::ZERO {
            LoanStatus::PaidOff
        } else if loan.status == LoanStatus::Overdue && !still_overdue {
            LoanStatus::Active
        } else {
            loan.status
        };
        loan.updated_at = at;
        let loan = loan.clone();

        let row = ledger_row(ledger, ledger_net);
        state.transactions.push(row.clone());

        Ok(Some(AppliedPayment { loan, payment, ledger: row }))
    }

    async fn mark_overdue(&self, today: NaiveDate) -> Result<OverdueSweep, AppError> {
        let mut state = self.state();
        let at = now();
        let mut sweep = OverdueSweep::default();

        for p in state
            .installments
            .iter_mut()
            .filter(|p| p.status == PaymentStatus::Pending && p.due_date < today)
        {
            p.status = PaymentStatus::Overdue;
            p.updated_at = at;
            sweep.payments_marked += 1;
        }

        let overdue_loans: HashSet<Uuid> = state
            .installments
            .iter()
            .filter(|p| p.status == PaymentStatus::Overdue)
            .map(|p| p.loan_id)
            .collect();

        for loan in state
            .loans
            .iter_mut()
            .filter(|l| l.status == LoanStatus::Active && overdue_loans.contains(&l.id))
        {
            loan.status = LoanStatus::Overdue;
            loan.updated_at = at;
            sweep.loans_marked += 1;
        }

        Ok(sweep)
    }

    async fn delete_loan(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        let before = state.loans.len();
        state.loans.retain(|l| l.id != id);
        if state.loans.len() == before {
            return Ok(false);
        }
        state.installments.retain(|p| p.loan_id != id);
        for tx in state.transactions.iter_mut().filter(|tx| tx.loan_id == Some(id)) {
            tx.loan_id = None;
            tx.loan_payment_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl ChargeStore for MemoryStore {
    async fn insert_charge(&self, charge: &NewRecurringCharge) -> Result<RecurringCharge, AppError> {
        let at = now();
        let row = RecurringCharge {
            id: Uuid::new_v4(),
            owner_id: charge.owner_id,
            name: charge.name.clone(),
            vendor: charge.vendor.clone(),
            amount: charge.amount,
            currency: charge.currency.clone(),
            frequency: charge.frequency,
            next_due_date: charge.next_due_date,
            status: ChargeStatus::Active,
            auto_create_transaction: charge.auto_create_transaction,
            notes: charge.notes.clone(),
            created_at: at,
            updated_at: at,
        };
        self.state().charges.push(row.clone());
        Ok(row)
    }

    async fn find_charge(&self, id: Uuid) -> Result<Option<RecurringCharge>, AppError> {
        Ok(self.state().charges.iter().find(|c| c.id == id).cloned())
    }

    async fn list_charges(&self, owner_id: Uuid) -> Result<Vec<RecurringCharge>, AppError> {
        let mut rows: Vec<_> = self
            .state()
            .charges
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.next_due_date, &a.name).cmp(&(b.next_due_date, &b.name)));
        Ok(rows)
    }

    async fn update_charge(
        &self,
        id: Uuid,
        patch: &RecurringChargePatch,
    ) -> Result<Option<RecurringCharge>, AppError> {
        let mut state = self.state();
        let Some(charge) = state.charges.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        patch.apply_to(charge);
        charge.updated_at = now();
        Ok(Some(charge.clone()))
    }

    async fn delete_charge(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        let before = state.charges.len();
        state.charges.retain(|c| c.id != id);
        let removed = state.charges.len() < before;
        if removed {
            for tx in state
                .transactions
                .iter_mut()
                .filter(|tx| tx.recurring_charge_id == Some(id))
            {
                tx.recurring_charge_id = None;
            }
        }
        Ok(removed)
    }

    async fn list_due_charges(&self, today: NaiveDate) -> Result<Vec<RecurringCharge>, AppError> {
        let mut rows: Vec<_> = self
            .state()
            .charges
            .iter()
            .filter(|c| c.is_due(today))
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.next_due_date, c.id));
        Ok(rows)
    }

    async fn fire_charge(
        &self,
        id: Uuid,
        expected_due: NaiveDate,
        next_due: NaiveDate,
        ledger: &NewTransaction,
        ledger_net: Decimal,
    ) -> Result<Option<FinanceTransaction>, AppError> {
        let mut state = self.state();
        if state.fail_charges.contains(&id) {
            return Err(storage_error("fire_charge"));
        }

        let Some(charge) = state.charges.iter_mut().find(|c| {
            c.id == id
                && c.next_due_date == expected_due
                && c.status == ChargeStatus::Active
                && c.auto_create_transaction
        }) else {
            return Ok(None);
        };
        charge.next_due_date = next_due;
        charge.updated_at = now();

        let row = ledger_row(ledger, ledger_net);
        state.transactions.push(row.clone());
        Ok(Some(row))
    }
}
