// src/db/loan_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        finance_repo::insert_transaction_with,
        store::{AppliedPayment, LoanStore},
    },
    models::{
        finance::NewTransaction,
        loan::{Loan, LoanPayment, NewLoan, OverdueSweep, PaymentInput, ScheduledInstallment},
    },
};

#[derive(Clone)]
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for LoanRepository {
    async fn insert_loan(&self, loan: &NewLoan, monthly_payment: Decimal) -> Result<Loan, AppError> {
        let row = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                owner_id, lender, vehicle_registration, loan_amount, interest_rate,
                loan_term_months, monthly_payment, currency, start_date, first_payment_date,
                remaining_balance, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $4, $11)
            RETURNING *
            "#,
        )
            .bind(loan.owner_id)
            .bind(&loan.lender)
            .bind(&loan.vehicle_registration)
            .bind(loan.loan_amount)
            .bind(loan.interest_rate)
            .bind(loan.loan_term_months)
            .bind(monthly_payment)
            .bind(&loan.currency)
            .bind(loan.start_date)
            .bind(loan.first_payment_date)
            .bind(&loan.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert_installment(
        &self,
        loan_id: Uuid,
        row: &ScheduledInstallment,
    ) -> Result<LoanPayment, AppError> {
        let payment = sqlx::query_as::<_, LoanPayment>(
            r#"
            INSERT INTO loan_payments (
                loan_id, payment_number, due_date, amount_due, principal_amount, interest_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(loan_id)
            .bind(row.payment_number)
            .bind(row.due_date)
            .bind(row.amount_due)
            .bind(row.principal_amount)
            .bind(row.interest_amount)
            .fetch_one(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, AppError> {
        let row = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_loans(&self, owner_id: Uuid) -> Result<Vec<Loan>, AppError> {
        let rows = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE owner_id = $1 ORDER BY created_at DESC, id DESC",
        )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_installments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>, AppError> {
        let rows = sqlx::query_as::<_, LoanPayment>(
            "SELECT * FROM loan_payments WHERE loan_id = $1 ORDER BY payment_number ASC",
        )
            .bind(loan_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_installment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<LoanPayment>, AppError> {
        let row = sqlx::query_as::<_, LoanPayment>(
            "SELECT * FROM loan_payments WHERE id = $1 AND loan_id = $2",
        )
            .bind(payment_id)
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn apply_payment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
        input: &PaymentInput,
        ledger: &NewTransaction,
        ledger_net: Decimal,
    ) -> Result<Option<AppliedPayment>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Só baixa parcela em aberto; a condição no WHERE resolve a corrida
        // entre dois pagamentos da mesma parcela.
        let payment = sqlx::query_as::<_, LoanPayment>(
            r#"
            UPDATE loan_payments SET
                amount_paid = amount_paid + $3,
                status = CASE
                    WHEN amount_paid + $3 >= amount_due THEN 'paid'::loan_payment_status
                    ELSE 'partial'::loan_payment_status
                END,
                paid_date = $4,
                payment_method = COALESCE($5, payment_method),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1 AND loan_id = $2 AND status <> 'paid'
            RETURNING *
            "#,
        )
            .bind(payment_id)
            .bind(loan_id)
            .bind(input.amount)
            .bind(input.paid_date)
            .bind(&input.payment_method)
            .bind(&input.notes)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Leitura e escrita do saldo no mesmo UPDATE.
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET
                total_paid = total_paid + $2,
                remaining_balance = GREATEST(remaining_balance - $2, 0),
                status = CASE
                    WHEN remaining_balance - $2 <= 0 THEN 'paid_off'::loan_status
                    WHEN status = 'overdue' AND NOT EXISTS (
                        SELECT 1 FROM loan_payments lp
                        WHERE lp.loan_id = $1 AND lp.status = 'overdue'
                    ) THEN 'active'::loan_status
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(loan_id)
            .bind(input.amount)
            .fetch_one(&mut *tx)
            .await?;

        let ledger = insert_transaction_with(&mut *tx, ledger, ledger_net).await?;

        tx.commit().await?;

        Ok(Some(AppliedPayment { loan, payment, ledger }))
    }

    async fn mark_overdue(&self, today: NaiveDate) -> Result<OverdueSweep, AppError> {
        let mut tx = self.pool.begin().await?;

        let payments = sqlx::query(
            r#"
            UPDATE loan_payments SET status = 'overdue', updated_at = NOW()
            WHERE status = 'pending' AND due_date < $1
            "#,
        )
            .bind(today)
            .execute(&mut *tx)
            .await?;

        let loans = sqlx::query(
            r#"
            UPDATE loans SET status = 'overdue', updated_at = NOW()
            WHERE status = 'active'
              AND EXISTS (
                  SELECT 1 FROM loan_payments lp
                  WHERE lp.loan_id = loans.id AND lp.status = 'overdue'
              )
            "#,
        )
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OverdueSweep {
            payments_marked: payments.rows_affected(),
            loans_marked: loans.rows_affected(),
        })
    }

    async fn delete_loan(&self, id: Uuid) -> Result<bool, AppError> {
        // Parcelas saem em cascata; lançamentos do razão ficam com loan_id nulo.
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
