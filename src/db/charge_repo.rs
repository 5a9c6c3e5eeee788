// src/db/charge_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{finance_repo::insert_transaction_with, store::ChargeStore},
    models::{
        finance::{FinanceTransaction, NewTransaction},
        recurring::{NewRecurringCharge, RecurringCharge, RecurringChargePatch},
    },
};

#[derive(Clone)]
pub struct ChargeRepository {
    pool: PgPool,
}

impl ChargeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChargeStore for ChargeRepository {
    async fn insert_charge(&self, charge: &NewRecurringCharge) -> Result<RecurringCharge, AppError> {
        let row = sqlx::query_as::<_, RecurringCharge>(
            r#"
            INSERT INTO recurring_charges (
                owner_id, name, vendor, amount, currency, frequency,
                next_due_date, auto_create_transaction, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(charge.owner_id)
            .bind(&charge.name)
            .bind(&charge.vendor)
            .bind(charge.amount)
            .bind(&charge.currency)
            .bind(charge.frequency)
            .bind(charge.next_due_date)
            .bind(charge.auto_create_transaction)
            .bind(&charge.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_charge(&self, id: Uuid) -> Result<Option<RecurringCharge>, AppError> {
        let row = sqlx::query_as::<_, RecurringCharge>("SELECT * FROM recurring_charges WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_charges(&self, owner_id: Uuid) -> Result<Vec<RecurringCharge>, AppError> {
        let rows = sqlx::query_as::<_, RecurringCharge>(
            "SELECT * FROM recurring_charges WHERE owner_id = $1 ORDER BY next_due_date ASC, name ASC",
        )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_charge(
        &self,
        id: Uuid,
        patch: &RecurringChargePatch,
    ) -> Result<Option<RecurringCharge>, AppError> {
        // Um COALESCE por coluna: o patch mapeia 1:1 para o UPDATE.
        let row = sqlx::query_as::<_, RecurringCharge>(
            r#"
            UPDATE recurring_charges SET
                name = COALESCE($2, name),
                vendor = COALESCE($3, vendor),
                amount = COALESCE($4, amount),
                currency = COALESCE($5, currency),
                frequency = COALESCE($6, frequency),
                next_due_date = COALESCE($7, next_due_date),
                status = COALESCE($8, status),
                auto_create_transaction = COALESCE($9, auto_create_transaction),
                notes = COALESCE($10, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(&patch.name)
            .bind(&patch.vendor)
            .bind(patch.amount)
            .bind(&patch.currency)
            .bind(patch.frequency)
            .bind(patch.next_due_date)
            .bind(patch.status)
            .bind(patch.auto_create_transaction)
            .bind(&patch.notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn delete_charge(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recurring_charges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_due_charges(&self, today: NaiveDate) -> Result<Vec<RecurringCharge>, AppError> {
        let rows = sqlx::query_as::<_, RecurringCharge>(
            r#"
            SELECT * FROM recurring_charges
            WHERE status = 'active'
              AND auto_create_transaction
              AND next_due_date <= $1
            ORDER BY next_due_date ASC, id ASC
            "#,
        )
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

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
        let mut tx = self.pool.begin().await?;

        // Claim: só avança se ninguém avançou desde a leitura.
        let claimed = sqlx::query(
            r#"
            UPDATE recurring_charges SET next_due_date = $3, updated_at = NOW()
            WHERE id = $1
              AND next_due_date = $2
              AND status = 'active'
              AND auto_create_transaction
            "#,
        )
            .bind(id)
            .bind(expected_due)
            .bind(next_due)
            .execute(&mut *tx)
            .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = insert_transaction_with(&mut *tx, ledger, ledger_net).await?;
        tx.commit().await?;

        Ok(Some(row))
    }
}
