// src/db/finance_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgArguments, query::QueryAs, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::store::LedgerStore,
    models::finance::{FinanceTransaction, NewTransaction, TransactionFilter},
};

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Placeholders $1..$7 usados por `bind_filter`.
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::timestamptz IS NULL OR occurred_at >= $1)
      AND ($2::timestamptz IS NULL OR occurred_at < $2)
      AND ($3::txn_type IS NULL OR txn_type = $3)
      AND ($4::txn_status IS NULL OR status = $4)
      AND ($5::txn_direction IS NULL OR direction = $5)
      AND ($6::txn_source IS NULL OR source = $6)
      AND ($7::text IS NULL OR currency = $7)
"#;

fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &TransactionFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.window.and_then(|w| w.start))
        .bind(filter.window.and_then(|w| w.end))
        .bind(filter.txn_type)
        .bind(filter.status)
        .bind(filter.direction)
        .bind(filter.source)
        .bind(filter.currency.clone())
}

/// Grava um lançamento em qualquer executor (pool ou transação aberta).
/// Empréstimos e cobranças recorrentes chamam isto dentro da própria transação.
pub async fn insert_transaction_with<'e, E>(
    executor: E,
    tx: &NewTransaction,
    amount_net: Decimal,
) -> Result<FinanceTransaction, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, FinanceTransaction>(
        r#"
        INSERT INTO finance_transactions (
            direction, txn_type, source, status,
            amount_gross, fees, amount_net, currency,
            occurred_at, description, vendor,
            booking_id, agreement_id, loan_id, loan_payment_id, recurring_charge_id, ticket_id,
            created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING *
        "#,
    )
        .bind(tx.direction)
        .bind(tx.txn_type)
        .bind(tx.source)
        .bind(tx.status)
        .bind(tx.amount_gross)
        .bind(tx.fees)
        .bind(amount_net)
        .bind(&tx.currency)
        .bind(tx.occurred_at)
        .bind(&tx.description)
        .bind(&tx.vendor)
        .bind(tx.links.booking_id)
        .bind(tx.links.agreement_id)
        .bind(tx.links.loan_id)
        .bind(tx.links.loan_payment_id)
        .bind(tx.links.recurring_charge_id)
        .bind(tx.links.ticket_id)
        .bind(tx.created_by)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

#[async_trait]
impl LedgerStore for FinanceRepository {
    async fn insert_transaction(
        &self,
        tx: &NewTransaction,
        amount_net: Decimal,
    ) -> Result<FinanceTransaction, AppError> {
        insert_transaction_with(&self.pool, tx, amount_net).await
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<FinanceTransaction>, AppError> {
        let row = sqlx::query_as::<_, FinanceTransaction>(
            "SELECT * FROM finance_transactions WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinanceTransaction>, i64), AppError> {
        let count_sql = format!("SELECT COUNT(*) FROM finance_transactions {}", FILTER_CLAUSE);
        let (total,) = bind_filter(sqlx::query_as::<_, (i64,)>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT * FROM finance_transactions {} ORDER BY occurred_at DESC, id DESC LIMIT $8 OFFSET $9",
            FILTER_CLAUSE
        );
        let rows = bind_filter(sqlx::query_as::<_, FinanceTransaction>(&list_sql), filter)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinanceTransaction>, AppError> {
        let sql = format!(
            "SELECT * FROM finance_transactions {} ORDER BY occurred_at DESC, id DESC",
            FILTER_CLAUSE
        );
        let rows = bind_filter(sqlx::query_as::<_, FinanceTransaction>(&sql), filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn delete_transaction(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM finance_transactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
