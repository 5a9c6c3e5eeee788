// src/db/ticket_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::TicketStore,
    models::ticket::{NewTicket, Ticket, TicketPatch, TicketQuery},
};

#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapa os curingas do LIKE para que a busca seja literal.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl TicketStore for TicketRepository {
    async fn insert_ticket(&self, ticket: &NewTicket) -> Result<Ticket, AppError> {
        let row = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO pcn_tickets (
                pcn_number, vehicle_registration, issuer, reason,
                amount, currency, issue_date, due_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(&ticket.pcn_number)
            .bind(&ticket.vehicle_registration)
            .bind(&ticket.issuer)
            .bind(&ticket.reason)
            .bind(ticket.amount)
            .bind(&ticket.currency)
            .bind(ticket.issue_date)
            .bind(ticket.due_date)
            .bind(&ticket.notes)
            .bind(ticket.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, Ticket>("SELECT * FROM pcn_tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn query_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, AppError> {
        let filter = &query.filter;
        let search = filter
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM pcn_tickets
            WHERE ($1::ticket_status IS NULL OR status = $1)
              AND ($2::text IS NULL
                   OR pcn_number ILIKE $2
                   OR vehicle_registration ILIKE $2
                   OR issuer ILIKE $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
              AND ($5::timestamptz IS NULL OR (created_at, id) < ($5, $6::uuid))
            ORDER BY created_at DESC, id DESC
            LIMIT $7
            "#,
        )
            .bind(filter.status)
            .bind(search)
            .bind(filter.created_from)
            .bind(filter.created_before)
            .bind(query.cursor.map(|c| c.created_at))
            .bind(query.cursor.map(|c| c.id))
            .bind(query.fetch)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_ticket(&self, id: Uuid, patch: &TicketPatch) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE pcn_tickets SET
                status = COALESCE($2, status),
                amount = COALESCE($3, amount),
                due_date = COALESCE($4, due_date),
                reason = COALESCE($5, reason),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(patch.status)
            .bind(patch.amount)
            .bind(patch.due_date)
            .bind(&patch.reason)
            .bind(&patch.notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pcn_tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
