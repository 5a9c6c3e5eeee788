// src/services/ticket_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{clamp_limit, Cursor, CursorPage},
    },
    db::TicketStore,
    models::ticket::{NewTicket, Ticket, TicketFilter, TicketPatch, TicketQuery},
};

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, ticket: NewTicket) -> Result<Ticket, AppError> {
        if ticket.amount < Decimal::ZERO {
            return Err(AppError::BusinessRule("O valor da multa não pode ser negativo.".into()));
        }
        self.store.insert_ticket(&ticket).await
    }

    /// Página keyset: busca `limit + 1` para saber se há mais.
    pub async fn paginate(
        &self,
        limit: Option<i64>,
        cursor: Option<&str>,
        filter: TicketFilter,
    ) -> Result<CursorPage<Ticket>, AppError> {
        let limit = clamp_limit(limit);
        let cursor = Cursor::decode_optional(cursor)?;

        let rows = self
            .store
            .query_tickets(&TicketQuery { filter, cursor, fetch: limit + 1 })
            .await?;

        Ok(CursorPage::from_overfetch(rows, limit))
    }

    pub async fn get(&self, id: Uuid) -> Result<Ticket, AppError> {
        self.store
            .find_ticket(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("ticket {}", id)))
    }

    pub async fn update(&self, id: Uuid, patch: TicketPatch) -> Result<Ticket, AppError> {
        if patch.is_empty() {
            return Err(AppError::BusinessRule("Nenhum campo para atualizar.".into()));
        }
        if patch.amount.is_some_and(|a| a < Decimal::ZERO) {
            return Err(AppError::BusinessRule("O valor da multa não pode ser negativo.".into()));
        }

        self.store
            .update_ticket(id, &patch)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("ticket {}", id)))
    }

    /// Só quem registrou o ticket pode apagá-lo.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let ticket = self.get(id).await?;
        if ticket.created_by != user_id {
            return Err(AppError::Forbidden);
        }

        if !self.store.delete_ticket(id).await? {
            return Err(AppError::ResourceNotFound(format!("ticket {}", id)));
        }
        tracing::info!(ticket_id = %id, "ticket removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::MemoryStore, models::ticket::TicketStatus};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::dec;
    use std::collections::HashSet;

    fn new_ticket(n: u32, owner: Uuid) -> NewTicket {
        NewTicket {
            pcn_number: format!("WM{:08}", n),
            vehicle_registration: if n % 2 == 0 { "AB12 CDE".into() } else { "XY70 ZZZ".into() },
            issuer: "Westminster City Council".into(),
            reason: None,
            amount: dec!(130),
            currency: "GBP".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: None,
            notes: None,
            created_by: owner,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, TicketService) {
        let store = Arc::new(MemoryStore::new());
        let service = TicketService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn ten_tickets_come_back_newest_first_in_two_pages() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        for d in 1..=10 {
            store.insert_ticket_at(&new_ticket(d, owner), day(d), Uuid::new_v4());
        }

        let first = service.paginate(Some(5), None, TicketFilter::default()).await.unwrap();
        let days: Vec<_> = first.items.iter().map(|t| t.created_at).collect();
        assert_eq!(days, (6..=10).rev().map(day).collect::<Vec<_>>());
        assert!(first.has_more);
        let cursor = first.next_cursor.expect("first page has a cursor");

        let second = service
            .paginate(Some(5), Some(&cursor), TicketFilter::default())
            .await
            .unwrap();
        let days: Vec<_> = second.items.iter().map(|t| t.created_at).collect();
        assert_eq!(days, (1..=5).rev().map(day).collect::<Vec<_>>());
        assert!(!second.has_more);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn shared_timestamps_are_paged_without_gaps_or_repeats() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        let mut expected = HashSet::new();
        for n in 0..7 {
            let t = store.insert_ticket_at(&new_ticket(n, owner), day(3), Uuid::new_v4());
            expected.insert(t.id);
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = service
                .paginate(Some(3), cursor.as_deref(), TicketFilter::default())
                .await
                .unwrap();
            seen.extend(page.items.iter().map(|t| t.id));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 7);
        assert_eq!(seen.iter().copied().collect::<HashSet<_>>(), expected);
        // Dentro do mesmo instante, id decrescente.
        let mut sorted = seen.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, sorted);
    }

    #[tokio::test]
    async fn newer_inserts_never_leak_into_later_pages() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        for d in 1..=6 {
            store.insert_ticket_at(&new_ticket(d, owner), day(d), Uuid::new_v4());
        }

        let first = service.paginate(Some(3), None, TicketFilter::default()).await.unwrap();
        let newcomer = store.insert_ticket_at(&new_ticket(99, owner), day(20), Uuid::new_v4());

        let second = service
            .paginate(Some(3), first.next_cursor.as_deref(), TicketFilter::default())
            .await
            .unwrap();
        assert!(second.items.iter().all(|t| t.id != newcomer.id));
        assert_eq!(second.items.len(), 3);
    }

    #[tokio::test]
    async fn limit_is_clamped_and_bad_cursors_are_rejected() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        for d in 1..=3 {
            store.insert_ticket_at(&new_ticket(d, owner), day(d), Uuid::new_v4());
        }

        let page = service.paginate(Some(0), None, TicketFilter::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.has_more);

        let page = service.paginate(Some(10_000), None, TicketFilter::default()).await.unwrap();
        assert_eq!(page.items.len(), 3);

        let err = service
            .paginate(None, Some("not-a-cursor"), TicketFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCursor));
    }

    #[tokio::test]
    async fn filters_and_cursor_are_combined() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        for d in 1..=8 {
            store.insert_ticket_at(&new_ticket(d, owner), day(d), Uuid::new_v4());
        }

        let filter = TicketFilter {
            search_term: Some("ab12".into()),
            ..Default::default()
        };
        let first = service.paginate(Some(2), None, filter.clone()).await.unwrap();
        let second = service
            .paginate(Some(2), first.next_cursor.as_deref(), filter)
            .await
            .unwrap();

        let all: Vec<_> = first.items.iter().chain(second.items.iter()).collect();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|t| t.vehicle_registration == "AB12 CDE"));
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let ticket = service.create(new_ticket(1, owner)).await.unwrap();

        let patched = service
            .update(
                ticket.id,
                TicketPatch { status: Some(TicketStatus::Appealed), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(patched.status, TicketStatus::Appealed);
        assert_eq!(patched.amount, ticket.amount);

        assert!(service.update(ticket.id, TicketPatch::default()).await.is_err());
        assert!(matches!(
            service.update(Uuid::new_v4(), TicketPatch { amount: Some(dec!(1)), ..Default::default() }).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_the_creator_deletes() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let ticket = service.create(new_ticket(1, owner)).await.unwrap();

        assert!(matches!(
            service.delete(ticket.id, Uuid::new_v4()).await,
            Err(AppError::Forbidden)
        ));
        service.delete(ticket.id, owner).await.unwrap();
        assert!(matches!(service.get(ticket.id).await, Err(AppError::ResourceNotFound(_))));
    }
}
