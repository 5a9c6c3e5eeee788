// src/services/finance_service.rs

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{OffsetPage, PageRequest},
    },
    db::LedgerStore,
    domain::{
        ledger::{resolve_net, summarize},
        windows::{resolve_window, SummaryPreset},
    },
    models::finance::{
        FinanceSummary, FinanceTransaction, NewTransaction, TransactionFilter, TxnDirection,
        TxnSource, TxnStatus, TxnType,
    },
};

/// Parâmetros do resumo: janela (datas ou preset) mais filtros categóricos.
#[derive(Debug, Clone, Default)]
pub struct SummaryRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub preset: Option<SummaryPreset>,
    pub txn_type: Option<TxnType>,
    /// Sem status explícito, só lançamentos pagos entram na conta.
    pub status: Option<TxnStatus>,
    pub direction: Option<TxnDirection>,
    pub source: Option<TxnSource>,
    /// Obrigatória quando o período tem lançamentos em mais de uma moeda.
    pub currency: Option<String>,
}

#[derive(Clone)]
pub struct FinanceService {
    store: Arc<dyn LedgerStore>,
}

impl FinanceService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, tx: NewTransaction) -> Result<FinanceTransaction, AppError> {
        let net = resolve_net(tx.amount_gross, tx.fees, tx.amount_net)?;
        self.store.insert_transaction(&tx, net).await
    }

    pub async fn summarize(
        &self,
        request: SummaryRequest,
        now: DateTime<Utc>,
    ) -> Result<FinanceSummary, AppError> {
        let window = resolve_window(request.start_date, request.end_date, request.preset, now)?;

        let filter = TransactionFilter {
            window,
            txn_type: request.txn_type,
            status: Some(request.status.unwrap_or(TxnStatus::Paid)),
            direction: request.direction,
            source: request.source,
            currency: request.currency,
        };

        let rows = self.store.fetch_transactions(&filter).await?;
        summarize(&rows, window, filter.currency.clone())
    }

    pub async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<FinanceTransaction>, AppError> {
        let (items, total) = self.store.list_transactions(&filter, page).await?;
        Ok(OffsetPage::new(items, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<FinanceTransaction, AppError> {
        self.store
            .find_transaction(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("transação {}", id)))
    }

    /// Correção administrativa: apaga de vez. Só quem lançou pode apagar.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let tx = self.get(id).await?;
        if tx.created_by != user_id {
            return Err(AppError::Forbidden);
        }

        if !self.store.delete_transaction(id).await? {
            return Err(AppError::ResourceNotFound(format!("transação {}", id)));
        }
        tracing::info!(transaction_id = %id, "lançamento removido");
        Ok(())
    }
}
