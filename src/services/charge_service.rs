// src/services/charge_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ChargeStore,
    domain::{ledger::resolve_net, recurrence::advance},
    models::{
        finance::{
            FinanceTransaction, NewTransaction, TransactionLinks, TxnDirection, TxnSource, TxnStatus,
            TxnType,
        },
        recurring::{NewRecurringCharge, RecurringCharge, RecurringChargePatch, SyncReport},
    },
};

#[derive(Clone)]
pub struct ChargeService {
    store: Arc<dyn ChargeStore>,
}

impl ChargeService {
    pub fn new(store: Arc<dyn ChargeStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, charge: NewRecurringCharge) -> Result<RecurringCharge, AppError> {
        if charge.amount <= Decimal::ZERO {
            return Err(AppError::BusinessRule("O valor da cobrança deve ser maior que zero.".into()));
        }
        self.store.insert_charge(&charge).await
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<RecurringCharge>, AppError> {
        self.store.list_charges(owner_id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: RecurringChargePatch,
        user_id: Uuid,
    ) -> Result<RecurringCharge, AppError> {
        if patch.is_empty() {
            return Err(AppError::BusinessRule("Nenhum campo para atualizar.".into()));
        }
        if patch.amount.is_some_and(|a| a <= Decimal::ZERO) {
            return Err(AppError::BusinessRule("O valor da cobrança deve ser maior que zero.".into()));
        }

        self.owned(id, user_id).await?;
        self.store
            .update_charge(id, &patch)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("cobrança {}", id)))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.owned(id, user_id).await?;
        if !self.store.delete_charge(id).await? {
            return Err(AppError::ResourceNotFound(format!("cobrança {}", id)));
        }
        tracing::info!(charge_id = %id, "cobrança recorrente removida");
        Ok(())
    }

    /// Materializa no razão cada modelo vencido até `today` e avança o
    /// vencimento um período. Um vencimento por varredura, mesmo que vários
    /// períodos tenham passado.
    pub async fn sync_due(&self, today: NaiveDate) -> Result<SyncReport, AppError> {
        let due = self.store.list_due_charges(today).await?;
        let mut report = SyncReport::default();

        for charge in &due {
            match self.fire(charge).await {
                Ok(Some(tx)) => {
                    report.created_count += 1;
                    tracing::debug!(charge_id = %charge.id, transaction_id = %tx.id, "cobrança lançada");
                }
                Ok(None) => {
                    report.skipped_count += 1;
                    tracing::debug!(charge_id = %charge.id, "vencimento já reivindicado");
                }
                Err(e) => {
                    report.failed_count += 1;
                    tracing::warn!(charge_id = %charge.id, error = %e, "falha ao lançar cobrança recorrente");
                }
            }
        }

        tracing::info!(
            due = due.len(),
            created = report.created_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            %today,
            "sincronização de cobranças concluída"
        );
        Ok(report)
    }

    async fn fire(&self, charge: &RecurringCharge) -> Result<Option<FinanceTransaction>, AppError> {
        let next_due = advance(charge.next_due_date, charge.frequency)?;

        let ledger = NewTransaction {
            direction: TxnDirection::Out,
            txn_type: TxnType::Subscription,
            source: TxnSource::RecurringCharge,
            status: TxnStatus::Paid,
            amount_gross: charge.amount,
            fees: Decimal::ZERO,
            amount_net: None,
            currency: charge.currency.clone(),
            occurred_at: charge.next_due_date.and_time(NaiveTime::MIN).and_utc(),
            description: Some(charge.name.clone()),
            vendor: charge.vendor.clone(),
            links: TransactionLinks {
                recurring_charge_id: Some(charge.id),
                ..Default::default()
            },
            created_by: charge.owner_id,
        };
        let net = resolve_net(ledger.amount_gross, ledger.fees, None)?;

        self.store
            .fire_charge(charge.id, charge.next_due_date, next_due, &ledger, net)
            .await
    }

    async fn owned(&self, id: Uuid, user_id: Uuid) -> Result<RecurringCharge, AppError> {
        let charge = self
            .store
            .find_charge(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("cobrança {}", id)))?;

        if charge.owner_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(charge)
    }
}
