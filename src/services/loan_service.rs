// src/services/loan_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::round2},
    db::LoanStore,
    domain::{
        amortization::{compute_monthly_payment, generate_schedule, monthly_rate},
        ledger::resolve_net,
    },
    models::{
        finance::{NewTransaction, TransactionLinks, TxnDirection, TxnSource, TxnStatus, TxnType},
        loan::{
            Loan, LoanStatus, LoanWithSchedule, NewLoan, OverdueSweep, PaymentInput, PaymentReceipt,
            PaymentStatus,
        },
    },
};

#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LoanStore>,
}

impl LoanService {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// Grava o empréstimo e depois o cronograma, parcela a parcela.
    /// Uma parcela que falha é registrada e contada; as demais seguem.
    pub async fn create(&self, loan: NewLoan) -> Result<LoanWithSchedule, AppError> {
        if loan.loan_amount <= Decimal::ZERO {
            return Err(AppError::BusinessRule("O valor financiado deve ser positivo.".into()));
        }

        let monthly_payment = match loan.monthly_payment {
            Some(p) if p <= Decimal::ZERO => {
                return Err(AppError::BusinessRule("A parcela deve ser maior que zero.".into()));
            }
            Some(p) => {
                // Parcela que não cobre os juros do 1º mês nunca amortiza.
                let first_interest = round2(loan.loan_amount * monthly_rate(loan.interest_rate));
                if round2(p) <= first_interest {
                    return Err(AppError::BusinessRule(format!(
                        "A parcela {} não cobre os juros do primeiro mês ({}).",
                        p, first_interest
                    )));
                }
                round2(p)
            }
            None => compute_monthly_payment(loan.loan_amount, loan.interest_rate, loan.loan_term_months)?,
        };

        let schedule = generate_schedule(
            loan.loan_amount,
            loan.interest_rate,
            loan.loan_term_months,
            monthly_payment,
            loan.first_payment_date,
        )?;

        let record = self.store.insert_loan(&loan, monthly_payment).await?;

        let mut payments = Vec::with_capacity(schedule.len());
        let mut schedule_failed = 0;
        for row in &schedule {
            match self.store.insert_installment(record.id, row).await {
                Ok(payment) => payments.push(payment),
                Err(e) => {
                    schedule_failed += 1;
                    tracing::warn!(
                        loan_id = %record.id,
                        payment_number = row.payment_number,
                        error = %e,
                        "falha ao gravar parcela do cronograma"
                    );
                }
            }
        }

        tracing::info!(
            loan_id = %record.id,
            installments = payments.len(),
            failed = schedule_failed,
            "empréstimo criado"
        );

        Ok(LoanWithSchedule { loan: record, payments, schedule_failed })
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Loan>, AppError> {
        self.store.list_loans(owner_id).await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<LoanWithSchedule, AppError> {
        let loan = self.owned(id, user_id).await?;
        let payments = self.store.list_installments(id).await?;
        Ok(LoanWithSchedule { loan, payments, schedule_failed: 0 })
    }

    /// Baixa uma parcela e espelha o pagamento no razão (saída / loan_payment).
    pub async fn record_payment(
        &self,
        loan_id: Uuid,
        payment_id: Uuid,
        input: PaymentInput,
        user_id: Uuid,
    ) -> Result<PaymentReceipt, AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BusinessRule("O valor pago deve ser maior que zero.".into()));
        }
        let input = PaymentInput { amount: round2(input.amount), ..input };

        let loan = self.owned(loan_id, user_id).await?;
        if loan.status == LoanStatus::PaidOff {
            return Err(AppError::Conflict("Empréstimo já quitado.".into()));
        }

        let installment = self
            .store
            .find_installment(loan_id, payment_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("parcela {}", payment_id)))?;
        if installment.status == PaymentStatus::Paid {
            return Err(AppError::Conflict("Parcela já paga.".into()));
        }

        let ledger = NewTransaction {
            direction: TxnDirection::Out,
            txn_type: TxnType::LoanPayment,
            source: TxnSource::Loan,
            status: TxnStatus::Paid,
            amount_gross: input.amount,
            fees: Decimal::ZERO,
            amount_net: None,
            currency: loan.currency.clone(),
            occurred_at: start_of_day(input.paid_date),
            description: Some(format!("Parcela {} - {}", installment.payment_number, loan.lender)),
            vendor: Some(loan.lender.clone()),
            links: TransactionLinks {
                loan_id: Some(loan_id),
                loan_payment_id: Some(payment_id),
                ..Default::default()
            },
            created_by: user_id,
        };
        let net = resolve_net(ledger.amount_gross, ledger.fees, None)?;

        // Outro pagamento pode ter quitado a parcela entre a leitura e aqui.
        let applied = self
            .store
            .apply_payment(loan_id, payment_id, &input, &ledger, net)
            .await?
            .ok_or_else(|| AppError::Conflict("Parcela já paga.".into()))?;

        tracing::info!(
            loan_id = %loan_id,
            payment_id = %payment_id,
            amount = %input.amount,
            status = ?applied.payment.status,
            "pagamento de parcela registrado"
        );

        Ok(PaymentReceipt {
            loan: applied.loan,
            payment: applied.payment,
            ledger_transaction_id: applied.ledger.id,
        })
    }

    /// Varredura idempotente: pode rodar quantas vezes quiser.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<OverdueSweep, AppError> {
        let sweep = self.store.mark_overdue(today).await?;
        tracing::info!(
            payments = sweep.payments_marked,
            loans = sweep.loans_marked,
            %today,
            "varredura de atraso concluída"
        );
        Ok(sweep)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.owned(id, user_id).await?;
        if !self.store.delete_loan(id).await? {
            return Err(AppError::ResourceNotFound(format!("empréstimo {}", id)));
        }
        tracing::info!(loan_id = %id, "empréstimo removido");
        Ok(())
    }

    async fn owned(&self, id: Uuid, user_id: Uuid) -> Result<Loan, AppError> {
        let loan = self
            .store
            .find_loan(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("empréstimo {}", id)))?;

        if loan.owner_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(loan)
    }
}

fn start_of_day(day: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use rust_decimal::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_loan(owner_id: Uuid, amount: Decimal, rate: Decimal, term: i32) -> NewLoan {
        NewLoan {
            owner_id,
            lender: "Black Horse Finance".into(),
            vehicle_registration: Some("AB12 CDE".into()),
            loan_amount: amount,
            interest_rate: rate,
            loan_term_months: term,
            monthly_payment: None,
            currency: "GBP".into(),
            start_date: date(2024, 1, 1),
            first_payment_date: date(2024, 2, 1),
            notes: None,
        }
    }

    fn payment(amount: Decimal, day: NaiveDate) -> PaymentInput {
        PaymentInput { amount, paid_date: day, payment_method: Some("bank_transfer".into()), notes: None }
    }

    fn setup() -> (Arc<MemoryStore>, LoanService) {
        let store = Arc::new(MemoryStore::new());
        let service = LoanService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn creation_derives_payment_and_writes_the_schedule() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();

        let created = service.create(new_loan(owner, dec!(12000), dec!(6), 12)).await.unwrap();
        assert_eq!(created.loan.monthly_payment, dec!(1032.80));
        assert_eq!(created.loan.remaining_balance, dec!(12000));
        assert_eq!(created.payments.len(), 12);
        assert_eq!(created.schedule_failed, 0);

        let first = &created.payments[0];
        assert_eq!(first.payment_number, 1);
        assert_eq!(first.interest_amount, dec!(60.00));
        assert_eq!(first.principal_amount, dec!(972.80));
        assert_eq!(first.due_date, date(2024, 2, 1));

        let repaid: Decimal = created.payments.iter().map(|p| p.principal_amount).sum();
        assert_eq!(repaid, dec!(12000));
    }

    #[tokio::test]
    async fn supplied_payment_must_outgrow_the_first_interest() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();

        // 12000 a 6% a.a.: juros do 1º mês = 60.00
        for too_low in [dec!(60.00), dec!(59.99), dec!(1)] {
            let mut loan = new_loan(owner, dec!(12000), dec!(6), 12);
            loan.monthly_payment = Some(too_low);
            assert!(matches!(service.create(loan).await, Err(AppError::BusinessRule(_))));
        }
        assert!(service.list(owner).await.unwrap().is_empty());

        let mut loan = new_loan(owner, dec!(12000), dec!(6), 12);
        loan.monthly_payment = Some(dec!(1100));
        let created = service.create(loan).await.unwrap();
        assert_eq!(created.loan.monthly_payment, dec!(1100));
        assert_eq!(created.payments[0].principal_amount, dec!(1040.00));
    }

    #[tokio::test]
    async fn one_failed_installment_does_not_abort_the_batch() {
        let (store, service) = setup();
        store.fail_installment(4);

        let created = service
            .create(new_loan(Uuid::new_v4(), dec!(1200), Decimal::ZERO, 6))
            .await
            .unwrap();
        assert_eq!(created.schedule_failed, 1);
        assert_eq!(created.payments.len(), 5);
        assert!(created.payments.iter().all(|p| p.payment_number != 4));
    }

    #[tokio::test]
    async fn full_payment_marks_paid_and_mirrors_to_the_ledger() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(12000), dec!(6), 12)).await.unwrap();
        let first = &created.payments[0];

        let receipt = service
            .record_payment(created.loan.id, first.id, payment(dec!(1032.80), date(2024, 2, 1)), owner)
            .await
            .unwrap();

        assert_eq!(receipt.payment.status, PaymentStatus::Paid);
        assert_eq!(receipt.loan.total_paid, dec!(1032.80));
        assert_eq!(receipt.loan.remaining_balance, dec!(10967.20));
        assert_eq!(receipt.loan.status, LoanStatus::Active);

        let ledger = store.transactions();
        assert_eq!(ledger.len(), 1);
        let row = &ledger[0];
        assert_eq!(row.id, receipt.ledger_transaction_id);
        assert_eq!(row.direction, TxnDirection::Out);
        assert_eq!(row.txn_type, TxnType::LoanPayment);
        assert_eq!(row.source, TxnSource::Loan);
        assert_eq!(row.amount_net, dec!(1032.80));
        assert_eq!(row.loan_payment_id, Some(first.id));
    }

    #[tokio::test]
    async fn short_final_payment_is_partial_and_loan_stays_active() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();
        let last = created.payments.last().unwrap();

        let receipt = service
            .record_payment(created.loan.id, last.id, payment(dec!(50), date(2024, 4, 1)), owner)
            .await
            .unwrap();

        assert_eq!(receipt.payment.status, PaymentStatus::Partial);
        assert_eq!(receipt.payment.amount_paid, dec!(50));
        assert_eq!(receipt.loan.status, LoanStatus::Active);
        assert_eq!(receipt.loan.remaining_balance, dec!(250));
    }

    #[tokio::test]
    async fn partial_payments_accumulate_until_paid() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();
        let first = &created.payments[0];

        service
            .record_payment(created.loan.id, first.id, payment(dec!(60), date(2024, 2, 1)), owner)
            .await
            .unwrap();
        let receipt = service
            .record_payment(created.loan.id, first.id, payment(dec!(40), date(2024, 2, 3)), owner)
            .await
            .unwrap();

        assert_eq!(receipt.payment.amount_paid, dec!(100));
        assert_eq!(receipt.payment.status, PaymentStatus::Paid);
        assert_eq!(receipt.loan.total_paid, dec!(100));

        let again = service
            .record_payment(created.loan.id, first.id, payment(dec!(1), date(2024, 2, 4)), owner)
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn paying_everything_closes_the_loan() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();

        let mut last = None;
        for p in &created.payments {
            last = Some(
                service
                    .record_payment(created.loan.id, p.id, payment(p.amount_due, p.due_date), owner)
                    .await
                    .unwrap(),
            );
        }

        let receipt = last.unwrap();
        assert_eq!(receipt.loan.remaining_balance, Decimal::ZERO);
        assert_eq!(receipt.loan.total_paid, dec!(300));
        assert_eq!(receipt.loan.status, LoanStatus::PaidOff);
    }

    #[tokio::test]
    async fn overdue_sweep_is_idempotent() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(1200), Decimal::ZERO, 12)).await.unwrap();
        let today = date(2024, 5, 15);

        let first = service.mark_overdue(today).await.unwrap();
        // Vencem 01/02, 01/03, 01/04 e 01/05.
        assert_eq!(first, OverdueSweep { payments_marked: 4, loans_marked: 1 });
        let after_first = service.get(created.loan.id, owner).await.unwrap();

        let second = service.mark_overdue(today).await.unwrap();
        assert_eq!(second, OverdueSweep::default());
        let after_second = service.get(created.loan.id, owner).await.unwrap();

        assert_eq!(after_second.loan.status, LoanStatus::Overdue);
        let statuses = |l: &LoanWithSchedule| l.payments.iter().map(|p| p.status).collect::<Vec<_>>();
        assert_eq!(statuses(&after_first), statuses(&after_second));
        assert_eq!(after_first.loan.status, after_second.loan.status);
    }

    #[tokio::test]
    async fn settling_every_overdue_installment_reactivates_the_loan() {
        let (store, service) = setup();
        let owner = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();
        let first = &created.payments[0];

        service.mark_overdue(date(2024, 2, 10)).await.unwrap();
        assert_eq!(store.installments(created.loan.id)[0].status, PaymentStatus::Overdue);

        let receipt = service
            .record_payment(created.loan.id, first.id, payment(dec!(100), date(2024, 2, 10)), owner)
            .await
            .unwrap();
        assert_eq!(receipt.loan.status, LoanStatus::Active);
    }

    #[tokio::test]
    async fn strangers_cannot_touch_a_loan() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();
        let first = &created.payments[0];

        assert!(matches!(service.get(created.loan.id, stranger).await, Err(AppError::Forbidden)));
        assert!(matches!(
            service
                .record_payment(created.loan.id, first.id, payment(dec!(100), date(2024, 2, 1)), stranger)
                .await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(service.delete(created.loan.id, stranger).await, Err(AppError::Forbidden)));
        assert!(service.list(stranger).await.unwrap().is_empty());

        service.delete(created.loan.id, owner).await.unwrap();
        assert!(matches!(service.get(created.loan.id, owner).await, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn invalid_loans_and_payments_are_rejected() {
        let (_store, service) = setup();
        let owner = Uuid::new_v4();

        assert!(service.create(new_loan(owner, Decimal::ZERO, dec!(5), 12)).await.is_err());
        assert!(service.create(new_loan(owner, dec!(1000), dec!(5), 0)).await.is_err());

        let created = service.create(new_loan(owner, dec!(300), Decimal::ZERO, 3)).await.unwrap();
        let first = &created.payments[0];
        assert!(service
            .record_payment(created.loan.id, first.id, payment(Decimal::ZERO, date(2024, 2, 1)), owner)
            .await
            .is_err());
        assert!(matches!(
            service
                .record_payment(created.loan.id, Uuid::new_v4(), payment(dec!(10), date(2024, 2, 1)), owner)
                .await,
            Err(AppError::ResourceNotFound(_))
        ));
    }
}
