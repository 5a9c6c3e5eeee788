// src/domain/ledger.rs

use rust_decimal::Decimal;

use crate::{
    common::{
        error::AppError,
        money::{has_cents_precision, round2},
    },
    models::finance::{DateWindow, FinanceSummary, FinanceTransaction, TxnDirection},
};

/// `amount_net = amount_gross - fees`. Um líquido informado precisa bater com a conta.
pub fn resolve_net(
    amount_gross: Decimal,
    fees: Decimal,
    supplied: Option<Decimal>,
) -> Result<Decimal, AppError> {
    if amount_gross.is_sign_negative() && !amount_gross.is_zero() {
        return Err(AppError::BusinessRule("O valor bruto não pode ser negativo.".into()));
    }
    if fees.is_sign_negative() && !fees.is_zero() {
        return Err(AppError::BusinessRule("As taxas não podem ser negativas.".into()));
    }
    if !has_cents_precision(amount_gross) || !has_cents_precision(fees) {
        return Err(AppError::BusinessRule(
            "Bruto e taxas aceitam no máximo duas casas decimais.".into(),
        ));
    }
    if fees > amount_gross {
        return Err(AppError::BusinessRule("As taxas excedem o valor bruto.".into()));
    }

    let computed = round2(amount_gross - fees);
    match supplied {
        None => Ok(computed),
        Some(net) if round2(net) == computed => Ok(computed),
        Some(net) => Err(AppError::BusinessRule(format!(
            "Valor líquido {} difere de bruto - taxas ({}).",
            net, computed
        ))),
    }
}

/// Agrega os lançamentos já filtrados. Entrada soma em receita, saída em custo.
/// Moedas nunca se misturam: sem `currency`, o conjunto precisa ter uma só.
pub fn summarize(
    transactions: &[FinanceTransaction],
    window: Option<DateWindow>,
    currency: Option<String>,
) -> Result<FinanceSummary, AppError> {
    let currency = match currency {
        Some(code) => Some(code),
        None => {
            let first = transactions.first().map(|tx| tx.currency.clone());
            let mixed = first
                .as_deref()
                .is_some_and(|code| transactions.iter().any(|tx| tx.currency != code));
            if mixed {
                return Err(AppError::BusinessRule(
                    "Lançamentos em moedas diferentes; informe a moeda do resumo.".into(),
                ));
            }
            first
        }
    };

    let mut summary = FinanceSummary {
        currency,
        revenue: Decimal::ZERO,
        costs: Decimal::ZERO,
        profit: Decimal::ZERO,
        by_type: Default::default(),
        by_source: Default::default(),
        transaction_count: transactions.len(),
        start: window.and_then(|w| w.start),
        end: window.and_then(|w| w.end),
    };

    for tx in transactions {
        match tx.direction {
            TxnDirection::In => summary.revenue += tx.amount_net,
            TxnDirection::Out => summary.costs += tx.amount_net,
        }
        *summary
            .by_type
            .entry(tx.txn_type.as_str().to_string())
            .or_insert(Decimal::ZERO) += tx.amount_net;
        *summary
            .by_source
            .entry(tx.source.as_str().to_string())
            .or_insert(Decimal::ZERO) += tx.amount_net;
    }

    summary.revenue = round2(summary.revenue);
    summary.costs = round2(summary.costs);
    summary.profit = summary.revenue - summary.costs;
    Ok(summary)
}
