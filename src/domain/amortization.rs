// src/domain/amortization.rs
//
// Tabela Price: parcela fixa, juros sobre o saldo devedor.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};

use crate::{
    common::{error::AppError, money::round2},
    models::loan::ScheduledInstallment,
};

const MONTHS_PER_YEAR: i32 = 12;

/// Taxa anual em % -> taxa mensal decimal (6 -> 0.005).
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(MONTHS_PER_YEAR)
}

pub fn compute_monthly_payment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: i32,
) -> Result<Decimal, AppError> {
    if term_months <= 0 {
        return Err(AppError::BusinessRule("O prazo deve ter ao menos 1 mês.".into()));
    }
    if annual_rate_percent.is_sign_negative() && !annual_rate_percent.is_zero() {
        return Err(AppError::BusinessRule("A taxa de juros não pode ser negativa.".into()));
    }

    let term = Decimal::from(term_months);
    let rate = monthly_rate(annual_rate_percent);

    // Sem juros a fórmula fechada divide por zero.
    if rate.is_zero() {
        return Ok(round2(principal / term));
    }

    let growth = (Decimal::ONE + rate)
        .checked_powi(i64::from(term_months))
        .ok_or_else(|| AppError::BusinessRule("Prazo ou taxa fora do intervalo suportado.".into()))?;

    let payment = principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(growth - Decimal::ONE))
        .ok_or_else(|| AppError::BusinessRule("Prazo ou taxa fora do intervalo suportado.".into()))?;

    Ok(round2(payment))
}

/// Gera o cronograma: parcela `i` vence `first_payment_date + (i - 1)` meses.
/// A última parcela absorve o resíduo de arredondamento e zera o saldo.
pub fn generate_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: i32,
    payment: Decimal,
    first_payment_date: NaiveDate,
) -> Result<Vec<ScheduledInstallment>, AppError> {
    if term_months <= 0 {
        return Err(AppError::BusinessRule("O prazo deve ter ao menos 1 mês.".into()));
    }
    if principal <= Decimal::ZERO {
        return Err(AppError::BusinessRule("O valor financiado deve ser positivo.".into()));
    }

    let rate = monthly_rate(annual_rate_percent);
    let mut balance = round2(principal);
    let mut schedule = Vec::with_capacity(term_months as usize);

    for number in 1..=term_months {
        let due_date = first_payment_date
            .checked_add_months(Months::new((number - 1) as u32))
            .ok_or_else(|| AppError::BusinessRule("Data de vencimento fora do calendário.".into()))?;

        let interest_amount = round2(balance * rate);
        let principal_amount = if number == term_months {
            balance
        } else {
            (payment - interest_amount).clamp(Decimal::ZERO, balance)
        };

        balance -= principal_amount;

        schedule.push(ScheduledInstallment {
            payment_number: number,
            due_date,
            amount_due: principal_amount + interest_amount,
            principal_amount,
            interest_amount,
            balance_after: balance,
        });
    }

    Ok(schedule)
}
