use chrono::{Days, Months, NaiveDate};

use crate::{common::error::AppError, models::recurring::ChargeFrequency};

/// Próximo vencimento, sempre somado a partir do vencimento anterior
/// (nunca de "hoje"). Fim de mês é ajustado pelo chrono (31/01 -> 29/02).
pub fn advance(from: NaiveDate, frequency: ChargeFrequency) -> Result<NaiveDate, AppError> {
    let next = match frequency {
        ChargeFrequency::Weekly => from.checked_add_days(Days::new(7)),
        ChargeFrequency::Monthly => from.checked_add_months(Months::new(1)),
        ChargeFrequency::Yearly => from.checked_add_months(Months::new(12)),
    };

    next.ok_or_else(|| AppError::BusinessRule(format!("Não foi possível avançar {} ({:?}).", from, frequency)))
}
