// src/domain/windows.rs
//
// Janelas de data do resumo financeiro, sempre semiabertas [start, end).

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{common::error::AppError, models::finance::DateWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPreset {
    Today,
    Yesterday,
    #[serde(alias = "this-week", alias = "this_week")]
    Week,
    #[serde(alias = "this-month", alias = "this_month")]
    Month,
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn day_after(day: NaiveDate) -> Result<NaiveDate, AppError> {
    day.checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::BusinessRule("Data fora do calendário.".into()))
}

/// Resolve o preset contra o relógio de quem chamou.
pub fn resolve_preset(preset: SummaryPreset, now: DateTime<Utc>) -> Result<DateWindow, AppError> {
    let today = now.date_naive();
    let tomorrow = day_after(today)?;

    let window = match preset {
        SummaryPreset::Today => DateWindow::bounded(start_of(today), start_of(tomorrow)),
        SummaryPreset::Yesterday => {
            let yesterday = today
                .pred_opt()
                .ok_or_else(|| AppError::BusinessRule("Data fora do calendário.".into()))?;
            DateWindow::bounded(start_of(yesterday), start_of(today))
        }
        SummaryPreset::Week => {
            // Semana começa no domingo mais recente (hoje, se hoje for domingo).
            let back = u64::from(today.weekday().num_days_from_sunday());
            let sunday = today
                .checked_sub_days(Days::new(back))
                .ok_or_else(|| AppError::BusinessRule("Data fora do calendário.".into()))?;
            DateWindow::bounded(start_of(sunday), start_of(tomorrow))
        }
        SummaryPreset::Month => {
            let first = today.with_day(1).unwrap_or(today);
            DateWindow::bounded(start_of(first), start_of(tomorrow))
        }
    };

    Ok(window)
}

/// Datas explícitas são dias inclusivos e têm precedência sobre o preset.
/// Sem nada informado: sem janela (todo o período).
pub fn resolve_window(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    preset: Option<SummaryPreset>,
    now: DateTime<Utc>,
) -> Result<Option<DateWindow>, AppError> {
    if start_date.is_some() || end_date.is_some() {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::BusinessRule(
                    "A data inicial não pode ser posterior à data final.".into(),
                ));
            }
        }
        let end = end_date.map(day_after).transpose()?.map(start_of);
        return Ok(Some(DateWindow {
            start: start_date.map(start_of),
            end,
        }));
    }

    preset.map(|p| resolve_preset(p, now)).transpose()
}
