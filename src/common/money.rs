use rust_decimal::{Decimal, RoundingStrategy};
use validator::ValidationError;

/// Arredonda para centavos, meio para cima (longe do zero).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Valor já está em centavos (no máximo duas casas decimais).
pub fn has_cents_precision(value: Decimal) -> bool {
    value.normalize().scale() <= 2
}

fn cents_error() -> ValidationError {
    let mut err = ValidationError::new("precision");
    err.message = Some("O valor aceita no máximo duas casas decimais.".into());
    err
}

/// Dinheiro: não negativo e em centavos.
pub fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if !has_cents_precision(*val) {
        return Err(cents_error());
    }
    Ok(())
}

/// Dinheiro estritamente positivo e em centavos.
pub fn validate_positive_amount(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    if !has_cents_precision(*val) {
        return Err(cents_error());
    }
    Ok(())
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

/// Código ISO 4217: três letras maiúsculas.
pub fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    let mut err = ValidationError::new("currency");
    err.message = Some("A moeda deve ser um código de 3 letras (ex: GBP).".into());
    Err(err)
}
