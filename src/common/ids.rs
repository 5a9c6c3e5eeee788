// Único ponto onde um identificador vindo do cliente vira `Uuid`.

use uuid::Uuid;

use crate::common::error::AppError;

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}

pub fn is_valid_id(raw: &str) -> bool {
    parse_id(raw).is_ok()
}
