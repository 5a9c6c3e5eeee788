// src/common/pagination.rs
//
// Duas estratégias convivem: keyset (cursor) para listas de tickets e
// offset (página/limite) para o razão financeiro.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

pub const DEFAULT_CURSOR_LIMIT: i64 = 20;
pub const MAX_CURSOR_LIMIT: i64 = 50;

pub const DEFAULT_OFFSET_LIMIT: i64 = 25;
pub const MAX_OFFSET_LIMIT: i64 = 100;
// Maior página cujo OFFSET ainda cabe em i64 com o limite máximo.
pub const MAX_PAGE: i64 = i64::MAX / MAX_OFFSET_LIMIT;

const CURSOR_DELIMITER: char = '|';

/// Limite sempre em [1, 50], independente do que o cliente pedir.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_CURSOR_LIMIT)
        .clamp(1, MAX_CURSOR_LIMIT)
}

// =============================================================================
//  KEYSET
// =============================================================================

/// Posição do último registro visto, na ordem (created_at DESC, id DESC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}{}{}",
            self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            CURSOR_DELIMITER,
            self.id
        );
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(token: &str) -> Result<Self, AppError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim().as_bytes())
            .map_err(|_| AppError::InvalidCursor)?;
        let raw = String::from_utf8(bytes).map_err(|_| AppError::InvalidCursor)?;

        let (ts, id) = raw
            .split_once(CURSOR_DELIMITER)
            .ok_or(AppError::InvalidCursor)?;

        let created_at = DateTime::parse_from_rfc3339(ts)
            .map_err(|_| AppError::InvalidCursor)?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|_| AppError::InvalidCursor)?;

        Ok(Self { created_at, id })
    }

    /// Cursor ausente ou vazio = primeira página.
    pub fn decode_optional(token: Option<&str>) -> Result<Option<Self>, AppError> {
        match token.map(str::trim) {
            None | Some("") => Ok(None),
            Some(t) => Self::decode(t).map(Some),
        }
    }

    /// Verdadeiro quando a chave vem estritamente depois do cursor (mais antiga).
    pub fn admits(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        created_at < self.created_at || (created_at == self.created_at && id < self.id)
    }
}

/// Registros paginados por keyset expõem sua chave de ordenação.
pub trait Keyed {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid);
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Keyed> CursorPage<T> {
    /// Recebe até `limit + 1` linhas; a extra só indica que há mais.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64) -> Self {
        let limit = limit.max(1) as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more {
            rows.last().map(|row| {
                let (created_at, id) = row.sort_key();
                Cursor::new(created_at, id).encode()
            })
        } else {
            None
        };

        Self { items: rows, next_cursor, has_more }
    }
}

// =============================================================================
//  OFFSET
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_OFFSET_LIMIT).clamp(1, MAX_OFFSET_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.limit - 1) / request.limit
        };
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
        }
    }
}
