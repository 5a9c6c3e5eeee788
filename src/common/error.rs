use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio. Nunca saem da API crus: passam por `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Identificador inválido: {0}")]
    InvalidId(String),

    #[error("Cursor de paginação inválido")]
    InvalidCursor,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Acesso negado")]
    Forbidden,

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` carrega o contexto do erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Corpo de erro que efetivamente vai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Chave da mensagem no `I18nStore`.
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::InvalidId(_) => "invalid_id",
            AppError::InvalidCursor => "invalid_cursor",
            AppError::InvalidToken | AppError::JwtError(_) => "invalid_token",
            AppError::ResourceNotFound(_) => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::BusinessRule(_) => "business_rule",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidId(_)
            | AppError::InvalidCursor => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let error = i18n.translate(&locale.0, self.message_key());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::InvalidId(raw) => Some(json!({ "value": raw })),
            AppError::ResourceNotFound(what)
            | AppError::Conflict(what)
            | AppError::BusinessRule(what) => Some(json!({ "reason": what })),
            // Falhas de storage: loga com contexto, o cliente recebe só a mensagem genérica.
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!(error = ?e, "🔥 Erro interno do servidor: {}", e);
                None
            }
            AppError::JwtError(ref e) => {
                tracing::debug!("JWT rejeitado: {}", e);
                None
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado pelos middlewares, onde ainda não há Locale resolvido.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::new())
            .into_response()
    }
}
