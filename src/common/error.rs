// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::middleware::i18n::Locale;

// Taxonomia interna de erros. Erros de validação nunca são logados como exceção;
// erros de banco e internos viram 500 e são logados.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erro de campo único (ex: formulário de projeto)
    #[error("Campo inválido: {field}")]
    FieldValidation { field: String, code: &'static str },

    #[error("Código de projeto duplicado: {0}")]
    DuplicateProjectCode(String),

    #[error("Motivo de recusa vazio")]
    EmptyRejectionReason,

    #[error("Aprovador inválido")]
    InvalidApprover,

    #[error("Transição de status inválida: {0}")]
    InvalidStatusTransition(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Permissão negada: {0}")]
    PermissionDenied(String),

    #[error("Contexto da empresa ausente")]
    MissingCompanyContext,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O formato que vai para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
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

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::FieldValidation { .. }
            | AppError::EmptyRejectionReason
            | AppError::InvalidApprover => StatusCode::BAD_REQUEST,
            AppError::DuplicateProjectCode(_)
            | AppError::EmailAlreadyExists
            | AppError::InvalidStatusTransition(_) => StatusCode::CONFLICT,
            AppError::ResourceNotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::MissingCompanyContext => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para o idioma da requisição.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&e.code);
                            store.translate(lang, key)
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status,
                    error: store.translate(lang, "validation_failed"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::FieldValidation { field, code } => {
                let mut details = serde_json::Map::new();
                details.insert(field, json!([store.translate(lang, code)]));
                ApiError {
                    status,
                    error: store.translate(lang, "validation_failed"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::DuplicateProjectCode(code) => ApiError {
                status,
                error: store.translate(lang, "validation_failed"),
                details: Some(json!({
                    "code": [store.translate_with(lang, "duplicate_project_code", &code)]
                })),
            },
            AppError::EmptyRejectionReason => {
                ApiError::new(status, store.translate(lang, "empty_rejection_reason"))
            }
            AppError::InvalidApprover => {
                ApiError::new(status, store.translate(lang, "invalid_approver"))
            }
            AppError::InvalidStatusTransition(current) => ApiError::new(
                status,
                store.translate_with(lang, "invalid_status_transition", &current),
            ),
            AppError::ResourceNotFound(what) => {
                ApiError::new(status, store.translate_with(lang, "not_found", &what))
            }
            AppError::PermissionDenied(slug) => {
                ApiError::new(status, store.translate_with(lang, "permission_denied", &slug))
            }
            AppError::MissingCompanyContext => {
                ApiError::new(status, store.translate(lang, "missing_company_context"))
            }
            AppError::EmailAlreadyExists => {
                ApiError::new(status, store.translate(lang, "email_already_exists"))
            }
            AppError::InvalidCredentials => {
                ApiError::new(status, store.translate(lang, "invalid_credentials"))
            }
            AppError::InvalidToken => ApiError::new(status, store.translate(lang, "invalid_token")),
            AppError::UserNotFound => ApiError::new(status, store.translate(lang, "user_not_found")),
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError::new(status, store.translate(lang, "unexpected"))
            }
        }
    }
}

// Usado pelos handlers que não recebem o Locale (auth)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale(DEFAULT_LANG.to_string());
        self.to_api_error(&locale, &I18nStore::new()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn duplicate_code_is_a_field_level_conflict() {
        let api = AppError::DuplicateProjectCode("P-01".into()).to_api_error(&en(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::CONFLICT);
        let details = api.details.expect("details");
        assert_eq!(details["code"][0], "Project code 'P-01' is already in use.");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let api = AppError::InternalServerError(anyhow::anyhow!("boom"))
            .to_api_error(&Locale("pt".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
    }

    #[test]
    fn empty_reason_is_bad_request() {
        assert_eq!(AppError::EmptyRejectionReason.status_code(), StatusCode::BAD_REQUEST);
    }
}
