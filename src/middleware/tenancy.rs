// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
pub const COMPANY_ID_HEADER: &str = "x-company-id";

// Empresa ativa da requisição e as capacidades do usuário nela.
// Preenchido pelo `company_guard`.
#[derive(Debug, Clone)]
pub struct CompanyContext {
    pub company_id: Uuid,
    pub capabilities: Vec<String>,
}

impl CompanyContext {
    pub fn has_capability(&self, slug: &str) -> bool {
        self.capabilities.iter().any(|c| c == slug)
    }
}

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CompanyContext>()
            .cloned()
            .ok_or(AppError::MissingCompanyContext)
    }
}
