// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::{CompanyContext, COMPANY_ID_HEADER},
    models::auth::User,
};

// Valida o Bearer token e injeta o usuário nos "extensions" da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let user = app_state.auth_service.validate_token(&token).await?;
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Auth + empresa: exige o cabeçalho x-company-id e que o usuário seja membro ativo.
// As capacidades são carregadas uma única vez por requisição.
pub async fn company_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let company_id = company_id_from_headers(&request)?;
    let user = app_state.auth_service.validate_token(&token).await?;

    let capabilities = app_state
        .rbac_repo
        .find_member_capabilities(user.id, company_id)
        .await?
        .ok_or_else(|| AppError::PermissionDenied("company:member".to_string()))?;

    tracing::debug!(user_id = %user.id, %company_id, "Contexto de empresa resolvido");

    request.extensions_mut().insert(AuthenticatedUser(user));
    request
        .extensions_mut()
        .insert(CompanyContext { company_id, capabilities });
    Ok(next.run(request).await)
}

// O token é copiado antes de qualquer `.await`: a Request não é Sync.
fn bearer_token(request: &Request) -> Result<String, AppError> {
    request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|bearer| bearer.token().to_string())
        .ok_or(AppError::InvalidToken)
}

fn company_id_from_headers(request: &Request) -> Result<Uuid, AppError> {
    request
        .headers()
        .get(COMPANY_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or(AppError::MissingCompanyContext)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
