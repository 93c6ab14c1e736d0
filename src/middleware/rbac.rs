// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, middleware::tenancy::CompanyContext};

/// Define uma capacidade exigida por uma rota.
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Guardião: rejeita com 403 quando o membro não possui a capacidade.
/// As capacidades vêm do `CompanyContext`, carregado uma vez por requisição.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let company = parts
            .extensions
            .get::<CompanyContext>()
            .ok_or(AppError::MissingCompanyContext)?;

        let required = T::slug();
        if !company.has_capability(required) {
            tracing::debug!(company_id = %company.company_id, permission = required, "Permissão negada");
            return Err(AppError::PermissionDenied(required.to_string()));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub const LEAVE_APPROVE: &str = "leave:approve";
pub const PROJECTS_WRITE: &str = "projects:write";
pub const RESOURCING_WRITE: &str = "resourcing:write";
pub const SETTINGS_WRITE: &str = "settings:write";

// Capacidades concedidas ao dono na criação da empresa
pub const ALL_CAPABILITIES: &[&str] = &[LEAVE_APPROVE, PROJECTS_WRITE, RESOURCING_WRITE, SETTINGS_WRITE];

pub struct PermLeaveApprove;
impl PermissionDef for PermLeaveApprove {
    fn slug() -> &'static str { LEAVE_APPROVE }
}

pub struct PermProjectsWrite;
impl PermissionDef for PermProjectsWrite {
    fn slug() -> &'static str { PROJECTS_WRITE }
}

pub struct PermResourcingWrite;
impl PermissionDef for PermResourcingWrite {
    fn slug() -> &'static str { RESOURCING_WRITE }
}

pub struct PermSettingsWrite;
impl PermissionDef for PermSettingsWrite {
    fn slug() -> &'static str { SETTINGS_WRITE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    async fn check(capabilities: Vec<&str>) -> Result<(), AppError> {
        let mut request = Request::builder().body(()).expect("request");
        request.extensions_mut().insert(CompanyContext {
            company_id: Uuid::new_v4(),
            capabilities: capabilities.into_iter().map(String::from).collect(),
        });
        let (mut parts, _) = request.into_parts();
        RequirePermission::<PermLeaveApprove>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn approver_capability_passes() {
        assert!(check(vec!["projects:write", LEAVE_APPROVE]).await.is_ok());
    }

    #[tokio::test]
    async fn missing_capability_is_forbidden() {
        let err = check(vec!["projects:write"]).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(slug) if slug == LEAVE_APPROVE));
    }
}
