// src/handlers/settings.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        db_utils::get_rls_connection,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSettingsWrite, RequirePermission},
        tenancy::CompanyContext,
    },
    models::settings::{CompanySettings, UpdateSettingsRequest},
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Configurações de alocação da empresa", body = CompanySettings)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {

    // Obtém conexão segura com RLS
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let settings = app_state.settings_repo
        .get_settings(&mut *rls_conn, company.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Configurações atualizadas", body = CompanySettings),
        (status = 400, description = "Valores fora da faixa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermSettingsWrite>,
    Json(mut payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    payload.default_currency = payload.default_currency.map(|c| c.to_uppercase());

    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let current = app_state.settings_repo
        .get_settings(&mut *rls_conn, company.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state.settings_repo
        .update_settings(&mut *rls_conn, company.company_id, &current, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Capacidade e exibição mudaram => grades em cache ficam obsoletas
    app_state.resourcing_service
        .cache()
        .invalidate_company(company.company_id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}
