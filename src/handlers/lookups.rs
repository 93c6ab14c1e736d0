// src/handlers/lookups.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::CompanyContext},
    models::lookups::{OfficeLocation, OfficeStage, ProjectArea},
};

// GET /api/lookups/stages
#[utoipa::path(
    get,
    path = "/api/lookups/stages",
    tag = "Lookups",
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Etapas padrão do escritório, em ordem", body = Vec<OfficeStage>)),
    security(("api_jwt" = []))
)]
pub async fn list_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stages = app_state
        .lookups_repo
        .list_stages(&mut *rls_conn, company.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stages)))
}

// GET /api/lookups/locations
#[utoipa::path(
    get,
    path = "/api/lookups/locations",
    tag = "Lookups",
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Escritórios", body = Vec<OfficeLocation>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let locations = app_state
        .lookups_repo
        .list_locations(&mut *rls_conn, company.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(locations)))
}

// GET /api/lookups/areas
#[utoipa::path(
    get,
    path = "/api/lookups/areas",
    tag = "Lookups",
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Áreas de projeto", body = Vec<ProjectArea>)),
    security(("api_jwt" = []))
)]
pub async fn list_areas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let areas = app_state
        .lookups_repo
        .list_areas(&mut *rls_conn, company.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(areas)))
}
