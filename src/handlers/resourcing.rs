// src/handlers/resourcing.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermResourcingWrite, RequirePermission},
        tenancy::CompanyContext,
    },
    models::allocation::{CellQuery, CellValue, SaveCellOutcome, SaveCellPayload, WeekQuery, WeekResourceView},
};

// GET /api/resourcing/week
#[utoipa::path(
    get,
    path = "/api/resourcing/week",
    tag = "Resourcing",
    params(WeekQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Grade semanal de alocação por membro", body = WeekResourceView)),
    security(("api_jwt" = []))
)]
pub async fn get_week(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let today = Utc::now().date_naive();
    let view = app_state
        .resourcing_service
        .get_week_view(&mut rls_conn, company.company_id, &query, today)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// GET /api/resourcing/cell
#[utoipa::path(
    get,
    path = "/api/resourcing/cell",
    tag = "Resourcing",
    params(CellQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Valor atual da célula", body = CellValue),
        (status = 404, description = "Membro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cell(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Query(query): Query<CellQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cell = app_state
        .resourcing_service
        .get_cell(&mut rls_conn, company.company_id, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cell)))
}

// PUT /api/resourcing/cell
#[utoipa::path(
    put,
    path = "/api/resourcing/cell",
    tag = "Resourcing",
    request_body = SaveCellPayload,
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Resultado da gravação (saved=false quando nada mudou)", body = SaveCellOutcome),
        (status = 400, description = "Valor inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_cell(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermResourcingWrite>,
    Json(payload): Json<SaveCellPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .resourcing_service
        .save_cell(&mut rls_conn, company.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}
