// src/handlers/projects.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermProjectsWrite, RequirePermission},
        tenancy::CompanyContext,
    },
    models::project::{
        CodeAvailability, CodeAvailabilityQuery, Project, ProjectDetail, ProjectFinancialMetrics,
        ProjectListQuery, ProjectPayload, ProjectSaveResponse, ReconcileStagesPayload,
    },
};

// Etapas gravadas só em parte => 207 com o relatório de cada passo
fn save_status(response: &ProjectSaveResponse, success: StatusCode) -> StatusCode {
    if response.stages.is_success() { success } else { StatusCode::MULTI_STATUS }
}

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    params(ProjectListQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Projetos da empresa", body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let projects = app_state
        .project_service
        .list_projects(&mut rls_conn, company.company_id, query.department.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(projects)))
}

// GET /api/projects/code-availability
#[utoipa::path(
    get,
    path = "/api/projects/code-availability",
    tag = "Projects",
    params(CodeAvailabilityQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Disponibilidade do código", body = CodeAvailability)),
    security(("api_jwt" = []))
)]
pub async fn check_code_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Query(query): Query<CodeAvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let availability = app_state
        .project_service
        .check_code(&mut rls_conn, company.company_id, &query.code, query.exclude_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(availability)))
}

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = ProjectPayload,
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses(
        (status = 201, description = "Projeto e etapas criados", body = ProjectSaveResponse),
        (status = 207, description = "Projeto criado, etapas gravadas em parte", body = ProjectSaveResponse),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermProjectsWrite>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .project_service
        .create_project(&mut rls_conn, company.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((save_status(&response, StatusCode::CREATED), Json(response)))
}

// GET /api/projects/{id}
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Projeto com etapas e campos derivados", body = ProjectDetail),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .project_service
        .get_project(&mut rls_conn, company.company_id, project_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/projects/{id}
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    request_body = ProjectPayload,
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Projeto e etapas atualizados", body = ProjectSaveResponse),
        (status = 207, description = "Projeto atualizado, etapas gravadas em parte", body = ProjectSaveResponse),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermProjectsWrite>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .project_service
        .update_project(&mut rls_conn, company.company_id, project_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((save_status(&response, StatusCode::OK), Json(response)))
}

// DELETE /api/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 204, description = "Projeto removido"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermProjectsWrite>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .project_service
        .delete_project(&mut rls_conn, company.company_id, project_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/projects/{id}/stages/reconcile
#[utoipa::path(
    post,
    path = "/api/projects/{id}/stages/reconcile",
    tag = "Projects",
    request_body = ReconcileStagesPayload,
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Etapas reconciliadas", body = ProjectSaveResponse),
        (status = 207, description = "Alguns passos continuam pendentes", body = ProjectSaveResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn reconcile_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermProjectsWrite>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ReconcileStagesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .project_service
        .reconcile_stages(&mut rls_conn, company.company_id, project_id, &payload.steps)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((save_status(&response, StatusCode::OK), Json(response)))
}

// GET /api/projects/{id}/financials
#[utoipa::path(
    get,
    path = "/api/projects/{id}/financials",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses((status = 200, description = "Métricas financeiras do projeto", body = ProjectFinancialMetrics)),
    security(("api_jwt" = []))
)]
pub async fn get_financials(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let metrics = app_state
        .project_service
        .financial_metrics(&mut rls_conn, company.company_id, project_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(metrics)))
}
