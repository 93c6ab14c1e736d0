// src/handlers/leave.rs

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
        rbac::{PermLeaveApprove, RequirePermission},
        tenancy::CompanyContext,
    },
    models::leave::{
        ApproverCandidate, CreateLeavePayload, LeaveListQuery, LeaveRequest, LeaveRequestView,
        ReassignApproverPayload, RejectLeavePayload,
    },
};

// =============================================================================
//  FILA DO APROVADOR
// =============================================================================

// GET /api/leave/requests?filter=pending|all
#[utoipa::path(
    get,
    path = "/api/leave/requests",
    tag = "Leave",
    params(LeaveListQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Pedidos de ausência", body = Vec<LeaveRequestView>),
        (status = 403, description = "Sem permissão de aprovador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermLeaveApprove>,
    Query(query): Query<LeaveListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let requests = app_state
        .leave_service
        .list_requests(&mut rls_conn, company.company_id, user.0.id, query.filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(requests)))
}

// POST /api/leave/requests/{id}/approve
#[utoipa::path(
    post,
    path = "/api/leave/requests/{id}/approve",
    tag = "Leave",
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Pedido aprovado", body = LeaveRequest),
        (status = 409, description = "Pedido não está mais pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .leave_service
        .approve_request(&mut rls_conn, company.company_id, user.0.id, request_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/leave/requests/{id}/reject
#[utoipa::path(
    post,
    path = "/api/leave/requests/{id}/reject",
    tag = "Leave",
    request_body = RejectLeavePayload,
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Pedido recusado", body = LeaveRequest),
        (status = 400, description = "Motivo vazio"),
        (status = 409, description = "Pedido não está mais pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectLeavePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .leave_service
        .reject_request(&mut rls_conn, company.company_id, user.0.id, request_id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/leave/requests/{id}/reassign
#[utoipa::path(
    post,
    path = "/api/leave/requests/{id}/reassign",
    tag = "Leave",
    request_body = ReassignApproverPayload,
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Aprovador reatribuído", body = LeaveRequest),
        (status = 400, description = "Aprovador inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn reassign_approver(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReassignApproverPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .leave_service
        .reassign_approver(&mut rls_conn, company.company_id, request_id, payload.new_approver_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}

// GET /api/leave/requests/{id}/approver-candidates
#[utoipa::path(
    get,
    path = "/api/leave/requests/{id}/approver-candidates",
    tag = "Leave",
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses((status = 200, description = "Outros aprovadores possíveis", body = Vec<ApproverCandidate>)),
    security(("api_jwt" = []))
)]
pub async fn approver_candidates(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let candidates = app_state
        .leave_service
        .approver_candidates(&mut rls_conn, company.company_id, request_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(candidates)))
}

// =============================================================================
//  PEDIDOS DO PRÓPRIO MEMBRO
// =============================================================================

// POST /api/leave/requests
#[utoipa::path(
    post,
    path = "/api/leave/requests",
    tag = "Leave",
    request_body = CreateLeavePayload,
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 201, description = "Pedido criado", body = LeaveRequest)),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Json(payload): Json<CreateLeavePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .leave_service
        .create_request(&mut rls_conn, company.company_id, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// POST /api/leave/requests/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/leave/requests/{id}/cancel",
    tag = "Leave",
    params(
        ("id" = Uuid, Path, description = "ID do Pedido"),
        ("x-company-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Pedido cancelado", body = LeaveRequest),
        (status = 403, description = "Pedido de outro membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .leave_service
        .cancel_request(&mut rls_conn, company.company_id, user.0.id, request_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(request)))
}
