// src/handlers/team.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermResourcingWrite, RequirePermission},
        tenancy::CompanyContext,
    },
    models::team::{CreateInvitePayload, Invite, TeamListQuery, TeamMember},
};

// GET /api/team/members
#[utoipa::path(
    get,
    path = "/api/team/members",
    tag = "Team",
    params(TeamListQuery, ("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 200, description = "Membros ativos e convites pendentes", body = Vec<TeamMember>)),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    Query(query): Query<TeamListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let members = app_state
        .team_service
        .list_members(&mut rls_conn, company.company_id, query.department.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(members)))
}

// POST /api/team/invites
#[utoipa::path(
    post,
    path = "/api/team/invites",
    tag = "Team",
    request_body = CreateInvitePayload,
    params(("x-company-id" = Uuid, Header, description = "ID da Empresa")),
    responses((status = 201, description = "Membro pré-registrado", body = Invite)),
    security(("api_jwt" = []))
)]
pub async fn create_invite(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyContext,
    _perm: RequirePermission<PermResourcingWrite>,
    Json(payload): Json<CreateInvitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &company, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let invite = app_state
        .team_service
        .create_invite(&mut rls_conn, company.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invite)))
}
