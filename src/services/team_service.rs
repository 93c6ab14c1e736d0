// src/services/team_service.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TeamRepository,
    models::team::{CreateInvitePayload, Invite, TeamMember},
    services::resourcing_service::WeekViewCache,
};

#[derive(Clone)]
pub struct TeamService {
    team_repo: TeamRepository,
    week_cache: WeekViewCache,
}

impl TeamService {
    pub fn new(team_repo: TeamRepository, week_cache: WeekViewCache) -> Self {
        Self { team_repo, week_cache }
    }

    /// Equipe completa: perfis ativos seguidos dos convites pendentes.
    pub async fn list_members(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<TeamMember>, AppError> {
        let department = department.map(str::trim).filter(|d| !d.is_empty());

        let profiles = self
            .team_repo
            .list_profiles(&mut *conn, company_id, department)
            .await?;
        let invites = self
            .team_repo
            .list_pending_invites(&mut *conn, company_id, department)
            .await?;

        Ok(profiles
            .into_iter()
            .map(TeamMember::Active)
            .chain(invites.into_iter().map(TeamMember::Pending))
            .collect())
    }

    pub async fn find_member(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<TeamMember>, AppError> {
        if let Some(profile) = self.team_repo.find_profile(&mut *conn, company_id, member_id).await? {
            return Ok(Some(TeamMember::Active(profile)));
        }

        Ok(self
            .team_repo
            .find_pending_invite(&mut *conn, company_id, member_id)
            .await?
            .map(TeamMember::Pending))
    }

    pub async fn create_invite(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &CreateInvitePayload,
    ) -> Result<Invite, AppError> {
        let invite = self.team_repo.create_invite(&mut *conn, company_id, payload).await?;
        tracing::info!(invite_id = %invite.id, %company_id, "Convite pré-registrado criado");
        // Convites pendentes já aparecem como linhas da grade
        self.invalidate_week_views(company_id)?;
        Ok(invite)
    }

    pub(crate) fn invalidate_week_views(&self, company_id: Uuid) -> Result<(), AppError> {
        self.week_cache.invalidate_company(company_id)
    }
}
