// src/services/company_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, TeamRepository},
    middleware::rbac::ALL_CAPABILITIES,
    models::{
        auth::User,
        company::{Company, CreateCompanyPayload},
    },
};

#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    team_repo: TeamRepository,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(company_repo: CompanyRepository, team_repo: TeamRepository, pool: PgPool) -> Self {
        Self { company_repo, team_repo, pool }
    }

    /// Cria a empresa e, atomicamente, o vínculo do dono (todas as capacidades)
    /// e o perfil dele na equipe.
    pub async fn create_company_with_owner(
        &self,
        owner: &User,
        payload: &CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        let capabilities: Vec<String> = ALL_CAPABILITIES.iter().map(|c| c.to_string()).collect();

        let mut tx = self.pool.begin().await?;

        let company = self
            .company_repo
            .create_company(&mut *tx, payload.name.trim())
            .await?;

        self.company_repo
            .add_member(&mut *tx, company.id, owner.id, &capabilities)
            .await?;

        self.team_repo
            .create_profile(
                &mut *tx,
                company.id,
                owner.id,
                &owner.email,
                payload.first_name.trim(),
                payload.last_name.as_deref(),
                payload.location.as_deref(),
                payload.department.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(company_id = %company.id, owner_id = %owner.id, "Empresa criada");
        Ok(company)
    }
}
