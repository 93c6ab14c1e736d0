// src/db/team_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::team::{CreateInvitePayload, Invite, Profile},
};

#[derive(Clone, Default)]
pub struct TeamRepository;

impl TeamRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_profiles<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<Profile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, company_id, first_name, last_name, email, avatar_url,
                   weekly_capacity, location, department, job_title
            FROM profiles
            WHERE company_id = $1
              AND ($2::text IS NULL OR department = $2)
            ORDER BY first_name, last_name
            "#,
        )
        .bind(company_id)
        .bind(department)
        .fetch_all(executor)
        .await?;

        Ok(profiles)
    }

    // Apenas convites pré-registrados ainda pendentes entram na equipe
    pub async fn list_pending_invites<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<Invite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, company_id, email, first_name, last_name,
                   weekly_capacity, location, department, job_title
            FROM invites
            WHERE company_id = $1
              AND status = 'pending'
              AND invitation_type = 'pre_registered'
              AND ($2::text IS NULL OR department = $2)
            ORDER BY first_name, last_name
            "#,
        )
        .bind(company_id)
        .bind(department)
        .fetch_all(executor)
        .await?;

        Ok(invites)
    }

    pub async fn find_profile<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<Profile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, company_id, first_name, last_name, email, avatar_url,
                   weekly_capacity, location, department, job_title
            FROM profiles
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id)
        .bind(profile_id)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }

    pub async fn find_pending_invite<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        invite_id: Uuid,
    ) -> Result<Option<Invite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, company_id, email, first_name, last_name,
                   weekly_capacity, location, department, job_title
            FROM invites
            WHERE company_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(company_id)
        .bind(invite_id)
        .fetch_optional(executor)
        .await?;

        Ok(invite)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_profile<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: Option<&str>,
        location: Option<&str>,
        department: Option<&str>,
    ) -> Result<Profile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, company_id, email, first_name, last_name, location, department)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, first_name, last_name, email, avatar_url,
                      weekly_capacity, location, department, job_title
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(location)
        .bind(department)
        .fetch_one(executor)
        .await?;

        Ok(profile)
    }

    pub async fn create_invite<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &CreateInvitePayload,
    ) -> Result<Invite, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites
                (company_id, email, first_name, last_name, weekly_capacity, location, department, job_title)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, company_id, email, first_name, last_name,
                      weekly_capacity, location, department, job_title
            "#,
        )
        .bind(company_id)
        .bind(input.email.as_deref())
        .bind(&input.first_name)
        .bind(input.last_name.as_deref())
        .bind(input.weekly_capacity)
        .bind(input.location.as_deref())
        .bind(input.department.as_deref())
        .bind(input.job_title.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(invite)
    }
}
