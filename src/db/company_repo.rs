// src/db/company_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::company::Company};

#[derive(Clone, Default)]
pub struct CompanyRepository;

impl CompanyRepository {
    pub fn new() -> Self {
        Self
    }

    /// Cria uma nova empresa na base de dados.
    pub async fn create_company<'e, E>(&self, executor: E, name: &str) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    /// Liga o usuário à empresa com as capacidades informadas.
    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        capabilities: &[String],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO company_members (company_id, user_id, capabilities)
            VALUES ($1, $2, $3)
            ON CONFLICT (company_id, user_id)
            DO UPDATE SET capabilities = EXCLUDED.capabilities, is_active = true
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .bind(capabilities)
        .execute(executor)
        .await?;

        Ok(())
    }
}
