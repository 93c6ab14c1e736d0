// src/db/lookups_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lookups::{OfficeLocation, OfficeStage, ProjectArea},
};

// Catálogos da empresa usados nos formulários de projeto
#[derive(Clone, Default)]
pub struct LookupsRepository;

impl LookupsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_stages<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<OfficeStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stages = sqlx::query_as::<_, OfficeStage>(
            "SELECT id, name, order_index FROM office_stages WHERE company_id = $1 ORDER BY order_index, name",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    pub async fn list_locations<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<OfficeLocation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let locations = sqlx::query_as::<_, OfficeLocation>(
            "SELECT id, city, country, code FROM office_locations WHERE company_id = $1 ORDER BY city",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(locations)
    }

    pub async fn list_areas<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<ProjectArea>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let areas = sqlx::query_as::<_, ProjectArea>(
            "SELECT id, code, name, country FROM project_areas WHERE company_id = $1 ORDER BY code",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(areas)
    }
}
