// src/db/allocation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::allocation::{AllocationRow, AnnualLeaveRow, HolidayRow, OtherLeaveRow, ProjectSummary},
};

#[derive(Clone, Default)]
pub struct AllocationRepository;

impl AllocationRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEITURA DA SEMANA
    // =========================================================================

    pub async fn week_allocations<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<Vec<AllocationRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT resource_id, project_id, allocation_date, hours
            FROM project_resource_allocations
            WHERE company_id = $1 AND allocation_date BETWEEN $2 AND $3
            ORDER BY resource_id, project_id, allocation_date
            "#,
        )
        .bind(company_id)
        .bind(week_start)
        .bind(week_end)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn week_projects<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<ProjectSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, code, name, department
            FROM projects
            WHERE company_id = $1
              AND status NOT IN ('completed', 'cancelled')
              AND ($2::text IS NULL OR department = $2)
            ORDER BY code
            "#,
        )
        .bind(company_id)
        .bind(department)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Colunas extras: projetos fora do filtro que ainda têm horas na semana.
    pub async fn projects_by_ids<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_ids: &[Uuid],
    ) -> Result<Vec<ProjectSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, code, name, department
            FROM projects
            WHERE company_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(company_id)
        .bind(project_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn annual_leaves<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<Vec<AnnualLeaveRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, AnnualLeaveRow>(
            r#"
            SELECT member_id, date, hours
            FROM annual_leaves
            WHERE company_id = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(company_id)
        .bind(week_start)
        .bind(week_end)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn holidays<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<Vec<HolidayRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT name, date, location
            FROM office_holidays
            WHERE company_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
        )
        .bind(company_id)
        .bind(week_start)
        .bind(week_end)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn other_leaves<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<OtherLeaveRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OtherLeaveRow>(
            r#"
            SELECT member_id, hours
            FROM weekly_other_leave
            WHERE company_id = $1 AND week_start_date = $2
            "#,
        )
        .bind(company_id)
        .bind(week_start)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    //  CÉLULA (projeto x membro x semana)
    // =========================================================================

    /// Soma das horas gravadas para a célula na semana.
    pub async fn cell_hours<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        member_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<f64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let hours = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(hours), 0)::DOUBLE PRECISION
            FROM project_resource_allocations
            WHERE company_id = $1 AND project_id = $2 AND resource_id = $3
              AND allocation_date BETWEEN $4 AND $5
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .bind(member_id)
        .bind(week_start)
        .bind(week_end)
        .fetch_one(executor)
        .await?;

        Ok(hours)
    }

    // Remove as linhas diárias da semana, exceto a da segunda-feira
    pub async fn clear_cell_days<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        member_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
        keep_week_start: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            DELETE FROM project_resource_allocations
            WHERE company_id = $1 AND project_id = $2 AND resource_id = $3
              AND allocation_date BETWEEN $4 AND $5
              AND NOT ($6 AND allocation_date = $4)
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .bind(member_id)
        .bind(week_start)
        .bind(week_end)
        .bind(keep_week_start)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn upsert_cell<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        member_id: Uuid,
        resource_type: &str,
        week_start: NaiveDate,
        hours: f64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO project_resource_allocations (
                company_id, project_id, resource_id, resource_type,
                week_start_date, allocation_date, hours
            )
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            ON CONFLICT (project_id, resource_id, allocation_date)
            DO UPDATE SET hours = EXCLUDED.hours, resource_type = EXCLUDED.resource_type
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .bind(member_id)
        .bind(resource_type)
        .bind(week_start)
        .bind(hours)
        .execute(executor)
        .await?;

        Ok(())
    }
}
