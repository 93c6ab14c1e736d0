// src/db/project_repo.rs

use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::project::{Project, ProjectFinancialMetrics, ProjectRecord, ProjectStage, StageInput},
    services::stage_reconciliation::StageWrite,
};

const PROJECT_COLUMNS: &str = r#"
    id, company_id, code, name, manager_id, country, office_id, department,
    status, current_stage, target_profit_percentage, stages, avg_rate, currency,
    created_at, updated_at
"#;

fn map_code_conflict(e: sqlx::Error, code: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::DuplicateProjectCode(code.to_string());
        }
    }
    AppError::DatabaseError(e)
}

#[derive(Clone, Default)]
pub struct ProjectRepository;

impl ProjectRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PROJECTS
    // =========================================================================

    pub async fn list_projects<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE company_id = $1 AND ($2::text IS NULL OR department = $2)
             ORDER BY code"
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(company_id)
            .bind(department)
            .fetch_all(executor)
            .await?;

        Ok(projects)
    }

    pub async fn find_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE company_id = $1 AND id = $2");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(company_id)
            .bind(project_id)
            .fetch_optional(executor)
            .await?;

        Ok(project)
    }

    /// Existe outro projeto da empresa com o mesmo código?
    pub async fn code_exists<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        code: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM projects
                WHERE company_id = $1 AND code = $2
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(company_id)
        .bind(code)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    pub async fn insert_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        record: &ProjectRecord,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO projects (
                company_id, code, name, manager_id, country, office_id, department,
                status, current_stage, target_profit_percentage, stages, avg_rate, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(company_id)
            .bind(&record.code)
            .bind(&record.name)
            .bind(record.manager_id)
            .bind(record.country.as_deref())
            .bind(record.office_id)
            .bind(record.department.as_deref())
            .bind(record.status)
            .bind(record.current_stage.as_deref())
            .bind(record.target_profit_percentage)
            .bind(&record.stage_names)
            .bind(record.avg_rate)
            .bind(&record.currency)
            .fetch_one(executor)
            .await
            .map_err(|e| map_code_conflict(e, &record.code))
    }

    pub async fn update_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        record: &ProjectRecord,
    ) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE projects SET
                code = $3, name = $4, manager_id = $5, country = $6, office_id = $7,
                department = $8, status = $9, current_stage = $10,
                target_profit_percentage = $11, stages = $12, avg_rate = $13,
                currency = $14, updated_at = NOW()
            WHERE company_id = $1 AND id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(company_id)
            .bind(project_id)
            .bind(&record.code)
            .bind(&record.name)
            .bind(record.manager_id)
            .bind(record.country.as_deref())
            .bind(record.office_id)
            .bind(record.department.as_deref())
            .bind(record.status)
            .bind(record.current_stage.as_deref())
            .bind(record.target_profit_percentage)
            .bind(&record.stage_names)
            .bind(record.avg_rate)
            .bind(&record.currency)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_code_conflict(e, &record.code))
    }

    pub async fn delete_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Guarda (ou limpa, com `None`) as etapas submetidas cuja gravação ficou incompleta.
    pub async fn set_pending_stage_writes<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        pending: Option<&[StageInput]>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE projects SET pending_stage_writes = $3 WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(project_id)
        .bind(pending.map(Json))
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn pending_stage_writes<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Vec<StageInput>>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pending = sqlx::query_scalar::<_, Option<Json<Vec<StageInput>>>>(
            "SELECT pending_stage_writes FROM projects WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(project_id)
        .fetch_optional(executor)
        .await?;

        Ok(pending.flatten().map(|Json(stages)| stages))
    }

    // =========================================================================
    //  STAGES & FEES
    // =========================================================================

    pub async fn list_stages<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<ProjectStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stages = sqlx::query_as::<_, ProjectStage>(
            r#"
            SELECT id, company_id, project_id, stage_name, fee, is_applicable,
                   billing_month, invoice_date, invoice_status
            FROM project_stages
            WHERE company_id = $1 AND project_id = $2
            ORDER BY stage_name
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    pub async fn delete_stage<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        stage_name: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "DELETE FROM project_stages WHERE company_id = $1 AND project_id = $2 AND stage_name = $3",
        )
        .bind(company_id)
        .bind(project_id)
        .bind(stage_name)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn upsert_stage<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        stage: &StageWrite,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO project_stages (
                company_id, project_id, stage_name, fee, is_applicable,
                billing_month, invoice_date, invoice_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (project_id, stage_name)
            DO UPDATE SET
                fee = EXCLUDED.fee,
                is_applicable = EXCLUDED.is_applicable,
                billing_month = EXCLUDED.billing_month,
                invoice_date = EXCLUDED.invoice_date,
                invoice_status = EXCLUDED.invoice_status
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .bind(&stage.stage_name)
        .bind(stage.fee)
        .bind(stage.is_applicable)
        .bind(stage.billing_month.as_deref())
        .bind(stage.invoice_date)
        .bind(stage.invoice_status)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn upsert_fee<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        stage: &StageWrite,
        currency: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO project_fees (
                company_id, project_id, stage_name, fee, currency,
                billing_month, invoice_date, invoice_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (project_id, stage_name)
            DO UPDATE SET
                fee = EXCLUDED.fee,
                currency = EXCLUDED.currency,
                billing_month = EXCLUDED.billing_month,
                invoice_date = EXCLUDED.invoice_date,
                invoice_status = EXCLUDED.invoice_status,
                updated_at = NOW()
            "#,
        )
        .bind(company_id)
        .bind(project_id)
        .bind(&stage.stage_name)
        .bind(stage.fee)
        .bind(currency)
        .bind(stage.billing_month.as_deref())
        .bind(stage.invoice_date)
        .bind(stage.invoice_status)
        .execute(executor)
        .await?;

        Ok(())
    }

    // Calculado no banco (get_project_financial_metrics)
    pub async fn financial_metrics<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
    ) -> Result<ProjectFinancialMetrics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let metrics = sqlx::query_as::<_, ProjectFinancialMetrics>(
            "SELECT * FROM get_project_financial_metrics($1)",
        )
        .bind(project_id)
        .fetch_one(executor)
        .await?;

        Ok(metrics)
    }
}
