// src/services/project_service.rs

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    common::{error::AppError, saga::SagaReport},
    db::{ProjectRepository, SettingsRepository},
    models::project::{
        CodeAvailability, Project, ProjectDetail, ProjectFinancialMetrics, ProjectFormVariant,
        ProjectPayload, ProjectRecord, ProjectSaveResponse, ProjectStatus, StageInput,
    },
    services::{
        resourcing_service::WeekViewCache,
        stage_fees::stage_view,
        stage_reconciliation::{
            normalize_stage_inputs, plan_stage_reconciliation, retry_stage_inputs, run_stage_saga,
            StagePlan, StageStore, StageWrite,
        },
    },
};

fn field_error(field: &str, code: &'static str) -> AppError {
    AppError::FieldValidation { field: field.to_string(), code }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Valida e normaliza o formulário de projeto.
/// O diálogo exige também país, meta de lucro, status e escritório.
pub fn validate_project(payload: &ProjectPayload, default_currency: &str) -> Result<ProjectRecord, AppError> {
    let code = payload.code.trim();
    if code.is_empty() {
        return Err(field_error("code", "required"));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(field_error("name", "required"));
    }

    let country = non_blank(payload.country.as_deref());
    let status_input = non_blank(payload.status.as_deref());

    if payload.variant == ProjectFormVariant::Dialog {
        if country.is_none() {
            return Err(field_error("country", "required"));
        }
        if payload.target_profit_percentage.is_none() {
            return Err(field_error("targetProfitPercentage", "required"));
        }
        if status_input.is_none() {
            return Err(field_error("status", "required"));
        }
        if payload.office_id.is_none() {
            return Err(field_error("officeId", "required"));
        }
    }

    if let Some(profit) = payload.target_profit_percentage {
        if profit < Decimal::ZERO || profit > Decimal::ONE_HUNDRED {
            return Err(field_error("targetProfitPercentage", "invalid_range"));
        }
    }
    if let Some(rate) = payload.avg_rate {
        if rate < Decimal::ZERO {
            return Err(field_error("avgRate", "invalid_range"));
        }
    }

    let status = match status_input {
        Some(label) => ProjectStatus::from_label(&label).ok_or_else(|| field_error("status", "invalid_status"))?,
        None => ProjectStatus::Planning,
    };

    let currency = non_blank(payload.currency.as_deref())
        .unwrap_or_else(|| default_currency.to_string())
        .to_uppercase();

    Ok(ProjectRecord {
        code: code.to_string(),
        name: name.to_string(),
        manager_id: payload.manager_id,
        country,
        office_id: payload.office_id,
        department: non_blank(payload.department.as_deref()),
        status,
        current_stage: non_blank(payload.current_stage.as_deref()),
        target_profit_percentage: payload.target_profit_percentage,
        avg_rate: payload.avg_rate,
        currency,
        stage_names: normalize_stage_inputs(&payload.stages)
            .into_iter()
            .map(|s| s.stage_name)
            .collect(),
    })
}

// ---
// Adaptador do StageStore sobre uma conexão (cada passo com commit próprio)
// ---

struct PgStageStore<'c> {
    conn: &'c mut PgConnection,
    repo: &'c ProjectRepository,
    company_id: Uuid,
}

#[async_trait]
impl StageStore for PgStageStore<'_> {
    async fn delete_stage(&mut self, project_id: Uuid, stage_name: &str) -> Result<(), AppError> {
        self.repo
            .delete_stage(&mut *self.conn, self.company_id, project_id, stage_name)
            .await
    }

    async fn upsert_stage(&mut self, project_id: Uuid, stage: &StageWrite) -> Result<(), AppError> {
        self.repo
            .upsert_stage(&mut *self.conn, self.company_id, project_id, stage)
            .await
    }

    async fn upsert_fee(&mut self, project_id: Uuid, stage: &StageWrite, currency: &str) -> Result<(), AppError> {
        self.repo
            .upsert_fee(&mut *self.conn, self.company_id, project_id, stage, currency)
            .await
    }
}

#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
    settings_repo: SettingsRepository,
    week_cache: WeekViewCache,
}

impl ProjectService {
    pub fn new(project_repo: ProjectRepository, settings_repo: SettingsRepository, week_cache: WeekViewCache) -> Self {
        Self { project_repo, settings_repo, week_cache }
    }

    pub async fn check_code(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        code: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<CodeAvailability, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(field_error("code", "required"));
        }

        let taken = self
            .project_repo
            .code_exists(&mut *conn, company_id, code, exclude_id)
            .await?;

        Ok(CodeAvailability { code: code.to_string(), available: !taken })
    }

    pub async fn list_projects(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<Project>, AppError> {
        self.project_repo
            .list_projects(&mut *conn, company_id, department.map(str::trim).filter(|d| !d.is_empty()))
            .await
    }

    pub async fn get_project(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectDetail, AppError> {
        let project = self.find_or_404(conn, company_id, project_id).await?;
        let stages = self
            .project_repo
            .list_stages(&mut *conn, company_id, project_id)
            .await?;

        let now = Utc::now();
        let stage_details = stages
            .into_iter()
            .map(|stage| stage_view(stage, project.avg_rate, now))
            .collect();

        Ok(ProjectDetail { status_label: project.status.label().to_string(), project, stage_details })
    }

    pub async fn create_project(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &ProjectPayload,
    ) -> Result<ProjectSaveResponse, AppError> {
        let settings = self.settings_repo.get_settings(&mut *conn, company_id).await?;
        let record = validate_project(payload, &settings.default_currency)?;
        self.ensure_code_free(conn, company_id, &record.code, None).await?;

        let project = self
            .project_repo
            .insert_project(&mut *conn, company_id, &record)
            .await?;
        tracing::info!(project_id = %project.id, code = %project.code, "Projeto criado");
        self.invalidate_week_views(company_id)?;

        let inputs = normalize_stage_inputs(&payload.stages);
        let plan = plan_stage_reconciliation(&[], &inputs);
        let stages = self.run_saga(conn, company_id, &project, &plan, None, &inputs).await;

        Ok(ProjectSaveResponse { project, stages })
    }

    pub async fn update_project(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        payload: &ProjectPayload,
    ) -> Result<ProjectSaveResponse, AppError> {
        let settings = self.settings_repo.get_settings(&mut *conn, company_id).await?;
        let record = validate_project(payload, &settings.default_currency)?;
        self.ensure_code_free(conn, company_id, &record.code, Some(project_id)).await?;

        let project = self
            .project_repo
            .update_project(&mut *conn, company_id, project_id, &record)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Project".to_string()))?;
        // Colunas da grade semanal (nome, status, departamento) podem ter mudado
        self.invalidate_week_views(company_id)?;

        let existing = self
            .project_repo
            .list_stages(&mut *conn, company_id, project_id)
            .await?;
        let inputs = normalize_stage_inputs(&payload.stages);
        let plan = plan_stage_reconciliation(&existing, &inputs);
        tracing::info!(
            %project_id,
            delete = plan.to_delete.len(),
            update = plan.to_update.len(),
            insert = plan.to_insert.len(),
            "Reconciliando etapas do projeto"
        );

        let stages = self.run_saga(conn, company_id, &project, &plan, None, &inputs).await;
        Ok(ProjectSaveResponse { project, stages })
    }

    /// Refaz a reconciliação a partir das últimas etapas submetidas, se a gravação
    /// anterior ficou incompleta, ou do estado gravado (`projects.stages`).
    /// Com `steps` vazio todos os passos são executados de novo.
    pub async fn reconcile_stages(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        steps: &[String],
    ) -> Result<ProjectSaveResponse, AppError> {
        let project = self.find_or_404(conn, company_id, project_id).await?;
        let existing = self
            .project_repo
            .list_stages(&mut *conn, company_id, project_id)
            .await?;

        let pending = self
            .project_repo
            .pending_stage_writes(&mut *conn, company_id, project_id)
            .await?;

        let selected = retry_stage_inputs(&project.stages, &existing, pending);
        let plan = plan_stage_reconciliation(&existing, &selected);

        let only: HashSet<String> = steps.iter().cloned().collect();
        let only = (!only.is_empty()).then_some(&only);

        let stages = self.run_saga(conn, company_id, &project, &plan, only, &selected).await;
        Ok(ProjectSaveResponse { project, stages })
    }

    pub async fn delete_project(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<(), AppError> {
        let deleted = self
            .project_repo
            .delete_project(&mut *conn, company_id, project_id)
            .await?;

        if !deleted {
            return Err(AppError::ResourceNotFound("Project".to_string()));
        }
        tracing::info!(%project_id, "Projeto removido");
        self.invalidate_week_views(company_id)?;
        Ok(())
    }

    pub async fn financial_metrics(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectFinancialMetrics, AppError> {
        self.find_or_404(conn, company_id, project_id).await?;
        self.project_repo.financial_metrics(&mut *conn, project_id).await
    }

    /// Projetos são colunas da grade: qualquer escrita descarta as semanas da empresa.
    pub(crate) fn invalidate_week_views(&self, company_id: Uuid) -> Result<(), AppError> {
        self.week_cache.invalidate_company(company_id)
    }

    async fn find_or_404(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<Project, AppError> {
        self.project_repo
            .find_project(&mut *conn, company_id, project_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Project".to_string()))
    }

    async fn ensure_code_free(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        code: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if self
            .project_repo
            .code_exists(&mut *conn, company_id, code, exclude_id)
            .await?
        {
            return Err(AppError::DuplicateProjectCode(code.to_string()));
        }
        Ok(())
    }

    /// Executa o plano e guarda `inputs` enquanto restarem passos pendentes,
    /// para que a nova tentativa grave as fees submetidas e não zeros.
    async fn run_saga(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project: &Project,
        plan: &StagePlan,
        only: Option<&HashSet<String>>,
        inputs: &[StageInput],
    ) -> SagaReport {
        let mut store = PgStageStore { conn: &mut *conn, repo: &self.project_repo, company_id };
        let report = run_stage_saga(&mut store, project.id, plan, &project.currency, only).await;

        if !report.is_success() {
            tracing::warn!(
                project_id = %project.id,
                pending = ?report.pending_steps(),
                "Gravação de etapas incompleta"
            );
        }

        // Subconjunto concluído: passos fora dele podem ainda depender das entradas guardadas
        if report.is_success() && only.is_some() {
            return report;
        }
        let pending = (!report.is_success()).then_some(inputs);
        if let Err(e) = self
            .project_repo
            .set_pending_stage_writes(&mut *conn, company_id, project.id, pending)
            .await
        {
            tracing::error!(project_id = %project.id, error = %e, "Falha ao guardar as etapas pendentes");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache_view(week_start: chrono::NaiveDate) -> std::sync::Arc<crate::models::allocation::WeekResourceView> {
        std::sync::Arc::new(crate::models::allocation::WeekResourceView {
            week_start,
            week_end: week_start + chrono::Duration::days(6),
            display_preference: crate::models::settings::DisplayPreference::Hours,
            projects: vec![],
            members: vec![],
        })
    }

    fn payload(value: serde_json::Value) -> ProjectPayload {
        serde_json::from_value(value).expect("payload")
    }

    fn field_of(err: AppError) -> (String, &'static str) {
        match err {
            AppError::FieldValidation { field, code } => (field, code),
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn wizard_needs_only_code_and_name() {
        let record = validate_project(
            &payload(json!({
                "code": " P-001 ",
                "name": "Casa",
                "stages": [{ "stageName": "Concept" }, { "stageName": "Concept" }, { "stageName": " " }]
            })),
            "eur",
        )
        .expect("valid");

        assert_eq!(record.code, "P-001");
        assert_eq!(record.status, ProjectStatus::Planning);
        assert_eq!(record.currency, "EUR");
        assert_eq!(record.stage_names, vec!["Concept".to_string()]);
    }

    #[test]
    fn blank_code_or_name_is_required() {
        let err = validate_project(&payload(json!({ "code": "  ", "name": "Casa" })), "USD").unwrap_err();
        assert_eq!(field_of(err), ("code".to_string(), "required"));

        let err = validate_project(&payload(json!({ "code": "P-1", "name": "" })), "USD").unwrap_err();
        assert_eq!(field_of(err), ("name".to_string(), "required"));
    }

    #[test]
    fn dialog_requires_extended_fields() {
        let err = validate_project(
            &payload(json!({ "variant": "dialog", "code": "P-1", "name": "Casa", "country": "PT" })),
            "USD",
        )
        .unwrap_err();
        assert_eq!(field_of(err), ("targetProfitPercentage".to_string(), "required"));

        let record = validate_project(
            &payload(json!({
                "variant": "dialog",
                "code": "P-1",
                "name": "Casa",
                "country": "PT",
                "targetProfitPercentage": 20,
                "status": "In Progress",
                "officeId": Uuid::new_v4(),
            })),
            "USD",
        )
        .expect("valid");
        assert_eq!(record.status, ProjectStatus::InProgress);
    }

    #[test]
    fn profit_outside_percentage_range_is_rejected() {
        let err = validate_project(
            &payload(json!({ "code": "P-1", "name": "Casa", "targetProfitPercentage": 120 })),
            "USD",
        )
        .unwrap_err();
        assert_eq!(field_of(err), ("targetProfitPercentage".to_string(), "invalid_range"));
    }

    #[test]
    fn unknown_status_label_is_rejected() {
        let err = validate_project(&payload(json!({ "code": "P-1", "name": "Casa", "status": "Archived" })), "USD")
            .unwrap_err();
        assert_eq!(field_of(err), ("status".to_string(), "invalid_status"));
    }

    #[tokio::test]
    async fn project_writes_drop_cached_week_views_of_the_company() {
        let cache = WeekViewCache::new(std::time::Duration::from_secs(60), 100);
        let service = ProjectService::new(ProjectRepository::new(), SettingsRepository::new(), cache.clone());
        let company = Uuid::new_v4();
        let other_company = Uuid::new_v4();
        let week: chrono::NaiveDate = "2024-06-10".parse().expect("date");

        cache.insert((company, week, None), cache_view(week)).await;
        cache.insert((other_company, week, None), cache_view(week)).await;

        // Chamado após criar, editar ou remover um projeto
        service.invalidate_week_views(company).expect("invalidate");
        cache.sync().await;

        assert!(cache.get(&(company, week, None)).await.is_none());
        assert!(cache.get(&(other_company, week, None)).await.is_some());
    }
}
