// src/services/resourcing_service.rs

use chrono::{Duration as ChronoDuration, NaiveDate};
use moka::future::Cache;
use sqlx::{Connection, PgConnection};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AllocationRepository, ProjectRepository, SettingsRepository},
    models::{
        allocation::{
            CellQuery, CellValue, SaveCellOutcome, SaveCellPayload, WeekLeaveData, WeekQuery,
            WeekResourceView,
        },
        settings::ResourcingConfig,
        team::TeamMember,
    },
    services::{
        allocation_map::{
            build_member_rows, cell_needs_save, create_allocation_map, format_cell_value,
            leave_hours_by_member, nest_allocations, parse_cell_input, projects_missing_from_columns,
            sort_member_rows, week_end_of, week_start_of,
        },
        team_service::TeamService,
    },
};

/// (empresa, segunda-feira da semana, departamento)
pub type WeekCacheKey = (Uuid, NaiveDate, Option<String>);

// Visões da semana já agregadas (sem ordenação). Cada escrita de alocação ou
// de ausência invalida apenas as entradas da empresa e semana afetadas.
#[derive(Clone)]
pub struct WeekViewCache {
    inner: Cache<WeekCacheKey, Arc<WeekResourceView>>,
}

impl WeekViewCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &WeekCacheKey) -> Option<Arc<WeekResourceView>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: WeekCacheKey, view: Arc<WeekResourceView>) {
        self.inner.insert(key, view).await;
    }

    pub fn invalidate_week(&self, company_id: Uuid, week_start: NaiveDate) -> Result<(), AppError> {
        self.inner
            .invalidate_entries_if(move |key, _| key.0 == company_id && key.1 == week_start)
            .map_err(|e| anyhow::anyhow!("Falha ao invalidar o cache da semana: {}", e))?;
        tracing::debug!(%company_id, %week_start, "Cache da semana invalidado");
        Ok(())
    }

    // Mudança de configuração afeta todas as semanas da empresa
    pub fn invalidate_company(&self, company_id: Uuid) -> Result<(), AppError> {
        self.inner
            .invalidate_entries_if(move |key, _| key.0 == company_id)
            .map_err(|e| anyhow::anyhow!("Falha ao invalidar o cache da empresa: {}", e))?;
        Ok(())
    }

    // Aplica invalidações pendentes antes das asserções
    #[cfg(test)]
    pub(crate) async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Invalida todas as semanas tocadas pelo intervalo (inclusive).
    pub fn invalidate_range(&self, company_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
        let mut week = week_start_of(start);
        while week <= end {
            self.invalidate_week(company_id, week)?;
            week += ChronoDuration::days(7);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ResourcingService {
    allocation_repo: AllocationRepository,
    project_repo: ProjectRepository,
    settings_repo: SettingsRepository,
    team_service: TeamService,
    cache: WeekViewCache,
}

impl ResourcingService {
    pub fn new(
        allocation_repo: AllocationRepository,
        project_repo: ProjectRepository,
        settings_repo: SettingsRepository,
        team_service: TeamService,
        cache: WeekViewCache,
    ) -> Self {
        Self { allocation_repo, project_repo, settings_repo, team_service, cache }
    }

    pub fn cache(&self) -> &WeekViewCache {
        &self.cache
    }

    /// Grade da semana que contém `query.week` (ou `today`), ordenada.
    pub async fn get_week_view(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        query: &WeekQuery,
        today: NaiveDate,
    ) -> Result<WeekResourceView, AppError> {
        let week_start = week_start_of(query.week.unwrap_or(today));
        let department = query
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        let key: WeekCacheKey = (company_id, week_start, department);

        let cached = self.cache.get(&key).await;
        let view = match cached {
            Some(view) => {
                tracing::debug!(%company_id, %week_start, "Visão da semana servida do cache");
                view
            }
            None => {
                tracing::debug!(%company_id, %week_start, "Visão da semana fora do cache");
                let view = Arc::new(
                    self.build_week_view(conn, company_id, week_start, key.2.as_deref())
                        .await?,
                );
                self.cache.insert(key, view.clone()).await;
                view
            }
        };

        let mut view = (*view).clone();
        sort_member_rows(&mut view.members, query.sort);
        Ok(view)
    }

    async fn build_week_view(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        week_start: NaiveDate,
        department: Option<&str>,
    ) -> Result<WeekResourceView, AppError> {
        let week_end = week_end_of(week_start);
        let settings = self.settings_repo.get_settings(&mut *conn, company_id).await?;
        let config = settings.resourcing_config();

        let members = self.team_service.list_members(conn, company_id, department).await?;
        let mut projects = self
            .allocation_repo
            .week_projects(&mut *conn, company_id, department)
            .await?;
        let rows = self
            .allocation_repo
            .week_allocations(&mut *conn, company_id, week_start, week_end)
            .await?;
        let leave = WeekLeaveData {
            annual_leaves: self
                .allocation_repo
                .annual_leaves(&mut *conn, company_id, week_start, week_end)
                .await?,
            holidays: self
                .allocation_repo
                .holidays(&mut *conn, company_id, week_start, week_end)
                .await?,
            other_leaves: self
                .allocation_repo
                .other_leaves(&mut *conn, company_id, week_start)
                .await?,
        };

        let allocation_map = create_allocation_map(&nest_allocations(&rows));
        let leave_hours = leave_hours_by_member(&members, &leave, &config);

        // Horas já lançadas precisam de coluna, mesmo fora do filtro de projetos
        let missing = projects_missing_from_columns(&projects, &members, &allocation_map);
        if !missing.is_empty() {
            projects.extend(
                self.allocation_repo
                    .projects_by_ids(&mut *conn, company_id, &missing)
                    .await?,
            );
            projects.sort_by(|a, b| a.code.cmp(&b.code));
        }

        Ok(WeekResourceView {
            week_start,
            week_end,
            display_preference: config.display_preference,
            projects,
            members: build_member_rows(&members, &allocation_map, &leave_hours, &config),
        })
    }

    /// Valor atual da célula, já formatado para o editor.
    pub async fn get_cell(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        query: &CellQuery,
    ) -> Result<CellValue, AppError> {
        let week_start = week_start_of(query.week);
        let (member, config) = self.member_and_config(conn, company_id, query.member_id).await?;
        let capacity = config.capacity_for(member.weekly_capacity());
        let preference = query.display_preference.unwrap_or(config.display_preference);

        let hours = self
            .allocation_repo
            .cell_hours(
                &mut *conn,
                company_id,
                query.project_id,
                query.member_id,
                week_start,
                week_end_of(week_start),
            )
            .await?;

        Ok(CellValue {
            week_start,
            hours,
            value: format_cell_value(hours, preference, capacity),
            display_preference: preference,
            capacity,
        })
    }

    /// Grava a célula (projeto x membro x semana) quando o valor mudou.
    /// A semana passa a ter uma única linha, na segunda-feira; 0 apaga a célula.
    pub async fn save_cell(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &SaveCellPayload,
    ) -> Result<SaveCellOutcome, AppError> {
        let week_start = week_start_of(payload.week);
        let week_end = week_end_of(week_start);

        let (member, config) = self.member_and_config(conn, company_id, payload.member_id).await?;
        self.project_repo
            .find_project(&mut *conn, company_id, payload.project_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Project".to_string()))?;

        let capacity = config.capacity_for(member.weekly_capacity());
        let preference = payload.display_preference.unwrap_or(config.display_preference);
        let hours = parse_cell_input(&payload.value, preference, capacity).ok_or_else(|| {
            AppError::FieldValidation { field: "value".to_string(), code: "invalid_range" }
        })?;

        let previous_hours = self
            .allocation_repo
            .cell_hours(&mut *conn, company_id, payload.project_id, payload.member_id, week_start, week_end)
            .await?;

        if !cell_needs_save(previous_hours, hours, preference, capacity) {
            return Ok(SaveCellOutcome { saved: false, previous_hours, hours: previous_hours, week_start });
        }

        let mut tx = conn.begin().await?;
        self.allocation_repo
            .clear_cell_days(
                &mut *tx,
                company_id,
                payload.project_id,
                payload.member_id,
                week_start,
                week_end,
                hours > 0.0,
            )
            .await?;
        if hours > 0.0 {
            self.allocation_repo
                .upsert_cell(
                    &mut *tx,
                    company_id,
                    payload.project_id,
                    payload.member_id,
                    member.resource_type(),
                    week_start,
                    hours,
                )
                .await?;
        }
        tx.commit().await?;

        tracing::info!(
            %company_id,
            project_id = %payload.project_id,
            member_id = %payload.member_id,
            %week_start,
            previous_hours,
            hours,
            "Alocação gravada"
        );
        self.cache.invalidate_week(company_id, week_start)?;

        Ok(SaveCellOutcome { saved: true, previous_hours, hours, week_start })
    }

    async fn member_and_config(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        member_id: Uuid,
    ) -> Result<(TeamMember, ResourcingConfig), AppError> {
        let member = self
            .team_service
            .find_member(conn, company_id, member_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Member".to_string()))?;
        let settings = self.settings_repo.get_settings(&mut *conn, company_id).await?;

        Ok((member, settings.resourcing_config()))
    }
}
