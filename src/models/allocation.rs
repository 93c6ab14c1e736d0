// src/models/allocation.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{settings::DisplayPreference, team::TeamMember};

// --- Linhas do banco ---

// Uma linha diária de project_resource_allocations
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AllocationRow {
    pub resource_id: Uuid,
    pub project_id: Uuid,
    pub allocation_date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AnnualLeaveRow {
    pub member_id: Uuid,
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HolidayRow {
    pub name: String,
    pub date: NaiveDate,
    // None = feriado de todos os escritórios
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OtherLeaveRow {
    pub member_id: Uuid,
    pub hours: f64,
}

// --- Estrutura aninhada membro -> projeto -> dia ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAllocation {
    pub project_id: Uuid,
    // Total semanal gravado; ignorado quando há detalhamento diário
    pub hours: f64,
    pub daily_breakdown: Vec<DailyHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberAllocations {
    pub member_id: Uuid,
    pub projects: Vec<ProjectAllocation>,
}

/// Todas as ausências da semana já normalizadas para (membro, horas).
#[derive(Debug, Clone, Default)]
pub struct WeekLeaveData {
    pub annual_leaves: Vec<AnnualLeaveRow>,
    pub holidays: Vec<HolidayRow>,
    pub other_leaves: Vec<OtherLeaveRow>,
}

// --- Visão da semana ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationLevel {
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberSort {
    #[default]
    Alphabetical,
    Utilization,
    Location,
    Department,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberWeekRow {
    pub member: TeamMember,
    pub name: String,
    pub capacity: f64,
    // project_id -> horas da semana
    pub project_hours: BTreeMap<Uuid, f64>,
    pub total_project_hours: f64,
    pub leave_hours: f64,
    pub utilization_percentage: i64,
    pub utilization_level: UtilizationLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekResourceView {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub display_preference: DisplayPreference,
    pub projects: Vec<ProjectSummary>,
    pub members: Vec<MemberWeekRow>,
}

// --- Requisições ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    // Qualquer dia da semana desejada; padrão = hoje
    pub week: Option<NaiveDate>,
    pub department: Option<String>,
    #[serde(default)]
    pub sort: MemberSort,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCellPayload {
    pub project_id: Uuid,
    pub member_id: Uuid,
    pub week: NaiveDate,
    // Texto digitado na célula ("12", "12,5", "30%")
    #[schema(example = "12")]
    pub value: String,
    // Sobrepõe a preferência da empresa
    pub display_preference: Option<DisplayPreference>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CellQuery {
    pub project_id: Uuid,
    pub member_id: Uuid,
    pub week: NaiveDate,
    pub display_preference: Option<DisplayPreference>,
}

/// Valor inicial do editor de uma célula.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    pub week_start: NaiveDate,
    pub hours: f64,
    #[schema(example = "12.5")]
    pub value: String,
    pub display_preference: DisplayPreference,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCellOutcome {
    pub saved: bool,
    pub previous_hours: f64,
    pub hours: f64,
    pub week_start: NaiveDate,
}
