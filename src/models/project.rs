// src/models/project.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::saga::SagaReport;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

// Tabela de conversão entre o rótulo exibido e o valor do banco
const STATUS_LABELS: &[(ProjectStatus, &str, &str)] = &[
    (ProjectStatus::Planning, "Planning", "planning"),
    (ProjectStatus::InProgress, "In Progress", "in_progress"),
    (ProjectStatus::OnHold, "On Hold", "on_hold"),
    (ProjectStatus::Completed, "Completed", "completed"),
    (ProjectStatus::Cancelled, "Cancelled", "cancelled"),
];

impl ProjectStatus {
    pub fn label(self) -> &'static str {
        STATUS_LABELS
            .iter()
            .find(|(status, _, _)| *status == self)
            .map(|(_, label, _)| *label)
            .unwrap_or("Planning")
    }

    /// Aceita tanto o rótulo ("In Progress") quanto o valor do banco ("in_progress").
    pub fn from_label(input: &str) -> Option<Self> {
        let input = input.trim();
        STATUS_LABELS
            .iter()
            .find(|(_, label, value)| label.eq_ignore_ascii_case(input) || *value == input)
            .map(|(status, _, _)| *status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    NotBilled,
    Invoiced,
    Paid,
}

// --- Linhas do banco ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "P-2024-001")]
    pub code: String,
    #[schema(example = "Residência Vila Nova")]
    pub name: String,
    pub manager_id: Option<Uuid>,
    #[schema(example = "BR")]
    pub country: Option<String>,
    pub office_id: Option<Uuid>,
    pub department: Option<String>,
    pub status: ProjectStatus,
    pub current_stage: Option<String>,
    #[schema(example = "25.00")]
    pub target_profit_percentage: Option<Decimal>,
    #[schema(example = json!(["Concept", "Design Development"]))]
    pub stages: Vec<String>,
    #[schema(example = "150.00")]
    pub avg_rate: Option<Decimal>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStage {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Concept")]
    pub stage_name: String,
    #[schema(example = "12000.00")]
    pub fee: Decimal,
    pub is_applicable: bool,
    #[schema(example = "2024-05")]
    pub billing_month: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFee {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub stage_name: String,
    pub fee: Decimal,
    pub currency: String,
    pub billing_month: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_status: InvoiceStatus,
    pub updated_at: DateTime<Utc>,
}

// Calculado pela função get_project_financial_metrics no banco
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFinancialMetrics {
    pub total_fee: Decimal,
    pub invoiced_fee: Decimal,
    pub allocated_hours: f64,
    pub estimated_cost: Decimal,
    pub projected_profit: Decimal,
    pub profit_percentage: Decimal,
}

// --- Payloads ---

/// Variante do formulário. O diálogo exige o conjunto estendido de campos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFormVariant {
    #[default]
    Wizard,
    Dialog,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageInput {
    #[schema(example = "Concept")]
    pub stage_name: String,
    // Ausente na edição = preserva a fee existente
    pub fee: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_applicable: bool,
    pub billing_month: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_status: Option<InvoiceStatus>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[serde(default)]
    pub variant: ProjectFormVariant,
    #[schema(example = "P-2024-001")]
    pub code: String,
    #[schema(example = "Residência Vila Nova")]
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub country: Option<String>,
    pub office_id: Option<Uuid>,
    pub department: Option<String>,
    // Rótulo ("In Progress") ou valor do banco ("in_progress")
    #[schema(example = "In Progress")]
    pub status: Option<String>,
    pub current_stage: Option<String>,
    pub target_profit_percentage: Option<Decimal>,
    pub avg_rate: Option<Decimal>,
    pub currency: Option<String>,
    #[serde(default)]
    pub stages: Vec<StageInput>,
}

// Payload já validado e normalizado, pronto para o repositório
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub code: String,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub country: Option<String>,
    pub office_id: Option<Uuid>,
    pub department: Option<String>,
    pub status: ProjectStatus,
    pub current_stage: Option<String>,
    pub target_profit_percentage: Option<Decimal>,
    pub avg_rate: Option<Decimal>,
    pub currency: String,
    pub stage_names: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CodeAvailabilityQuery {
    pub code: String,
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeAvailability {
    pub code: String,
    pub available: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStagesPayload {
    // Passos a refazer (ex: "upsert_fee:Concept"); vazio = todos os pendentes
    #[serde(default)]
    pub steps: Vec<String>,
}

// --- Respostas ---

/// Etapa com os campos derivados (horas estimadas e idade da fatura).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    #[serde(flatten)]
    pub stage: ProjectStage,
    pub hours: Option<Decimal>,
    pub invoice_age_days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub status_label: String,
    pub stage_details: Vec<StageView>,
}

/// Resultado de uma gravação de projeto: a linha salva e o relatório das etapas.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSaveResponse {
    pub project: Project,
    pub stages: SagaReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_between_labels_and_values() {
        assert_eq!(ProjectStatus::from_label("In Progress"), Some(ProjectStatus::InProgress));
        assert_eq!(ProjectStatus::from_label("in_progress"), Some(ProjectStatus::InProgress));
        assert_eq!(ProjectStatus::from_label("on hold"), Some(ProjectStatus::OnHold));
        assert_eq!(ProjectStatus::from_label("Archived"), None);
        assert_eq!(ProjectStatus::Completed.label(), "Completed");
    }

    #[test]
    fn stage_input_defaults_to_applicable() {
        let stage: StageInput = serde_json::from_value(json!({ "stageName": "Concept" })).expect("stage");
        assert!(stage.is_applicable);
        assert!(stage.fee.is_none());
    }
}
