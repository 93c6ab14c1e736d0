// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Carga horária semanal padrão quando a empresa não configurou nenhuma.
pub const DEFAULT_WORK_WEEK_HOURS: f64 = 40.0;
pub const DEFAULT_WORKING_DAYS: i32 = 5;

// Como as células da grade de alocação são exibidas e editadas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "display_preference", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisplayPreference {
    #[default]
    Hours,
    Percentage,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = 40.0)]
    pub work_week_hours: f64,
    #[schema(example = 5)]
    pub working_days_per_week: i32,
    pub display_preference: DisplayPreference,
    #[schema(example = "USD")]
    pub default_currency: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CompanySettings {
    pub fn defaults_for(company_id: Uuid) -> Self {
        Self {
            company_id,
            work_week_hours: DEFAULT_WORK_WEEK_HOURS,
            working_days_per_week: DEFAULT_WORKING_DAYS,
            display_preference: DisplayPreference::Hours,
            default_currency: "USD".to_string(),
            updated_at: None,
        }
    }

    pub fn resourcing_config(&self) -> ResourcingConfig {
        ResourcingConfig {
            standard_weekly_capacity: self.work_week_hours,
            working_days_per_week: self.working_days_per_week.max(1) as u32,
            display_preference: self.display_preference,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 1.0, max = 168.0, message = "invalid_range"))]
    #[schema(example = 37.5)]
    pub work_week_hours: Option<f64>,

    #[validate(range(min = 1, max = 7, message = "invalid_range"))]
    pub working_days_per_week: Option<i32>,

    pub display_preference: Option<DisplayPreference>,

    #[validate(length(equal = 3, message = "invalid_range"))]
    pub default_currency: Option<String>,
}

/// Configuração explícita usada pelas funções de agregação e de formulário.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourcingConfig {
    pub standard_weekly_capacity: f64,
    pub working_days_per_week: u32,
    pub display_preference: DisplayPreference,
}

impl ResourcingConfig {
    /// Capacidade do membro, ou o padrão da empresa quando ausente/não positiva.
    pub fn capacity_for(&self, member_capacity: Option<f64>) -> f64 {
        match member_capacity {
            Some(c) if c > 0.0 => c,
            _ => self.standard_weekly_capacity,
        }
    }

    pub fn daily_hours(&self, weekly_capacity: f64) -> f64 {
        weekly_capacity / self.working_days_per_week as f64
    }
}

impl Default for ResourcingConfig {
    fn default() -> Self {
        Self {
            standard_weekly_capacity: DEFAULT_WORK_WEEK_HOURS,
            working_days_per_week: DEFAULT_WORKING_DAYS as u32,
            display_preference: DisplayPreference::Hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_falls_back_to_company_standard() {
        let config = ResourcingConfig { standard_weekly_capacity: 37.5, ..Default::default() };
        assert_eq!(config.capacity_for(Some(32.0)), 32.0);
        assert_eq!(config.capacity_for(None), 37.5);
        assert_eq!(config.capacity_for(Some(0.0)), 37.5);
    }

    #[test]
    fn daily_hours_split_over_working_days() {
        let config = ResourcingConfig::default();
        assert_eq!(config.daily_hours(40.0), 8.0);
    }
}
