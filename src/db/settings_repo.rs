use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{CompanySettings, UpdateSettingsRequest},
};

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    // Sem linha gravada = valores padrão da empresa
    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<CompanySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, CompanySettings>(
            "SELECT * FROM company_settings WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| CompanySettings::defaults_for(company_id)))
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        current: &CompanySettings,
        input: &UpdateSettingsRequest,
    ) -> Result<CompanySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update), campos ausentes mantêm o valor atual
        let settings = sqlx::query_as::<_, CompanySettings>(
            r#"
            INSERT INTO company_settings
                (company_id, work_week_hours, working_days_per_week, display_preference, default_currency)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (company_id)
            DO UPDATE SET
                work_week_hours = EXCLUDED.work_week_hours,
                working_days_per_week = EXCLUDED.working_days_per_week,
                display_preference = EXCLUDED.display_preference,
                default_currency = EXCLUDED.default_currency,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.work_week_hours.unwrap_or(current.work_week_hours))
        .bind(input.working_days_per_week.unwrap_or(current.working_days_per_week))
        .bind(input.display_preference.unwrap_or(current.display_preference))
        .bind(input.default_currency.as_deref().unwrap_or(&current.default_currency))
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
