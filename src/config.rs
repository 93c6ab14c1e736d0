// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::{db_utils::clear_session_tags, i18n::I18nStore},
    db::{
        AllocationRepository, CompanyRepository, LeaveRepository, LookupsRepository,
        ProjectRepository, RbacRepository, SettingsRepository, TeamRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        company_service::CompanyService,
        leave_service::LeaveService,
        project_service::ProjectService,
        resourcing_service::{ResourcingService, WeekViewCache},
        team_service::TeamService,
    },
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_WEEK_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_WEEK_CACHE_MAX_CAPACITY: u64 = 1_000;

/// Variáveis de ambiente lidas na inicialização.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub week_cache_ttl: Duration,
    pub week_cache_max_capacity: u64,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // `lookup` permite testar sem mexer no ambiente do processo
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let ttl_seconds = match lookup("WEEK_CACHE_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("WEEK_CACHE_TTL_SECONDS inválido: {raw}"))?,
            None => DEFAULT_WEEK_CACHE_TTL_SECONDS,
        };
        let week_cache_max_capacity = match lookup("WEEK_CACHE_MAX_CAPACITY") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("WEEK_CACHE_MAX_CAPACITY inválido: {raw}"))?,
            None => DEFAULT_WEEK_CACHE_MAX_CAPACITY,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            week_cache_ttl: Duration::from_secs(ttl_seconds),
            week_cache_max_capacity,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub rbac_repo: RbacRepository,
    pub settings_repo: SettingsRepository,
    pub lookups_repo: LookupsRepository,
    pub company_service: CompanyService,
    pub team_service: TeamService,
    pub project_service: ProjectService,
    pub leave_service: LeaveService,
    pub resourcing_service: ResourcingService,
}

impl AppState {
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            // Conexão devolvida à pool não carrega a empresa da requisição anterior
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    clear_session_tags(conn).await?;
                    Ok(true)
                })
            })
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: &ServerConfig) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new();
        let team_repo = TeamRepository::new();
        let project_repo = ProjectRepository::new();

        // Um único cache: toda escrita que muda a grade invalida o que ela lê
        let week_cache = WeekViewCache::new(config.week_cache_ttl, config.week_cache_max_capacity);

        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), db_pool.clone());
        let company_service =
            CompanyService::new(CompanyRepository::new(), team_repo.clone(), db_pool.clone());
        let team_service = TeamService::new(team_repo.clone(), week_cache.clone());
        let project_service =
            ProjectService::new(project_repo.clone(), settings_repo.clone(), week_cache.clone());
        let leave_service = LeaveService::new(
            LeaveRepository::new(),
            team_repo,
            settings_repo.clone(),
            rbac_repo.clone(),
            week_cache.clone(),
        );
        let resourcing_service = ResourcingService::new(
            AllocationRepository::new(),
            project_repo,
            settings_repo.clone(),
            team_service.clone(),
            week_cache,
        );

        Self {
            db_pool,
            jwt_secret: config.jwt_secret.clone(),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            rbac_repo,
            settings_repo,
            lookups_repo: LookupsRepository::new(),
            company_service,
            team_service,
            project_service,
            leave_service,
            resourcing_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/resourcing"),
            ("JWT_SECRET", "secret"),
        ]))
        .expect("config");

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.week_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.week_cache_max_capacity, 1_000);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = ServerConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/resourcing",
        )]));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn every_writer_shares_the_week_cache_read_by_the_grid() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/resourcing"),
            ("JWT_SECRET", "secret"),
        ]))
        .expect("config");
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("pool");
        let state = AppState::with_pool(pool, &config);
        let cache = state.resourcing_service.cache();

        let company = uuid::Uuid::new_v4();
        let week: chrono::NaiveDate = "2024-06-10".parse().expect("date");
        let view = || {
            Arc::new(crate::models::allocation::WeekResourceView {
                week_start: week,
                week_end: week + chrono::Duration::days(6),
                display_preference: crate::models::settings::DisplayPreference::Hours,
                projects: vec![],
                members: vec![],
            })
        };

        cache.insert((company, week, None), view()).await;
        state.project_service.invalidate_week_views(company).expect("invalidate");
        cache.sync().await;
        assert!(cache.get(&(company, week, None)).await.is_none());

        cache.insert((company, week, None), view()).await;
        state.team_service.invalidate_week_views(company).expect("invalidate");
        cache.sync().await;
        assert!(cache.get(&(company, week, None)).await.is_none());
    }

    #[test]
    fn invalid_cache_ttl_is_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/resourcing"),
            ("JWT_SECRET", "secret"),
            ("WEEK_CACHE_TTL_SECONDS", "five"),
        ]));
        assert!(result.is_err());
    }
}
