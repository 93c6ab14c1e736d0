//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, ServerConfig};
use crate::middleware::auth::{auth_guard, company_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = ServerConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Só exigem o token, não uma empresa ativa
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/companies", get(handlers::auth::get_my_companies))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let company_routes = Router::new()
        .route("/", post(handlers::companies::create_company))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let project_routes = Router::new()
        .route(
            "/",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route("/code-availability", get(handlers::projects::check_code_availability))
        .route(
            "/{id}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route("/{id}/stages/reconcile", post(handlers::projects::reconcile_stages))
        .route("/{id}/financials", get(handlers::projects::get_financials));

    let leave_routes = Router::new()
        .route(
            "/requests",
            get(handlers::leave::list_requests).post(handlers::leave::create_request),
        )
        .route("/requests/{id}/approve", post(handlers::leave::approve_request))
        .route("/requests/{id}/reject", post(handlers::leave::reject_request))
        .route("/requests/{id}/reassign", post(handlers::leave::reassign_approver))
        .route("/requests/{id}/cancel", post(handlers::leave::cancel_request))
        .route(
            "/requests/{id}/approver-candidates",
            get(handlers::leave::approver_candidates),
        );

    let team_routes = Router::new()
        .route("/members", get(handlers::team::list_members))
        .route("/invites", post(handlers::team::create_invite));

    let resourcing_routes = Router::new()
        .route("/week", get(handlers::resourcing::get_week))
        .route(
            "/cell",
            get(handlers::resourcing::get_cell).put(handlers::resourcing::save_cell),
        );

    let lookup_routes = Router::new()
        .route("/stages", get(handlers::lookups::list_stages))
        .route("/locations", get(handlers::lookups::list_locations))
        .route("/areas", get(handlers::lookups::list_areas));

    let settings_routes = Router::new().route(
        "/",
        get(handlers::settings::get_settings).put(handlers::settings::update_settings),
    );

    // Tudo abaixo exige token + x-company-id de uma empresa da qual o usuário é membro
    let company_scoped_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/leave", leave_routes)
        .nest("/team", team_routes)
        .nest("/resourcing", resourcing_routes)
        .nest("/lookups", lookup_routes)
        .nest("/settings", settings_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), company_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/companies", company_routes)
        .nest("/api", company_scoped_routes)
        .with_state(app_state)
}
