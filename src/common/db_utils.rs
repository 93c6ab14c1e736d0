use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::CompanyContext;

/// Variáveis de sessão que identificam empresa e usuário da requisição.
pub(crate) const SESSION_TAGS: [&str; 2] = ["app.company_id", "app.user_id"];

fn session_tag_values(company_id: Uuid, user_id: Uuid) -> [(&'static str, String); 2] {
    [
        (SESSION_TAGS[0], company_id.to_string()),
        (SESSION_TAGS[1], user_id.to_string()),
    ]
}

/// Zera as variáveis de sessão. Roda quando a conexão volta para a pool,
/// para que a próxima requisição não herde a empresa da anterior.
pub(crate) fn clear_session_tags_sql() -> String {
    let resets: Vec<String> = SESSION_TAGS
        .iter()
        .map(|key| format!("set_config('{}', '', false)", key))
        .collect();
    format!("SELECT {}", resets.join(", "))
}

pub(crate) async fn clear_session_tags(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(&clear_session_tags_sql()).execute(conn).await?;
    Ok(())
}

// ---
// Helper de sessão: marca a conexão com a empresa e o usuário
// ---
/// Adquire uma conexão da pool e define `app.company_id` e `app.user_id`.
/// São apenas marcações de sessão (auditoria, funções SQL); o isolamento
/// entre empresas vem do filtro `company_id` de cada consulta.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    company: &CompanyContext,
    user: &AuthenticatedUser,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    for (key, value) in session_tag_values(company.company_id, user.0.id) {
        sqlx::query("SELECT set_config($1, $2, false)")
            .bind(key)
            .bind(value)
            .execute(&mut *conn)
            .await?;
    }

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_clears_every_tag_set_on_acquire() {
        let sql = clear_session_tags_sql();
        for (key, _) in session_tag_values(Uuid::new_v4(), Uuid::new_v4()) {
            assert!(sql.contains(&format!("set_config('{key}', '', false)")), "{key} não é zerada");
        }
        assert!(sql.starts_with("SELECT "));
    }
}
