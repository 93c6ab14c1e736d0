// src/db/rbac_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::leave::ApproverCandidate};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Capacidades do membro ativo na empresa; None quando não é membro.
    pub async fn find_member_capabilities(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Vec<String>>, AppError> {
        let capabilities = sqlx::query_scalar::<_, Vec<String>>(
            r#"
            SELECT capabilities
            FROM company_members
            WHERE user_id = $1 AND company_id = $2 AND is_active = true
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(capabilities)
    }

    pub async fn user_has_permission(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM company_members
                WHERE user_id = $1
                  AND company_id = $2
                  AND is_active = true
                  AND $3 = ANY(capabilities)
            )
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Membros com a capacidade, exceto `exclude` (o aprovador atual).
    pub async fn list_members_with_permission(
        &self,
        company_id: Uuid,
        permission_slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ApproverCandidate>, AppError> {
        let candidates = sqlx::query_as::<_, ApproverCandidate>(
            r#"
            SELECT
                p.id,
                COALESCE(NULLIF(TRIM(CONCAT_WS(' ', p.first_name, p.last_name)), ''), p.email) AS name,
                p.email
            FROM company_members cm
            JOIN profiles p ON p.id = cm.user_id AND p.company_id = cm.company_id
            WHERE cm.company_id = $1
              AND cm.is_active = true
              AND $2 = ANY(cm.capabilities)
              AND ($3::uuid IS NULL OR p.id <> $3)
            ORDER BY name
            "#,
        )
        .bind(company_id)
        .bind(permission_slug)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates)
    }
}
