// src/db/leave_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::leave::{CreateLeavePayload, LeaveListFilter, LeaveRequest, LeaveRequestView, LeaveStatus},
};

const VIEW_SELECT: &str = r#"
    SELECT
        lr.id, lr.company_id, lr.member_id, lr.leave_type, lr.start_date, lr.end_date,
        lr.duration_type, lr.status, lr.requested_approver_id, lr.approved_by,
        lr.rejection_reason, lr.remarks, lr.created_at, lr.updated_at,
        NULLIF(TRIM(CONCAT_WS(' ', m.first_name, m.last_name)), '') AS member_name,
        NULLIF(TRIM(CONCAT_WS(' ', a.first_name, a.last_name)), '') AS approver_name
    FROM leave_requests lr
    LEFT JOIN profiles m ON m.id = lr.member_id AND m.company_id = lr.company_id
    LEFT JOIN profiles a ON a.id = lr.requested_approver_id AND a.company_id = lr.company_id
"#;

#[derive(Clone, Default)]
pub struct LeaveRepository;

impl LeaveRepository {
    pub fn new() -> Self {
        Self
    }

    /// Fila do aprovador: pendentes endereçados a ele ou sem aprovador definido,
    /// ou todos da empresa. Mesma regra de `LeaveListFilter::includes`.
    pub async fn list_requests<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        approver_id: Uuid,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequestView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = match filter {
            LeaveListFilter::Pending => {
                let sql = format!(
                    "{VIEW_SELECT}
                     WHERE lr.company_id = $1 AND lr.status = 'pending'
                       AND (lr.requested_approver_id = $2 OR lr.requested_approver_id IS NULL)
                     ORDER BY lr.start_date, lr.created_at"
                );
                sqlx::query_as::<_, LeaveRequestView>(&sql)
                    .bind(company_id)
                    .bind(approver_id)
                    .fetch_all(executor)
                    .await?
            }
            LeaveListFilter::All => {
                let sql = format!(
                    "{VIEW_SELECT}
                     WHERE lr.company_id = $1
                     ORDER BY lr.created_at DESC"
                );
                sqlx::query_as::<_, LeaveRequestView>(&sql)
                    .bind(company_id)
                    .fetch_all(executor)
                    .await?
            }
        };

        Ok(requests)
    }

    pub async fn find_request<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<LeaveRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            "SELECT * FROM leave_requests WHERE company_id = $1 AND id = $2",
        )
        .bind(company_id)
        .bind(request_id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn create_request<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        member_id: Uuid,
        payload: &CreateLeavePayload,
    ) -> Result<LeaveRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"
            INSERT INTO leave_requests (
                company_id, member_id, leave_type, start_date, end_date,
                duration_type, requested_approver_id, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(member_id)
        .bind(payload.leave_type.trim())
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.duration_type)
        .bind(payload.requested_approver_id)
        .bind(payload.remarks.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    /// Muda o status apenas se o pedido ainda estiver pendente.
    /// `None` = outro aprovador chegou antes.
    pub async fn transition_status<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        request_id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<LeaveRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"
            UPDATE leave_requests
            SET status = $3, approved_by = $4, rejection_reason = $5, updated_at = NOW()
            WHERE company_id = $1 AND id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(request_id)
        .bind(status)
        .bind(decided_by)
        .bind(rejection_reason)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn reassign_approver<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        request_id: Uuid,
        new_approver_id: Uuid,
    ) -> Result<Option<LeaveRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"
            UPDATE leave_requests
            SET requested_approver_id = $3, updated_at = NOW()
            WHERE company_id = $1 AND id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(request_id)
        .bind(new_approver_id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    // Um registro de annual_leaves por dia útil aprovado
    pub async fn insert_annual_leave<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        member_id: Uuid,
        request_id: Uuid,
        date: NaiveDate,
        hours: f64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO annual_leaves (company_id, member_id, leave_request_id, date, hours)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(company_id)
        .bind(member_id)
        .bind(request_id)
        .bind(date)
        .bind(hours)
        .execute(executor)
        .await?;

        Ok(())
    }
}
