// src/models/leave.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_duration_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveDurationType {
    #[default]
    FullDay,
    HalfDayAm,
    HalfDayPm,
}

impl LeaveDurationType {
    /// Fração do dia de trabalho consumida por dia de ausência.
    pub fn day_fraction(self) -> f64 {
        match self {
            LeaveDurationType::FullDay => 1.0,
            LeaveDurationType::HalfDayAm | LeaveDurationType::HalfDayPm => 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub member_id: Uuid,
    #[schema(example = "annual")]
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_type: LeaveDurationType,
    pub status: LeaveStatus,
    pub requested_approver_id: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da fila de aprovação (pedido + nomes para exibição)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    pub member_name: Option<String>,
    pub approver_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveListFilter {
    #[default]
    Pending,
    All,
}

impl LeaveListFilter {
    /// `Pending`: pedidos pendentes endereçados ao aprovador ou ainda sem aprovador.
    pub fn includes(self, request: &LeaveRequest, approver_id: Uuid) -> bool {
        match self {
            LeaveListFilter::Pending => {
                request.status == LeaveStatus::Pending
                    && request.requested_approver_id.is_none_or(|id| id == approver_id)
            }
            LeaveListFilter::All => true,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveListQuery {
    #[serde(default)]
    pub filter: LeaveListFilter,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproverCandidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_leave_dates"))]
pub struct CreateLeavePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "annual")]
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub duration_type: LeaveDurationType,
    pub requested_approver_id: Option<Uuid>,
    pub remarks: Option<String>,
}

fn validate_leave_dates(payload: &CreateLeavePayload) -> Result<(), ValidationError> {
    if payload.end_date < payload.start_date {
        return Err(ValidationError::new("invalid_range"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectLeavePayload {
    #[schema(example = "Overlaps with project delivery")]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignApproverPayload {
    pub new_approver_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(start: &str, end: &str) -> CreateLeavePayload {
        CreateLeavePayload {
            leave_type: "annual".into(),
            start_date: start.parse().expect("date"),
            end_date: end.parse().expect("date"),
            duration_type: LeaveDurationType::FullDay,
            requested_approver_id: None,
            remarks: None,
        }
    }

    #[test]
    fn end_before_start_is_invalid() {
        assert!(payload("2024-06-10", "2024-06-07").validate().is_err());
        assert!(payload("2024-06-10", "2024-06-10").validate().is_ok());
    }

    #[test]
    fn half_days_count_as_half() {
        assert_eq!(LeaveDurationType::HalfDayPm.day_fraction(), 0.5);
        assert_eq!(LeaveDurationType::FullDay.day_fraction(), 1.0);
    }

    fn request(status: LeaveStatus, approver: Option<Uuid>) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            leave_type: "annual".into(),
            start_date: "2024-06-10".parse().expect("date"),
            end_date: "2024-06-10".parse().expect("date"),
            duration_type: LeaveDurationType::FullDay,
            status,
            requested_approver_id: approver,
            approved_by: None,
            rejection_reason: None,
            remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unassigned_pending_requests_reach_every_approver_queue() {
        let me = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        assert!(LeaveListFilter::Pending.includes(&request(LeaveStatus::Pending, None), me));
        assert!(LeaveListFilter::Pending.includes(&request(LeaveStatus::Pending, Some(me)), me));
        assert!(!LeaveListFilter::Pending.includes(&request(LeaveStatus::Pending, Some(someone_else)), me));
        assert!(!LeaveListFilter::Pending.includes(&request(LeaveStatus::Approved, None), me));
        assert!(LeaveListFilter::All.includes(&request(LeaveStatus::Rejected, Some(someone_else)), me));
    }
}
