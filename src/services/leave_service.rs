// src/services/leave_service.rs

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{LeaveRepository, RbacRepository, SettingsRepository, TeamRepository},
    middleware::rbac::LEAVE_APPROVE,
    models::{
        leave::{
            ApproverCandidate, CreateLeavePayload, LeaveDurationType, LeaveListFilter, LeaveRequest,
            LeaveRequestView, LeaveStatus,
        },
        settings::ResourcingConfig,
        team::Profile,
    },
    services::resourcing_service::WeekViewCache,
};

/// Motivo da recusa já aparado; vazio é rejeitado antes de qualquer escrita.
pub fn rejection_reason(input: &str) -> Result<&str, AppError> {
    let reason = input.trim();
    if reason.is_empty() {
        return Err(AppError::EmptyRejectionReason);
    }
    Ok(reason)
}

pub fn ensure_pending(request: &LeaveRequest) -> Result<(), AppError> {
    if request.status != LeaveStatus::Pending {
        return Err(AppError::InvalidStatusTransition(request.status.as_str().to_string()));
    }
    Ok(())
}

/// Horas de ausência por dia útil do intervalo (inclusive).
pub fn leave_day_hours(
    start: NaiveDate,
    end: NaiveDate,
    duration: LeaveDurationType,
    weekly_capacity: f64,
    config: &ResourcingConfig,
) -> Vec<(NaiveDate, f64)> {
    let hours = config.daily_hours(weekly_capacity) * duration.day_fraction();

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| d.weekday().num_days_from_monday() < config.working_days_per_week)
        .map(|d| (d, hours))
        .collect()
}

// ---
// Porta de persistência do fluxo de ausências
// ---

/// Leituras e escritas usadas pelo fluxo de aprovação.
#[async_trait]
pub trait LeaveStore: Send {
    async fn find_request(&mut self, company_id: Uuid, request_id: Uuid) -> Result<Option<LeaveRequest>, AppError>;

    async fn list_requests(
        &mut self,
        company_id: Uuid,
        approver_id: Uuid,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequestView>, AppError>;

    async fn find_profile(&mut self, company_id: Uuid, member_id: Uuid) -> Result<Option<Profile>, AppError>;

    async fn resourcing_config(&mut self, company_id: Uuid) -> Result<ResourcingConfig, AppError>;

    async fn can_approve(&mut self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    async fn approver_candidates(
        &mut self,
        company_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ApproverCandidate>, AppError>;

    async fn create_request(
        &mut self,
        company_id: Uuid,
        member_id: Uuid,
        payload: &CreateLeavePayload,
    ) -> Result<LeaveRequest, AppError>;

    /// Aprovação atômica: status + um registro de férias por dia.
    /// `None` quando o pedido já não estava pendente.
    async fn approve(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        approver_id: Uuid,
        days: &[(NaiveDate, f64)],
    ) -> Result<Option<LeaveRequest>, AppError>;

    async fn transition_status(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<LeaveRequest>, AppError>;

    async fn reassign_approver(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        new_approver_id: Uuid,
    ) -> Result<Option<LeaveRequest>, AppError>;
}

// ---
// Fluxo (independente do banco)
// ---

async fn find_or_404<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    request_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    store
        .find_request(company_id, request_id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Leave request".to_string()))
}

async fn ensure_can_approve<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    if !store.can_approve(company_id, user_id).await? {
        return Err(AppError::InvalidApprover);
    }
    Ok(())
}

pub async fn create_leave<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    member_id: Uuid,
    payload: &CreateLeavePayload,
) -> Result<LeaveRequest, AppError> {
    payload.validate()?;

    store
        .find_profile(company_id, member_id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Profile".to_string()))?;

    if let Some(approver_id) = payload.requested_approver_id {
        ensure_can_approve(store, company_id, approver_id).await?;
    }

    let request = store.create_request(company_id, member_id, payload).await?;
    tracing::info!(request_id = %request.id, %member_id, "Pedido de ausência criado");
    Ok(request)
}

/// Aprova o pedido (registros de férias na mesma transação) e invalida as semanas tocadas.
pub async fn approve_leave<S: LeaveStore + ?Sized>(
    store: &mut S,
    week_cache: &WeekViewCache,
    company_id: Uuid,
    approver_id: Uuid,
    request_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    let request = find_or_404(store, company_id, request_id).await?;
    ensure_pending(&request)?;

    let config = store.resourcing_config(company_id).await?;
    let member_capacity = store
        .find_profile(company_id, request.member_id)
        .await?
        .and_then(|p| p.weekly_capacity);
    let days = leave_day_hours(
        request.start_date,
        request.end_date,
        request.duration_type,
        config.capacity_for(member_capacity),
        &config,
    );

    let approved = store
        .approve(company_id, request_id, approver_id, &days)
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition(request.status.as_str().to_string()))?;

    tracing::info!(%request_id, %approver_id, days = days.len(), "Pedido de ausência aprovado");
    week_cache.invalidate_range(company_id, approved.start_date, approved.end_date)?;

    Ok(approved)
}

pub async fn reject_leave<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    approver_id: Uuid,
    request_id: Uuid,
    reason: &str,
) -> Result<LeaveRequest, AppError> {
    let reason = rejection_reason(reason)?;

    let request = find_or_404(store, company_id, request_id).await?;
    ensure_pending(&request)?;

    let rejected = store
        .transition_status(company_id, request_id, LeaveStatus::Rejected, Some(approver_id), Some(reason))
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition(request.status.as_str().to_string()))?;

    tracing::info!(%request_id, %approver_id, "Pedido de ausência recusado");
    Ok(rejected)
}

pub async fn reassign_leave<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    request_id: Uuid,
    new_approver_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    let request = find_or_404(store, company_id, request_id).await?;
    ensure_pending(&request)?;

    if request.requested_approver_id == Some(new_approver_id) {
        return Err(AppError::InvalidApprover);
    }
    ensure_can_approve(store, company_id, new_approver_id).await?;

    let reassigned = store
        .reassign_approver(company_id, request_id, new_approver_id)
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition(request.status.as_str().to_string()))?;

    tracing::info!(%request_id, %new_approver_id, "Aprovador reatribuído");
    Ok(reassigned)
}

// Só o próprio membro cancela, e apenas enquanto pendente
pub async fn cancel_leave<S: LeaveStore + ?Sized>(
    store: &mut S,
    company_id: Uuid,
    member_id: Uuid,
    request_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    let request = find_or_404(store, company_id, request_id).await?;
    if request.member_id != member_id {
        return Err(AppError::PermissionDenied("leave:cancel".to_string()));
    }
    ensure_pending(&request)?;

    let cancelled = store
        .transition_status(company_id, request_id, LeaveStatus::Cancelled, None, None)
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition(request.status.as_str().to_string()))?;

    tracing::info!(%request_id, "Pedido de ausência cancelado");
    Ok(cancelled)
}

// ---
// Adaptador do LeaveStore sobre uma conexão RLS
// ---

struct PgLeaveStore<'c> {
    conn: &'c mut PgConnection,
    service: &'c LeaveService,
}

#[async_trait]
impl LeaveStore for PgLeaveStore<'_> {
    async fn find_request(&mut self, company_id: Uuid, request_id: Uuid) -> Result<Option<LeaveRequest>, AppError> {
        self.service
            .leave_repo
            .find_request(&mut *self.conn, company_id, request_id)
            .await
    }

    async fn list_requests(
        &mut self,
        company_id: Uuid,
        approver_id: Uuid,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequestView>, AppError> {
        self.service
            .leave_repo
            .list_requests(&mut *self.conn, company_id, approver_id, filter)
            .await
    }

    async fn find_profile(&mut self, company_id: Uuid, member_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.service
            .team_repo
            .find_profile(&mut *self.conn, company_id, member_id)
            .await
    }

    async fn resourcing_config(&mut self, company_id: Uuid) -> Result<ResourcingConfig, AppError> {
        Ok(self
            .service
            .settings_repo
            .get_settings(&mut *self.conn, company_id)
            .await?
            .resourcing_config())
    }

    async fn can_approve(&mut self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        self.service
            .rbac_repo
            .user_has_permission(user_id, company_id, LEAVE_APPROVE)
            .await
    }

    async fn approver_candidates(
        &mut self,
        company_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ApproverCandidate>, AppError> {
        self.service
            .rbac_repo
            .list_members_with_permission(company_id, LEAVE_APPROVE, exclude)
            .await
    }

    async fn create_request(
        &mut self,
        company_id: Uuid,
        member_id: Uuid,
        payload: &CreateLeavePayload,
    ) -> Result<LeaveRequest, AppError> {
        self.service
            .leave_repo
            .create_request(&mut *self.conn, company_id, member_id, payload)
            .await
    }

    async fn approve(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        approver_id: Uuid,
        days: &[(NaiveDate, f64)],
    ) -> Result<Option<LeaveRequest>, AppError> {
        let repo = &self.service.leave_repo;
        let mut tx = (*self.conn).begin().await?;

        let Some(approved) = repo
            .transition_status(&mut *tx, company_id, request_id, LeaveStatus::Approved, Some(approver_id), None)
            .await?
        else {
            return Ok(None);
        };

        for (date, hours) in days {
            repo.insert_annual_leave(&mut *tx, company_id, approved.member_id, approved.id, *date, *hours)
                .await?;
        }
        tx.commit().await?;

        Ok(Some(approved))
    }

    async fn transition_status(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<LeaveRequest>, AppError> {
        self.service
            .leave_repo
            .transition_status(&mut *self.conn, company_id, request_id, status, decided_by, rejection_reason)
            .await
    }

    async fn reassign_approver(
        &mut self,
        company_id: Uuid,
        request_id: Uuid,
        new_approver_id: Uuid,
    ) -> Result<Option<LeaveRequest>, AppError> {
        self.service
            .leave_repo
            .reassign_approver(&mut *self.conn, company_id, request_id, new_approver_id)
            .await
    }
}

#[derive(Clone)]
pub struct LeaveService {
    leave_repo: LeaveRepository,
    team_repo: TeamRepository,
    settings_repo: SettingsRepository,
    rbac_repo: RbacRepository,
    week_cache: WeekViewCache,
}

impl LeaveService {
    pub fn new(
        leave_repo: LeaveRepository,
        team_repo: TeamRepository,
        settings_repo: SettingsRepository,
        rbac_repo: RbacRepository,
        week_cache: WeekViewCache,
    ) -> Self {
        Self { leave_repo, team_repo, settings_repo, rbac_repo, week_cache }
    }

    fn store<'c>(&'c self, conn: &'c mut PgConnection) -> PgLeaveStore<'c> {
        PgLeaveStore { conn, service: self }
    }

    pub async fn list_requests(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        approver_id: Uuid,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequestView>, AppError> {
        self.store(conn).list_requests(company_id, approver_id, filter).await
    }

    pub async fn create_request(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        member_id: Uuid,
        payload: &CreateLeavePayload,
    ) -> Result<LeaveRequest, AppError> {
        create_leave(&mut self.store(conn), company_id, member_id, payload).await
    }

    pub async fn approve_request(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        approver_id: Uuid,
        request_id: Uuid,
    ) -> Result<LeaveRequest, AppError> {
        approve_leave(&mut self.store(conn), &self.week_cache, company_id, approver_id, request_id).await
    }

    pub async fn reject_request(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        approver_id: Uuid,
        request_id: Uuid,
        reason: &str,
    ) -> Result<LeaveRequest, AppError> {
        reject_leave(&mut self.store(conn), company_id, approver_id, request_id, reason).await
    }

    pub async fn reassign_approver(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        request_id: Uuid,
        new_approver_id: Uuid,
    ) -> Result<LeaveRequest, AppError> {
        reassign_leave(&mut self.store(conn), company_id, request_id, new_approver_id).await
    }

    /// Membros com a capacidade de aprovar, exceto o aprovador atual do pedido.
    pub async fn approver_candidates(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        request_id: Uuid,
    ) -> Result<Vec<ApproverCandidate>, AppError> {
        let mut store = self.store(conn);
        let request = find_or_404(&mut store, company_id, request_id).await?;
        store
            .approver_candidates(company_id, request.requested_approver_id)
            .await
    }

    pub async fn cancel_request(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        member_id: Uuid,
        request_id: Uuid,
    ) -> Result<LeaveRequest, AppError> {
        cancel_leave(&mut self.store(conn), company_id, member_id, request_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    // Store em memória: pedidos, perfis e registros de férias
    #[derive(Default)]
    struct MemoryLeaveStore {
        requests: Vec<LeaveRequest>,
        profiles: Vec<Profile>,
        approvers: Vec<Uuid>,
        annual_leaves: Vec<(Uuid, NaiveDate, f64)>,
        status_writes: usize,
    }

    impl MemoryLeaveStore {
        fn write_if_pending(
            &mut self,
            request_id: Uuid,
            update: impl FnOnce(&mut LeaveRequest),
        ) -> Option<LeaveRequest> {
            let request = self
                .requests
                .iter_mut()
                .find(|r| r.id == request_id && r.status == LeaveStatus::Pending)?;
            update(request);
            Some(request.clone())
        }
    }

    #[async_trait]
    impl LeaveStore for MemoryLeaveStore {
        async fn find_request(&mut self, _company_id: Uuid, request_id: Uuid) -> Result<Option<LeaveRequest>, AppError> {
            Ok(self.requests.iter().find(|r| r.id == request_id).cloned())
        }

        async fn list_requests(
            &mut self,
            _company_id: Uuid,
            approver_id: Uuid,
            filter: LeaveListFilter,
        ) -> Result<Vec<LeaveRequestView>, AppError> {
            Ok(self
                .requests
                .iter()
                .filter(|r| filter.includes(r, approver_id))
                .map(|r| LeaveRequestView { request: r.clone(), member_name: None, approver_name: None })
                .collect())
        }

        async fn find_profile(&mut self, _company_id: Uuid, member_id: Uuid) -> Result<Option<Profile>, AppError> {
            Ok(self.profiles.iter().find(|p| p.id == member_id).cloned())
        }

        async fn resourcing_config(&mut self, _company_id: Uuid) -> Result<ResourcingConfig, AppError> {
            Ok(ResourcingConfig::default())
        }

        async fn can_approve(&mut self, _company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
            Ok(self.approvers.contains(&user_id))
        }

        async fn approver_candidates(
            &mut self,
            _company_id: Uuid,
            _exclude: Option<Uuid>,
        ) -> Result<Vec<ApproverCandidate>, AppError> {
            Ok(vec![])
        }

        async fn create_request(
            &mut self,
            company_id: Uuid,
            member_id: Uuid,
            payload: &CreateLeavePayload,
        ) -> Result<LeaveRequest, AppError> {
            let mut created = request(LeaveStatus::Pending);
            created.company_id = company_id;
            created.member_id = member_id;
            created.start_date = payload.start_date;
            created.end_date = payload.end_date;
            created.requested_approver_id = payload.requested_approver_id;
            self.requests.push(created.clone());
            Ok(created)
        }

        async fn approve(
            &mut self,
            _company_id: Uuid,
            request_id: Uuid,
            approver_id: Uuid,
            days: &[(NaiveDate, f64)],
        ) -> Result<Option<LeaveRequest>, AppError> {
            self.status_writes += 1;
            let Some(approved) = self.write_if_pending(request_id, |r| {
                r.status = LeaveStatus::Approved;
                r.approved_by = Some(approver_id);
            }) else {
                return Ok(None);
            };
            self.annual_leaves
                .extend(days.iter().map(|(d, h)| (approved.member_id, *d, *h)));
            Ok(Some(approved))
        }

        async fn transition_status(
            &mut self,
            _company_id: Uuid,
            request_id: Uuid,
            status: LeaveStatus,
            decided_by: Option<Uuid>,
            rejection_reason: Option<&str>,
        ) -> Result<Option<LeaveRequest>, AppError> {
            self.status_writes += 1;
            Ok(self.write_if_pending(request_id, |r| {
                r.status = status;
                r.approved_by = decided_by;
                r.rejection_reason = rejection_reason.map(String::from);
            }))
        }

        async fn reassign_approver(
            &mut self,
            _company_id: Uuid,
            request_id: Uuid,
            new_approver_id: Uuid,
        ) -> Result<Option<LeaveRequest>, AppError> {
            Ok(self.write_if_pending(request_id, |r| r.requested_approver_id = Some(new_approver_id)))
        }
    }

    fn profile(id: Uuid) -> Profile {
        Profile {
            id,
            company_id: Uuid::nil(),
            first_name: Some("Ana".into()),
            last_name: None,
            email: "ana@example.com".into(),
            avatar_url: None,
            weekly_capacity: Some(40.0),
            location: None,
            department: None,
            job_title: None,
        }
    }

    fn ids(views: &[LeaveRequestView]) -> Vec<Uuid> {
        views.iter().map(|v| v.request.id).collect()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("date")
    }

    fn request(status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            leave_type: "annual".into(),
            start_date: date("2024-06-10"),
            end_date: date("2024-06-14"),
            duration_type: LeaveDurationType::FullDay,
            status,
            requested_approver_id: None,
            approved_by: None,
            rejection_reason: None,
            remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn blank_rejection_reason_is_refused() {
        assert!(matches!(rejection_reason("   "), Err(AppError::EmptyRejectionReason)));
        assert!(matches!(rejection_reason(""), Err(AppError::EmptyRejectionReason)));
        assert_eq!(rejection_reason("  Sobreposição com entrega ").expect("reason"), "Sobreposição com entrega");
    }

    #[test]
    fn only_pending_requests_can_change() {
        assert!(ensure_pending(&request(LeaveStatus::Pending)).is_ok());
        for status in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            let err = ensure_pending(&request(status)).unwrap_err();
            assert!(matches!(err, AppError::InvalidStatusTransition(s) if s == status.as_str()));
        }
    }

    #[test]
    fn approved_days_skip_weekends() {
        // sexta-feira a terça-feira
        let days = leave_day_hours(
            date("2024-06-14"),
            date("2024-06-18"),
            LeaveDurationType::FullDay,
            40.0,
            &ResourcingConfig::default(),
        );

        let dates: Vec<_> = days.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date("2024-06-14"), date("2024-06-17"), date("2024-06-18")]);
        assert!(days.iter().all(|(_, h)| *h == 8.0));
    }

    #[test]
    fn half_days_book_half_the_daily_hours() {
        let days = leave_day_hours(
            date("2024-06-10"),
            date("2024-06-10"),
            LeaveDurationType::HalfDayAm,
            30.0,
            &ResourcingConfig::default(),
        );
        assert_eq!(days, vec![(date("2024-06-10"), 3.0)]);
    }

    #[tokio::test]
    async fn approval_moves_request_from_pending_queue_to_history() {
        let company = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let cache = WeekViewCache::new(Duration::from_secs(60), 100);

        let mut pending = request(LeaveStatus::Pending);
        pending.requested_approver_id = Some(approver);
        let request_id = pending.id;
        let mut store = MemoryLeaveStore {
            profiles: vec![profile(pending.member_id)],
            requests: vec![pending],
            approvers: vec![approver],
            ..Default::default()
        };

        let queue = store.list_requests(company, approver, LeaveListFilter::Pending).await.expect("list");
        assert_eq!(ids(&queue), vec![request_id]);

        let approved = approve_leave(&mut store, &cache, company, approver, request_id).await.expect("approve");
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by, Some(approver));
        assert_eq!(store.status_writes, 1);
        // segunda a sexta, 8 h por dia
        assert_eq!(store.annual_leaves.len(), 5);
        assert!(store.annual_leaves.iter().all(|(_, _, h)| *h == 8.0));

        let queue = store.list_requests(company, approver, LeaveListFilter::Pending).await.expect("list");
        assert!(queue.is_empty());
        let history = store.list_requests(company, approver, LeaveListFilter::All).await.expect("list");
        assert_eq!(ids(&history), vec![request_id]);
        assert_eq!(history[0].request.status, LeaveStatus::Approved);

        // Segunda aprovação do mesmo pedido não grava nada
        let err = approve_leave(&mut store, &cache, company, approver, request_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition(_)));
        assert_eq!(store.status_writes, 1);
        assert_eq!(store.annual_leaves.len(), 5);
    }

    #[tokio::test]
    async fn approval_invalidates_the_touched_weeks() {
        let company = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let cache = WeekViewCache::new(Duration::from_secs(60), 100);
        let week = date("2024-06-10");
        let view = std::sync::Arc::new(crate::models::allocation::WeekResourceView {
            week_start: week,
            week_end: date("2024-06-16"),
            display_preference: crate::models::settings::DisplayPreference::Hours,
            projects: vec![],
            members: vec![],
        });
        cache.insert((company, week, None), view).await;

        let pending = request(LeaveStatus::Pending);
        let request_id = pending.id;
        let mut store = MemoryLeaveStore { requests: vec![pending], ..Default::default() };

        approve_leave(&mut store, &cache, company, approver, request_id).await.expect("approve");
        cache.sync().await;
        assert!(cache.get(&(company, week, None)).await.is_none());
    }

    #[tokio::test]
    async fn unassigned_request_is_visible_to_approvers_until_decided() {
        let company = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let member = Uuid::new_v4();
        let mut store = MemoryLeaveStore {
            profiles: vec![profile(member)],
            approvers: vec![approver],
            ..Default::default()
        };

        let payload = CreateLeavePayload {
            leave_type: "annual".into(),
            start_date: date("2024-06-10"),
            end_date: date("2024-06-11"),
            duration_type: LeaveDurationType::FullDay,
            requested_approver_id: None,
            remarks: None,
        };
        let created = create_leave(&mut store, company, member, &payload).await.expect("create");

        let queue = store.list_requests(company, approver, LeaveListFilter::Pending).await.expect("list");
        assert_eq!(ids(&queue), vec![created.id]);

        reject_leave(&mut store, company, approver, created.id, "Entrega no mesmo período")
            .await
            .expect("reject");
        let queue = store.list_requests(company, approver, LeaveListFilter::Pending).await.expect("list");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn reassigning_to_the_current_approver_is_refused() {
        let company = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let mut pending = request(LeaveStatus::Pending);
        pending.requested_approver_id = Some(approver);
        let request_id = pending.id;
        let mut store = MemoryLeaveStore {
            requests: vec![pending],
            approvers: vec![approver],
            ..Default::default()
        };

        let err = reassign_leave(&mut store, company, request_id, approver).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidApprover));

        // Sem a capacidade leave:approve também é recusado
        let err = reassign_leave(&mut store, company, request_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidApprover));
        assert_eq!(store.requests[0].requested_approver_id, Some(approver));
    }

    #[tokio::test]
    async fn only_the_owner_cancels() {
        let company = Uuid::new_v4();
        let pending = request(LeaveStatus::Pending);
        let (request_id, owner) = (pending.id, pending.member_id);
        let mut store = MemoryLeaveStore { requests: vec![pending], ..Default::default() };

        let err = cancel_leave(&mut store, company, Uuid::new_v4(), request_id).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));

        let cancelled = cancel_leave(&mut store, company, owner, request_id).await.expect("cancel");
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    }
}
