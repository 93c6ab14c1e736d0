pub mod allocation_map;
pub mod auth;
pub mod company_service;
pub mod leave_service;
pub mod project_service;
pub mod resourcing_service;
pub mod stage_fees;
pub mod stage_reconciliation;
pub mod team_service;
