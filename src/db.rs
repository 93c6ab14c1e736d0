pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod team_repo;
pub use team_repo::TeamRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod leave_repo;
pub use leave_repo::LeaveRepository;
pub mod allocation_repo;
pub use allocation_repo::AllocationRepository;
pub mod lookups_repo;
pub use lookups_repo::LookupsRepository;
