pub mod auth;
pub mod companies;
pub mod leave;
pub mod lookups;
pub mod projects;
pub mod resourcing;
pub mod settings;
pub mod team;
