pub mod allocation;
pub mod auth;
pub mod company;
pub mod leave;
pub mod lookups;
pub mod project;
pub mod settings;
pub mod team;
