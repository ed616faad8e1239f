pub mod auth;
pub mod booking;
pub mod fichaje;
pub mod group_menu;
pub mod members;
pub mod rbac;
pub mod settings;
pub mod tenancy;
pub mod tokens;
