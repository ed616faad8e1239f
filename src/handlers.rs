pub mod auth;
pub mod bookings;
pub mod fichaje;
pub mod group_menus;
pub mod members;
pub mod rbac;
pub mod settings;
pub mod tenancy;
