pub mod auth;
pub mod booking_normalizer;
pub mod booking_service;
pub mod fichaje_service;
pub mod member_service;
pub mod menu_service;
pub mod notifications;
pub mod rbac_service;
pub mod settings_service;
pub mod token_service;
