pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod session_repo;
pub use session_repo::SessionRepository;
pub mod token_repo;
pub use token_repo::TokenRepository;
pub mod member_repo;
pub use member_repo::MemberRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod group_menu_repo;
pub use group_menu_repo::GroupMenuRepository;
pub mod fichaje_repo;
pub use fichaje_repo::FichajeRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
