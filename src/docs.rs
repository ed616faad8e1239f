// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::{handlers, models, services, ws};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::accept_token,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Tenancy ---
        handlers::tenancy::list_my_restaurants,
        handlers::tenancy::switch_restaurant,

        // --- Bookings ---
        handlers::bookings::list_bookings,
        handlers::bookings::create_booking,
        handlers::bookings::get_booking,
        handlers::bookings::patch_booking,
        handlers::bookings::cancel_booking,
        handlers::bookings::send_reminders,

        // --- Menus ---
        handlers::group_menus::list_menus,
        handlers::group_menus::create_menu,
        handlers::group_menus::set_menu_active,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,

        // --- Members ---
        handlers::members::list_members,
        handlers::members::create_member,
        handlers::members::assign_member_role,
        handlers::members::invite_member,
        handlers::members::reset_member_password,

        // --- Fichaje ---
        handlers::fichaje::clock_in,
        handlers::fichaje::clock_out,
        handlers::fichaje::list_entries,
        ws::handler::fichaje_ws,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::settings::get_hours,
        handlers::settings::update_hours,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::BackofficeUser,
            models::auth::LoginPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AcceptTokenPayload,
            models::auth::SwitchRestaurantPayload,
            models::auth::AuthContext,
            models::auth::MeResponse,

            // --- Tenancy ---
            models::tenancy::Restaurant,
            models::tenancy::UserRestaurantView,

            // --- Bookings ---
            models::booking::Booking,
            models::booking::PrincipalSelection,
            models::booking::CreateBookingPayload,
            models::booking::PatchBookingPayload,
            models::booking::RemindersPayload,
            services::notifications::DeliveryOutcome,
            services::notifications::DeliveryReport,

            // --- Menus ---
            models::group_menu::GroupMenu,
            models::group_menu::GroupMenuPrincipales,
            models::group_menu::CreateGroupMenuPayload,
            models::group_menu::SetActivePayload,

            // --- RBAC ---
            models::rbac::Section,
            models::rbac::RoleView,
            models::rbac::CreateRolePayload,
            models::rbac::AssignRolePayload,
            models::rbac::EffectivePermissions,

            // --- Members / Tokens ---
            models::members::Member,
            models::members::MemberView,
            models::members::CreateMemberPayload,
            models::members::InviteMemberPayload,
            models::tokens::TokenIssuedResponse,
            models::tokens::RedeemResponse,

            // --- Fichaje ---
            models::fichaje::FichajeEntry,
            models::fichaje::FichajeEventKind,
            models::fichaje::FichajeEvent,
            models::fichaje::ClockPayload,

            // --- Settings ---
            models::settings::RestaurantSettings,
            models::settings::UpdateSettingsRequest,
            models::settings::UpdateHoursRequest,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e convites"),
        (name = "Users", description = "Dados do usuário da sessão"),
        (name = "Tenancy", description = "Restaurantes acessíveis e troca do ativo"),
        (name = "Bookings", description = "Reservas"),
        (name = "Menus", description = "Menus de grupo"),
        (name = "RBAC", description = "Cargos e seções"),
        (name = "Members", description = "Equipe, convites e reset de senha"),
        (name = "Fichaje", description = "Controle de ponto"),
        (name = "Settings", description = "Ajustes e horários do restaurante")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("bo_session"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_booking_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/bookings"));
        assert!(doc.paths.paths.contains_key("/api/bookings/{id}"));
        assert!(doc.paths.paths.contains_key("/api/fichaje/ws"));
    }
}
