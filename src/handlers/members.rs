// src/handlers/members.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ok, ok_with_message},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireSection, SecMiembros},
        tenancy::TenantContext,
    },
    models::{
        members::{CreateMemberPayload, InviteMemberPayload, Member, MemberView},
        rbac::AssignRolePayload,
        tokens::TokenIssuedResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/members",
    tag = "Members",
    responses((status = 200, description = "Equipe do restaurante", body = Vec<MemberView>)),
    security(("session_cookie" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecMiembros>,
) -> Result<impl IntoResponse, ApiError> {
    let members = app_state.member_service.list_members(tenant.0).await?;
    Ok(ok(members))
}

#[utoipa::path(
    post,
    path = "/api/members",
    tag = "Members",
    request_body = CreateMemberPayload,
    responses((status = 201, description = "Membro criado", body = Member)),
    security(("session_cookie" = []))
)]
pub async fn create_member(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireSection<SecMiembros>,
    Json(payload): Json<CreateMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let member = app_state.member_service.create_member(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, ok(member)))
}

#[utoipa::path(
    post,
    path = "/api/members/{id}/role",
    tag = "Members",
    params(("id" = i32, Path, description = "ID do membro")),
    request_body = AssignRolePayload,
    responses(
        (status = 200, description = "Cargo atribuído"),
        (status = 403, description = "Escalada de privilégio recusada"),
        (status = 404, description = "Miembro no encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn assign_member_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecMiembros>,
    Path(member_id): Path<i32>,
    Json(payload): Json<AssignRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .rbac_service
        .assign_role(&ctx, member_id, &payload.role)
        .await?;
    Ok(ok_with_message(member_id, "Rol asignado"))
}

#[utoipa::path(
    post,
    path = "/api/members/{id}/invite",
    tag = "Members",
    params(("id" = i32, Path, description = "ID do membro")),
    request_body = InviteMemberPayload,
    responses(
        (status = 200, description = "Convite emitido", body = TokenIssuedResponse),
        (status = 403, description = "Escalada de privilégio recusada")
    ),
    security(("session_cookie" = []))
)]
pub async fn invite_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecMiembros>,
    Path(member_id): Path<i32>,
    Json(payload): Json<InviteMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = app_state
        .token_service
        .invite_member(&ctx, member_id, &payload.role)
        .await?;

    let message = if issued.email_sent {
        "Invitación enviada"
    } else {
        "Invitación creada, pero no se pudo enviar el correo"
    };
    Ok(ok_with_message(issued, message))
}

#[utoipa::path(
    post,
    path = "/api/members/{id}/password-reset",
    tag = "Members",
    params(("id" = i32, Path, description = "ID do membro")),
    responses(
        (status = 200, description = "Reset emitido", body = TokenIssuedResponse),
        (status = 403, description = "Alvo com importância igual ou superior")
    ),
    security(("session_cookie" = []))
)]
pub async fn reset_member_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecMiembros>,
    Path(member_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = app_state
        .token_service
        .request_password_reset(&ctx, member_id)
        .await?;

    let message = if issued.email_sent {
        "Enlace de restablecimiento enviado"
    } else {
        "Enlace creado, pero no se pudo enviar el correo"
    };
    Ok(ok_with_message(issued, message))
}
