// src/services/fichaje_service.rs

use std::sync::Arc;

use chrono::NaiveDate;

use crate::common::error::{map_unique_violation, AppError};
use crate::db::{FichajeRepository, MemberRepository};
use crate::models::auth::AuthContext;
use crate::models::fichaje::{FichajeEntry, FichajeEvent, FichajeEventKind};
use crate::models::rbac::Section;
use crate::services::rbac_service::RoleResolver;
use crate::ws::FichajeHub;

#[derive(Clone)]
pub struct FichajeService {
    repo: FichajeRepository,
    member_repo: MemberRepository,
    resolver: RoleResolver,
    hub: Arc<FichajeHub>,
}

impl FichajeService {
    pub fn new(
        repo: FichajeRepository,
        member_repo: MemberRepository,
        resolver: RoleResolver,
        hub: Arc<FichajeHub>,
    ) -> Self {
        Self { repo, member_repo, resolver, hub }
    }

    /// Sem `member_id` = a ficha do próprio usuário. Fichar por outra pessoa
    /// exige a seção de membros.
    async fn resolve_member(&self, ctx: &AuthContext, requested: Option<i32>) -> Result<i32, AppError> {
        let Some(member_id) = requested else {
            return self
                .member_repo
                .find_by_user(ctx.restaurant_id, ctx.user_id)
                .await?
                .map(|m| m.id)
                .ok_or_else(|| AppError::validation("No tienes ficha de miembro en este restaurante"));
        };

        let member = self
            .member_repo
            .find(ctx.restaurant_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Miembro no encontrado".into()))?;

        if member.bo_user_id != Some(ctx.user_id)
            && !self
                .resolver
                .can_access(ctx.restaurant_id, &ctx.role, Section::Miembros)
                .await?
        {
            return Err(AppError::forbidden("No puedes fichar por otro miembro"));
        }
        Ok(member.id)
    }

    pub async fn clock_in(&self, ctx: &AuthContext, member_id: Option<i32>) -> Result<FichajeEntry, AppError> {
        let member_id = self.resolve_member(ctx, member_id).await?;

        // O índice parcial é quem garante uma entrada aberta por membro
        let entry = self
            .repo
            .clock_in(ctx.restaurant_id, member_id)
            .await
            .map_err(|e| map_unique_violation(e, "Ya hay un fichaje abierto para este miembro"))?;

        tracing::info!(restaurant_id = ctx.restaurant_id, member_id, entry_id = entry.id, "Entrada fichada");
        self.hub
            .broadcast(&FichajeEvent::from_entry(FichajeEventKind::ClockIn, &entry))
            .await;
        Ok(entry)
    }

    pub async fn clock_out(&self, ctx: &AuthContext, member_id: Option<i32>) -> Result<FichajeEntry, AppError> {
        let member_id = self.resolve_member(ctx, member_id).await?;

        let entry = self
            .repo
            .clock_out(ctx.restaurant_id, member_id)
            .await?
            .ok_or_else(|| AppError::validation("No hay ningún fichaje abierto"))?;

        tracing::info!(restaurant_id = ctx.restaurant_id, member_id, entry_id = entry.id, "Salida fichada");
        self.hub
            .broadcast(&FichajeEvent::from_entry(FichajeEventKind::ClockOut, &entry))
            .await;
        Ok(entry)
    }

    pub async fn list_entries(&self, restaurant_id: i32, date: NaiveDate) -> Result<Vec<FichajeEntry>, AppError> {
        self.repo.list_by_date(restaurant_id, date).await
    }

    /// Fecha as entradas que atravessaram a virada do dia e avisa os painéis.
    pub async fn close_stale_entries(&self) -> Result<usize, AppError> {
        let closed = self.repo.close_stale_entries().await?;
        for entry in &closed {
            self.hub
                .broadcast(&FichajeEvent::from_entry(FichajeEventKind::AutoClosed, entry))
                .await;
        }
        Ok(closed.len())
    }
}
