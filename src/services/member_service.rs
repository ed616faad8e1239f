// src/services/member_service.rs

use crate::common::error::AppError;
use crate::common::phone::normalize_phone;
use crate::db::MemberRepository;
use crate::models::members::{CreateMemberPayload, Member, MemberView};

#[derive(Clone)]
pub struct MemberService {
    repo: MemberRepository,
}

impl MemberService {
    pub fn new(repo: MemberRepository) -> Self {
        Self { repo }
    }

    pub async fn list_members(&self, restaurant_id: i32) -> Result<Vec<MemberView>, AppError> {
        self.repo.list(restaurant_id).await
    }

    pub async fn get_member(&self, restaurant_id: i32, member_id: i32) -> Result<Member, AppError> {
        self.repo
            .find(restaurant_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Miembro no encontrado".into()))
    }

    /// Telefone passa pela mesma normalização das reservas.
    pub async fn create_member(
        &self,
        restaurant_id: i32,
        payload: CreateMemberPayload,
    ) -> Result<Member, AppError> {
        let phone = match payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => {
                let normalized = normalize_phone(
                    payload.phone_country_code.as_deref().unwrap_or_default(),
                    raw,
                );
                if !normalized.valid {
                    return Err(AppError::validation("Teléfono inválido"));
                }
                Some(normalized)
            }
            None => None,
        };

        let email = payload
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        let member = self
            .repo
            .create(
                restaurant_id,
                payload.first_name.trim(),
                payload.last_name.trim(),
                email.as_deref(),
                phone.as_ref().map(|p| p.national.as_str()),
                phone.as_ref().map(|p| p.country_code.as_str()),
            )
            .await?;

        tracing::info!(restaurant_id, member_id = member.id, "Miembro creado");
        Ok(member)
    }
}
