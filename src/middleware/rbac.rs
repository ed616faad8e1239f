// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, models::auth::AuthContext, models::rbac::Section};

/// 1. O Trait que define uma seção protegida
pub trait SectionDef: Send + Sync + 'static {
    fn section() -> Section;
}

/// 2. O Extractor (Guardião)
pub struct RequireSection<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireSection<T>
where
    T: SectionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Contexto da sessão (posto pelo session_guard)
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .ok_or(AppError::InvalidSession)?;

        // B. Cargo -> seções
        let section = T::section();
        let allowed = app_state
            .rbac_service
            .resolver()
            .can_access(ctx.restaurant_id, &ctx.role, section)
            .await?;

        if !allowed {
            return Err(AppError::forbidden(format!(
                "No tienes acceso a la sección '{section}'"
            )));
        }

        Ok(RequireSection(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS SEÇÕES (TIPOS)
// ---

pub struct SecReservas;
impl SectionDef for SecReservas {
    fn section() -> Section { Section::Reservas }
}

pub struct SecMenus;
impl SectionDef for SecMenus {
    fn section() -> Section { Section::Menus }
}

pub struct SecAjustes;
impl SectionDef for SecAjustes {
    fn section() -> Section { Section::Ajustes }
}

pub struct SecMiembros;
impl SectionDef for SecMiembros {
    fn section() -> Section { Section::Miembros }
}

pub struct SecFichaje;
impl SectionDef for SecFichaje {
    fn section() -> Section { Section::Fichaje }
}

pub struct SecHorarios;
impl SectionDef for SecHorarios {
    fn section() -> Section { Section::Horarios }
}

pub struct SecFacturas;
impl SectionDef for SecFacturas {
    fn section() -> Section { Section::Facturas }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_has_a_marker() {
        let markers = [
            SecReservas::section(),
            SecMenus::section(),
            SecAjustes::section(),
            SecMiembros::section(),
            SecFichaje::section(),
            SecHorarios::section(),
            SecFacturas::section(),
        ];
        assert_eq!(markers, Section::ALL);
    }
}
