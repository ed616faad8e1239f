// src/services/menu_service.rs

use crate::common::error::AppError;
use crate::db::GroupMenuRepository;
use crate::models::group_menu::{CreateGroupMenuPayload, GroupMenu};

#[derive(Clone)]
pub struct MenuService {
    repo: GroupMenuRepository,
}

impl MenuService {
    pub fn new(repo: GroupMenuRepository) -> Self {
        Self { repo }
    }

    pub async fn list_menus(&self, restaurant_id: i32) -> Result<Vec<GroupMenu>, AppError> {
        self.repo.list(restaurant_id).await
    }

    pub async fn create_menu(
        &self,
        restaurant_id: i32,
        payload: CreateGroupMenuPayload,
    ) -> Result<GroupMenu, AppError> {
        if payload.price.is_sign_negative() {
            return Err(AppError::validation("El precio no puede ser negativo"));
        }

        let principales = clean_principales(payload.principales);
        let menu = self
            .repo
            .create(restaurant_id, payload.title.trim(), payload.price, principales)
            .await?;

        tracing::info!(restaurant_id, menu_id = menu.id, "Menú de grupo creado");
        Ok(menu)
    }

    pub async fn set_active(
        &self,
        restaurant_id: i32,
        menu_id: i32,
        active: bool,
    ) -> Result<GroupMenu, AppError> {
        self.repo
            .set_active(restaurant_id, menu_id, active)
            .await?
            .ok_or_else(|| AppError::NotFound("Menú de grupo no encontrado".into()))
    }
}

/// Nomes aparados, sem vazios nem repetidos, na ordem original.
fn clean_principales(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principales_are_cleaned() {
        let items = vec![" bacalao ".into(), "".into(), "paella".into(), "bacalao".into()];
        assert_eq!(clean_principales(items), vec!["bacalao", "paella"]);
    }
}
