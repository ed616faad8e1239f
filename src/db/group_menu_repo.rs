// src/db/group_menu_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};

use crate::common::error::AppError;
use crate::models::group_menu::{GroupMenu, GroupMenuPrincipales};

const MENU_COLUMNS: &str = "id, restaurant_id, title, price, active, principales, created_at";

#[derive(Clone)]
pub struct GroupMenuRepository {
    pool: PgPool,
}

impl GroupMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, restaurant_id: i32, menu_id: i32) -> Result<Option<GroupMenu>, AppError> {
        let menu = sqlx::query_as::<_, GroupMenu>(&format!(
            "SELECT {MENU_COLUMNS} FROM group_menus WHERE restaurant_id = $1 AND id = $2"
        ))
        .bind(restaurant_id)
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(menu)
    }

    /// Só menus ativos do mesmo restaurante servem para uma reserva.
    pub async fn find_active(&self, restaurant_id: i32, menu_id: i32) -> Result<Option<GroupMenu>, AppError> {
        let menu = sqlx::query_as::<_, GroupMenu>(&format!(
            "SELECT {MENU_COLUMNS} FROM group_menus WHERE restaurant_id = $1 AND id = $2 AND active"
        ))
        .bind(restaurant_id)
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(menu)
    }

    pub async fn list(&self, restaurant_id: i32) -> Result<Vec<GroupMenu>, AppError> {
        let menus = sqlx::query_as::<_, GroupMenu>(&format!(
            "SELECT {MENU_COLUMNS} FROM group_menus WHERE restaurant_id = $1 ORDER BY active DESC, title"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(menus)
    }

    pub async fn create(
        &self,
        restaurant_id: i32,
        title: &str,
        price: Decimal,
        principales: Vec<String>,
    ) -> Result<GroupMenu, AppError> {
        let menu = sqlx::query_as::<_, GroupMenu>(&format!(
            r#"
            INSERT INTO group_menus (restaurant_id, title, price, principales)
            VALUES ($1, $2, $3, $4)
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(title)
        .bind(price)
        .bind(Json(GroupMenuPrincipales { items: principales }))
        .fetch_one(&self.pool)
        .await?;

        Ok(menu)
    }

    pub async fn set_active(
        &self,
        restaurant_id: i32,
        menu_id: i32,
        active: bool,
    ) -> Result<Option<GroupMenu>, AppError> {
        let menu = sqlx::query_as::<_, GroupMenu>(&format!(
            r#"
            UPDATE group_menus SET active = $3
            WHERE restaurant_id = $1 AND id = $2
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(menu_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(menu)
    }
}
