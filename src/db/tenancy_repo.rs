// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::tenancy::{Restaurant, UserRestaurant, UserRestaurantView};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_restaurant(&self, restaurant_id: i32) -> Result<Option<Restaurant>, AppError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, slug, created_at FROM restaurants WHERE id = $1",
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(restaurant)
    }

    /// Vínculo do usuário com o restaurante. Esta é a verificação de
    /// autorização mais importante do gate de sessão.
    pub async fn find_link(
        &self,
        user_id: i32,
        restaurant_id: i32,
    ) -> Result<Option<UserRestaurant>, AppError> {
        let link = sqlx::query_as::<_, UserRestaurant>(
            r#"
            SELECT user_id, restaurant_id, role, created_at
            FROM bo_user_restaurants
            WHERE user_id = $1 AND restaurant_id = $2
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    /// Cria ou atualiza o vínculo (e o cargo) do usuário no restaurante.
    pub async fn upsert_link<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        restaurant_id: i32,
        role: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO bo_user_restaurants (user_id, restaurant_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, restaurant_id)
            DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(role)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<UserRestaurantView>, AppError> {
        let restaurants = sqlx::query_as::<_, UserRestaurantView>(
            r#"
            SELECT r.id, r.name, r.slug, ur.role
            FROM bo_user_restaurants ur
            JOIN restaurants r ON r.id = ur.restaurant_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(restaurants)
    }

    /// Superadmin enxerga todos os restaurantes.
    pub async fn list_all(&self) -> Result<Vec<UserRestaurantView>, AppError> {
        let restaurants = sqlx::query_as::<_, UserRestaurantView>(
            r#"
            SELECT r.id, r.name, r.slug, 'root'::text AS role
            FROM restaurants r
            ORDER BY r.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(restaurants)
    }

    pub async fn is_superadmin(&self, user_id: i32) -> Result<bool, AppError> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT is_superadmin FROM bo_users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(flag,)| flag).unwrap_or(false))
    }
}
