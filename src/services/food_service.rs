use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateFoodRequest, Food};

#[derive(Clone)]
pub struct FoodService {
    db: PgPool,
}

impl FoodService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Case-insensitive substring search over catalog foods plus the user's
    /// own, matching name or brand.
    pub async fn search_foods(
        &self,
        user_id: Uuid,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Food>, i64)> {
        let pattern = format!("%{}%", query.trim());

        let foods = sqlx::query_as::<_, Food>(
            "SELECT id, name, brand, serving_size, serving_unit, calories, protein_g, carbs_g,
                    fat_g, created_by, created_at, updated_at
             FROM foods
             WHERE (created_by IS NULL OR created_by = $1)
               AND (name ILIKE $2 OR brand ILIKE $2)
             ORDER BY name
             LIMIT $3 OFFSET $4"
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM foods
             WHERE (created_by IS NULL OR created_by = $1)
               AND (name ILIKE $2 OR brand ILIKE $2)"
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok((foods, total))
    }

    pub async fn get_food(&self, food_id: Uuid, user_id: Uuid) -> Result<Option<Food>> {
        let food = sqlx::query_as::<_, Food>(
            "SELECT id, name, brand, serving_size, serving_unit, calories, protein_g, carbs_g,
                    fat_g, created_by, created_at, updated_at
             FROM foods
             WHERE id = $1 AND (created_by IS NULL OR created_by = $2)"
        )
        .bind(food_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(food)
    }

    pub async fn create_food(&self, user_id: Uuid, request: CreateFoodRequest) -> Result<Food> {
        let food = sqlx::query_as::<_, Food>(
            "INSERT INTO foods
                (id, name, brand, serving_size, serving_unit, calories, protein_g, carbs_g,
                 fat_g, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
             RETURNING id, name, brand, serving_size, serving_unit, calories, protein_g, carbs_g,
                       fat_g, created_by, created_at, updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.brand)
        .bind(request.serving_size)
        .bind(&request.serving_unit)
        .bind(request.calories)
        .bind(request.protein_g)
        .bind(request.carbs_g)
        .bind(request.fat_g)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(food)
    }
}
