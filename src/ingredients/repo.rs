use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::StoreError,
    ingredients::repo_types::{Ingredient, IngredientDraft, IngredientFilter, IngredientRow},
};

/// Shared ingredient catalog.
#[async_trait]
pub trait IngredientRepo: Send + Sync {
    async fn create(&self, draft: IngredientDraft) -> Result<Ingredient, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, StoreError>;
    /// Matching ingredients ordered by name.
    async fn list(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, StoreError>;
    async fn update(
        &self,
        id: Uuid,
        draft: IngredientDraft,
    ) -> Result<Option<Ingredient>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const INGREDIENT_COLUMNS: &str =
    "id, name, category, calories, protein, carbs, fat, common_uses, created_at, updated_at";

#[async_trait]
impl IngredientRepo for PgStore {
    async fn create(&self, draft: IngredientDraft) -> Result<Ingredient, StoreError> {
        let n = draft.nutritional_info;
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients (id, name, category, calories, protein, carbs, fat, common_uses)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(draft.category.as_str())
        .bind(n.calories)
        .bind(n.protein)
        .bind(n.carbs)
        .bind(n.fat)
        .bind(&draft.common_uses)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, StoreError> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Ingredient::from))
    }

    async fn list(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE TRUE"
        ));
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(search) = &filter.search {
            qb.push(" AND strpos(lower(name), lower(")
                .push_bind(search.clone())
                .push(")) > 0");
        }
        qb.push(" ORDER BY name ASC");

        let rows = qb
            .build_query_as::<IngredientRow>()
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        draft: IngredientDraft,
    ) -> Result<Option<Ingredient>, StoreError> {
        let n = draft.nutritional_info;
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
               SET name        = $2,
                   category    = $3,
                   calories    = $4,
                   protein     = $5,
                   carbs       = $6,
                   fat         = $7,
                   common_uses = $8,
                   updated_at  = now()
             WHERE id = $1
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.category.as_str())
        .bind(n.calories)
        .bind(n.protein)
        .bind(n.carbs)
        .bind(n.fat)
        .bind(&draft.common_uses)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Ingredient::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
