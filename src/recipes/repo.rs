use async_trait::async_trait;
use sqlx::{types::Json, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::StoreError,
    recipes::{
        filter::{PageRequest, RecipeFilter},
        repo_types::{Recipe, RecipeDraft, RecipeRow},
    },
};

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError>;
    /// Recipes among `ids`, in no particular order. Unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Recipe>, StoreError>;
    /// One page of matching recipes, newest first, and the total match count.
    async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), StoreError>;
    /// Replaces the content fields. The owner never changes.
    async fn update(&self, id: Uuid, draft: RecipeDraft) -> Result<Option<Recipe>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const RECIPE_COLUMNS: &str = "r.id, r.title, r.description, r.ingredients, r.instructions, \
     r.prep_time, r.cook_time, r.cooking_time, r.servings, r.difficulty, r.tags, r.image_url, \
     r.user_id, r.created_at, r.updated_at, u.username AS owner_username";

/// `r` is the recipe relation; the owner is optional.
const OWNER_JOIN: &str = "LEFT JOIN users u ON u.id = r.user_id";

#[async_trait]
impl RecipeRepo for PgStore {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            WITH r AS (
                INSERT INTO recipes (id, title, description, ingredients, instructions, prep_time,
                                     cook_time, cooking_time, servings, difficulty, tags, image_url, user_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
            )
            SELECT {RECIPE_COLUMNS} FROM r {OWNER_JOIN}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(Json(&draft.ingredients))
        .bind(&draft.instructions)
        .bind(draft.prep_time)
        .bind(draft.cook_time)
        .bind(draft.cooking_time)
        .bind(draft.servings)
        .bind(draft.difficulty.as_str())
        .bind(&draft.tags)
        .bind(&draft.image_url)
        .bind(owner)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r {OWNER_JOIN} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Recipe::from))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Recipe>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r {OWNER_JOIN} WHERE r.id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes WHERE TRUE");
        filter.push_conditions(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool()).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r {OWNER_JOIN} WHERE TRUE"
        ));
        filter.push_conditions(&mut select);
        select
            .push(" ORDER BY r.created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<RecipeRow>()
            .fetch_all(self.pool())
            .await?;

        Ok((rows.into_iter().map(Recipe::from).collect(), total))
    }

    async fn update(&self, id: Uuid, draft: RecipeDraft) -> Result<Option<Recipe>, StoreError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            WITH r AS (
                UPDATE recipes
                   SET title        = $2,
                       description  = $3,
                       ingredients  = $4,
                       instructions = $5,
                       prep_time    = $6,
                       cook_time    = $7,
                       cooking_time = $8,
                       servings     = $9,
                       difficulty   = $10,
                       tags         = $11,
                       image_url    = $12,
                       updated_at   = now()
                 WHERE id = $1
                RETURNING *
            )
            SELECT {RECIPE_COLUMNS} FROM r {OWNER_JOIN}
            "#
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(Json(&draft.ingredients))
        .bind(&draft.instructions)
        .bind(draft.prep_time)
        .bind(draft.cook_time)
        .bind(draft.cooking_time)
        .bind(draft.servings)
        .bind(draft.difficulty.as_str())
        .bind(&draft.tags)
        .bind(&draft.image_url)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Recipe::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
