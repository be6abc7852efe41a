use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::IntoParams;

use crate::recipes::repo_types::Recipe;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Query string of `GET /recipes`. Multi-value filters are comma separated.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    pub search: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<String>,
    pub ingredients: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Filter dimensions combine with AND; values inside one dimension with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Case-insensitive substring of title, description or an ingredient name.
    pub search: Option<String>,
    /// Lower-cased difficulty names.
    pub difficulties: Vec<String>,
    /// Exact tags.
    pub tags: Vec<String>,
    /// Lower-cased ingredient names, matched exactly.
    pub ingredients: Vec<String>,
}

/// 1-indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl RecipeListQuery {
    pub fn into_parts(self) -> (RecipeFilter, PageRequest) {
        let filter = RecipeFilter {
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            difficulties: split_list(self.difficulty.as_deref())
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            tags: split_list(self.tags.as_deref()),
            ingredients: split_list(self.ingredients.as_deref())
                .into_iter()
                .map(|i| i.to_lowercase())
                .collect(),
        };
        (filter, PageRequest::new(self.page, self.limit))
    }
}

/// Escapes LIKE metacharacters so the search term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

const INGREDIENT_NAME_SQL: &str =
    "CASE WHEN jsonb_typeof(e) = 'string' THEN e #>> '{}' ELSE e ->> 'name' END";

impl RecipeFilter {
    /// Appends ` AND ...` clauses for every active dimension. The builder
    /// must already hold a `WHERE` clause over `recipes`.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(format!(
                    " OR EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS e WHERE {INGREDIENT_NAME_SQL} ILIKE "
                ))
                .push_bind(pattern)
                .push("))");
        }
        if !self.difficulties.is_empty() {
            qb.push(" AND lower(difficulty) = ANY(")
                .push_bind(self.difficulties.clone())
                .push(")");
        }
        if !self.tags.is_empty() {
            qb.push(" AND tags && ").push_bind(self.tags.clone());
        }
        if !self.ingredients.is_empty() {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS e WHERE lower({INGREDIENT_NAME_SQL}) = ANY("
            ))
            .push_bind(self.ingredients.clone())
            .push("))");
        }
    }

    /// Same semantics as [`push_conditions`](Self::push_conditions), evaluated in memory.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = recipe.title.to_lowercase().contains(&needle)
                || recipe.description.to_lowercase().contains(&needle)
                || recipe
                    .ingredients
                    .iter()
                    .any(|i| i.name().to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if !self.difficulties.is_empty()
            && !self
                .difficulties
                .contains(&recipe.difficulty.as_str().to_lowercase())
        {
            return false;
        }
        if !self.tags.is_empty() && !recipe.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if !self.ingredients.is_empty()
            && !recipe
                .ingredients
                .iter()
                .any(|i| self.ingredients.contains(&i.name().to_lowercase()))
        {
            return false;
        }
        true
    }
}
