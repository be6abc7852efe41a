use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    ingredients::repo_types::{Category, IngredientDraft, IngredientFilter, NutritionalInfo},
    validation::{char_len, text_list, Loose, Violations},
};

const CATEGORY_RULE: &str =
    "Category must be one of: Protein, Vegetable, Fruit, Grain, Dairy, Spice, Other";

/// Body of `POST /ingredients` and `PUT /ingredients/:id`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    #[schema(value_type = Option<String>)]
    pub name: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub category: Option<Loose<String>>,
    #[schema(value_type = Option<NutritionalInfo>)]
    pub nutritional_info: Option<Loose<NutritionalInfo>>,
    #[schema(value_type = Option<Vec<String>>)]
    pub common_uses: Option<Loose<Vec<Loose<String>>>>,
}

impl IngredientInput {
    pub fn validate(self) -> Result<IngredientDraft, AppError> {
        let mut v = Violations::new();

        let name = self
            .name
            .and_then(Loose::typed)
            .unwrap_or_default()
            .trim()
            .to_string();
        v.check(
            (2..=50).contains(&char_len(&name)),
            "Name must be between 2 and 50 characters",
        );

        let category = self
            .category
            .and_then(Loose::typed)
            .and_then(|c| Category::parse(c.trim()));
        v.check(category.is_some(), CATEGORY_RULE);

        let nutritional_info = v
            .typed(
                self.nutritional_info,
                "Nutritional info values must be numbers",
            )
            .unwrap_or_default();
        let common_uses = text_list(self.common_uses).unwrap_or_else(|| {
            v.push("Common uses must be a list of strings");
            Vec::new()
        });

        v.finish(())?;
        Ok(IngredientDraft {
            name,
            category: category.unwrap_or(Category::Other),
            nutritional_info,
            common_uses,
        })
    }
}

/// Query string of `GET /ingredients`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl IngredientListQuery {
    pub fn into_filter(self) -> Result<IngredientFilter, AppError> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Category::parse(raw)
                    .ok_or_else(|| AppError::ValidationFailed(vec![CATEGORY_RULE.into()]))?,
            ),
        };
        Ok(IngredientFilter {
            category,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}
