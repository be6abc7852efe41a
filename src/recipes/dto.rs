use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    recipes::repo_types::{Difficulty, IngredientEntry, Recipe, RecipeDraft},
    validation::{text_list, Loose, Violations},
};

/// An ingredient line as sent by clients; the name may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientEntryInput {
    Plain(String),
    Detailed {
        name: Option<String>,
        quantity: Option<String>,
        unit: Option<String>,
    },
}

/// Body of `POST /recipes` and `PUT /recipes/:id`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    #[serde(alias = "name")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub description: Option<Loose<String>>,
    #[schema(value_type = Option<Vec<IngredientEntry>>)]
    pub ingredients: Option<Loose<Vec<Loose<IngredientEntryInput>>>>,
    #[schema(value_type = Option<Vec<String>>)]
    pub instructions: Option<Loose<Vec<Loose<String>>>>,
    #[schema(value_type = Option<i64>)]
    pub prep_time: Option<Loose<i64>>,
    #[schema(value_type = Option<i64>)]
    pub cook_time: Option<Loose<i64>>,
    #[schema(value_type = Option<i64>)]
    pub cooking_time: Option<Loose<i64>>,
    #[schema(value_type = Option<i64>)]
    pub servings: Option<Loose<i64>>,
    #[schema(value_type = Option<String>)]
    pub difficulty: Option<Loose<String>>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<Loose<Vec<Loose<String>>>>,
    #[serde(alias = "image")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Loose<String>>,
}

const DEFAULT_SERVINGS: i32 = 4;
const DIFFICULTY_RULE: &str = "Difficulty must be one of: Easy, Medium, Hard";

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `Err` for a mistyped, fractional, out-of-range or too small value.
fn bounded(value: Option<Loose<i64>>, min: i64) -> Result<Option<i32>, ()> {
    match value {
        None => Ok(None),
        Some(Loose::Typed(v)) if v >= min => i32::try_from(v).map(Some).map_err(|_| ()),
        Some(_) => Err(()),
    }
}

fn ingredient_entry(input: IngredientEntryInput) -> Option<IngredientEntry> {
    match input {
        IngredientEntryInput::Plain(text) => non_blank(Some(text)).map(IngredientEntry::Plain),
        IngredientEntryInput::Detailed {
            name,
            quantity,
            unit,
        } => non_blank(name).map(|name| IngredientEntry::Detailed {
            name,
            quantity: non_blank(quantity),
            unit: non_blank(unit),
        }),
    }
}

impl RecipeInput {
    /// A value of the wrong JSON type counts as a violation of that field's rule.
    pub fn validate(self) -> Result<RecipeDraft, AppError> {
        let mut v = Violations::new();

        let title = non_blank(self.title.and_then(Loose::typed));
        v.check(title.is_some(), "Recipe title is required");
        let description = v
            .typed(self.description, "Description must be text")
            .unwrap_or_default();

        let mut ingredients = Vec::new();
        match self.ingredients.and_then(Loose::typed) {
            Some(list) if !list.is_empty() => {
                let count = list.len();
                ingredients = list
                    .into_iter()
                    .filter_map(|entry| entry.typed().and_then(ingredient_entry))
                    .collect();
                v.check(ingredients.len() == count, "Each ingredient must have a name");
            }
            _ => v.push("At least one ingredient is required"),
        }

        let instructions = match text_list(self.instructions) {
            Some(steps) if !steps.is_empty() => steps,
            Some(_) => {
                v.push("At least one instruction is required");
                Vec::new()
            }
            None => {
                v.push("Instructions must be a list of steps");
                Vec::new()
            }
        };

        let cooking_time = match bounded(self.cooking_time, 1) {
            Ok(Some(t)) => Some(t),
            _ => {
                v.push("Cooking time must be a positive integer");
                None
            }
        };
        let prep_time = bounded(self.prep_time, 0).unwrap_or_else(|_| {
            v.push("Prep time cannot be negative");
            None
        });
        let cook_time = bounded(self.cook_time, 0).unwrap_or_else(|_| {
            v.push("Cook time cannot be negative");
            None
        });
        let servings = bounded(self.servings, 1).unwrap_or_else(|_| {
            v.push("Servings must be at least 1");
            None
        });

        let difficulty = match non_blank(v.typed(self.difficulty, DIFFICULTY_RULE)) {
            None => Difficulty::default(),
            Some(raw) => Difficulty::parse(&raw).unwrap_or_else(|| {
                v.push(DIFFICULTY_RULE);
                Difficulty::default()
            }),
        };

        let tags = text_list(self.tags).unwrap_or_else(|| {
            v.push("Tags must be a list of strings");
            Vec::new()
        });
        let image_url = non_blank(v.typed(self.image_url, "Image URL must be text"));

        v.finish(())?;
        Ok(RecipeDraft {
            title: title.unwrap_or_default(),
            description: description.trim().to_string(),
            ingredients,
            instructions,
            prep_time,
            cook_time,
            cooking_time: cooking_time.unwrap_or_default(),
            servings: servings.unwrap_or(DEFAULT_SERVINGS),
            difficulty,
            tags,
            image_url,
        })
    }
}

/// Page of `GET /recipes`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeListResponse {
    pub recipes: Vec<Recipe>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_recipes: i64,
}
