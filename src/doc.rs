//! OpenAPI document served next to Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    auth::dto::{AuthResponse, LoginRequest, RegisterRequest},
    dto::MessageResponse,
    error::ErrorBody,
    favorites::{
        dto::{FavoriteInput, FavoriteNotesInput},
        repo_types::{Favorite, FavoriteWithRecipe},
    },
    ingredients::{
        dto::IngredientInput,
        repo_types::{Category, Ingredient, NutritionalInfo},
    },
    recipes::{
        dto::{RecipeInput, RecipeListResponse},
        repo_types::{Difficulty, IngredientEntry, Recipe, RecipeOwner},
    },
    users::dto::{PublicUser, UpdateUserRequest},
};

/// Adds the bearer JWT scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some("Token returned by register, login or Google sign-in."))
            .build();
        components.add_security_scheme("bearer", SecurityScheme::Http(scheme));
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "MealMatch API",
        description = "Recipes, ingredients and favorites with JWT or Google sign-in."
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::google_start,
        crate::auth::handlers::google_callback,
        crate::recipes::handlers::list_recipes,
        crate::recipes::handlers::get_recipe,
        crate::recipes::handlers::create_recipe,
        crate::recipes::handlers::update_recipe,
        crate::recipes::handlers::delete_recipe,
        crate::ingredients::handlers::list_ingredients,
        crate::ingredients::handlers::get_ingredient,
        crate::ingredients::handlers::create_ingredient,
        crate::ingredients::handlers::update_ingredient,
        crate::ingredients::handlers::delete_ingredient,
        crate::favorites::handlers::list_favorites,
        crate::favorites::handlers::get_favorite,
        crate::favorites::handlers::add_favorite,
        crate::favorites::handlers::update_favorite,
        crate::favorites::handlers::remove_favorite,
        crate::users::handlers::list_users,
        crate::users::handlers::get_user,
        crate::users::handlers::update_user,
        crate::users::handlers::delete_user,
    ),
    components(schemas(
        ErrorBody,
        MessageResponse,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        PublicUser,
        UpdateUserRequest,
        Recipe,
        RecipeOwner,
        RecipeInput,
        RecipeListResponse,
        IngredientEntry,
        Difficulty,
        Ingredient,
        IngredientInput,
        Category,
        NutritionalInfo,
        Favorite,
        FavoriteWithRecipe,
        FavoriteInput,
        FavoriteNotesInput,
    )),
    tags(
        (name = "auth", description = "Registration, login and Google sign-in"),
        (name = "recipes", description = "Recipe catalog"),
        (name = "ingredients", description = "Ingredient catalog"),
        (name = "favorites", description = "The caller's saved recipes"),
        (name = "users", description = "User directory and profiles")
    )
)]
pub struct ApiDoc;
