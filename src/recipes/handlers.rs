use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    dto::MessageResponse,
    error::AppError,
    policy::{can_access, Operation, Resource},
    recipes::{
        dto::{RecipeInput, RecipeListResponse},
        filter::RecipeListQuery,
        repo_types::Recipe,
    },
    state::AppState,
    validation::{path_id, ApiJson, ApiQuery},
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "One page of recipes", body = RecipeListResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, query))]
pub async fn list_recipes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let (filter, page) = query.into_parts();
    let (recipes, total) = state.recipes.list(&filter, page).await?;
    Ok(Json(RecipeListResponse {
        recipes,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
        total_recipes: total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = uuid::Uuid, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe", body = Recipe),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 404, description = "Recipe not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    let id = path_id(&id)?;
    let recipe = state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Recipe created", body = Recipe),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    let draft = payload.validate()?;
    let recipe = state.recipes.create(user.id, draft).await?;
    info!(recipe_id = %recipe.id, user_id = %user.id, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = uuid::Uuid, Path, description = "Recipe id")),
    request_body = RecipeInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipe updated", body = Recipe),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Recipe not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<Json<Recipe>, AppError> {
    let id = path_id(&id)?;
    let draft = payload.validate()?;
    let existing = state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    can_access(
        Some(user.id),
        Resource::Recipe {
            owner: existing.user_id,
        },
        Operation::Update,
    )?;

    let recipe = state
        .recipes
        .update(id, draft)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    info!(recipe_id = %recipe.id, user_id = %user.id, "recipe updated");
    Ok(Json(recipe))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = uuid::Uuid, Path, description = "Recipe id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipe deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Recipe not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = path_id(&id)?;
    let existing = state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    can_access(
        Some(user.id),
        Resource::Recipe {
            owner: existing.user_id,
        },
        Operation::Delete,
    )?;

    if !state.recipes.delete(id).await? {
        return Err(AppError::not_found("Recipe not found"));
    }
    info!(recipe_id = %id, user_id = %user.id, "recipe deleted");
    Ok(Json(MessageResponse::new("Recipe deleted successfully")))
}
