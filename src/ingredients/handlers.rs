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
    ingredients::{
        dto::{IngredientInput, IngredientListQuery},
        repo_types::Ingredient,
    },
    policy::{can_access, Operation, Resource},
    state::AppState,
    validation::{path_id, ApiJson, ApiQuery},
};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Matching ingredients", body = [Ingredient]),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, query))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IngredientListQuery>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(state.ingredients.list(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(("id" = uuid::Uuid, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient", body = Ingredient),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 404, description = "Ingredient not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>, AppError> {
    let id = path_id(&id)?;
    state
        .ingredients
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Ingredient not found"))
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = IngredientInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<IngredientInput>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    let draft = payload.validate()?;
    let ingredient = state.ingredients.create(draft).await?;
    info!(ingredient_id = %ingredient.id, user_id = %user.id, "ingredient created");
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(("id" = uuid::Uuid, Path, description = "Ingredient id")),
    request_body = IngredientInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Ingredient updated", body = Ingredient),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Ingredient not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<IngredientInput>,
) -> Result<Json<Ingredient>, AppError> {
    let id = path_id(&id)?;
    let draft = payload.validate()?;
    if state.ingredients.find_by_id(id).await?.is_none() {
        return Err(AppError::not_found("Ingredient not found"));
    }
    can_access(Some(user.id), Resource::Ingredient, Operation::Update)?;

    let ingredient = state
        .ingredients
        .update(id, draft)
        .await?
        .ok_or_else(|| AppError::not_found("Ingredient not found"))?;
    info!(ingredient_id = %id, user_id = %user.id, "ingredient updated");
    Ok(Json(ingredient))
}

#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(("id" = uuid::Uuid, Path, description = "Ingredient id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Ingredient deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Ingredient not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = path_id(&id)?;
    if state.ingredients.find_by_id(id).await?.is_none() {
        return Err(AppError::not_found("Ingredient not found"));
    }
    can_access(Some(user.id), Resource::Ingredient, Operation::Delete)?;

    if !state.ingredients.delete(id).await? {
        return Err(AppError::not_found("Ingredient not found"));
    }
    info!(ingredient_id = %id, user_id = %user.id, "ingredient deleted");
    Ok(Json(MessageResponse::new("Ingredient deleted successfully")))
}
