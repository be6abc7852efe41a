//! In-memory doubles and request helpers for handler tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use reqwest::Url;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth::oauth::{ExternalProfile, IdentityProvider},
    error::StoreError,
    favorites::{repo::FavoriteRepo, repo_types::Favorite},
    ingredients::{
        repo::IngredientRepo,
        repo_types::{Ingredient, IngredientDraft, IngredientFilter},
    },
    recipes::{
        filter::{PageRequest, RecipeFilter},
        repo::RecipeRepo,
        repo_types::{Recipe, RecipeDraft, RecipeOwner},
    },
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User, UserUpdate},
    },
};

/// Vec-backed store with the same uniqueness rules as the schema.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    recipes: Mutex<Vec<Recipe>>,
    ingredients: Mutex<Vec<Ingredient>>,
    favorites: Mutex<Vec<Favorite>>,
}

fn user_conflict(users: &[User], skip: Option<Uuid>, username: &str, email: &str) -> Option<StoreError> {
    let others: Vec<&User> = users.iter().filter(|u| Some(u.id) != skip).collect();
    if others.iter().any(|u| u.username == username) {
        return Some(StoreError::Conflict("User already exists with that username".into()));
    }
    if others.iter().any(|u| u.email == email) {
        return Some(StoreError::Conflict("User already exists with that email".into()));
    }
    None
}

fn subject_taken(users: &[User], skip: Option<Uuid>, google_id: Option<&str>) -> Option<StoreError> {
    let google_id = google_id?;
    users
        .iter()
        .any(|u| Some(u.id) != skip && u.google_id.as_deref() == Some(google_id))
        .then(|| StoreError::Conflict("Google account is already linked to another user".into()))
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if let Some(conflict) = user_conflict(&users, None, &new.username, &new.email)
            .or_else(|| subject_taken(&users, None, new.google_id.as_deref()))
        {
            return Err(conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            google_id: new.google_id,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_external_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().await.clone())
    }

    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().await;
        let Some(current) = users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };
        let username = changes.username.unwrap_or(current.username);
        let email = changes.email.unwrap_or(current.email);
        if let Some(conflict) = user_conflict(&users, Some(id), &username, &email) {
            return Err(conflict);
        }
        let user = users.iter_mut().find(|u| u.id == id).map(|u| {
            u.username = username;
            u.email = email;
            if let Some(hash) = changes.password_hash {
                u.password_hash = Some(hash);
            }
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        });
        Ok(user)
    }

    async fn link_external_identity(
        &self,
        id: Uuid,
        google_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().await;
        if let Some(conflict) = subject_taken(&users, Some(id), Some(google_id)) {
            return Err(conflict);
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.google_id = Some(google_id.to_string());
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

fn apply_draft(recipe: &mut Recipe, draft: RecipeDraft) {
    recipe.title = draft.title;
    recipe.description = draft.description;
    recipe.ingredients = draft.ingredients;
    recipe.instructions = draft.instructions;
    recipe.prep_time = draft.prep_time;
    recipe.cook_time = draft.cook_time;
    recipe.cooking_time = draft.cooking_time;
    recipe.servings = draft.servings;
    recipe.difficulty = draft.difficulty;
    recipe.tags = draft.tags;
    recipe.image_url = draft.image_url;
    recipe.updated_at = OffsetDateTime::now_utc();
}

impl MemoryStore {
    /// Fills in owner summaries the way the users join does.
    async fn with_owners(&self, mut recipes: Vec<Recipe>) -> Vec<Recipe> {
        let users = self.users.lock().await;
        for recipe in &mut recipes {
            recipe.owner = recipe.user_id.and_then(|id| {
                users.iter().find(|u| u.id == id).map(|u| RecipeOwner {
                    id,
                    username: u.username.clone(),
                })
            });
        }
        recipes
    }

    async fn with_owner(&self, recipe: Option<Recipe>) -> Option<Recipe> {
        self.with_owners(recipe.into_iter().collect()).await.pop()
    }

    /// Inserts a recipe with no owner, as rows from before ownership existed.
    pub async fn insert_unowned_recipe(&self, draft: RecipeDraft) -> Recipe {
        let mut recipe = RecipeRepo::create(self, Uuid::nil(), draft)
            .await
            .expect("memory insert");
        recipe.user_id = None;
        recipe.owner = None;
        let mut recipes = self.recipes.lock().await;
        if let Some(stored) = recipes.iter_mut().find(|r| r.id == recipe.id) {
            stored.user_id = None;
        }
        recipe
    }
}

#[async_trait]
impl RecipeRepo for MemoryStore {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut recipe = Recipe {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            ingredients: vec![],
            instructions: vec![],
            prep_time: None,
            cook_time: None,
            cooking_time: 0,
            servings: 0,
            difficulty: Default::default(),
            tags: vec![],
            image_url: None,
            user_id: Some(owner),
            owner: None,
            created_at: now,
            updated_at: now,
        };
        apply_draft(&mut recipe, draft);
        self.recipes.lock().await.push(recipe.clone());
        Ok(self.with_owner(Some(recipe)).await.expect("just created"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        let found = self.recipes.lock().await.iter().find(|r| r.id == id).cloned();
        Ok(self.with_owner(found).await)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Recipe>, StoreError> {
        let found: Vec<Recipe> = self
            .recipes
            .lock()
            .await
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        Ok(self.with_owners(found).await)
    }

    async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), StoreError> {
        let (items, total) = {
            let recipes = self.recipes.lock().await;
            let matching: Vec<&Recipe> =
                recipes.iter().rev().filter(|r| filter.matches(r)).collect();
            let total = matching.len() as i64;
            let items: Vec<Recipe> = matching
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .cloned()
                .collect();
            (items, total)
        };
        Ok((self.with_owners(items).await, total))
    }

    async fn update(&self, id: Uuid, draft: RecipeDraft) -> Result<Option<Recipe>, StoreError> {
        let updated = {
            let mut recipes = self.recipes.lock().await;
            recipes.iter_mut().find(|r| r.id == id).map(|r| {
                apply_draft(r, draft);
                r.clone()
            })
        };
        Ok(self.with_owner(updated).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut recipes = self.recipes.lock().await;
        let before = recipes.len();
        recipes.retain(|r| r.id != id);
        Ok(recipes.len() < before)
    }
}

#[async_trait]
impl IngredientRepo for MemoryStore {
    async fn create(&self, draft: IngredientDraft) -> Result<Ingredient, StoreError> {
        let now = OffsetDateTime::now_utc();
        let ingredient = Ingredient {
            id: Uuid::new_v4(),
            name: draft.name,
            category: draft.category,
            nutritional_info: draft.nutritional_info,
            common_uses: draft.common_uses,
            created_at: now,
            updated_at: now,
        };
        self.ingredients.lock().await.push(ingredient.clone());
        Ok(ingredient)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.ingredients.lock().await.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, StoreError> {
        let mut items: Vec<Ingredient> = self
            .ingredients
            .lock()
            .await
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: IngredientDraft,
    ) -> Result<Option<Ingredient>, StoreError> {
        let mut items = self.ingredients.lock().await;
        Ok(items.iter_mut().find(|i| i.id == id).map(|i| {
            i.name = draft.name;
            i.category = draft.category;
            i.nutritional_info = draft.nutritional_info;
            i.common_uses = draft.common_uses;
            i.updated_at = OffsetDateTime::now_utc();
            i.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut items = self.ingredients.lock().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }
}

#[async_trait]
impl FavoriteRepo for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        notes: Option<String>,
    ) -> Result<Favorite, StoreError> {
        let mut favorites = self.favorites.lock().await;
        if favorites
            .iter()
            .any(|f| f.user_id == user_id && f.recipe_id == recipe_id)
        {
            return Err(StoreError::Conflict("Recipe already in favorites".into()));
        }
        let favorite = Favorite {
            id: Uuid::new_v4(),
            user_id,
            recipe_id,
            notes,
            created_at: OffsetDateTime::now_utc(),
        };
        favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Favorite>, StoreError> {
        Ok(self.favorites.lock().await.iter().find(|f| f.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError> {
        Ok(self
            .favorites
            .lock()
            .await
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<Favorite>, StoreError> {
        let mut favorites = self.favorites.lock().await;
        Ok(favorites.iter_mut().find(|f| f.id == id).map(|f| {
            f.notes = notes;
            f.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut favorites = self.favorites.lock().await;
        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        Ok(favorites.len() < before)
    }
}

/// Provider that accepts the code `"good"` and returns a fixed profile.
pub struct FakeProvider {
    pub profile: ExternalProfile,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> anyhow::Result<Url> {
        Ok(Url::parse_with_params(
            "https://idp.test/authorize",
            &[("state", state)],
        )?)
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<ExternalProfile> {
        anyhow::ensure!(code == "good", "provider rejected code");
        Ok(self.profile.clone())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Registers `username` and returns `(token, user id)`.
pub async fn register(app: &Router, username: &str) -> (String, String) {
    let res = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": format!("{username}@x.com"),
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    (
        res.body["token"].as_str().unwrap().to_string(),
        res.body["user"]["id"].as_str().unwrap().to_string(),
    )
}

pub fn soup() -> Value {
    serde_json::json!({
        "title": "Soup",
        "description": "...",
        "ingredients": ["Water"],
        "instructions": ["Boil"],
        "cookingTime": 10
    })
}

/// Creates a recipe and returns its id.
pub async fn create_recipe(app: &Router, token: &str, body: Value) -> String {
    let res = send(app, Method::POST, "/api/recipes", Some(token), Some(body)).await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    res.body["id"].as_str().unwrap().to_string()
}
