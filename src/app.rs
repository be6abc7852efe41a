use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::doc::ApiDoc;
use crate::state::AppState;
use crate::{auth, favorites, ingredients, recipes, users};

pub fn build_app(state: AppState) -> Router {
    let with_google = state.identity_provider.is_some();
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router(with_google))
                .merge(recipes::router())
                .merge(ingredients::router())
                .merge(favorites::router())
                .merge(users::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/api-docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_recipe, register, send, soup};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn app() -> Router {
        build_app(AppState::fake())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = send(&app(), Method::GET, "/api/health", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, "ok");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let res = send(&app(), Method::GET, "/openapi.json", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["info"]["title"], "MealMatch API");
        assert!(res.body["paths"]["/api/recipes"]["get"].is_object());
        assert!(res.body["paths"]["/api/favorites/{id}"]["put"].is_object());
        assert!(res.body["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn swagger_ui_is_mounted() {
        let res = send(&app(), Method::GET, "/api-docs/", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn registration_returns_token_and_no_password() {
        let app = app();
        let res = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "chef1", "email": "chef1@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.body["message"], "User registered successfully");
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["user"]["username"], "chef1");
        let raw = res.body.to_string();
        assert!(!raw.contains("password"));
        assert!(!raw.contains("secret1"));
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let app = app();
        register(&app, "chef1").await;
        for body in [
            json!({"username": "chef1", "email": "other@x.com", "password": "secret1"}),
            json!({"username": "other", "email": "CHEF1@x.com", "password": "secret1"}),
        ] {
            let res = send(&app, Method::POST, "/api/auth/register", None, Some(body)).await;
            assert_eq!(res.status, StatusCode::CONFLICT, "{:?}", res.body);
        }
    }

    #[tokio::test]
    async fn login_checks_password() {
        let app = app();
        register(&app, "chef1").await;

        let bad = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "chef1@x.com", "password": "wrong-pass"})),
        )
        .await;
        assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
        assert_eq!(bad.body["message"], "Invalid credentials");

        let unknown = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

        let ok = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "Chef1@X.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.body["message"], "Login successful");

        let token = ok.body["token"].as_str().unwrap();
        let me = send(&app, Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["email"], "chef1@x.com");
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_or_bad_tokens() {
        let app = app();
        let missing = send(&app, Method::POST, "/api/recipes", None, Some(soup())).await;
        assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
        let garbage = send(&app, Method::POST, "/api/recipes", Some("not.a.jwt"), Some(soup())).await;
        assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
        let me = send(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_rejected() {
        let app = app();
        let (token, id) = register(&app, "chef1").await;
        let del = send(&app, Method::DELETE, &format!("/api/users/{id}"), Some(&token), None).await;
        assert_eq!(del.status, StatusCode::OK);
        let me = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn only_owner_mutates_recipe() {
        let app = app();
        let (a, a_id) = register(&app, "alice").await;
        let (b, _) = register(&app, "bob").await;
        let id = create_recipe(&app, &a, soup()).await;
        let uri = format!("/api/recipes/{id}");

        let got = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(got.status, StatusCode::OK);
        assert_eq!(got.body["userId"], a_id);
        assert_eq!(got.body["servings"], 4);
        assert_eq!(got.body["difficulty"], "Medium");

        let mut changed = soup();
        changed["title"] = json!("Better soup");
        let by_b = send(&app, Method::PUT, &uri, Some(&b), Some(changed.clone())).await;
        assert_eq!(by_b.status, StatusCode::FORBIDDEN);
        assert_eq!(by_b.body["message"], "Not authorized to update this recipe");
        let del_b = send(&app, Method::DELETE, &uri, Some(&b), None).await;
        assert_eq!(del_b.status, StatusCode::FORBIDDEN);

        let by_a = send(&app, Method::PUT, &uri, Some(&a), Some(changed)).await;
        assert_eq!(by_a.status, StatusCode::OK);
        assert_eq!(by_a.body["title"], "Better soup");
        assert_eq!(by_a.body["userId"], a_id);

        let del_a = send(&app, Method::DELETE, &uri, Some(&a), None).await;
        assert_eq!(del_a.status, StatusCode::OK);
        assert_eq!(del_a.body["message"], "Recipe deleted successfully");
        let gone = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unowned_recipe_can_be_changed_by_any_caller() {
        let (state, store) = AppState::fake_with_store();
        let app = build_app(state);
        let (token, _) = register(&app, "alice").await;
        let draft = serde_json::from_value::<crate::recipes::dto::RecipeInput>(soup())
            .unwrap()
            .validate()
            .unwrap();
        let legacy = store.insert_unowned_recipe(draft).await;

        let uri = format!("/api/recipes/{}", legacy.id);
        let anonymous = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
        let res = send(&app, Method::PUT, &uri, Some(&token), Some(soup())).await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body["userId"].is_null());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_for_any_caller() {
        let app = app();
        let (token, _) = register(&app, "alice").await;
        let missing = uuid::Uuid::new_v4();
        for (method, uri, body) in [
            (Method::GET, format!("/api/recipes/{missing}"), None),
            (Method::PUT, format!("/api/recipes/{missing}"), Some(soup())),
            (Method::DELETE, format!("/api/recipes/{missing}"), None),
            (Method::GET, format!("/api/favorites/{missing}"), None),
            (Method::DELETE, format!("/api/favorites/{missing}"), None),
            (Method::GET, format!("/api/ingredients/{missing}"), None),
            (Method::DELETE, format!("/api/ingredients/{missing}"), None),
            (Method::GET, format!("/api/users/{missing}"), None),
            (Method::DELETE, format!("/api/users/{missing}"), None),
        ] {
            let res = send(&app, method.clone(), &uri, Some(&token), body).await;
            assert_eq!(res.status, StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn malformed_ids_and_bodies_are_validation_errors() {
        let app = app();
        let (token, _) = register(&app, "alice").await;
        let res = send(&app, Method::GET, "/api/recipes/123", None, None).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "Validation failed");

        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/recipes")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let res = crate::testing::send_request(&app, request).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_violated_rule_is_reported() {
        let app = app();
        let (token, _) = register(&app, "alice").await;
        let res = send(&app, Method::POST, "/api/recipes", Some(&token), Some(json!({}))).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 4);

        let res = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ab", "email": "bad", "password": "123"})),
        )
        .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn wrongly_typed_fields_are_reported_with_the_rest() {
        let app = app();
        let (token, _) = register(&app, "alice").await;
        let res = send(
            &app,
            Method::POST,
            "/api/recipes",
            Some(&token),
            Some(json!({
                "title": "",
                "ingredients": [],
                "instructions": [],
                "cookingTime": "ten"
            })),
        )
        .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 4);

        let res = send(
            &app,
            Method::POST,
            "/api/ingredients",
            Some(&token),
            Some(json!({"name": "T", "category": 1, "commonUses": "x"})),
        )
        .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 3);

        let res = send(
            &app,
            Method::POST,
            "/api/favorites",
            Some(&token),
            Some(json!({"recipeId": 5, "notes": 5})),
        )
        .await;
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn favoriting_twice_conflicts() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        let recipe = create_recipe(&app, &a, soup()).await;
        let body = json!({"recipeId": recipe, "notes": "weekly"});

        let first = send(&app, Method::POST, "/api/favorites", Some(&a), Some(body.clone())).await;
        assert_eq!(first.status, StatusCode::CREATED);
        assert_eq!(first.body["notes"], "weekly");

        let second = send(&app, Method::POST, "/api/favorites", Some(&a), Some(body)).await;
        assert_eq!(second.status, StatusCode::CONFLICT);
        assert_eq!(second.body["message"], "Recipe already in favorites");
    }

    #[tokio::test]
    async fn favoriting_missing_recipe_is_not_found() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        let body = json!({"recipeId": uuid::Uuid::new_v4()});
        let res = send(&app, Method::POST, "/api/favorites", Some(&a), Some(body)).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body["message"], "Recipe not found");
    }

    #[tokio::test]
    async fn foreign_favorite_is_forbidden_not_missing() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        let (b, _) = register(&app, "bob").await;
        let recipe = create_recipe(&app, &a, soup()).await;
        let fav = send(
            &app,
            Method::POST,
            "/api/favorites",
            Some(&a),
            Some(json!({"recipeId": recipe})),
        )
        .await;
        let uri = format!("/api/favorites/{}", fav.body["id"].as_str().unwrap());

        let read = send(&app, Method::GET, &uri, Some(&b), None).await;
        assert_eq!(read.status, StatusCode::FORBIDDEN);
        assert_eq!(read.body["message"], "Not authorized to access this favorite");
        let update = send(&app, Method::PUT, &uri, Some(&b), Some(json!({"notes": "mine"}))).await;
        assert_eq!(update.status, StatusCode::FORBIDDEN);
        let delete = send(&app, Method::DELETE, &uri, Some(&b), None).await;
        assert_eq!(delete.status, StatusCode::FORBIDDEN);

        let own = send(&app, Method::GET, &uri, Some(&a), None).await;
        assert_eq!(own.status, StatusCode::OK);
        assert_eq!(own.body["recipe"]["title"], "Soup");
        let update = send(&app, Method::PUT, &uri, Some(&a), Some(json!({"notes": "mine"}))).await;
        assert_eq!(update.status, StatusCode::OK);
        assert_eq!(update.body["notes"], "mine");
        let delete = send(&app, Method::DELETE, &uri, Some(&a), None).await;
        assert_eq!(delete.status, StatusCode::OK);
        assert_eq!(delete.body["message"], "Favorite removed successfully");
    }

    #[tokio::test]
    async fn favorites_list_is_scoped_and_embeds_recipes() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        let (b, _) = register(&app, "bob").await;
        let first = create_recipe(&app, &a, soup()).await;
        let mut stew = soup();
        stew["title"] = json!("Stew");
        let second = create_recipe(&app, &a, stew).await;
        for id in [&first, &second] {
            send(&app, Method::POST, "/api/favorites", Some(&a), Some(json!({"recipeId": id}))).await;
        }
        send(&app, Method::POST, "/api/favorites", Some(&b), Some(json!({"recipeId": first}))).await;

        let res = send(&app, Method::GET, "/api/favorites", Some(&a), None).await;
        assert_eq!(res.status, StatusCode::OK);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["recipe"]["title"], "Stew");
        assert_eq!(items[1]["recipeId"], first);

        // Deleting the recipe leaves the favorite with no embedded recipe.
        send(&app, Method::DELETE, &format!("/api/recipes/{second}"), Some(&a), None).await;
        let res = send(&app, Method::GET, "/api/favorites", Some(&a), None).await;
        assert!(res.body[0]["recipe"].is_null());
    }

    #[tokio::test]
    async fn recipe_pages_follow_tag_filter() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        for (i, tags) in std::iter::repeat(json!(["quick"]))
            .take(7)
            .chain(std::iter::repeat(json!(["easy", "vegan"])).take(4))
            .chain(std::iter::repeat(json!(["slow"])).take(3))
            .enumerate()
        {
            let mut body = soup();
            body["title"] = json!(format!("Recipe {i}"));
            body["tags"] = tags;
            create_recipe(&app, &a, body).await;
        }

        let res = send(&app, Method::GET, "/api/recipes?tags=quick,easy&page=2&limit=5", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["page"], 2);
        assert_eq!(res.body["limit"], 5);
        assert_eq!(res.body["totalRecipes"], 11);
        assert_eq!(res.body["totalPages"], 3);
        assert_eq!(res.body["recipes"].as_array().unwrap().len(), 5);

        let last = send(&app, Method::GET, "/api/recipes?tags=quick,easy&page=3&limit=5", None, None).await;
        assert_eq!(last.body["recipes"].as_array().unwrap().len(), 1);

        let all = send(&app, Method::GET, "/api/recipes", None, None).await;
        assert_eq!(all.body["page"], 1);
        assert_eq!(all.body["limit"], 10);
        assert_eq!(all.body["totalRecipes"], 14);
        assert_eq!(all.body["recipes"][0]["title"], "Recipe 13");

        let bad = send(&app, Method::GET, "/api/recipes?page=abc", None, None).await;
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingredient_catalog_needs_auth_only_for_writes() {
        let app = app();
        let (a, _) = register(&app, "alice").await;
        let (b, _) = register(&app, "bob").await;
        let body = json!({"name": "Tomato", "category": "Vegetable", "nutritionalInfo": {"calories": 18}});

        let anon = send(&app, Method::POST, "/api/ingredients", None, Some(body.clone())).await;
        assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
        let created = send(&app, Method::POST, "/api/ingredients", Some(&a), Some(body)).await;
        assert_eq!(created.status, StatusCode::CREATED);
        let uri = format!("/api/ingredients/{}", created.body["id"].as_str().unwrap());

        let update = send(
            &app,
            Method::PUT,
            &uri,
            Some(&b),
            Some(json!({"name": "Cherry tomato", "category": "Fruit"})),
        )
        .await;
        assert_eq!(update.status, StatusCode::OK);
        assert_eq!(update.body["category"], "Fruit");

        let list = send(&app, Method::GET, "/api/ingredients?category=Fruit&search=cherry", None, None).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);

        let invalid = send(
            &app,
            Method::POST,
            "/api/ingredients",
            Some(&a),
            Some(json!({"name": "X", "category": "Candy"})),
        )
        .await;
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body["errors"].as_array().unwrap().len(), 2);

        let delete = send(&app, Method::DELETE, &uri, Some(&b), None).await;
        assert_eq!(delete.status, StatusCode::OK);
        assert_eq!(delete.body["message"], "Ingredient deleted successfully");
    }

    #[tokio::test]
    async fn user_directory_and_self_service() {
        let app = app();
        let (a, a_id) = register(&app, "alice").await;
        let (b, _) = register(&app, "bob").await;

        let anon = send(&app, Method::GET, "/api/users", None, None).await;
        assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
        let list = send(&app, Method::GET, "/api/users", Some(&b), None).await;
        assert_eq!(list.status, StatusCode::OK);
        assert_eq!(list.body.as_array().unwrap().len(), 2);
        assert!(!list.body.to_string().contains("password"));

        let uri = format!("/api/users/{a_id}");
        let by_b = send(&app, Method::PUT, &uri, Some(&b), Some(json!({"username": "mallory"}))).await;
        assert_eq!(by_b.status, StatusCode::FORBIDDEN);
        assert_eq!(by_b.body["message"], "Not authorized to update this user");

        let taken = send(&app, Method::PUT, &uri, Some(&a), Some(json!({"username": "bob"}))).await;
        assert_eq!(taken.status, StatusCode::CONFLICT);

        let renamed = send(
            &app,
            Method::PUT,
            &uri,
            Some(&a),
            Some(json!({"username": "alice2", "password": "newsecret"})),
        )
        .await;
        assert_eq!(renamed.status, StatusCode::OK);
        assert_eq!(renamed.body["username"], "alice2");

        let login = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@x.com", "password": "newsecret"})),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);

        let del_b = send(&app, Method::DELETE, &uri, Some(&b), None).await;
        assert_eq!(del_b.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn open_user_directory_when_configured() {
        let mut state = AppState::fake();
        let mut config = (*state.config).clone();
        config.users_require_auth = false;
        state.config = std::sync::Arc::new(config);
        let app = build_app(state);
        let (_, id) = register(&app, "alice").await;

        let list = send(&app, Method::GET, "/api/users", None, None).await;
        assert_eq!(list.status, StatusCode::OK);
        let one = send(&app, Method::GET, &format!("/api/users/{id}"), None, None).await;
        assert_eq!(one.status, StatusCode::OK);
        assert_eq!(one.body["username"], "alice");
    }

    #[tokio::test]
    async fn deleting_a_user_keeps_their_recipes() {
        let app = app();
        let (a, a_id) = register(&app, "alice").await;
        let recipe = create_recipe(&app, &a, soup()).await;
        send(&app, Method::DELETE, &format!("/api/users/{a_id}"), Some(&a), None).await;

        let res = send(&app, Method::GET, &format!("/api/recipes/{recipe}"), None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["userId"], a_id);
        assert!(res.body["owner"].is_null());
    }

    #[tokio::test]
    async fn recipes_carry_the_owner_username() {
        let app = app();
        let (a, a_id) = register(&app, "alice").await;
        let created = send(&app, Method::POST, "/api/recipes", Some(&a), Some(soup())).await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["owner"]["username"], "alice");
        assert_eq!(created.body["owner"]["id"], a_id);
        let id = created.body["id"].as_str().unwrap().to_string();

        let one = send(&app, Method::GET, &format!("/api/recipes/{id}"), None, None).await;
        assert_eq!(one.body["owner"]["username"], "alice");
        let list = send(&app, Method::GET, "/api/recipes", None, None).await;
        assert_eq!(list.body["recipes"][0]["owner"]["username"], "alice");

        let fav = send(&app, Method::POST, "/api/favorites", Some(&a), Some(json!({"recipeId": id}))).await;
        assert_eq!(fav.status, StatusCode::CREATED);
        let favs = send(&app, Method::GET, "/api/favorites", Some(&a), None).await;
        assert_eq!(favs.body[0]["recipe"]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn google_routes_absent_without_provider() {
        let res = send(&app(), Method::GET, "/api/auth/google", None, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }
}
