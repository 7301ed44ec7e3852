use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use crate::notify::Notifier;
use larder_core::db::Database;
use larder_core::models::{
    CategoryCount, ExportData, NewRecipe, NewTip, RECENT_DAYS, Recipe, RecordInput, SearchResults,
    Tip, validate_new_recipe, validate_new_tip, validate_record_input,
};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
    notifier: Arc<Notifier>,
    api_token: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct ListQuery {
    category: Option<String>,
}

#[derive(Deserialize)]
struct RecentQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
struct RecordsResponse {
    recipes: Vec<Recipe>,
    tips: Vec<Tip>,
}

#[derive(Serialize)]
struct CategoriesResponse {
    recipes: Vec<CategoryCount>,
    tips: Vec<CategoryCount>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_json(rejection: &JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

// --- Middleware ---

/// Without a configured token the whole `/api` surface answers 503 so a
/// half-configured deployment fails loudly instead of serving openly.
async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(ref expected) = state.api_token else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "API token not configured".to_string(),
            }),
        )
            .into_response();
    };

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Json(input) = payload.map_err(|e| bad_json(&e))?;
    validate_record_input(&input).map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    match input {
        RecordInput::Recipe(new_recipe) => {
            let recipe = {
                let db = state
                    .db
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                db.insert_recipe(&new_recipe)
                    .context("failed to insert recipe")?
            };
            state.notifier.announce_recipe(&recipe).await;
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({ "type": "recipe", "id": recipe.id })),
            ))
        }
        RecordInput::Tip(new_tip) => {
            let tip = {
                let db = state
                    .db
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                db.insert_tip(&new_tip).context("failed to insert tip")?
            };
            state.notifier.announce_tip(&tip).await;
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({ "type": "tip", "id": tip.id })),
            ))
        }
    }
}

async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipes = db
        .list_recipes(params.category.as_deref())
        .context("database error")?;
    Ok(Json(recipes))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipe = db
        .get_recipe(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))?;
    Ok(Json(recipe))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewRecipe>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let Json(req) = payload.map_err(|e| bad_json(&e))?;
    validate_new_recipe(&req).map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if !db.update_recipe(id, &req).context("database error")? {
        return Err(ApiError::NotFound(format!("Recipe {id} not found")));
    }
    let recipe = db
        .get_recipe(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))?;
    Ok(Json(recipe))
}

/// Delete is idempotent: a missing id still answers 204.
async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.delete_recipe(id).context("database error")?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tips(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Tip>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let tips = db
        .list_tips(params.category.as_deref())
        .context("database error")?;
    Ok(Json(tips))
}

async fn get_tip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tip>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let tip = db
        .get_tip(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Tip {id} not found")))?;
    Ok(Json(tip))
}

async fn update_tip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewTip>, JsonRejection>,
) -> Result<Json<Tip>, ApiError> {
    let Json(req) = payload.map_err(|e| bad_json(&e))?;
    validate_new_tip(&req).map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if !db.update_tip(id, &req).context("database error")? {
        return Err(ApiError::NotFound(format!("Tip {id} not found")));
    }
    let tip = db
        .get_tip(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Tip {id} not found")))?;
    Ok(Json(tip))
}

async fn delete_tip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    db.delete_tip(id).context("database error")?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_records(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let results = db.search(&params.q).context("database error")?;
    Ok(Json(results))
}

async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipes = db.recipe_categories().context("database error")?;
    let tips = db.tip_categories().context("database error")?;
    Ok(Json(CategoriesResponse { recipes, tips }))
}

async fn get_recent(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let days = params.days.unwrap_or(RECENT_DAYS);
    if days < 1 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipes = db.recent_recipes(days).context("database error")?;
    let tips = db.recent_tips(days).context("database error")?;
    Ok(Json(RecordsResponse { recipes, tips }))
}

async fn get_highlights(
    State(state): State<AppState>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipes = db.highlighted_recipes().context("database error")?;
    let tips = db.highlighted_tips().context("database error")?;
    Ok(Json(RecordsResponse { recipes, tips }))
}

async fn export_records(State(state): State<AppState>) -> Result<Json<ExportData>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let export = db.export_all().context("database error")?;
    Ok(Json(export))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/records", post(create_record))
        .route("/api/recipes", get(list_recipes))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/tips", get(list_tips))
        .route(
            "/api/tips/{id}",
            get(get_tip).put(update_tip).delete(delete_tip),
        )
        .route("/api/search", get(search_records))
        .route("/api/categories", get(get_categories))
        .route("/api/recent", get(get_recent))
        .route("/api/highlights", get(get_highlights))
        .route("/api/export", get(export_records))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    db: Database,
    notifier: Notifier,
    port: u16,
    bind: &str,
    api_token: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        notifier: Arc::new(notifier),
        api_token: api_token.clone(),
    };

    let app = build_router(state);

    match api_token {
        Some(ref token) => match (token.get(..4), token.get(token.len().saturating_sub(4)..)) {
            (Some(head), Some(tail)) if token.len() >= 8 => {
                eprintln!("API token: {head}...{tail} (see api_token file in data directory)");
            }
            _ => eprintln!("API token configured"),
        },
        None => {
            eprintln!("Warning: no API token configured. /api requests will answer 503.");
        }
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token-abc123";

    fn test_state(api_token: Option<String>) -> AppState {
        AppState {
            db: Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
            notifier: Arc::new(Notifier::new(None, "http://127.0.0.1:65432")),
            api_token,
        }
    }

    fn test_app(api_token: Option<String>) -> Router {
        build_router(test_state(api_token))
    }

    fn seed_recipe(state: &AppState, title: &str, category: &str) -> Recipe {
        let db = state.db.lock().unwrap();
        db.insert_recipe(&NewRecipe {
            title: title.to_string(),
            category: category.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn authed_get(path: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(path)
            .header("Authorization", format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    fn authed_json(method: &str, path: &str, body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(path)
            .header("Authorization", format!("Bearer {TOKEN}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn auth_missing_token_returns_401() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn auth_wrong_token_returns_401() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .header("Authorization", "Bearer wrong-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_unconfigured_token_returns_503() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .header("Authorization", "Bearer anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "API token not configured");
    }

    #[tokio::test]
    async fn auth_correct_token_succeeds() {
        let app = test_app(Some(TOKEN.to_string()));
        let response = app.oneshot(authed_get("/api/recipes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_open_without_token() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn create_recipe_roundtrip() {
        let state = test_state(Some(TOKEN.to_string()));
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"type": "recipe", "title": "Soup", "category": "dinner",
                    "ingredients": [{"name": "water", "amount": "1L"}],
                    "directions": ["boil"]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["type"], "recipe");
        let id = json["id"].as_i64().unwrap();

        let response = app
            .oneshot(authed_get(&format!("/api/recipes/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Soup");
        assert_eq!(json["ingredients"][0]["name"], "water");
        assert_eq!(json["source_type"], "ai");
        assert_eq!(json["highlight"], false);
    }

    #[tokio::test]
    async fn create_tip_roundtrip() {
        let state = test_state(Some(TOKEN.to_string()));
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"type": "tip", "title": "Pantry staples", "category": "storage",
                    "items": [{"name": "rice", "details": "airtight jar"}],
                    "source_type": "personal"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["type"], "tip");

        let response = app.oneshot(authed_get("/api/tips/1")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["items"][0]["name"], "rice");
        assert_eq!(json["source_type"], "personal");
    }

    #[tokio::test]
    async fn create_record_without_type_is_rejected() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"title": "Soup", "category": "dinner", "ingredients": []}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn create_record_unknown_type_is_rejected() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"type": "snack", "title": "Soup", "category": "dinner"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_record_blank_title_is_rejected() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"type": "recipe", "title": "   ", "category": "dinner"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("title"));
    }

    #[tokio::test]
    async fn create_record_invalid_source_type_is_rejected() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/records",
                r#"{"type": "recipe", "title": "Soup", "category": "dinner",
                    "source_type": "magazine"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_missing_recipe_returns_404() {
        let app = test_app(Some(TOKEN.to_string()));
        let response = app.oneshot(authed_get("/api/recipes/99")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Recipe 99 not found");
    }

    #[tokio::test]
    async fn update_recipe_replaces_fields() {
        let state = test_state(Some(TOKEN.to_string()));
        let recipe = seed_recipe(&state, "Soup", "dinner");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(authed_json(
                "PUT",
                &format!("/api/recipes/{}", recipe.id),
                r#"{"title": "Better Soup", "category": "dinner", "cook_time": 30}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Better Soup");
        assert_eq!(json["cook_time"], 30);
        // created_at is server-assigned and survives the update untouched.
        assert_eq!(
            json["created_at"].as_str(),
            recipe.created_at.as_deref()
        );
    }

    #[tokio::test]
    async fn update_missing_recipe_returns_404() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json(
                "PUT",
                "/api/recipes/42",
                r#"{"title": "Soup", "category": "dinner"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_recipe_is_idempotent_204() {
        let state = test_state(Some(TOKEN.to_string()));
        let recipe = seed_recipe(&state, "Soup", "dinner");
        let app = build_router(state);

        let request = |id: i64| {
            axum::http::Request::delete(format!("/api/recipes/{id}"))
                .header("Authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(request(recipe.id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Deleting the same id again still answers 204.
        let response = app.clone().oneshot(request(recipe.id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(authed_get(&format!("/api/recipes/{}", recipe.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_recipes_filters_by_category() {
        let state = test_state(Some(TOKEN.to_string()));
        seed_recipe(&state, "Soup", "dinner");
        seed_recipe(&state, "Pancakes", "breakfast");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(authed_get("/api/recipes?category=dinner"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["title"], "Soup");

        let response = app.oneshot(authed_get("/api/recipes")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_returns_both_variants() {
        let state = test_state(Some(TOKEN.to_string()));
        {
            let db = state.db.lock().unwrap();
            db.insert_recipe(&NewRecipe {
                title: "Garlic bread".to_string(),
                category: "baking".to_string(),
                ..Default::default()
            })
            .unwrap();
            db.insert_tip(&NewTip {
                title: "Garlic storage".to_string(),
                category: "storage".to_string(),
                ..Default::default()
            })
            .unwrap();
        }
        let app = build_router(state);

        let response = app
            .oneshot(authed_get("/api/search?q=garlic"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["recipes"].as_array().unwrap().len(), 1);
        assert_eq!(json["tips"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_without_query_param_is_rejected() {
        let app = test_app(Some(TOKEN.to_string()));
        let response = app.oneshot(authed_get("/api/search")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn categories_lists_both_variants() {
        let state = test_state(Some(TOKEN.to_string()));
        seed_recipe(&state, "Soup", "dinner");
        seed_recipe(&state, "Stew", "dinner");
        let app = build_router(state);

        let response = app.oneshot(authed_get("/api/categories")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["recipes"][0]["category"], "dinner");
        assert_eq!(json["recipes"][0]["count"], 2);
        assert!(json["tips"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_respects_window() {
        let state = test_state(Some(TOKEN.to_string()));
        {
            let db = state.db.lock().unwrap();
            let old = (chrono::Utc::now() - chrono::Duration::days(30))
                .format(larder_core::models::TIMESTAMP_FORMAT)
                .to_string();
            db.insert_recipe(&NewRecipe {
                title: "Old".to_string(),
                category: "dinner".to_string(),
                created_at: Some(old),
                ..Default::default()
            })
            .unwrap();
            db.insert_recipe(&NewRecipe {
                title: "Fresh".to_string(),
                category: "dinner".to_string(),
                ..Default::default()
            })
            .unwrap();
        }
        let app = build_router(state);

        let response = app.clone().oneshot(authed_get("/api/recent")).await.unwrap();
        let json = body_json(response).await;
        let recipes = json["recipes"].as_array().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["title"], "Fresh");

        let response = app
            .clone()
            .oneshot(authed_get("/api/recent?days=60"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["recipes"].as_array().unwrap().len(), 2);

        let response = app.oneshot(authed_get("/api/recent?days=0")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn highlights_lists_flagged_records() {
        let state = test_state(Some(TOKEN.to_string()));
        {
            let db = state.db.lock().unwrap();
            db.insert_recipe(&NewRecipe {
                title: "Plain".to_string(),
                category: "dinner".to_string(),
                ..Default::default()
            })
            .unwrap();
            db.insert_recipe(&NewRecipe {
                title: "Starred".to_string(),
                category: "dinner".to_string(),
                highlight: true,
                ..Default::default()
            })
            .unwrap();
        }
        let app = build_router(state);

        let response = app.oneshot(authed_get("/api/highlights")).await.unwrap();
        let json = body_json(response).await;
        let recipes = json["recipes"].as_array().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["title"], "Starred");
    }

    #[tokio::test]
    async fn export_orders_by_title() {
        let state = test_state(Some(TOKEN.to_string()));
        seed_recipe(&state, "Ziti", "dinner");
        seed_recipe(&state, "Apple pie", "dessert");
        let app = build_router(state);

        let response = app.oneshot(authed_get("/api/export")).await.unwrap();
        let json = body_json(response).await;
        let recipes = json["recipes"].as_array().unwrap();
        assert_eq!(recipes[0]["title"], "Apple pie");
        assert_eq!(recipes[1]["title"], "Ziti");
        assert!(json["tips"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_body_returns_400() {
        let app = test_app(Some(TOKEN.to_string()));

        let response = app
            .oneshot(authed_json("POST", "/api/records", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }
}
