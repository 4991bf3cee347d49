use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::recipes::{
        CreateRecipeRequest, LikeResponse, RateRecipeRequest, RecipeList, RecipeWithAggregates,
        UpdateRecipeRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Recipe,
    response::ApiResponse,
    routes::params::Pagination,
    services::recipe_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes", post(create_recipe))
        .route("/recipes/{id}", get(get_recipe))
        .route("/recipes/{id}", put(update_recipe))
        .route("/recipes/{id}", delete(delete_recipe))
        .route("/recipes/{id}/like", post(like_recipe))
        .route("/recipes/{id}/rating", post(rate_recipe))
        .route("/my-recipes", get(my_recipes))
}

#[utoipa::path(get, path = "/api/recipes", tag = "Recipes")]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::list_recipes(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/my-recipes", tag = "Recipes")]
pub async fn my_recipes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::my_recipes(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe with aggregates", body = ApiResponse<RecipeWithAggregates>),
        (status = 404, description = "Recipe not found"),
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeWithAggregates>>> {
    let resp = recipe_service::get_recipe(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/recipes", request_body = CreateRecipeRequest, tag = "Recipes")]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let resp = recipe_service::create_recipe(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/recipes/{id}", request_body = UpdateRecipeRequest, tag = "Recipes")]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let resp = recipe_service::update_recipe(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/recipes/{id}", tag = "Recipes")]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/recipes/{id}/like", tag = "Recipes")]
pub async fn like_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    let resp = recipe_service::toggle_like(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/recipes/{id}/rating", request_body = RateRecipeRequest, tag = "Recipes")]
pub async fn rate_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateRecipeRequest>,
) -> AppResult<Json<ApiResponse<RecipeWithAggregates>>> {
    let resp = recipe_service::rate_recipe(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
