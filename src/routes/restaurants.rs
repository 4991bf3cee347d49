use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::restaurants::{
        CreateMenuItemRequest, MenuList, NearbyList, NearbyQuery, RateRestaurantRequest,
        RestaurantList, RestaurantWithRating, UpdateMenuItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::MenuItem,
    response::ApiResponse,
    routes::params::Pagination,
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants))
        .route("/nearby", get(nearby))
        .route("/{id}", get(get_restaurant))
        .route("/{id}/rating", post(rate_restaurant))
        .route("/{id}/menu", get(list_menu))
        .route("/{id}/menu", post(create_menu_item))
        .route("/{id}/menu/{item_id}", put(update_menu_item))
        .route("/{id}/menu/{item_id}", delete(delete_menu_item))
}

#[utoipa::path(get, path = "/api/restaurants", tag = "Restaurants")]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<RestaurantList>>> {
    let resp = restaurant_service::list_restaurants(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/nearby",
    params(
        ("latitude" = f64, Query, description = "Caller latitude"),
        ("longitude" = f64, Query, description = "Caller longitude"),
        ("radius_km" = Option<f64>, Query, description = "Search radius in km, default 5"),
    ),
    responses(
        (status = 200, description = "Restaurants within the radius, nearest first", body = ApiResponse<NearbyList>)
    ),
    tag = "Restaurants"
)]
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<ApiResponse<NearbyList>>> {
    let resp = restaurant_service::nearby(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/restaurants/{id}", tag = "Restaurants")]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RestaurantWithRating>>> {
    let resp = restaurant_service::get_restaurant(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/restaurants/{id}/rating", request_body = RateRestaurantRequest, tag = "Restaurants")]
pub async fn rate_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateRestaurantRequest>,
) -> AppResult<Json<ApiResponse<RestaurantWithRating>>> {
    let resp = restaurant_service::rate_restaurant(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/restaurants/{id}/menu", tag = "Restaurants")]
pub async fn list_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = restaurant_service::list_menu(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/restaurants/{id}/menu", request_body = CreateMenuItemRequest, tag = "Restaurants")]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = restaurant_service::create_menu_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/restaurants/{id}/menu/{item_id}", request_body = UpdateMenuItemRequest, tag = "Restaurants")]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = restaurant_service::update_menu_item(&state, &user, id, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/restaurants/{id}/menu/{item_id}", tag = "Restaurants")]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = restaurant_service::delete_menu_item(&state, &user, id, item_id).await?;
    Ok(Json(resp))
}
