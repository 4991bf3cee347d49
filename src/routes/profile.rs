use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};

use crate::{
    dto::profile::{
        UpdateProfileRequest, UpdateRestaurantProfileRequest, UpdateStoreProfileRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{RestaurantProfile, StoreProfile, User},
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/store-profile", get(get_store_profile))
        .route("/store-profile", put(update_store_profile))
        .route("/restaurant-profile", get(get_restaurant_profile))
        .route("/restaurant-profile", put(update_restaurant_profile))
}

#[utoipa::path(get, path = "/api/profile", tag = "Profile")]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/profile", request_body = UpdateProfileRequest, tag = "Profile")]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/store-profile", tag = "Profile")]
pub async fn get_store_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StoreProfile>>> {
    let resp = profile_service::get_store_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/store-profile", request_body = UpdateStoreProfileRequest, tag = "Profile")]
pub async fn update_store_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateStoreProfileRequest>,
) -> AppResult<Json<ApiResponse<StoreProfile>>> {
    let resp = profile_service::update_store_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/restaurant-profile", tag = "Profile")]
pub async fn get_restaurant_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RestaurantProfile>>> {
    let resp = profile_service::get_restaurant_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/restaurant-profile", request_body = UpdateRestaurantProfileRequest, tag = "Profile")]
pub async fn update_restaurant_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateRestaurantProfileRequest>,
) -> AppResult<Json<ApiResponse<RestaurantProfile>>> {
    let resp = profile_service::update_restaurant_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
