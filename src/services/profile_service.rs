use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    dto::profile::{
        UpdateProfileRequest, UpdateRestaurantProfileRequest, UpdateStoreProfileRequest,
    },
    entity::{
        restaurant_profiles::{
            ActiveModel as RestaurantProfileActive, Column as RestaurantCol,
            Entity as RestaurantProfiles,
        },
        store_profiles::ActiveModel as StoreProfileActive,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_restaurant, ensure_store},
    models::{RestaurantProfile, StoreProfile, User},
    response::{ApiResponse, Meta},
    services::{auth_service, order_service, restaurant_service},
    state::AppState,
};

pub async fn get_profile(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", auth_service::user_to_api(user)?, None))
}

pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = user.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(Some(full_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        auth_service::user_to_api(user)?,
        Some(Meta::empty()),
    ))
}

pub async fn get_store_profile(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<StoreProfile>> {
    ensure_store(auth)?;
    let profile = order_service::own_store_profile(&state.orm, auth.user_id).await?;
    Ok(ApiResponse::success("OK", store_profile_to_api(profile), None))
}

pub async fn update_store_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateStoreProfileRequest,
) -> AppResult<ApiResponse<StoreProfile>> {
    ensure_store(auth)?;
    let profile = order_service::own_store_profile(&state.orm, auth.user_id).await?;

    let mut active: StoreProfileActive = profile.into();
    if let Some(store_name) = payload.store_name {
        active.store_name = Set(store_name);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    active.updated_at = Set(Utc::now().into());
    let profile = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Store profile updated",
        store_profile_to_api(profile),
        Some(Meta::empty()),
    ))
}

pub async fn get_restaurant_profile(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<RestaurantProfile>> {
    ensure_restaurant(auth)?;
    let profile = RestaurantProfiles::find()
        .filter(RestaurantCol::UserId.eq(auth.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        restaurant_service::restaurant_profile_to_api(profile),
        None,
    ))
}

pub async fn update_restaurant_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateRestaurantProfileRequest,
) -> AppResult<ApiResponse<RestaurantProfile>> {
    ensure_restaurant(auth)?;
    let profile = RestaurantProfiles::find()
        .filter(RestaurantCol::UserId.eq(auth.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: RestaurantProfileActive = profile.into();
    if let Some(restaurant_name) = payload.restaurant_name {
        active.restaurant_name = Set(restaurant_name);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(cuisine) = payload.cuisine {
        active.cuisine = Set(Some(cuisine));
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(Some(longitude));
    }
    active.updated_at = Set(Utc::now().into());
    let profile = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Restaurant profile updated",
        restaurant_service::restaurant_profile_to_api(profile),
        Some(Meta::empty()),
    ))
}

pub fn store_profile_to_api(model: crate::entity::store_profiles::Model) -> StoreProfile {
    StoreProfile {
        id: model.id,
        user_id: model.user_id,
        store_name: model.store_name,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
