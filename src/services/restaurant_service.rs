use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::restaurants::{
        CreateMenuItemRequest, MenuList, NearbyList, NearbyQuery, NearbyRestaurant,
        RateRestaurantRequest, RestaurantList, RestaurantWithRating, UpdateMenuItemRequest,
    },
    entity::{
        menu_items::{
            ActiveModel as MenuItemActive, Column as MenuCol, Entity as MenuItems,
            Model as MenuItemModel,
        },
        restaurant_profiles::{
            Column as RestaurantCol, Entity as RestaurantProfiles,
            Model as RestaurantProfileModel,
        },
        restaurant_ratings::{
            ActiveModel as RatingActive, Column as RatingCol, Entity as RestaurantRatings,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_restaurant},
    models::{MenuItem, RestaurantProfile, Role},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const DEFAULT_RADIUS_KM: f64 = 5.0;

pub async fn list_restaurants(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<RestaurantList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = RestaurantProfiles::find().order_by_desc(RestaurantCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        items.push(with_rating(state, model).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Restaurants",
        RestaurantList { items },
        Some(meta),
    ))
}

pub async fn get_restaurant(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<RestaurantWithRating>> {
    let restaurant = RestaurantProfiles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Restaurant",
        with_rating(state, restaurant).await?,
        None,
    ))
}

/// Haversine filter over restaurants that have published coordinates,
/// nearest first.
pub async fn nearby(state: &AppState, query: NearbyQuery) -> AppResult<ApiResponse<NearbyList>> {
    let radius_km = query.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
    if radius_km <= 0.0 {
        return Err(AppError::Validation("Radius must be positive".into()));
    }

    let candidates = RestaurantProfiles::find()
        .filter(RestaurantCol::Latitude.is_not_null())
        .filter(RestaurantCol::Longitude.is_not_null())
        .all(&state.orm)
        .await?;

    let mut items: Vec<NearbyRestaurant> = Vec::new();
    for model in candidates {
        let (Some(lat), Some(lng)) = (model.latitude, model.longitude) else {
            continue;
        };
        let distance_km = haversine_km(query.latitude, query.longitude, lat, lng);
        if distance_km <= radius_km {
            items.push(NearbyRestaurant {
                restaurant: restaurant_profile_to_api(model),
                distance_km,
            });
        }
    }
    items.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    Ok(ApiResponse::success(
        "Nearby restaurants",
        NearbyList { items },
        Some(Meta::empty()),
    ))
}

pub async fn rate_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RateRestaurantRequest,
) -> AppResult<ApiResponse<RestaurantWithRating>> {
    if !(1..=5).contains(&payload.stars) {
        return Err(AppError::Validation("Stars must be between 1 and 5".into()));
    }
    let restaurant = RestaurantProfiles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = RestaurantRatings::find()
        .filter(RatingCol::RestaurantId.eq(restaurant.id))
        .filter(RatingCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    match existing {
        Some(rating) => {
            let mut active: RatingActive = rating.into();
            active.stars = Set(payload.stars);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?;
        }
        None => {
            RatingActive {
                id: Set(Uuid::new_v4()),
                restaurant_id: Set(restaurant.id),
                user_id: Set(user.user_id),
                stars: Set(payload.stars),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    Ok(ApiResponse::success(
        "Rating saved",
        with_rating(state, restaurant).await?,
        Some(Meta::empty()),
    ))
}

pub async fn list_menu(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuList>> {
    let restaurant = RestaurantProfiles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = MenuItems::find()
        .filter(MenuCol::RestaurantId.eq(restaurant.id))
        .order_by_asc(MenuCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_to_api)
        .collect();

    Ok(ApiResponse::success("Menu", MenuList { items }, Some(Meta::empty())))
}

pub async fn create_menu_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let restaurant = find_owned_restaurant(state, user, restaurant_id).await?;
    if payload.price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }

    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant.id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_to_api(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    item_id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let restaurant = find_owned_restaurant(state, user, restaurant_id).await?;
    let item = find_menu_item(state, restaurant.id, item_id).await?;

    let mut active: MenuItemActive = item.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("Price must not be negative".into()));
        }
        active.price = Set(price);
    }
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_to_api(item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let restaurant = find_owned_restaurant(state, user, restaurant_id).await?;
    let item = find_menu_item(state, restaurant.id, item_id).await?;
    item.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_owned_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<RestaurantProfileModel> {
    ensure_restaurant(user)?;
    let restaurant = RestaurantProfiles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    match user.role {
        Role::Admin => Ok(restaurant),
        _ if restaurant.user_id == user.user_id => Ok(restaurant),
        _ => Err(AppError::Forbidden),
    }
}

async fn find_menu_item(
    state: &AppState,
    restaurant_id: Uuid,
    item_id: Uuid,
) -> AppResult<MenuItemModel> {
    let item = MenuItems::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if item.restaurant_id != restaurant_id {
        return Err(AppError::NotFound);
    }
    Ok(item)
}

async fn with_rating(
    state: &AppState,
    model: RestaurantProfileModel,
) -> AppResult<RestaurantWithRating> {
    let (average_rating, rating_count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(stars)::float8, COUNT(*) FROM restaurant_ratings WHERE restaurant_id = $1",
    )
    .bind(model.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(RestaurantWithRating {
        restaurant: restaurant_profile_to_api(model),
        average_rating,
        rating_count,
    })
}

pub fn restaurant_profile_to_api(model: RestaurantProfileModel) -> RestaurantProfile {
    RestaurantProfile {
        id: model.id,
        user_id: model.user_id,
        restaurant_name: model.restaurant_name,
        address: model.address,
        cuisine: model.cuisine,
        latitude: model.latitude,
        longitude: model.longitude,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn menu_item_to_api(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert!(haversine_km(48.8566, 2.3522, 48.8566, 2.3522) < 1e-9);
    }

    #[test]
    fn paris_to_london_is_about_344_km() {
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = haversine_km(-6.2, 106.8, 35.7, 139.7);
        let b = haversine_km(35.7, 139.7, -6.2, 106.8);
        assert!((a - b).abs() < 1e-9);
    }
}
