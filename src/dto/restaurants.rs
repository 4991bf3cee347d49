use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{MenuItem, RestaurantProfile};

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantWithRating {
    #[serde(flatten)]
    pub restaurant: RestaurantProfile,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantList {
    pub items: Vec<RestaurantWithRating>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in kilometers, default 5.
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyRestaurant {
    #[serde(flatten)]
    pub restaurant: RestaurantProfile,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyList {
    pub items: Vec<NearbyRestaurant>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRestaurantRequest {
    pub stars: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList {
    pub items: Vec<MenuItem>,
}
