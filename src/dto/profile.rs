use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStoreProfileRequest {
    pub store_name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRestaurantProfileRequest {
    pub restaurant_name: Option<String>,
    pub address: Option<String>,
    pub cuisine: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
