use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod profile;
pub mod recipes;
pub mod restaurants;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(profile::router())
        .merge(recipes::router())
        .nest("/restaurants", restaurants::router())
        .nest("/store-products", products::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
}
