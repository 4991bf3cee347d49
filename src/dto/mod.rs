pub mod auth;
pub mod orders;
pub mod payments;
pub mod products;
pub mod profile;
pub mod recipes;
pub mod restaurants;
