use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Recipe;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRecipeRequest {
    /// 1 to 5.
    pub stars: i32,
}

/// Like count and average rating are derived from related rows on read,
/// never maintained as counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeWithAggregates {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub like_count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeList {
    pub items: Vec<RecipeWithAggregates>,
}
