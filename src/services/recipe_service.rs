use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::recipes::{
        CreateRecipeRequest, LikeResponse, RateRecipeRequest, RecipeList, RecipeWithAggregates,
        UpdateRecipeRequest,
    },
    entity::{
        recipe_likes::{
            ActiveModel as LikeActive, Column as LikeCol, Entity as RecipeLikes,
        },
        recipe_ratings::{
            ActiveModel as RatingActive, Column as RatingCol, Entity as RecipeRatings,
        },
        recipes::{ActiveModel as RecipeActive, Column as RecipeCol, Entity as Recipes, Model as RecipeModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Recipe,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_recipes(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Recipes::find().order_by_desc(RecipeCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        items.push(with_aggregates(state, model).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Recipes", RecipeList { items }, Some(meta)))
}

pub async fn my_recipes(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Recipes::find()
        .filter(RecipeCol::AuthorId.eq(user.user_id))
        .order_by_desc(RecipeCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        items.push(with_aggregates(state, model).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("My recipes", RecipeList { items }, Some(meta)))
}

pub async fn get_recipe(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<RecipeWithAggregates>> {
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Recipe", with_aggregates(state, recipe).await?, None))
}

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<ApiResponse<Recipe>> {
    let recipe = RecipeActive {
        id: Set(Uuid::new_v4()),
        author_id: Set(user.user_id),
        title: Set(payload.title),
        description: Set(payload.description),
        ingredients: Set(payload.ingredients),
        instructions: Set(payload.instructions),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Recipe created",
        recipe_to_api(recipe),
        Some(Meta::empty()),
    ))
}

pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRecipeRequest,
) -> AppResult<ApiResponse<Recipe>> {
    let recipe = find_owned(state, user, id).await?;

    let mut active: RecipeActive = recipe.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(ingredients) = payload.ingredients {
        active.ingredients = Set(ingredients);
    }
    if let Some(instructions) = payload.instructions {
        active.instructions = Set(instructions);
    }
    active.updated_at = Set(Utc::now().into());
    let recipe = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Recipe updated",
        recipe_to_api(recipe),
        Some(Meta::empty()),
    ))
}

pub async fn delete_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let recipe = find_owned(state, user, id).await?;
    recipe.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Toggle the caller's like on a recipe.
pub async fn toggle_like(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<LikeResponse>> {
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = RecipeLikes::find()
        .filter(LikeCol::RecipeId.eq(recipe.id))
        .filter(LikeCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let liked = match existing {
        Some(like) => {
            like.delete(&state.orm).await?;
            false
        }
        None => {
            LikeActive {
                id: Set(Uuid::new_v4()),
                recipe_id: Set(recipe.id),
                user_id: Set(user.user_id),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
            true
        }
    };

    let like_count = like_count(state, recipe.id).await?;
    Ok(ApiResponse::success(
        if liked { "Liked" } else { "Unliked" },
        LikeResponse { liked, like_count },
        Some(Meta::empty()),
    ))
}

/// Upsert the caller's rating; one rating per (recipe, user).
pub async fn rate_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RateRecipeRequest,
) -> AppResult<ApiResponse<RecipeWithAggregates>> {
    if !(1..=5).contains(&payload.stars) {
        return Err(AppError::Validation("Stars must be between 1 and 5".into()));
    }
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = RecipeRatings::find()
        .filter(RatingCol::RecipeId.eq(recipe.id))
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
                recipe_id: Set(recipe.id),
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
        with_aggregates(state, recipe).await?,
        Some(Meta::empty()),
    ))
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<RecipeModel> {
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if recipe.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok(recipe)
}

async fn like_count(state: &AppState, recipe_id: Uuid) -> AppResult<i64> {
    let count = RecipeLikes::find()
        .filter(LikeCol::RecipeId.eq(recipe_id))
        .count(&state.orm)
        .await?;
    Ok(count as i64)
}

/// Aggregates are derived on read; there is no maintained counter to drift.
async fn with_aggregates(
    state: &AppState,
    model: RecipeModel,
) -> AppResult<RecipeWithAggregates> {
    let like_count = like_count(state, model.id).await?;

    let (average_rating,): (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(stars)::float8 FROM recipe_ratings WHERE recipe_id = $1",
    )
    .bind(model.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(RecipeWithAggregates {
        recipe: recipe_to_api(model),
        like_count,
        average_rating,
    })
}

pub fn recipe_to_api(model: RecipeModel) -> Recipe {
    Recipe {
        id: model.id,
        author_id: model.author_id,
        title: model.title,
        description: model.description,
        ingredients: model.ingredients,
        instructions: model.instructions,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
