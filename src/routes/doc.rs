use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth as auth_dto,
        orders as order_dto,
        payments as payment_dto,
        products as product_dto,
        profile as profile_dto,
        recipes as recipe_dto,
        restaurants as restaurant_dto,
    },
    models::{
        MenuItem, Order, OrderItem, Payment, PaymentMethod, PaymentStatus, Product, Recipe,
        RestaurantProfile, Role, StoreProfile, User,
    },
    response::{ApiResponse, Meta},
    routes::{auth, health, orders, params, payments, products, profile, recipes, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::verify_email,
        auth::resend_verification_otp,
        auth::forgot_password,
        auth::verify_password_reset_otp,
        auth::reset_password,
        auth::change_password,
        auth::me,
        profile::get_profile,
        profile::update_profile,
        profile::get_store_profile,
        profile::update_store_profile,
        profile::get_restaurant_profile,
        profile::update_restaurant_profile,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        recipes::list_recipes,
        recipes::my_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::like_recipe,
        recipes::rate_recipe,
        restaurants::list_restaurants,
        restaurants::nearby,
        restaurants::get_restaurant,
        restaurants::rate_restaurant,
        restaurants::list_menu,
        restaurants::create_menu_item,
        restaurants::update_menu_item,
        restaurants::delete_menu_item,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        payments::process_payment,
        payments::get_payment,
    ),
    components(
        schemas(
            User,
            Role,
            StoreProfile,
            RestaurantProfile,
            Product,
            Recipe,
            MenuItem,
            Order,
            OrderItem,
            Payment,
            PaymentMethod,
            PaymentStatus,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::VerifyEmailRequest,
            auth_dto::EmailRequest,
            auth_dto::VerifyResetOtpRequest,
            auth_dto::VerifyResetOtpResponse,
            auth_dto::ResetPasswordRequest,
            auth_dto::ChangePasswordRequest,
            profile_dto::UpdateProfileRequest,
            profile_dto::UpdateStoreProfileRequest,
            profile_dto::UpdateRestaurantProfileRequest,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ProductList,
            recipe_dto::CreateRecipeRequest,
            recipe_dto::UpdateRecipeRequest,
            recipe_dto::RateRecipeRequest,
            recipe_dto::RecipeWithAggregates,
            recipe_dto::LikeResponse,
            recipe_dto::RecipeList,
            restaurant_dto::RestaurantWithRating,
            restaurant_dto::RestaurantList,
            restaurant_dto::NearbyQuery,
            restaurant_dto::NearbyRestaurant,
            restaurant_dto::NearbyList,
            restaurant_dto::RateRestaurantRequest,
            restaurant_dto::CreateMenuItemRequest,
            restaurant_dto::UpdateMenuItemRequest,
            restaurant_dto::MenuList,
            order_dto::OrderItemRequest,
            order_dto::CreateOrderRequest,
            order_dto::UpdateOrderRequest,
            order_dto::OrderWithItems,
            order_dto::OrderList,
            payment_dto::ProcessPaymentRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<order_dto::OrderWithItems>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<Payment>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login, email verification and password flows"),
        (name = "Profile", description = "Base and role-specific profiles"),
        (name = "Recipes", description = "Recipe catalog, likes and ratings"),
        (name = "Restaurants", description = "Restaurant directory, menus and ratings"),
        (name = "Store Products", description = "Store product catalog"),
        (name = "Orders", description = "Order creation and tracking"),
        (name = "Payments", description = "Payment processing"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
