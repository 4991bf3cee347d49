pub mod menu_items;
pub mod order_items;
pub mod orders;
pub mod otps;
pub mod payments;
pub mod products;
pub mod recipe_likes;
pub mod recipe_ratings;
pub mod recipes;
pub mod restaurant_profiles;
pub mod restaurant_ratings;
pub mod store_profiles;
pub mod users;

pub use menu_items::Entity as MenuItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use otps::Entity as Otps;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use recipe_likes::Entity as RecipeLikes;
pub use recipe_ratings::Entity as RecipeRatings;
pub use recipes::Entity as Recipes;
pub use restaurant_profiles::Entity as RestaurantProfiles;
pub use restaurant_ratings::Entity as RestaurantRatings;
pub use store_profiles::Entity as StoreProfiles;
pub use users::Entity as Users;
