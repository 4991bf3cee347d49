use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use geotaste_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "admin@geotaste.test", "Admin1234", "admin").await?;
    let customer_id = ensure_user(&pool, "customer@geotaste.test", "Customer1234", "normal").await?;

    let store_user_id = ensure_user(&pool, "store@geotaste.test", "Store1234", "store").await?;
    let store_id = ensure_store_profile(&pool, store_user_id, "Corner Grocer", "12 Market St").await?;
    seed_products(&pool, store_id).await?;

    let restaurant_user_id =
        ensure_user(&pool, "restaurant@geotaste.test", "Resto1234", "restaurant").await?;
    let restaurant_id = ensure_restaurant_profile(
        &pool,
        restaurant_user_id,
        "Trattoria Nonna",
        "3 Via Roma",
        Some("italian"),
        45.4642,
        9.19,
    )
    .await?;
    seed_menu(&pool, restaurant_id).await?;

    println!(
        "Seed completed. Admin: {admin_id}, Customer: {customer_id}, Store: {store_id}, Restaurant: {restaurant_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // Seeded accounts are pre-verified so they can log in immediately.
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role, email_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, email_verified = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_store_profile(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    store_name: &str,
    address: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO store_profiles (id, user_id, store_name, address)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE SET store_name = EXCLUDED.store_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(store_name)
    .bind(address)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id,)) => Ok(id),
        None => {
            let existing: (Uuid,) =
                sqlx::query_as("SELECT id FROM store_profiles WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?;
            Ok(existing.0)
        }
    }
}

async fn ensure_restaurant_profile(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    restaurant_name: &str,
    address: &str,
    cuisine: Option<&str>,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO restaurant_profiles (id, user_id, restaurant_name, address, cuisine, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE SET restaurant_name = EXCLUDED.restaurant_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(restaurant_name)
    .bind(address)
    .bind(cuisine)
    .bind(latitude)
    .bind(longitude)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id,)) => Ok(id),
        None => {
            let existing: (Uuid,) =
                sqlx::query_as("SELECT id FROM restaurant_profiles WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?;
            Ok(existing.0)
        }
    }
}

async fn seed_products(pool: &sqlx::PgPool, store_id: Uuid) -> anyhow::Result<()> {
    // Prices are integer cents.
    let products = vec![
        ("Olive Oil 500ml", "Cold-pressed extra virgin", 1250_i64, 40),
        ("Arborio Rice 1kg", "Risotto grade", 680_i64, 60),
        ("San Marzano Tomatoes", "Canned, 400g", 390_i64, 120),
        ("Parmigiano Wedge 200g", "Aged 24 months", 990_i64, 25),
    ];

    for (name, desc, price, stock) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE store_id = $1 AND name = $2")
                .bind(store_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_menu(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    let items = vec![
        ("Tagliatelle al ragù", "House pasta, slow-cooked ragù", 1450_i64),
        ("Margherita", "Tomato, fior di latte, basil", 950_i64),
        ("Tiramisù", "Classic, made in house", 650_i64),
    ];

    for (name, desc, price) in items {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM menu_items WHERE restaurant_id = $1 AND name = $2")
                .bind(restaurant_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, restaurant_id, name, description, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded menu items");
    Ok(())
}
