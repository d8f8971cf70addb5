use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use local_commerce_api::{config::AppConfig, db::create_pool, roles::Role};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let vendor_a = ensure_user(&pool, "greengrocer@example.com", "vendor123", &[Role::Vendor]).await?;
    let vendor_b = ensure_user(&pool, "dairyfarm@example.com", "vendor123", &[Role::Vendor]).await?;
    // A dual-role account: shops as a customer, sells as a vendor.
    let shopper = ensure_user(
        &pool,
        "shopper@example.com",
        "shopper123",
        &[Role::Customer, Role::Vendor],
    )
    .await?;

    seed_products(&pool, vendor_a, &[("VEG-001", "Tomatoes 1kg", "produce", 3500, 3000), ("VEG-002", "Onions 1kg", "produce", 2800, 2400)]).await?;
    seed_products(&pool, vendor_b, &[("DRY-001", "Milk 1l", "dairy", 6500, 6000), ("DRY-002", "Paneer 200g", "dairy", 9000, 8200)]).await?;

    println!("Seed completed. Vendors: {vendor_a}, {vendor_b}. Shopper: {shopper}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    roles: &[Role],
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let active_role = roles[0];
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, active_role, email_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET active_role = EXCLUDED.active_role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(active_role.as_str())
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

    for role in roles {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    }

    println!("Ensured user {email} (roles: {roles:?})");
    Ok(user_id)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    tenant_id: Uuid,
    products: &[(&str, &str, &str, i64, i64)],
) -> anyhow::Result<()> {
    for (sku, name, category, retail, b2b) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, tenant_id, sku, name, category, stock,
                 retail_price_cents, b2b_price_cents, paid_cost_cents,
                 allow_loose, min_quantity)
            VALUES ($1, $2, $3, $4, $5, 50, $6, $7, $8, FALSE, 1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(sku)
        .bind(name)
        .bind(category)
        .bind(retail)
        .bind(b2b)
        .bind(b2b * 8 / 10)
        .execute(pool)
        .await?;
    }

    println!("Seeded products for vendor {tenant_id}");
    Ok(())
}
