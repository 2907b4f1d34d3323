// src/db.rs

//! Startup database helpers. Schema DDL lives in `schema.sql` and is
//! applied out-of-band; this module only seeds the demo catalog when
//! `SEED_DB=true`.

use sqlx::PgPool;
use tracing::info;

use crate::errors::Result;

const DEMO_IMAGE: &str = "https://images.pexels.com/photos/26755185/pexels-photo-26755185.jpeg";

/// Inserts the demo products once. A non-empty catalog means seeding has
/// already happened (or real data exists), so this is a no-op then.
pub async fn seed_products(pool: &PgPool) -> Result<()> {
  let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(pool).await?;
  if existing > 0 {
    info!(existing, "Products already present; skipping seed.");
    return Ok(());
  }

  let demo_products: [(&str, &str, &str, i64, i32, Vec<String>); 3] = [
    (
      "Classic White T-Shirt",
      "classic-white-tshirt",
      "Soft cotton white t-shirt for daily wear.",
      49_900, // Rs 499.00, stored in paise
      50,
      vec![DEMO_IMAGE.to_string(), DEMO_IMAGE.to_string()],
    ),
    (
      "Blue Denim Jeans",
      "blue-denim-jeans",
      "Comfort-fit denim jeans with stretch.",
      129_900,
      30,
      vec![DEMO_IMAGE.to_string()],
    ),
    (
      "Running Shoes",
      "running-shoes",
      "Lightweight shoes suitable for running and training.",
      249_900,
      20,
      vec![DEMO_IMAGE.to_string(), DEMO_IMAGE.to_string()],
    ),
  ];

  for (title, slug, description, price_paise, stock, images) in demo_products {
    sqlx::query("INSERT INTO products (title, slug, description, price_paise, stock, images) VALUES ($1, $2, $3, $4, $5, $6)")
      .bind(title)
      .bind(slug)
      .bind(description)
      .bind(price_paise)
      .bind(stock)
      .bind(&images)
      .execute(pool)
      .await?;
  }

  info!("Seeded demo catalog.");
  Ok(())
}
