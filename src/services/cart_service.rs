// src/services/cart_service.rs

//! Server-side cart repository, scoped per authenticated user. Lines are
//! (product, quantity) pairs with quantity always >= 1; a decrement that
//! reaches zero deletes the row.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::CartItem;

/// A bare cart line as fed into checkout.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
  pub product_id: Uuid,
  pub quantity: i32,
}

/// Adds `quantity` units of a product to the user's cart, creating the
/// line or bumping an existing one.
#[instrument(skip(pool), fields(%user_id, %product_id))]
pub async fn add_item(pool: &PgPool, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be at least 1.".to_string()));
  }

  let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
  if product_exists.is_none() {
    return Err(AppError::NotFound(format!("Product {} not found.", product_id)));
  }

  let item: CartItem = sqlx::query_as(
    "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
     ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
     RETURNING id, user_id, product_id, quantity, added_at",
  )
  .bind(user_id)
  .bind(product_id)
  .bind(quantity)
  .fetch_one(pool)
  .await?;

  info!(new_quantity = item.quantity, "Cart line updated.");
  Ok(item)
}

/// Removes one unit of a product from the user's cart. The last unit
/// deletes the line; removing an absent product is a no-op.
#[instrument(skip(pool), fields(%user_id, %product_id))]
pub async fn remove_item(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<()> {
  let res = sqlx::query(
    "UPDATE cart_items SET quantity = quantity - 1 WHERE user_id = $1 AND product_id = $2 AND quantity > 1",
  )
  .bind(user_id)
  .bind(product_id)
  .execute(pool)
  .await?;

  if res.rows_affected() == 0 {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(pool)
      .await?;
  }
  Ok(())
}

/// The user's cart as bare lines, for checkout.
pub async fn load_lines(pool: &PgPool, user_id: Uuid) -> Result<Vec<CartLine>> {
  let rows: Vec<(Uuid, i32)> =
    sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY added_at")
      .bind(user_id)
      .fetch_all(pool)
      .await?;
  Ok(
    rows
      .into_iter()
      .map(|(product_id, quantity)| CartLine { product_id, quantity })
      .collect(),
  )
}

// --- Display view ---

#[derive(Debug, Serialize)]
pub struct CartViewLine {
  pub product_id: Uuid,
  pub title: String,
  pub price_paise: i64,
  pub images: Vec<String>,
  pub quantity: i32,
  pub subtotal_paise: i64,
}

#[derive(Debug, Serialize)]
pub struct CartView {
  pub lines: Vec<CartViewLine>,
  pub total_paise: i64,
}

/// The user's cart joined with current product detail, plus a total
/// computed from current prices (the checkout total may differ if prices
/// change before the order is created).
pub async fn view(pool: &PgPool, user_id: Uuid) -> Result<CartView> {
  let rows: Vec<(Uuid, String, i64, Vec<String>, i32)> = sqlx::query_as(
    "SELECT p.id, p.title, p.price_paise, p.images, ci.quantity \
     FROM cart_items ci JOIN products p ON p.id = ci.product_id \
     WHERE ci.user_id = $1 ORDER BY ci.added_at",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let lines: Vec<CartViewLine> = rows
    .into_iter()
    .map(|(product_id, title, price_paise, images, quantity)| CartViewLine {
      product_id,
      title,
      price_paise,
      images,
      quantity,
      subtotal_paise: price_paise * quantity as i64,
    })
    .collect();
  let total_paise = lines.iter().map(|l| l.subtotal_paise).sum();

  Ok(CartView { lines, total_paise })
}

/// Empties the user's cart. Called after a confirmed payment.
pub async fn clear(pool: &PgPool, user_id: Uuid) -> Result<()> {
  sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .execute(pool)
    .await?;
  Ok(())
}
