// src/services/stock_ledger.rs

//! Atomic stock adjustments. Every stock mutation on the checkout path
//! goes through `reserve`/`release`; no caller may read-then-write the
//! stock column outside this guard.

use sqlx::PgConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Reserves `quantity` units of a product with a single conditional
/// decrement. The `stock >= quantity` guard and the decrement are one
/// statement, so concurrent reservations for the same product cannot
/// both pass on the same units.
///
/// Takes a `PgConnection` so callers can run it inside their own
/// transaction.
pub async fn reserve(conn: &mut PgConnection, product_id: Uuid, quantity: i32) -> Result<()> {
  let res = sqlx::query("UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2")
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

  if res.rows_affected() == 1 {
    debug!(%product_id, quantity, "Reserved stock.");
    return Ok(());
  }

  // The guard rejected the decrement: either the product is gone or the
  // remaining stock is short. Re-read to tell the two apart.
  let row: Option<(String, i32)> = sqlx::query_as("SELECT title, stock FROM products WHERE id = $1")
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

  match row {
    None => Err(AppError::NotFound(format!("Product {} not found.", product_id))),
    Some((title, available)) => {
      warn!(%product_id, requested = quantity, available, "Stock reservation rejected.");
      Err(AppError::InsufficientStock {
        product: title,
        requested: quantity,
        available,
      })
    }
  }
}

/// Returns previously reserved units to a product. Always succeeds for an
/// existing product; no upper bound is enforced.
pub async fn release(conn: &mut PgConnection, product_id: Uuid, quantity: i32) -> Result<()> {
  sqlx::query("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1")
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
  debug!(%product_id, quantity, "Released stock.");
  Ok(())
}
