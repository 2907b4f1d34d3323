// src/services/order_service.rs

//! Order aggregate: transactional creation with stock reservation, the
//! PENDING -> PAID / PENDING -> FAILED transitions, and the order queries
//! used by the history and admin surfaces.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderItem, OrderStatus};
use crate::services::stock_ledger;

const ORDER_COLUMNS: &str =
  "id, user_id, status, total_amount_paise, currency, gateway_order_id, gateway_payment_id, created_at, updated_at";

/// One order line priced at checkout time from the database, never from
/// client input.
#[derive(Debug, Clone)]
pub struct PricedLine {
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price_paise: i64,
}

/// Creates a PENDING order and its items in one transaction, reserving
/// stock for every line first. Any failed reservation rolls the whole
/// transaction back, so reservations are all-or-nothing.
#[instrument(skip(pool, lines), fields(%user_id, line_count = lines.len()))]
pub async fn create_order(pool: &PgPool, user_id: Uuid, lines: &[PricedLine], currency: &str) -> Result<Order> {
  let total: i64 = lines.iter().map(|l| l.unit_price_paise * l.quantity as i64).sum();

  let mut tx = pool.begin().await?;

  for line in lines {
    stock_ledger::reserve(&mut tx, line.product_id, line.quantity).await?;
  }

  let order: Order = sqlx::query_as(&format!(
    "INSERT INTO orders (user_id, status, total_amount_paise, currency) VALUES ($1, 'pending', $2, $3) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .bind(total)
  .bind(currency)
  .fetch_one(&mut *tx)
  .await?;

  for line in lines {
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price_paise) VALUES ($1, $2, $3, $4)")
      .bind(order.id)
      .bind(line.product_id)
      .bind(line.quantity)
      .bind(line.unit_price_paise)
      .execute(&mut *tx)
      .await?;
  }

  tx.commit().await?;

  info!(order_id = %order.id, total_amount_paise = total, "Created pending order.");
  Ok(order)
}

/// Transitions PENDING -> PAID and records the gateway payment id. The
/// synchronous callback and the webhook race here; the conditional UPDATE
/// lets exactly one of them through and the loser observes an
/// already-paid order and does nothing. Duplicate deliveries with the
/// same payment id are therefore no-ops.
#[instrument(skip(pool), fields(%order_id))]
pub async fn mark_paid(pool: &PgPool, order_id: Uuid, gateway_payment_id: &str) -> Result<Order> {
  let updated: Option<Order> = sqlx::query_as(&format!(
    "UPDATE orders SET status = 'paid', gateway_payment_id = $2, updated_at = now() \
     WHERE id = $1 AND status = 'pending' RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(gateway_payment_id)
  .fetch_optional(pool)
  .await?;

  if let Some(order) = updated {
    info!("Order marked paid.");
    return Ok(order);
  }

  // The conditional update lost: the order is already terminal or gone.
  match find_by_id(pool, order_id).await? {
    None => Err(AppError::NotFound(format!("Order {} not found.", order_id))),
    Some(order) if order.status == OrderStatus::Paid => {
      if order.gateway_payment_id.as_deref() == Some(gateway_payment_id) {
        info!("Duplicate payment confirmation; no-op.");
      } else {
        warn!(
          stored_payment_id = ?order.gateway_payment_id,
          "Payment confirmation for an already-paid order with a different payment id; keeping the stored reference."
        );
      }
      Ok(order)
    }
    Some(_) => Err(AppError::Conflict(format!(
      "Order {} already failed; cannot mark paid.",
      order_id
    ))),
  }
}

/// Transitions PENDING -> FAILED and releases the stock reserved for
/// every line, in one transaction. The conditional status flip makes
/// repeat calls no-ops, so stock is restored exactly once.
#[instrument(skip(pool), fields(%order_id))]
pub async fn mark_failed_and_restore(pool: &PgPool, order_id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;

  let res = sqlx::query("UPDATE orders SET status = 'failed', updated_at = now() WHERE id = $1 AND status = 'pending'")
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

  if res.rows_affected() == 0 {
    // Already terminal (stock was handled on the first transition) or
    // unknown.
    let status: Option<(OrderStatus,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1")
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    return match status {
      None => Err(AppError::NotFound(format!("Order {} not found.", order_id))),
      Some((OrderStatus::Paid,)) => {
        warn!("Refusing to fail an order that is already paid.");
        Ok(())
      }
      Some(_) => {
        info!("Order already failed; stock restoration skipped.");
        Ok(())
      }
    };
  }

  let items: Vec<OrderItem> =
    sqlx::query_as("SELECT id, order_id, product_id, quantity, unit_price_paise FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .fetch_all(&mut *tx)
      .await?;

  for item in &items {
    stock_ledger::release(&mut tx, item.product_id, item.quantity).await?;
  }

  tx.commit().await?;

  info!(restored_lines = items.len(), "Order marked failed and stock restored.");
  Ok(())
}

/// Records the remote gateway order id minted at checkout initiation, so
/// webhook deliveries can be correlated even when the provider omits the
/// receipt.
pub async fn set_gateway_order(pool: &PgPool, order_id: Uuid, gateway_order_id: &str) -> Result<()> {
  sqlx::query("UPDATE orders SET gateway_order_id = $2, updated_at = now() WHERE id = $1")
    .bind(order_id)
    .bind(gateway_order_id)
    .execute(pool)
    .await?;
  Ok(())
}

pub async fn find_by_id(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  Ok(order)
}

pub async fn find_by_gateway_order_id(pool: &PgPool, gateway_order_id: &str) -> Result<Option<Order>> {
  let order = sqlx::query_as(&format!(
    "SELECT {} FROM orders WHERE gateway_order_id = $1",
    ORDER_COLUMNS
  ))
  .bind(gateway_order_id)
  .fetch_optional(pool)
  .await?;
  Ok(order)
}

pub async fn find_by_id_for_user(pool: &PgPool, order_id: Uuid, user_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as(&format!(
    "SELECT {} FROM orders WHERE id = $1 AND user_id = $2",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(user_id)
  .fetch_optional(pool)
  .await?;
  Ok(order)
}

// --- Order history ---

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
  pub id: Uuid,
  pub product_id: Uuid,
  pub title: String,
  pub images: Vec<String>,
  pub quantity: i32,
  pub unit_price_paise: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItemDetail>,
}

/// A user's orders, newest first, with item and product detail.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<OrderWithItems>> {
  let orders: Vec<Order> = sqlx::query_as(&format!(
    "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  attach_items(pool, orders).await
}

pub async fn find_with_items_for_user(pool: &PgPool, order_id: Uuid, user_id: Uuid) -> Result<Option<OrderWithItems>> {
  let Some(order) = find_by_id_for_user(pool, order_id, user_id).await? else {
    return Ok(None);
  };
  let mut with_items = attach_items(pool, vec![order]).await?;
  Ok(with_items.pop())
}

async fn attach_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }

  let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
  let rows: Vec<(Uuid, Uuid, Uuid, String, Vec<String>, i32, i64)> = sqlx::query_as(
    "SELECT oi.order_id, oi.id, oi.product_id, p.title, p.images, oi.quantity, oi.unit_price_paise \
     FROM order_items oi JOIN products p ON p.id = oi.product_id \
     WHERE oi.order_id = ANY($1)",
  )
  .bind(&ids)
  .fetch_all(pool)
  .await?;

  let mut by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
  for (order_id, id, product_id, title, images, quantity, unit_price_paise) in rows {
    by_order.entry(order_id).or_default().push(OrderItemDetail {
      id,
      product_id,
      title,
      images,
      quantity,
      unit_price_paise,
    });
  }

  Ok(
    orders
      .into_iter()
      .map(|order| {
        let items = by_order.remove(&order.id).unwrap_or_default();
        OrderWithItems { order, items }
      })
      .collect(),
  )
}

// --- Admin views ---

#[derive(Debug, Serialize, FromRow)]
pub struct AdminOrderRow {
  pub id: Uuid,
  pub status: OrderStatus,
  pub total_amount_paise: i64,
  pub currency: String,
  pub created_at: DateTime<Utc>,
  pub user_email: String,
  pub user_name: Option<String>,
  pub item_count: i64,
}

/// Every order with purchaser identity and item count, newest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminOrderRow>> {
  let rows = sqlx::query_as(
    "SELECT o.id, o.status, o.total_amount_paise, o.currency, o.created_at, \
            u.email AS user_email, u.name AS user_name, \
            COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count \
     FROM orders o \
     JOIN users u ON u.id = o.user_id \
     LEFT JOIN order_items oi ON oi.order_id = o.id \
     GROUP BY o.id, u.email, u.name \
     ORDER BY o.created_at DESC",
  )
  .fetch_all(pool)
  .await?;
  Ok(rows)
}

#[derive(Debug, Default, Serialize)]
pub struct OrderStats {
  pub total_orders: i64,
  pub total_revenue_paise: i64,
  pub pending: i64,
  pub paid: i64,
  pub failed: i64,
}

/// Grouped count/sum by status, folded into one stats row. Revenue sums
/// over all orders regardless of status.
pub async fn stats(pool: &PgPool) -> Result<OrderStats> {
  let rows: Vec<(OrderStatus, i64, i64)> = sqlx::query_as(
    "SELECT status, COUNT(*), COALESCE(SUM(total_amount_paise), 0)::BIGINT FROM orders GROUP BY status",
  )
  .fetch_all(pool)
  .await?;

  let mut stats = OrderStats::default();
  for (status, count, revenue) in rows {
    stats.total_orders += count;
    stats.total_revenue_paise += revenue;
    match status {
      OrderStatus::Pending => stats.pending = count,
      OrderStatus::Paid => stats.paid = count,
      OrderStatus::Failed => stats.failed = count,
    }
  }
  Ok(stats)
}
