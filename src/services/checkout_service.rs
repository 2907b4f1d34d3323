// src/services/checkout_service.rs

//! Reconciliation flow between local orders and the payment gateway:
//! checkout initiation, the client's synchronous confirmation, and the
//! provider's asynchronous webhook. The two confirmation paths race to
//! mark the same order paid; `order_service::mark_paid` keeps the effect
//! exactly-once.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Order, Product};
use crate::services::cart_service::{self, CartLine};
use crate::services::order_service::{self, PricedLine};
use crate::services::payment_gateway::{self, RemoteOrder, WebhookEvent};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
  pub order_id: Uuid,
  pub gateway_order: RemoteOrder,
  pub key_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentConfirmation {
  pub order_id: Uuid,
  pub gateway_order_id: String,
  pub gateway_payment_id: String,
  pub signature: String,
}

/// What became of a webhook delivery. Everything except `Rejected` is
/// acknowledged with success so the provider does not retry futilely.
#[derive(Debug, PartialEq, Eq)]
pub enum WebhookDisposition {
  Processed { order_id: Uuid },
  Unmatched,
  Ignored,
  Rejected,
}

/// Prices cart lines against the catalog rows loaded for them. Prices
/// come from the database, never from the client, so a tampered request
/// cannot change what is charged.
pub fn price_cart_lines(products: &[Product], lines: &[CartLine]) -> Result<Vec<PricedLine>> {
  if lines.is_empty() {
    return Err(AppError::Validation("Cart is empty.".to_string()));
  }

  let mut priced = Vec::with_capacity(lines.len());
  for line in lines {
    if line.quantity < 1 {
      return Err(AppError::Validation(format!(
        "Invalid quantity {} for product {}.",
        line.quantity, line.product_id
      )));
    }
    let product = products
      .iter()
      .find(|p| p.id == line.product_id)
      .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", line.product_id)))?;
    priced.push(PricedLine {
      product_id: product.id,
      quantity: line.quantity,
      unit_price_paise: product.price_paise,
    });
  }

  let total: i64 = priced.iter().map(|l| l.unit_price_paise * l.quantity as i64).sum();
  if total <= 0 {
    return Err(AppError::Validation("Order total must be positive.".to_string()));
  }

  Ok(priced)
}

/// Creates a PENDING order with reserved stock, then mints the remote
/// gateway order the client pays against. The local order id travels as
/// the provider receipt, which is how webhook deliveries find their way
/// back. A gateway failure after the local order exists fails the order
/// and releases its stock instead of stranding it.
#[instrument(skip(state, lines), fields(%user_id, line_count = lines.len()))]
pub async fn initiate_checkout(state: &AppState, user_id: Uuid, lines: &[CartLine]) -> Result<CheckoutOutcome> {
  if lines.is_empty() {
    return Err(AppError::Validation("Cart is empty.".to_string()));
  }

  let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
  let products: Vec<Product> = sqlx::query_as(
    "SELECT id, title, slug, description, price_paise, stock, images, created_at, updated_at \
     FROM products WHERE id = ANY($1)",
  )
  .bind(&ids)
  .fetch_all(&state.db_pool)
  .await?;

  let priced = price_cart_lines(&products, lines)?;
  let order = order_service::create_order(&state.db_pool, user_id, &priced, &state.config.currency).await?;

  let remote = match state
    .payment
    .create_remote_order(order.total_amount_paise, &order.currency, &order.id.to_string())
    .await
  {
    Ok(remote) => remote,
    Err(err) => {
      warn!(order_id = %order.id, error = %err, "Gateway order creation failed; failing local order.");
      order_service::mark_failed_and_restore(&state.db_pool, order.id).await?;
      return Err(err);
    }
  };

  order_service::set_gateway_order(&state.db_pool, order.id, &remote.id).await?;

  info!(order_id = %order.id, remote_order_id = %remote.id, "Checkout initiated.");
  Ok(CheckoutOutcome {
    order_id: order.id,
    gateway_order: remote,
    key_id: state.payment.publishable_key_id().to_string(),
  })
}

/// Handles the client's synchronous callback after the payment UI
/// closes. A valid signature marks the order paid and clears the cart; an
/// invalid one fails the order and restores its stock.
#[instrument(skip(state, confirmation), fields(%user_id, order_id = %confirmation.order_id))]
pub async fn confirm_payment(state: &AppState, user_id: Uuid, confirmation: &PaymentConfirmation) -> Result<Order> {
  let order = order_service::find_by_id_for_user(&state.db_pool, confirmation.order_id, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", confirmation.order_id)))?;

  let valid = state.payment.verify_callback_signature(
    &confirmation.gateway_order_id,
    &confirmation.gateway_payment_id,
    &confirmation.signature,
  );
  if !valid {
    warn!(order_id = %order.id, "Payment signature verification failed; failing order and restoring stock.");
    order_service::mark_failed_and_restore(&state.db_pool, order.id).await?;
    return Err(AppError::PaymentVerification(
      "Payment signature did not match.".to_string(),
    ));
  }

  let paid = order_service::mark_paid(&state.db_pool, order.id, &confirmation.gateway_payment_id).await?;
  cart_service::clear(&state.db_pool, user_id).await?;

  info!(order_id = %paid.id, "Payment confirmed.");
  Ok(paid)
}

/// Handles a webhook delivery from the gateway. The endpoint is
/// unauthenticated; the signature over the raw body is the only gate, and
/// a failed check changes no state.
#[instrument(skip(state, raw_body, signature), fields(body_len = raw_body.len()))]
pub async fn handle_webhook(state: &AppState, raw_body: &[u8], signature: Option<&str>) -> Result<WebhookDisposition> {
  let Some(signature) = signature else {
    warn!("Webhook without a signature header rejected.");
    return Ok(WebhookDisposition::Rejected);
  };
  if !state.payment.verify_webhook_signature(raw_body, signature) {
    warn!("Webhook signature verification failed; no state change.");
    return Ok(WebhookDisposition::Rejected);
  }

  match payment_gateway::parse_webhook_event(raw_body)? {
    WebhookEvent::Unknown { event } => {
      info!(event, "Ignoring unhandled webhook event.");
      Ok(WebhookDisposition::Ignored)
    }
    WebhookEvent::PaymentCaptured {
      payment_id,
      remote_order_id,
      receipt,
    } => {
      let Some(order) = resolve_captured_order(&state.db_pool, receipt.as_deref(), &remote_order_id).await? else {
        warn!(%remote_order_id, "payment.captured did not match any local order.");
        return Ok(WebhookDisposition::Unmatched);
      };

      match order_service::mark_paid(&state.db_pool, order.id, &payment_id).await {
        Ok(paid) => {
          info!(order_id = %paid.id, "Webhook marked order paid.");
          Ok(WebhookDisposition::Processed { order_id: paid.id })
        }
        // A capture for an order we already failed: retrying will not
        // change the outcome, so acknowledge and log.
        Err(AppError::Conflict(msg)) => {
          warn!(order_id = %order.id, %msg, "Webhook capture for a terminal order; acknowledged without change.");
          Ok(WebhookDisposition::Ignored)
        }
        Err(err) => Err(err),
      }
    }
  }
}

/// Maps a captured payment back to a local order. The receipt carries the
/// local order id (set at initiation); the stored remote order id covers
/// deliveries where the provider omits the receipt.
async fn resolve_captured_order(pool: &PgPool, receipt: Option<&str>, remote_order_id: &str) -> Result<Option<Order>> {
  if let Some(receipt) = receipt {
    match Uuid::parse_str(receipt) {
      Ok(order_id) => {
        if let Some(order) = order_service::find_by_id(pool, order_id).await? {
          return Ok(Some(order));
        }
      }
      Err(_) => warn!(receipt, "Webhook receipt is not a local order id."),
    }
  }
  order_service::find_by_gateway_order_id(pool, remote_order_id).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn product(id: Uuid, price_paise: i64) -> Product {
    Product {
      id,
      title: format!("Product {}", id.simple()),
      slug: format!("product-{}", id.simple()),
      description: None,
      price_paise,
      stock: 100,
      images: Vec::new(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn prices_lines_from_catalog_prices() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let products = vec![product(a, 10_000), product(b, 2_500)];
    let lines = vec![
      CartLine {
        product_id: a,
        quantity: 2,
      },
      CartLine {
        product_id: b,
        quantity: 3,
      },
    ];

    let priced = price_cart_lines(&products, &lines).unwrap();
    assert_eq!(priced.len(), 2);
    assert_eq!(priced[0].unit_price_paise, 10_000);
    assert_eq!(priced[1].unit_price_paise, 2_500);

    let total: i64 = priced.iter().map(|l| l.unit_price_paise * l.quantity as i64).sum();
    assert_eq!(total, 27_500);
  }

  #[test]
  fn empty_cart_is_rejected() {
    let products = vec![product(Uuid::new_v4(), 100)];
    assert!(matches!(
      price_cart_lines(&products, &[]),
      Err(AppError::Validation(_))
    ));
  }

  #[test]
  fn unknown_product_is_rejected() {
    let products = vec![product(Uuid::new_v4(), 100)];
    let lines = vec![CartLine {
      product_id: Uuid::new_v4(),
      quantity: 1,
    }];
    assert!(matches!(price_cart_lines(&products, &lines), Err(AppError::NotFound(_))));
  }

  #[test]
  fn non_positive_quantity_is_rejected() {
    let id = Uuid::new_v4();
    let products = vec![product(id, 100)];
    for quantity in [0, -1] {
      let lines = vec![CartLine {
        product_id: id,
        quantity,
      }];
      assert!(matches!(
        price_cart_lines(&products, &lines),
        Err(AppError::Validation(_))
      ));
    }
  }

  #[test]
  fn zero_total_is_rejected() {
    let id = Uuid::new_v4();
    let products = vec![product(id, 0)];
    let lines = vec![CartLine {
      product_id: id,
      quantity: 5,
    }];
    assert!(matches!(
      price_cart_lines(&products, &lines),
      Err(AppError::Validation(_))
    ));
  }
}
