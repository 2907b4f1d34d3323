// tests/checkout_flow_tests.rs
//
// End-to-end reconciliation scenarios against a live PostgreSQL instance.
// Provision with:
//   createdb storefront_test
//   psql "$DATABASE_URL" -f schema.sql
// then run: cargo test -- --ignored

use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::errors::AppError;
use storefront::models::{Order, OrderStatus, Product};
use storefront::services::auth_service;
use storefront::services::cart_service::CartLine;
use storefront::services::checkout_service::{self, PaymentConfirmation, WebhookDisposition};
use storefront::services::order_service;
use storefront::services::payment_gateway::{sign_hmac_hex, PaymentGateway};
use storefront::state::AppState;

const TEST_SECRET: &str = "test_key_secret";

fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
    // Discard port: remote order creation fails fast, which the gateway
    // failure test relies on. No other test touches the network.
    payment_api_base: "http://127.0.0.1:9".to_string(),
    payment_key_id: "rzp_test_key".to_string(),
    payment_key_secret: TEST_SECRET.to_string(),
    currency: "INR".to_string(),
    seed_db: false,
  }
}

async fn test_state() -> AppState {
  let config = test_config();
  let db_pool = PgPool::connect(&config.database_url)
    .await
    .expect("DATABASE_URL must point at a prepared test database");
  let payment = PaymentGateway::from_config(&config).expect("gateway client");
  AppState {
    db_pool,
    payment: Arc::new(payment),
    config: Arc::new(config),
  }
}

async fn create_user(pool: &PgPool) -> Uuid {
  let email = format!("buyer-{}@example.com", Uuid::new_v4().simple());
  auth_service::register_user(pool, &email, "a strong password", Some("Test Buyer"))
    .await
    .unwrap()
    .id
}

async fn create_product(pool: &PgPool, price_paise: i64, stock: i32) -> Uuid {
  let slug = format!("prod-{}", Uuid::new_v4().simple());
  let (id,): (Uuid,) =
    sqlx::query_as("INSERT INTO products (title, slug, price_paise, stock) VALUES ($1, $2, $3, $4) RETURNING id")
      .bind(format!("Product {}", slug))
      .bind(&slug)
      .bind(price_paise)
      .bind(stock)
      .fetch_one(pool)
      .await
      .unwrap();
  id
}

async fn load_products(pool: &PgPool, ids: &[Uuid]) -> Vec<Product> {
  sqlx::query_as(
    "SELECT id, title, slug, description, price_paise, stock, images, created_at, updated_at \
     FROM products WHERE id = ANY($1)",
  )
  .bind(ids)
  .fetch_all(pool)
  .await
  .unwrap()
}

async fn stock_of(pool: &PgPool, product_id: Uuid) -> i32 {
  sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
    .bind(product_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn status_of(pool: &PgPool, order_id: Uuid) -> OrderStatus {
  let (status,): (OrderStatus,) = sqlx::query_as("SELECT status FROM orders WHERE id = $1")
    .bind(order_id)
    .fetch_one(pool)
    .await
    .unwrap();
  status
}

/// Creates a PENDING order for 2 units of a fresh product with price
/// 10_000 paise and stock 5 (the setup shared by scenarios A, C and D).
async fn pending_order_for_two_units(state: &AppState) -> (Uuid, Uuid, Order) {
  let user_id = create_user(&state.db_pool).await;
  let product_id = create_product(&state.db_pool, 10_000, 5).await;

  let products = load_products(&state.db_pool, &[product_id]).await;
  let lines = [CartLine { product_id, quantity: 2 }];
  let priced = checkout_service::price_cart_lines(&products, &lines).unwrap();
  let order = order_service::create_order(&state.db_pool, user_id, &priced, "INR")
    .await
    .unwrap();

  (user_id, product_id, order)
}

// --- Scenario A: checkout creates a pending order and reserves stock ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn checkout_reserves_stock_and_creates_pending_order() {
  let state = test_state().await;
  let (_user_id, product_id, order) = pending_order_for_two_units(&state).await;

  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.total_amount_paise, 20_000);
  assert_eq!(stock_of(&state.db_pool, product_id).await, 3);

  // The stored total equals the sum of line subtotals.
  let line_sum: i64 = sqlx::query_scalar(
    "SELECT COALESCE(SUM(unit_price_paise * quantity), 0)::BIGINT FROM order_items WHERE order_id = $1",
  )
  .bind(order.id)
  .fetch_one(&state.db_pool)
  .await
  .unwrap();
  assert_eq!(line_sum, order.total_amount_paise);
}

// --- Scenario B: insufficient stock aborts with nothing applied ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn insufficient_stock_aborts_without_partial_effects() {
  let state = test_state().await;
  let user_id = create_user(&state.db_pool).await;
  let product_id = create_product(&state.db_pool, 10_000, 1).await;

  let products = load_products(&state.db_pool, &[product_id]).await;
  let lines = [CartLine { product_id, quantity: 2 }];
  let priced = checkout_service::price_cart_lines(&products, &lines).unwrap();
  let err = order_service::create_order(&state.db_pool, user_id, &priced, "INR")
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    AppError::InsufficientStock {
      requested: 2,
      available: 1,
      ..
    }
  ));
  assert_eq!(stock_of(&state.db_pool, product_id).await, 1);

  let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
    .bind(user_id)
    .fetch_one(&state.db_pool)
    .await
    .unwrap();
  assert_eq!(order_count, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn failed_reservation_rolls_back_earlier_lines() {
  let state = test_state().await;
  let user_id = create_user(&state.db_pool).await;
  let plenty = create_product(&state.db_pool, 5_000, 5).await;
  let scarce = create_product(&state.db_pool, 5_000, 1).await;

  let products = load_products(&state.db_pool, &[plenty, scarce]).await;
  let lines = [
    CartLine {
      product_id: plenty,
      quantity: 2,
    },
    CartLine {
      product_id: scarce,
      quantity: 2,
    },
  ];
  let priced = checkout_service::price_cart_lines(&products, &lines).unwrap();
  let err = order_service::create_order(&state.db_pool, user_id, &priced, "INR")
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::InsufficientStock { .. }));
  // The reservation applied for the first line was rolled back with the
  // transaction.
  assert_eq!(stock_of(&state.db_pool, plenty).await, 5);
  assert_eq!(stock_of(&state.db_pool, scarce).await, 1);
}

// --- Scenario C: valid confirmation marks the order paid ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn valid_confirmation_marks_order_paid() {
  let state = test_state().await;
  let (user_id, product_id, order) = pending_order_for_two_units(&state).await;

  let confirmation = PaymentConfirmation {
    order_id: order.id,
    gateway_order_id: "order_rzp_sync".to_string(),
    gateway_payment_id: "pay_sync".to_string(),
    signature: sign_hmac_hex(TEST_SECRET.as_bytes(), b"order_rzp_sync|pay_sync"),
  };

  let paid = checkout_service::confirm_payment(&state, user_id, &confirmation)
    .await
    .unwrap();
  assert_eq!(paid.status, OrderStatus::Paid);
  assert_eq!(paid.gateway_payment_id.as_deref(), Some("pay_sync"));
  // No further stock movement on payment.
  assert_eq!(stock_of(&state.db_pool, product_id).await, 3);

  // A duplicate confirmation is a no-op.
  let again = checkout_service::confirm_payment(&state, user_id, &confirmation)
    .await
    .unwrap();
  assert_eq!(again.status, OrderStatus::Paid);
  assert_eq!(stock_of(&state.db_pool, product_id).await, 3);
}

// --- Scenario D: invalid signature fails the order and restores stock ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn invalid_signature_fails_order_and_restores_stock() {
  let state = test_state().await;
  let (user_id, product_id, order) = pending_order_for_two_units(&state).await;

  let confirmation = PaymentConfirmation {
    order_id: order.id,
    gateway_order_id: "order_rzp_bad".to_string(),
    gateway_payment_id: "pay_bad".to_string(),
    signature: "deadbeef".to_string(),
  };

  let err = checkout_service::confirm_payment(&state, user_id, &confirmation)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::PaymentVerification(_)));
  assert_eq!(status_of(&state.db_pool, order.id).await, OrderStatus::Failed);
  assert_eq!(stock_of(&state.db_pool, product_id).await, 5);

  // Restoring again is a no-op; stock does not climb past the original.
  order_service::mark_failed_and_restore(&state.db_pool, order.id)
    .await
    .unwrap();
  assert_eq!(stock_of(&state.db_pool, product_id).await, 5);
}

// --- Scenario E: duplicate webhook deliveries are exactly-once in effect ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn duplicate_webhook_deliveries_mark_paid_once() {
  let state = test_state().await;
  let (_user_id, product_id, order) = pending_order_for_two_units(&state).await;
  order_service::set_gateway_order(&state.db_pool, order.id, "order_rzp_wh")
    .await
    .unwrap();

  let body = serde_json::json!({
    "event": "payment.captured",
    "payload": {
      "payment": {
        "entity": {
          "id": "pay_wh",
          "order_id": "order_rzp_wh",
          "receipt": order.id.to_string(),
        }
      }
    }
  })
  .to_string();
  let signature = sign_hmac_hex(TEST_SECRET.as_bytes(), body.as_bytes());

  let first = checkout_service::handle_webhook(&state, body.as_bytes(), Some(&signature))
    .await
    .unwrap();
  assert_eq!(first, WebhookDisposition::Processed { order_id: order.id });
  assert_eq!(status_of(&state.db_pool, order.id).await, OrderStatus::Paid);
  assert_eq!(stock_of(&state.db_pool, product_id).await, 3);

  // Second delivery: still success, nothing re-applied.
  let second = checkout_service::handle_webhook(&state, body.as_bytes(), Some(&signature))
    .await
    .unwrap();
  assert_eq!(second, WebhookDisposition::Processed { order_id: order.id });
  assert_eq!(status_of(&state.db_pool, order.id).await, OrderStatus::Paid);
  assert_eq!(stock_of(&state.db_pool, product_id).await, 3);

  // A tampered delivery is rejected without touching state.
  let rejected = checkout_service::handle_webhook(&state, body.as_bytes(), Some("00ff"))
    .await
    .unwrap();
  assert_eq!(rejected, WebhookDisposition::Rejected);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn unmatched_and_unknown_webhooks_are_acknowledged() {
  let state = test_state().await;

  // payment.captured for an order that does not exist locally.
  let body = serde_json::json!({
    "event": "payment.captured",
    "payload": {
      "payment": {
        "entity": {
          "id": "pay_ghost",
          "order_id": "order_rzp_ghost",
          "receipt": Uuid::new_v4().to_string(),
        }
      }
    }
  })
  .to_string();
  let signature = sign_hmac_hex(TEST_SECRET.as_bytes(), body.as_bytes());
  let disposition = checkout_service::handle_webhook(&state, body.as_bytes(), Some(&signature))
    .await
    .unwrap();
  assert_eq!(disposition, WebhookDisposition::Unmatched);

  // An event type we do not handle.
  let body = serde_json::json!({"event": "refund.processed", "payload": {}}).to_string();
  let signature = sign_hmac_hex(TEST_SECRET.as_bytes(), body.as_bytes());
  let disposition = checkout_service::handle_webhook(&state, body.as_bytes(), Some(&signature))
    .await
    .unwrap();
  assert_eq!(disposition, WebhookDisposition::Ignored);
}

// --- Gateway failure after order creation ---

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL with schema.sql applied (set DATABASE_URL)"]
async fn gateway_failure_fails_order_and_restores_stock() {
  // The test config points the gateway at a closed port, so the remote
  // order call fails after the local order is created.
  let state = test_state().await;
  let user_id = create_user(&state.db_pool).await;
  let product_id = create_product(&state.db_pool, 10_000, 5).await;

  let lines = [CartLine { product_id, quantity: 2 }];
  let err = checkout_service::initiate_checkout(&state, user_id, &lines)
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::Gateway(_)));
  // Instead of a stranded PENDING order, the order fails and stock comes
  // back.
  assert_eq!(stock_of(&state.db_pool, product_id).await, 5);
  let (status,): (OrderStatus,) = sqlx::query_as("SELECT status FROM orders WHERE user_id = $1")
    .bind(user_id)
    .fetch_one(&state.db_pool)
    .await
    .unwrap();
  assert_eq!(status, OrderStatus::Failed);
}
