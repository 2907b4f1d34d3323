// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::checkout_service::{self, PaymentConfirmation};
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Handler Implementations ---

#[instrument(
    name = "handler::start_checkout",
    skip(app_state, auth_user),
    fields(user_id = %auth_user.user_id)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  info!("Checkout initiation attempt by user: {}", auth_user.user_id);

  let lines = cart_service::load_lines(&app_state.db_pool, auth_user.user_id).await?;
  let outcome = checkout_service::initiate_checkout(app_state.get_ref(), auth_user.user_id, &lines).await?;

  Ok(HttpResponse::Ok().json(json!({
    "orderId": outcome.order_id.to_string(),
    "gatewayOrder": outcome.gateway_order,
    "keyId": outcome.key_id,
  })))
}

#[instrument(
    name = "handler::confirm_payment",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user_id, order_id = %req_payload.order_id)
)]
pub async fn confirm_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PaymentConfirmation>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = checkout_service::confirm_payment(app_state.get_ref(), auth_user.user_id, &req_payload).await?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Payment confirmed.",
    "order": order,
  })))
}
