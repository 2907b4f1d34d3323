// src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: Option<i32>, // defaults to 1
}

#[derive(Deserialize, Debug)]
pub struct RemoveFromCartRequestPayload {
  pub product_id: Uuid,
}

// --- Handler Implementations ---

#[instrument(name = "handler::view_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn view_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = cart_service::view(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({"cart": cart})))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let quantity = req_payload.quantity.unwrap_or(1);
  let item = cart_service::add_item(&app_state.db_pool, auth_user.user_id, req_payload.product_id, quantity).await?;

  info!(
    "Add to cart successful for user: {}. Product ID: {}, New Quantity: {}",
    auth_user.user_id, item.product_id, item.quantity
  );

  Ok(HttpResponse::Ok().json(json!({
    "message": "Item added to cart successfully.",
    "cartItem": item
  })))
}

#[instrument(
    name = "handler::remove_from_cart",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id)
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RemoveFromCartRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  cart_service::remove_item(&app_state.db_pool, auth_user.user_id, req_payload.product_id).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Item removed from cart."})))
}
