// src/web/handlers/admin_handlers.rs

//! Admin console endpoints: product CRUD and order stats. Every handler
//! takes the `AdminUser` extractor, so the role gate runs before any
//! body is touched.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Product;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

const PRODUCT_COLUMNS: &str = "id, title, slug, description, price_paise, stock, images, created_at, updated_at";

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct ProductPayload {
  pub title: String,
  pub slug: String,
  pub description: Option<String>,
  pub price_paise: i64,
  pub stock: i32,
  #[serde(default)]
  pub images: Vec<String>,
}

fn validate_product_payload(payload: &ProductPayload) -> Result<(), AppError> {
  if payload.title.trim().is_empty() {
    return Err(AppError::Validation("Product title is required.".to_string()));
  }
  if payload.slug.trim().is_empty() {
    return Err(AppError::Validation("Product slug is required.".to_string()));
  }
  if payload.price_paise < 0 {
    return Err(AppError::Validation("Price cannot be negative.".to_string()));
  }
  if payload.stock < 0 {
    return Err(AppError::Validation("Stock cannot be negative.".to_string()));
  }
  Ok(())
}

fn map_slug_conflict(e: sqlx::Error) -> AppError {
  if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
    AppError::Conflict("A product with this slug already exists.".to_string())
  } else {
    AppError::Sqlx(e)
  }
}

// --- Product CRUD ---

#[instrument(name = "handler::admin_create_product", skip(app_state, req_payload, admin), fields(admin_id = %admin.0.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ProductPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  validate_product_payload(&req_payload)?;

  let product: Product = sqlx::query_as(&format!(
    "INSERT INTO products (title, slug, description, price_paise, stock, images) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(req_payload.title.trim())
  .bind(req_payload.slug.trim())
  .bind(req_payload.description.as_deref())
  .bind(req_payload.price_paise)
  .bind(req_payload.stock)
  .bind(&req_payload.images)
  .fetch_one(&app_state.db_pool)
  .await
  .map_err(map_slug_conflict)?;

  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(json!({"product": product})))
}

#[instrument(
    name = "handler::admin_update_product",
    skip(app_state, req_payload, admin, path),
    fields(admin_id = %admin.0.user_id, product_id = %path.as_ref())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  validate_product_payload(&req_payload)?;

  let product: Option<Product> = sqlx::query_as(&format!(
    "UPDATE products SET title = $2, slug = $3, description = $4, price_paise = $5, stock = $6, images = $7, \
     updated_at = now() WHERE id = $1 RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(product_id)
  .bind(req_payload.title.trim())
  .bind(req_payload.slug.trim())
  .bind(req_payload.description.as_deref())
  .bind(req_payload.price_paise)
  .bind(req_payload.stock)
  .bind(&req_payload.images)
  .fetch_optional(&app_state.db_pool)
  .await
  .map_err(map_slug_conflict)?;

  match product {
    Some(product) => {
      info!("Product updated.");
      Ok(HttpResponse::Ok().json(json!({"product": product})))
    }
    None => Err(AppError::NotFound(format!("Product {} not found.", product_id))),
  }
}

#[instrument(
    name = "handler::admin_delete_product",
    skip(app_state, admin, path),
    fields(admin_id = %admin.0.user_id, product_id = %path.as_ref())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  // Deletion is blocked while any order line references the product, so
  // order history never dangles.
  let referencing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
    .bind(product_id)
    .fetch_one(&app_state.db_pool)
    .await?;

  if referencing > 0 {
    warn!(referencing, "Refusing to delete a product referenced by orders.");
    return Err(AppError::Conflict(format!(
      "Cannot delete product: it is used in {} past order(s).",
      referencing
    )));
  }

  let res = sqlx::query("DELETE FROM products WHERE id = $1")
    .bind(product_id)
    .execute(&app_state.db_pool)
    .await?;

  if res.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Product {} not found.", product_id)));
  }

  info!("Product deleted.");
  Ok(HttpResponse::Ok().json(json!({"message": "Product deleted."})))
}

// --- Orders & stats ---

#[instrument(name = "handler::admin_list_orders", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn list_all_orders_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_all(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({"orders": orders})))
}

#[instrument(name = "handler::admin_stats", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn order_stats_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let stats = order_service::stats(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({"stats": stats})))
}
