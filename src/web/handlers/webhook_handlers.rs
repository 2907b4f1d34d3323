// src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::checkout_service::{self, WebhookDisposition};
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 signature of the raw body.
const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[instrument(
    name = "handler::payment_webhook",
    skip(app_state, req, body),
    fields(payload_bytes = body.len())
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes, // Raw request body: the signature covers these exact bytes
) -> Result<HttpResponse, AppError> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  match checkout_service::handle_webhook(app_state.get_ref(), &body, signature.as_deref()).await? {
    WebhookDisposition::Processed { order_id } => {
      info!(%order_id, "Webhook processed.");
      Ok(HttpResponse::Ok().json(json!({"ok": true, "orderId": order_id.to_string()})))
    }
    // Unmatched and ignored deliveries are acknowledged so the provider
    // does not keep retrying something that will never match.
    WebhookDisposition::Unmatched | WebhookDisposition::Ignored => {
      Ok(HttpResponse::Ok().json(json!({"ok": true})))
    }
    WebhookDisposition::Rejected => {
      Ok(HttpResponse::BadRequest().json(json!({"ok": false, "message": "Invalid signature"})))
    }
  }
}
