// src/services/payment_gateway.rs

//! Payment gateway adapter: remote order creation over the provider's
//! REST API, plus HMAC-SHA256 verification of client callbacks and
//! webhook deliveries.

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const ORDERS_PATH: &str = "/v1/orders";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote order as echoed back by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
  pub id: String,
  pub amount: i64,
  pub currency: String,
  #[serde(default)]
  pub receipt: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

/// Gateway handle holding the shared HTTP client and credentials. Built
/// once at startup and injected through `AppState`.
pub struct PaymentGateway {
  http: Client,
  api_base: String,
  key_id: String,
  key_secret: String,
}

impl PaymentGateway {
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment gateway HTTP client: {}", e)))?;

    Ok(Self {
      http,
      api_base: config.payment_api_base.trim_end_matches('/').to_string(),
      key_id: config.payment_key_id.clone(),
      key_secret: config.payment_key_secret.clone(),
    })
  }

  /// Key id the client needs to open the provider's payment UI.
  pub fn publishable_key_id(&self) -> &str {
    &self.key_id
  }

  /// Creates a remote order the client will pay against. `receipt` is the
  /// correlation key the provider echoes back in webhook payloads.
  #[instrument(name = "payment_gateway::create_remote_order", skip(self))]
  pub async fn create_remote_order(&self, amount_paise: i64, currency: &str, receipt: &str) -> Result<RemoteOrder> {
    let url = format!("{}{}", self.api_base, ORDERS_PATH);
    let body = json!({
      "amount": amount_paise,
      "currency": currency,
      "receipt": receipt,
      "payment_capture": 1,
    });

    let response = self
      .http
      .post(&url)
      .basic_auth(&self.key_id, Some(&self.key_secret))
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!(error = %e, "Payment gateway request failed.");
        AppError::Gateway(format!("Order creation request failed: {}", e))
      })?;

    if !response.status().is_success() {
      let status = response.status();
      let detail = response.text().await.unwrap_or_default();
      error!(%status, detail, "Payment gateway rejected order creation.");
      return Err(AppError::Gateway(format!("Order creation returned {}: {}", status, detail)));
    }

    let remote: RemoteOrder = response
      .json()
      .await
      .map_err(|e| AppError::Gateway(format!("Malformed order-creation response: {}", e)))?;

    info!(remote_order_id = %remote.id, "Created remote gateway order.");
    Ok(remote)
  }

  /// Verifies the signature delivered with the client's synchronous
  /// payment callback: HMAC-SHA256 over `"{order_id}|{payment_id}"`,
  /// hex-encoded. A mismatch is a normal negative result, never an error.
  pub fn verify_callback_signature(&self, remote_order_id: &str, payment_id: &str, signature: &str) -> bool {
    let message = format!("{}|{}", remote_order_id, payment_id);
    verify_hmac_hex(self.key_secret.as_bytes(), message.as_bytes(), signature)
  }

  /// Verifies a webhook signature over the body bytes exactly as they
  /// arrived. Re-serialized JSON would not survive this check, so callers
  /// must pass the raw request body.
  pub fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool {
    verify_hmac_hex(self.key_secret.as_bytes(), raw_body, signature)
  }
}

/// Constant-time comparison of a hex-encoded HMAC-SHA256 tag.
fn verify_hmac_hex(secret: &[u8], message: &[u8], signature_hex: &str) -> bool {
  let Ok(signature) = hex::decode(signature_hex) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
    return false;
  };
  mac.update(message);
  mac.verify_slice(&signature).is_ok()
}

/// Computes the hex HMAC tag for a message. Shared with tests, which need
/// to forge valid signatures.
pub fn sign_hmac_hex(secret: &[u8], message: &[u8]) -> String {
  let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
  mac.update(message);
  hex::encode(mac.finalize().into_bytes())
}

// --- Webhook payload parsing ---

/// Webhook events, parsed into a closed set before any business logic
/// runs. Everything other than `payment.captured` is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
  PaymentCaptured {
    payment_id: String,
    remote_order_id: String,
    receipt: Option<String>,
  },
  Unknown {
    event: String,
  },
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
  event: String,
  #[serde(default)]
  payload: Option<WebhookPayload>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
  #[serde(default)]
  payment: Option<PaymentWrapper>,
}

#[derive(Debug, Deserialize)]
struct PaymentWrapper {
  #[serde(default)]
  entity: Option<PaymentEntity>,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
  id: String,
  order_id: String,
  #[serde(default)]
  receipt: Option<String>,
}

pub fn parse_webhook_event(raw_body: &[u8]) -> Result<WebhookEvent> {
  let envelope: WebhookEnvelope =
    serde_json::from_slice(raw_body).map_err(|e| AppError::Validation(format!("Invalid webhook JSON: {}", e)))?;

  if envelope.event != "payment.captured" {
    return Ok(WebhookEvent::Unknown { event: envelope.event });
  }

  let entity = envelope
    .payload
    .and_then(|p| p.payment)
    .and_then(|p| p.entity)
    .ok_or_else(|| AppError::Validation("payment.captured event without a payment entity.".to_string()))?;

  Ok(WebhookEvent::PaymentCaptured {
    payment_id: entity.id,
    remote_order_id: entity.order_id,
    receipt: entity.receipt,
  })
}
