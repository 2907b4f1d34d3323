// tests/signature_tests.rs
//
// Signature and webhook-payload behavior through the public adapter API.
// These run without a database or network.

use storefront::config::AppConfig;
use storefront::errors::AppError;
use storefront::services::payment_gateway::{self, sign_hmac_hex, PaymentGateway, WebhookEvent};

const SECRET: &str = "integration_secret";

fn gateway() -> PaymentGateway {
  let config = AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: String::new(),
    payment_api_base: "https://gateway.invalid".to_string(),
    payment_key_id: "rzp_test_key".to_string(),
    payment_key_secret: SECRET.to_string(),
    currency: "INR".to_string(),
    seed_db: false,
  };
  PaymentGateway::from_config(&config).expect("gateway client builds without IO")
}

#[test]
fn callback_round_trip_and_tamper_detection() {
  let gw = gateway();
  let signature = sign_hmac_hex(SECRET.as_bytes(), b"order_9|pay_9");

  assert!(gw.verify_callback_signature("order_9", "pay_9", &signature));
  assert!(!gw.verify_callback_signature("order_9", "pay_8", &signature));
  assert!(!gw.verify_callback_signature("order_8", "pay_9", &signature));

  let mut tampered = signature.clone().into_bytes();
  tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
  let tampered = String::from_utf8(tampered).unwrap();
  assert!(!gw.verify_callback_signature("order_9", "pay_9", &tampered));
}

#[test]
fn webhook_signature_is_bound_to_raw_bytes() {
  let gw = gateway();
  let raw = br#"{ "event": "payment.captured", "payload": {} }"#;
  let signature = sign_hmac_hex(SECRET.as_bytes(), raw);

  assert!(gw.verify_webhook_signature(raw, &signature));
  // Any re-serialization changes bytes and breaks the signature.
  assert!(!gw.verify_webhook_signature(br#"{"event":"payment.captured","payload":{}}"#, &signature));
}

#[test]
fn webhook_payloads_parse_into_the_closed_event_set() {
  let captured = br#"{
    "event": "payment.captured",
    "payload": {"payment": {"entity": {"id": "pay_1", "order_id": "order_1"}}}
  }"#;
  match payment_gateway::parse_webhook_event(captured).unwrap() {
    WebhookEvent::PaymentCaptured {
      payment_id,
      remote_order_id,
      receipt,
    } => {
      assert_eq!(payment_id, "pay_1");
      assert_eq!(remote_order_id, "order_1");
      assert_eq!(receipt, None);
    }
    other => panic!("expected PaymentCaptured, got {:?}", other),
  }

  let unknown = br#"{"event": "order.notification", "payload": {}}"#;
  assert_eq!(
    payment_gateway::parse_webhook_event(unknown).unwrap(),
    WebhookEvent::Unknown {
      event: "order.notification".to_string()
    }
  );

  assert!(matches!(
    payment_gateway::parse_webhook_event(b"{"),
    Err(AppError::Validation(_))
  ));
}
