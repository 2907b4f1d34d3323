// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  // Payment gateway credentials. The key secret signs both the client
  // callback and webhook payloads.
  pub payment_api_base: String,
  pub payment_key_id: String,
  pub payment_key_secret: String,
  pub currency: String,

  // Optional: for seeding the demo catalog on startup
  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let payment_api_base = get_env("RAZORPAY_API_BASE").unwrap_or_else(|_| "https://api.razorpay.com".to_string());
    let payment_key_id = get_env("RAZORPAY_KEY_ID")?;
    let payment_key_secret = get_env("RAZORPAY_KEY_SECRET")?;
    let currency = get_env("CURRENCY").unwrap_or_else(|_| "INR".to_string());

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      payment_api_base,
      payment_key_id,
      payment_key_secret,
      currency,
      seed_db,
    })
  }
}
