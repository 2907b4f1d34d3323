// src/state.rs
use crate::config::AppConfig;
use crate::services::payment_gateway::PaymentGateway;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub payment: Arc<PaymentGateway>,
  pub config: Arc<AppConfig>, // Share loaded config
}
