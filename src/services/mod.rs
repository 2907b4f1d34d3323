// src/services/mod.rs

//! Business logic, one module per concern. Handlers stay thin and call
//! into these.

pub mod auth_service;
pub mod cart_service;
pub mod checkout_service;
pub mod order_service;
pub mod payment_gateway;
pub mod stock_ledger;
