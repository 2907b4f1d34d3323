// src/lib.rs

//! Storefront backend: product catalog, per-user carts, checkout against
//! a Razorpay-style payment gateway, order history, and a role-gated
//! admin console. The binary in `main.rs` wires these modules into an
//! actix-web server.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod web;
