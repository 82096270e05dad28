//! # Paygator server
//! This crate hosts the HTTP server for the Paygator payment gateway. It is responsible for:
//! * Recording customer payments and applying status updates reported by the payment rails.
//! * Paying vendors their share of completed payments through the mobile-money B2C rail.
//! * Exposing an admin API for operators.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/v1/payments`, `/api/v1/payments/{id}`: payment intake and lookup.
//! * `/api/v1/webhooks/{provider}`: payment status notifications from the rails.
//! * `/api/v1/payments/process-vendor-b2c`: pays the vendor for a single payment. Requires the API key.
//! * `/admin/api/*`: operator endpoints. Require the API key.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
