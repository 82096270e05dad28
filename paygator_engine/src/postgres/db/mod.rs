//! # PostgreSQL database methods
//!
//! The Postgres counterparts of the SQLite functions. Every function accepts a `&mut PgConnection`, so that callers
//! can pass either a pooled connection or an open transaction.
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

pub mod audit_log;
pub mod payments;
pub mod payouts;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    PgPoolOptions::new().max_connections(max_connections).connect(url).await
}
