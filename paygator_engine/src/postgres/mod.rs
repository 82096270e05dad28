//! PostgreSQL backend for the Paygator engine, enabled with the `postgres` feature.
mod postgres_impl;

pub mod db;
pub use postgres_impl::PostgresDatabase;
