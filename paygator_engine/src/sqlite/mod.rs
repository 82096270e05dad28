//! SQLite backend for the Paygator engine.
//!
//! This is the default backend. The schema lives in `migrations/` and is applied by
//! [`crate::traits::PaygatorDatabase::migrate`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
