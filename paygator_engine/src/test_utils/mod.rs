//! Helpers for tests of the engine and of the crates built on it. Enabled with the `test_utils` feature.
pub mod fake_disburser;
pub mod prepare_env;
