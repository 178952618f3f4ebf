//! Integration tests for the multilevel processing engine

mod cancellation;
mod config_integration;
mod processing_cycle;
mod test_utils;
