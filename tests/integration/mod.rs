//! Integration tests for contact identity reconciliation

mod cli_route;
mod concurrency;
mod identify_scenarios;
mod sled_store;
