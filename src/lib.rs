//! Contactlink: Identity Reconciliation
//!
//! Resolves partial contact records (an email, a phone number, or both) into one
//! consolidated identity. Records sharing an identifier are linked into a chain with a
//! single primary, the oldest record, and any number of secondaries.

pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod identity;
pub mod logging;
pub mod store;
