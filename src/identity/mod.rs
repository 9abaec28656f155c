//! Identity resolution core
//!
//! request → matcher → merge policy → (no-op | merge executor) → consolidator.
//! The core keeps no state of its own; every request recomputes the relevant chain
//! closure from the store.

pub mod consolidate;
pub mod executor;
pub mod matcher;
pub mod policy;
pub mod request;
pub mod service;

pub use consolidate::{build, ConsolidatedContact, IdentifyResponse};
pub use executor::{merge, plan_merge, surviving_primary};
pub use matcher::{chain_ids, find_group};
pub use policy::{decide, MergeDecision, MergeReason};
pub use request::{IdentifyRequest, Identifiers};
pub use service::IdentityService;
