//! Property-based tests for chain invariants
