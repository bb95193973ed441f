//! Shared utilities for the Marlin dependency resolver.
//!
//! This crate provides cross-cutting concerns used by all other Marlin crates:
//! the error taxonomy shared by every resolution step, and the hashing helper
//! used to derive on-disk cache keys.

pub mod errors;
pub mod hash;
