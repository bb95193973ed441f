//! Core data types for the Marlin dependency resolver.
//!
//! This crate defines the value types every other layer works with: the
//! Maven version model and its ordering, dependency coordinates and their
//! identity, exclusions, scopes, the version override table, and the
//! resolver configuration.
//!
//! This crate is intentionally free of network I/O.

pub mod config;
pub mod dependency;
pub mod overrides;
pub mod properties;
pub mod version;
