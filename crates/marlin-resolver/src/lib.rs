//! Dependency resolution engine: breadth-first transitive resolution over
//! Maven repositories, exclusions, version overrides, per-scope closures,
//! and conflict reporting.

pub mod cache;
pub mod collections;
pub mod conflict;
pub mod graph;
pub mod resolver;
