//! Maven repository protocol: repository layout, content retrieval,
//! authentication, caching, POM parsing and maven-metadata.xml.

pub mod auth;
pub mod cache;
pub mod metadata;
pub mod pom;
pub mod repository;
pub mod retriever;
