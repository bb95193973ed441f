//! Repository authentication using credentials from `marlin.toml`.
//!
//! Credentials are configured per repository, usually through
//! `${env:SECRET}` interpolation from `.marlin.env`:
//!
//! ```toml
//! [[repositories]]
//! name = "my-private"
//! url = "https://nexus.co/maven"
//! username = "${env:NEXUS_USER}"
//! password = "${env:NEXUS_PASS}"
//! ```
//!
//! By the time the config is loaded, `${env:...}` values are already
//! interpolated, so this module just reads the resolved credentials.

use reqwest::blocking::RequestBuilder;

use crate::repository::Repository;

/// Apply authentication to a request if the repository has credentials.
pub fn apply_auth(request: RequestBuilder, repo: &Repository) -> RequestBuilder {
    match (&repo.username, &repo.password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        (Some(user), None) => request.basic_auth(user, None::<&str>),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}
