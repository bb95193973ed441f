//! Version overrides: force specific versions for chosen artifacts.
//!
//! Declarations are comma-separated coordinate lists, e.g.
//! `"com.google.guava:guava:33.0.0-jre, org.slf4j:slf4j-api:2.0.13"`.

use std::collections::HashMap;

use marlin_util::errors::MarlinResult;

use crate::dependency::{Dependency, DependencyKey};
use crate::version::Version;

/// Lookup from dependency identity to the version that replaces it.
#[derive(Debug, Clone, Default)]
pub struct VersionOverrides {
    versions: HashMap<DependencyKey, Version>,
}

impl VersionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from override declarations.
    pub fn parse<I, S>(declarations: I) -> MarlinResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for declaration in declarations {
            for coordinate in declaration.as_ref().split(',') {
                let coordinate = coordinate.trim();
                if coordinate.is_empty() {
                    continue;
                }
                let dep = Dependency::parse(coordinate)?;
                if !dep.has_version() {
                    tracing::warn!("Ignoring version override without a version: {coordinate}");
                    continue;
                }
                table.insert(&dep);
            }
        }
        Ok(table)
    }

    /// Record `dep`'s version as the override for its identity.
    pub fn insert(&mut self, dep: &Dependency) {
        self.versions.insert(dep.key(), dep.version.clone());
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&Version> {
        self.versions.get(key)
    }

    /// Return `dep` with its version replaced when an override exists.
    pub fn override_dependency(&self, dep: &Dependency) -> Dependency {
        match self.versions.get(&dep.key()) {
            Some(version) => {
                tracing::debug!("Overriding {dep} with version {version}");
                dep.with_version(version.clone())
            }
            None => dep.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
