//! Version conflicts seen while unioning dependency closures.

use std::fmt;

use marlin_core::dependency::DependencyKey;
use marlin_core::version::Version;

/// Every identity that was requested at more than one version.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One losing version of an identity, next to the version that won.
#[derive(Debug, Clone)]
pub struct VersionConflict {
    pub key: DependencyKey,
    pub requested: Version,
    pub resolved: Version,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    /// Conflicts recorded for one identity.
    pub fn for_key<'a>(&'a self, key: &'a DependencyKey) -> impl Iterator<Item = &'a VersionConflict> {
        self.conflicts.iter().filter(move |c| &c.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested {} but resolved {} (highest version wins)",
            self.key, self.requested, self.resolved
        )
    }
}
