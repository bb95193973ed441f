use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use marlin_util::errors::{MarlinError, MarlinResult};

use crate::version::Version;

/// Default artifact type when none is declared.
pub const DEFAULT_TYPE: &str = "jar";

/// Wildcard accepted in either field of an [`Exclusion`].
pub const WILDCARD: &str = "*";

/// A transitive dependency to exclude; either field may be `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Whether this exclusion removes the `group_id:artifact_id` candidate.
    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        let any_group = self.group_id == WILDCARD;
        let any_artifact = self.artifact_id == WILDCARD;
        (any_group && any_artifact)
            || (any_group && self.artifact_id == artifact_id)
            || (self.group_id == group_id && any_artifact)
            || (self.group_id == group_id && self.artifact_id == artifact_id)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Identity of a dependency: its coordinate minus the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub type_: String,
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        if self.type_ != DEFAULT_TYPE {
            write!(f, "@{}", self.type_)?;
        }
        Ok(())
    }
}

/// A resolved dependency coordinate.
///
/// Equality and hashing use the identity `(group, artifact, classifier, type)`;
/// the version is deliberately not part of it, so collections keyed by
/// `Dependency` hold one entry per artifact.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Version,
    pub classifier: String,
    pub type_: String,
    pub exclusions: BTreeSet<Exclusion>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: Version) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version,
            classifier: String::new(),
            type_: DEFAULT_TYPE.to_string(),
            exclusions: BTreeSet::new(),
        }
    }

    /// Parse `groupId:artifactId[:version[:classifier]][@type]`.
    pub fn parse(input: &str) -> MarlinResult<Self> {
        let invalid = || MarlinError::InvalidCoordinate {
            input: input.to_string(),
        };
        let s = input.trim();
        let (coords, type_) = match s.rsplit_once('@') {
            Some((coords, t)) if !t.is_empty() => (coords, t),
            Some(_) => return Err(invalid()),
            None => (s, DEFAULT_TYPE),
        };

        let parts: Vec<&str> = coords.split(':').collect();
        if !(2..=4).contains(&parts.len()) || parts[0].is_empty() || parts[1].is_empty() {
            return Err(invalid());
        }

        let mut dep = Dependency::new(
            parts[0],
            parts[1],
            parts.get(2).map_or(Version::UNKNOWN, |v| Version::parse(v)),
        );
        dep.classifier = parts.get(3).map(|c| c.to_string()).unwrap_or_default();
        dep.type_ = type_.to_string();
        Ok(dep)
    }

    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
            type_: self.type_.clone(),
        }
    }

    pub fn with_version(&self, version: Version) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    pub fn with_exclusions(mut self, exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        self.exclusions.extend(exclusions);
        self
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_unknown()
    }

    /// Whether any of this dependency's own exclusions removes `candidate`.
    pub fn excludes(&self, candidate: &Dependency) -> bool {
        self.exclusions
            .iter()
            .any(|e| e.matches(&candidate.group_id, &candidate.artifact_id))
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.classifier == other.classifier
            && self.type_ == other.type_
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group_id.hash(state);
        self.artifact_id.hash(state);
        self.classifier.hash(state);
        self.type_.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if self.has_version() || !self.classifier.is_empty() {
            write!(f, ":{}", self.version)?;
        }
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        if self.type_ != DEFAULT_TYPE {
            write!(f, "@{}", self.type_)?;
        }
        Ok(())
    }
}

/// Declared usage context of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Compile,
    Runtime,
    Test,
    Standalone,
    Provided,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Compile,
        Scope::Runtime,
        Scope::Test,
        Scope::Standalone,
        Scope::Provided,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::Standalone => "standalone",
            Scope::Provided => "provided",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Scope::ALL.into_iter().find(|scope| scope.as_str() == s)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::Compile
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_version() {
        let a = Dependency::parse("org.example:lib:1.0").unwrap();
        let b = Dependency::parse("org.example:lib:2.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn identity_includes_classifier_and_type() {
        let a = Dependency::parse("org.example:lib:1.0").unwrap();
        let b = Dependency::parse("org.example:lib:1.0:sources").unwrap();
        let c = Dependency::parse("org.example:lib:1.0@aar").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn key_display() {
        let dep = Dependency::parse("org.example:lib:1.0:natives-linux@zip").unwrap();
        assert_eq!(dep.key().to_string(), "org.example:lib:natives-linux@zip");
        let plain = Dependency::parse("org.example:lib:1.0").unwrap();
        assert_eq!(plain.key().to_string(), "org.example:lib");
    }

    #[test]
    fn scope_parse_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(Scope::parse(scope.as_str()), Some(scope));
        }
        assert_eq!(Scope::parse("import"), None);
    }
}
