//! Maven repository abstraction: locality, URL layout, candidate locations.

use std::fmt;
use std::path::PathBuf;

use marlin_core::config::ResolverConfig;
use marlin_core::dependency::Dependency;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// File name of artifact- and version-level metadata documents.
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// A configured Maven repository with optional credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub location: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Repository {
    pub fn new(location: impl Into<String>) -> Self {
        let location: String = location.into();
        Self {
            location: location.trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Construct the default Maven Central repository.
    pub fn maven_central() -> Self {
        Self::new(MAVEN_CENTRAL_URL)
    }

    /// A location starting with `/` or `file:` is read from the filesystem.
    pub fn is_local(&self) -> bool {
        self.location.starts_with('/') || self.location.starts_with("file:")
    }

    /// Filesystem root of a local repository.
    pub fn local_path(&self) -> Option<PathBuf> {
        if !self.is_local() {
            return None;
        }
        let path = self
            .location
            .strip_prefix("file://")
            .or_else(|| self.location.strip_prefix("file:"))
            .unwrap_or(&self.location);
        Some(PathBuf::from(path))
    }

    /// Whether this repository has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// An addressable artifact at `location` (relative to the repository root).
    pub fn artifact(&self, location: impl Into<String>) -> RepositoryArtifact {
        RepositoryArtifact {
            repository: self.clone(),
            location: location.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// A concrete path inside one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryArtifact {
    pub repository: Repository,
    pub location: String,
}

impl RepositoryArtifact {
    /// Full URL (or filesystem path for local repositories).
    pub fn url(&self) -> String {
        format!("{}/{}", self.repository.location, self.location)
    }

    /// Filesystem path, for artifacts in local repositories.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.repository
            .local_path()
            .map(|root| root.join(&self.location))
    }
}

impl fmt::Display for RepositoryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Standard Maven layout directory for a given coordinate.
///
/// `org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0` becomes
/// `org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0`
pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
    format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
}

/// Directory holding the artifact-level metadata.
pub fn artifact_dir(dep: &Dependency) -> String {
    format!("{}/{}", dep.group_id.replace('.', "/"), dep.artifact_id)
}

/// Path of the POM; `file_version` differs from the directory version for
/// timestamped snapshots.
pub fn pom_path(dep: &Dependency, file_version: &str) -> String {
    format!(
        "{}/{}-{}.pom",
        coordinate_path(&dep.group_id, &dep.artifact_id, &dep.version.to_string()),
        dep.artifact_id,
        file_version
    )
}

/// Path of the artifact file itself, using the classifier and the type as extension.
pub fn artifact_path(dep: &Dependency, file_version: &str) -> String {
    let classifier = if dep.classifier.is_empty() {
        String::new()
    } else {
        format!("-{}", dep.classifier)
    };
    format!(
        "{}/{}-{}{}.{}",
        coordinate_path(&dep.group_id, &dep.artifact_id, &dep.version.to_string()),
        dep.artifact_id,
        file_version,
        classifier,
        dep.type_
    )
}

/// Path of the artifact-level `maven-metadata.xml` (version listing).
pub fn metadata_path(dep: &Dependency) -> String {
    format!("{}/{METADATA_FILE}", artifact_dir(dep))
}

/// Path of the version-level `maven-metadata.xml` (snapshot resolution).
pub fn snapshot_metadata_path(dep: &Dependency) -> String {
    format!(
        "{}/{METADATA_FILE}",
        coordinate_path(&dep.group_id, &dep.artifact_id, &dep.version.to_string())
    )
}

/// POM candidates, one per repository, in order.
///
/// Remote repositories use `snapshot_version` (a timestamped file version)
/// when given; local repositories keep the literal `-SNAPSHOT` file name.
pub fn pom_artifacts(
    repos: &[Repository],
    dep: &Dependency,
    snapshot_version: Option<&str>,
) -> Vec<RepositoryArtifact> {
    let literal = dep.version.to_string();
    repos
        .iter()
        .map(|repo| {
            let file_version = match snapshot_version {
                Some(v) if !repo.is_local() => v,
                _ => literal.as_str(),
            };
            repo.artifact(pom_path(dep, file_version))
        })
        .collect()
}

/// Artifact file candidates, one per repository, in order.
pub fn file_artifacts(
    repos: &[Repository],
    dep: &Dependency,
    snapshot_version: Option<&str>,
) -> Vec<RepositoryArtifact> {
    let literal = dep.version.to_string();
    repos
        .iter()
        .map(|repo| {
            let file_version = match snapshot_version {
                Some(v) if !repo.is_local() => v,
                _ => literal.as_str(),
            };
            repo.artifact(artifact_path(dep, file_version))
        })
        .collect()
}

/// Artifact-level metadata candidates, one per repository.
pub fn metadata_artifacts(repos: &[Repository], dep: &Dependency) -> Vec<RepositoryArtifact> {
    repos
        .iter()
        .map(|repo| repo.artifact(metadata_path(dep)))
        .collect()
}

/// Version-level metadata candidates, remote repositories only.
pub fn snapshot_metadata_artifacts(
    repos: &[Repository],
    dep: &Dependency,
) -> Vec<RepositoryArtifact> {
    repos
        .iter()
        .filter(|repo| !repo.is_local())
        .map(|repo| repo.artifact(snapshot_metadata_path(dep)))
        .collect()
}

/// Build the ordered repository list from a config: the local repository
/// first (when configured), the configured ones in declaration order, and
/// Maven Central last unless already present.
pub fn build_repositories(config: &ResolverConfig) -> Vec<Repository> {
    let mut repos = Vec::new();
    if let Some(local) = &config.local_repository {
        repos.push(Repository::new(local.as_str()));
    }
    for entry in &config.repositories {
        repos.push(
            Repository::new(entry.url.as_str())
                .with_credentials(entry.username.clone(), entry.password.clone()),
        );
    }
    if !repos
        .iter()
        .any(|r| r.location.contains("repo.maven.apache.org"))
    {
        repos.push(Repository::maven_central());
    }
    repos
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlin_core::config::RepositoryConfig;

    fn dep(s: &str) -> Dependency {
        Dependency::parse(s).unwrap()
    }

    #[test]
    fn coordinate_path_replaces_dots() {
        let path = coordinate_path("org.jetbrains.kotlinx", "kotlinx-coroutines-core", "1.8.0");
        assert_eq!(path, "org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0");
    }

    #[test]
    fn locality_rule() {
        assert!(Repository::new("/home/me/.m2/repository").is_local());
        assert!(Repository::new("file:///home/me/.m2/repository").is_local());
        assert!(!Repository::new("https://repo.example/maven").is_local());
        assert_eq!(
            Repository::new("file:///opt/m2").local_path(),
            Some(PathBuf::from("/opt/m2"))
        );
        assert_eq!(Repository::maven_central().local_path(), None);
    }

    #[test]
    fn pom_url_format() {
        let repos = vec![Repository::maven_central()];
        let candidates = pom_artifacts(
            &repos,
            &dep("org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0"),
            None,
        );
        assert_eq!(
            candidates[0].url(),
            "https://repo.maven.apache.org/maven2/org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0/kotlinx-coroutines-core-1.8.0.pom"
        );
    }

    #[test]
    fn snapshot_pom_uses_timestamp_only_remotely() {
        let repos = vec![
            Repository::new("/opt/m2"),
            Repository::new("https://snapshots.example/"),
        ];
        let candidates = pom_artifacts(
            &repos,
            &dep("com.example:my-lib:1.0-SNAPSHOT"),
            Some("1.0-20240615.143022-42"),
        );
        assert_eq!(
            candidates[0].location,
            "com/example/my-lib/1.0-SNAPSHOT/my-lib-1.0-SNAPSHOT.pom"
        );
        assert_eq!(
            candidates[1].url(),
            "https://snapshots.example/com/example/my-lib/1.0-SNAPSHOT/my-lib-1.0-20240615.143022-42.pom"
        );
    }

    #[test]
    fn file_artifact_with_classifier_and_type() {
        let repos = vec![Repository::maven_central()];
        let candidates = file_artifacts(&repos, &dep("org.lwjgl:lwjgl:3.3.3:natives-linux@zip"), None);
        assert!(candidates[0]
            .location
            .ends_with("org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-linux.zip"));
    }

    #[test]
    fn metadata_url_format() {
        let repos = vec![Repository::maven_central()];
        let candidates = metadata_artifacts(&repos, &dep("org.jetbrains.kotlinx:kotlinx-coroutines-core"));
        assert_eq!(
            candidates[0].url(),
            "https://repo.maven.apache.org/maven2/org/jetbrains/kotlinx/kotlinx-coroutines-core/maven-metadata.xml"
        );
    }

    #[test]
    fn snapshot_metadata_skips_local_repositories() {
        let repos = vec![Repository::new("/opt/m2"), Repository::maven_central()];
        let candidates = snapshot_metadata_artifacts(&repos, &dep("a.b:c:1.0-SNAPSHOT"));
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].url().ends_with("a/b/c/1.0-SNAPSHOT/maven-metadata.xml"));
    }

    #[test]
    fn build_repositories_orders_local_first_and_central_last() {
        let config = ResolverConfig {
            local_repository: Some("/opt/m2".to_string()),
            repositories: vec![RepositoryConfig {
                name: "nexus".to_string(),
                url: "https://nexus.co/maven/".to_string(),
                username: Some("user".to_string()),
                password: Some("pass".to_string()),
            }],
            ..Default::default()
        };
        let repos = build_repositories(&config);
        assert_eq!(repos.len(), 3);
        assert!(repos[0].is_local());
        assert_eq!(repos[1].location, "https://nexus.co/maven");
        assert!(repos[1].has_auth());
        assert_eq!(repos[2], Repository::maven_central());
    }

    #[test]
    fn build_repositories_does_not_duplicate_central() {
        let config = ResolverConfig {
            repositories: vec![RepositoryConfig {
                name: "central".to_string(),
                url: MAVEN_CENTRAL_URL.to_string(),
                username: None,
                password: None,
            }],
            ..Default::default()
        };
        assert_eq!(build_repositories(&config).len(), 1);
    }
}
