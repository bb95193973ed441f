#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use marlin_core::dependency::Dependency;
use marlin_maven::repository::{self, Repository, RepositoryArtifact};
use marlin_maven::retriever::ContentRetriever;
use marlin_resolver::resolver::DependencyResolver;
use marlin_util::errors::{MarlinError, MarlinResult};

pub const REPO: &str = "https://repo.test/maven2";
pub const MIRROR: &str = "https://mirror.test/maven2";

/// Repository content keyed by full URL.
#[derive(Default)]
pub struct MemoryRepository {
    files: HashMap<String, String>,
    broken: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, url: impl Into<String>, content: impl Into<String>) {
        self.files.insert(url.into(), content.into());
    }

    /// Store a POM for `coordinate` in the repository at `base`.
    pub fn put_pom(&mut self, base: &str, coordinate: &str, xml: String) {
        let dep = Dependency::parse(coordinate).unwrap();
        let path = repository::pom_path(&dep, &dep.version.to_string());
        self.put(format!("{base}/{path}"), xml);
    }

    /// A POM with plain compile-scope declarations.
    pub fn simple(&mut self, coordinate: &str, deps: &[&str]) {
        self.put_pom(REPO, coordinate, pom(coordinate, &dependencies(deps)));
    }

    /// Make fetches of `url` fail with a transport error.
    pub fn break_url(&mut self, url: impl Into<String>) {
        self.broken.insert(url.into());
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ContentRetriever for MemoryRepository {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        let url = artifact.url();
        self.fetched.lock().unwrap().push(url.clone());
        if self.broken.contains(&url) {
            return Err(MarlinError::ArtifactRetrieval {
                location: url,
                message: "connection reset".to_string(),
            });
        }
        self.files
            .get(&url)
            .cloned()
            .ok_or_else(|| MarlinError::not_found(url))
    }
}

pub fn dep(s: &str) -> Dependency {
    Dependency::parse(s).unwrap()
}

/// A project document with `body` inserted after the coordinates.
pub fn pom(coordinate: &str, body: &str) -> String {
    let d = dep(coordinate);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  {body}
</project>"#,
        d.group_id, d.artifact_id, d.version
    )
}

/// `<dependencies>` for `g:a[:v]` declarations, each optionally suffixed `#scope`.
pub fn dependencies(deps: &[&str]) -> String {
    let mut xml = String::from("<dependencies>");
    for declaration in deps {
        let (coordinate, scope) = match declaration.split_once('#') {
            Some((c, s)) => (c, Some(s)),
            None => (*declaration, None),
        };
        let d = dep(coordinate);
        xml.push_str(&format!(
            "<dependency><groupId>{}</groupId><artifactId>{}</artifactId>",
            d.group_id, d.artifact_id
        ));
        if d.has_version() {
            xml.push_str(&format!("<version>{}</version>", d.version));
        }
        if let Some(scope) = scope {
            xml.push_str(&format!("<scope>{scope}</scope>"));
        }
        xml.push_str("</dependency>");
    }
    xml.push_str("</dependencies>");
    xml
}

pub fn resolver(repo: MemoryRepository, root: &str) -> DependencyResolver {
    DependencyResolver::new(Arc::new(repo), vec![Repository::new(REPO)], dep(root))
}

pub fn names(deps: impl IntoIterator<Item = impl ToString>) -> Vec<String> {
    deps.into_iter().map(|d| d.to_string()).collect()
}
