//! Dependency resolution for one root coordinate: version lookup, POM loading
//! with parent and BOM inheritance, and the transitive closure.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use marlin_core::config::ResolverConfig;
use marlin_core::dependency::{Dependency, DependencyKey, Exclusion, Scope};
use marlin_core::overrides::VersionOverrides;
use marlin_core::version::{self, Version};
use marlin_maven::cache::CachingRetriever;
use marlin_maven::metadata::{self, MavenMetadata};
use marlin_maven::pom::{self, Pom};
use marlin_maven::repository::{self, Repository, RepositoryArtifact};
use marlin_maven::retriever::{ContentRetriever, DefaultRetriever};
use marlin_util::errors::{MarlinError, MarlinResult};

use crate::cache::VisitedSet;
use crate::collections::DependencySet;
use crate::graph::DependencyTree;

/// Resolves one root dependency against an ordered list of repositories.
///
/// Metadata, snapshot metadata and the POM are fetched at most once per
/// resolver. Resolvers for other coordinates share the retriever, so a
/// caching retriever deduplicates fetches across them.
pub struct DependencyResolver {
    retriever: Arc<dyn ContentRetriever>,
    repositories: Arc<[Repository]>,
    overrides: Arc<VersionOverrides>,
    root: Dependency,
    /// Parent/BOM chain leading to this resolver, including `root`.
    chain: VisitedSet,
    metadata: OnceLock<MavenMetadata>,
    snapshot: OnceLock<Option<MavenMetadata>>,
    pom: OnceLock<Arc<Pom>>,
}

/// The transitive closure of a root dependency.
#[derive(Debug)]
pub struct Resolution {
    pub root: Dependency,
    /// The root followed by every reachable dependency, in discovery order.
    pub dependencies: DependencySet,
    parents: HashMap<DependencyKey, DependencyKey>,
}

impl Resolution {
    /// The identity that introduced `key`; `None` for the root.
    pub fn parent_of(&self, key: &DependencyKey) -> Option<&DependencyKey> {
        self.parents.get(key)
    }

    /// Dependencies excluding the root itself.
    pub fn transitive(&self) -> impl Iterator<Item = &Dependency> {
        let root = self.root.key();
        self.dependencies.iter().filter(move |d| d.key() != root)
    }

    /// The discovery tree, for display.
    pub fn tree(&self) -> DependencyTree {
        DependencyTree::from_resolution(self)
    }
}

impl DependencyResolver {
    pub fn new(
        retriever: Arc<dyn ContentRetriever>,
        repositories: Vec<Repository>,
        root: Dependency,
    ) -> Self {
        Self::with_chain(
            retriever,
            repositories.into(),
            Arc::new(VersionOverrides::new()),
            root,
            VisitedSet::new(),
        )
    }

    /// A resolver wired from configuration: the default file/HTTP retriever
    /// behind a cache, the configured repositories and the override table.
    pub fn from_config(config: &ResolverConfig, root: Dependency) -> MarlinResult<Self> {
        let inner = DefaultRetriever::new()?;
        let retriever: Arc<dyn ContentRetriever> = match &config.cache_dir {
            Some(dir) => Arc::new(CachingRetriever::with_disk_cache(inner, dir)),
            None => Arc::new(CachingRetriever::new(inner)),
        };
        let resolver = Self::new(retriever, repository::build_repositories(config), root)
            .with_overrides(config.override_table()?);
        Ok(resolver)
    }

    pub fn with_overrides(mut self, overrides: VersionOverrides) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    fn with_chain(
        retriever: Arc<dyn ContentRetriever>,
        repositories: Arc<[Repository]>,
        overrides: Arc<VersionOverrides>,
        root: Dependency,
        mut chain: VisitedSet,
    ) -> Self {
        chain.visit(&root);
        Self {
            retriever,
            repositories,
            overrides,
            root,
            chain,
            metadata: OnceLock::new(),
            snapshot: OnceLock::new(),
            pom: OnceLock::new(),
        }
    }

    /// A resolver for another coordinate sharing this one's retriever,
    /// repositories and overrides.
    pub fn for_dependency(&self, dep: Dependency) -> Self {
        Self::with_chain(
            Arc::clone(&self.retriever),
            Arc::clone(&self.repositories),
            Arc::clone(&self.overrides),
            dep,
            VisitedSet::new(),
        )
    }

    /// A resolver for a parent or imported POM, failing on a repeat.
    fn nested(&self, dep: Dependency) -> MarlinResult<Self> {
        if self.chain.contains(&dep) {
            let mut chain = self.chain.clone();
            chain.visit(&dep);
            return Err(MarlinError::CyclicParent {
                chain: chain.describe(),
            });
        }
        Ok(Self::with_chain(
            Arc::clone(&self.retriever),
            Arc::clone(&self.repositories),
            Arc::clone(&self.overrides),
            dep,
            self.chain.clone(),
        ))
    }

    pub fn root(&self) -> &Dependency {
        &self.root
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// The root's version, or the latest published one when unspecified.
    ///
    /// Never fails: an unresolvable latest version yields [`Version::UNKNOWN`].
    pub fn resolve_version(&self) -> Version {
        let root = self.overrides.override_dependency(&self.root);
        if root.has_version() {
            return root.version;
        }
        match self.latest_version() {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!("No latest version for {}: {e}", self.root);
                Version::UNKNOWN
            }
        }
    }

    /// The root with overrides applied and its version resolved.
    pub fn resolved_root(&self) -> Dependency {
        self.root.with_version(self.resolve_version())
    }

    /// Artifact-level metadata merged across every repository that has it.
    pub fn metadata(&self) -> MarlinResult<&MavenMetadata> {
        if let Some(meta) = self.metadata.get() {
            return Ok(meta);
        }
        let merged = self.fetch_metadata()?;
        Ok(self.metadata.get_or_init(|| merged))
    }

    fn fetch_metadata(&self) -> MarlinResult<MavenMetadata> {
        let candidates = repository::metadata_artifacts(&self.repositories, &self.root);
        let mut merged: Option<MavenMetadata> = None;
        for candidate in &candidates {
            let content = match self.retriever.retrieve(candidate) {
                Ok(content) => content,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let meta = metadata::parse_metadata(&content)?;
            tracing::debug!(
                "{} versions of {} in {}",
                meta.versions.len(),
                self.root,
                candidate.repository
            );
            merged = Some(match merged {
                None => meta,
                Some(acc) => merge_metadata(acc, meta),
            });
        }
        merged.ok_or_else(|| not_found(&self.root, &candidates))
    }

    /// Every published version, ascending.
    pub fn list_versions(&self) -> MarlinResult<Vec<Version>> {
        let mut versions = self.metadata()?.versions.clone();
        version::sort_versions(&mut versions);
        Ok(versions)
    }

    pub fn latest_version(&self) -> MarlinResult<Version> {
        Ok(self.metadata()?.latest.clone())
    }

    /// The release version, falling back to latest when none is recorded.
    pub fn release_version(&self) -> MarlinResult<Version> {
        let meta = self.metadata()?;
        if meta.release.is_unknown() {
            Ok(meta.latest.clone())
        } else {
            Ok(meta.release.clone())
        }
    }

    /// Version-level metadata for a snapshot root, from the first remote
    /// repository that has it.
    pub fn snapshot_metadata(&self) -> MarlinResult<Option<&MavenMetadata>> {
        if let Some(meta) = self.snapshot.get() {
            return Ok(meta.as_ref());
        }
        let dep = self.resolved_root();
        let mut found = None;
        for candidate in repository::snapshot_metadata_artifacts(&self.repositories, &dep) {
            match self.retriever.retrieve(&candidate) {
                Ok(content) => {
                    found = Some(metadata::parse_metadata(&content)?);
                    break;
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(self.snapshot.get_or_init(|| found).as_ref())
    }

    /// File version for remote snapshot artifacts, when timestamped.
    fn snapshot_file_version(&self, dep: &Dependency) -> MarlinResult<Option<String>> {
        if !dep.version.is_snapshot() {
            return Ok(None);
        }
        Ok(self
            .snapshot_metadata()?
            .and_then(MavenMetadata::snapshot_file_version))
    }

    /// The root's POM with parent and imported BOMs merged in.
    pub fn get_maven_pom(&self) -> MarlinResult<Arc<Pom>> {
        if let Some(pom) = self.pom.get() {
            return Ok(Arc::clone(pom));
        }
        let pom = Arc::new(self.load_pom()?);
        Ok(Arc::clone(self.pom.get_or_init(|| pom)))
    }

    fn load_pom(&self) -> MarlinResult<Pom> {
        let dep = self.resolved_root();
        let snapshot = self.snapshot_file_version(&dep)?;
        let candidates = repository::pom_artifacts(&self.repositories, &dep, snapshot.as_deref());
        let (source, content) = self.fetch_first(&dep, &candidates)?;

        let mut pom = pom::parse_pom(&content, &source.url())?;
        match pom.parent_dependency() {
            Some(parent) => {
                tracing::debug!("{dep} inherits from {parent}");
                let parent_pom = self.nested(parent)?.get_maven_pom()?;
                pom.inherit_parent(&parent_pom);
            }
            None => pom.index_management(),
        }
        loop {
            let pending = pom.pending_imports();
            if pending.is_empty() {
                break;
            }
            for (key, bom) in pending {
                tracing::debug!("{dep} imports {bom}");
                let bom_pom = self.nested(bom)?.get_maven_pom()?;
                pom.import_management(key, &bom_pom);
            }
        }
        Ok(pom)
    }

    /// First candidate that exists wins; anything but "not found" is fatal.
    fn fetch_first(
        &self,
        dep: &Dependency,
        candidates: &[RepositoryArtifact],
    ) -> MarlinResult<(RepositoryArtifact, String)> {
        for candidate in candidates {
            match self.retriever.retrieve(candidate) {
                Ok(content) => return Ok((candidate.clone(), content)),
                Err(e) if e.is_not_found() => {
                    tracing::trace!("{dep} not in {}", candidate.repository);
                }
                Err(e) => return Err(e),
            }
        }
        Err(not_found(dep, candidates))
    }

    /// Whether the root's POM can be fetched from any repository.
    ///
    /// Missing or unreachable artifacts read as `false`; a POM that exists
    /// but cannot be loaded is still an error.
    pub fn exists(&self) -> MarlinResult<bool> {
        match self.get_maven_pom() {
            Ok(_) => Ok(true),
            Err(MarlinError::ArtifactNotFound { .. } | MarlinError::ArtifactRetrieval { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Candidate locations of the root's artifact file, one per repository.
    pub fn artifact_locations(&self) -> MarlinResult<Vec<RepositoryArtifact>> {
        let dep = self.resolved_root();
        let snapshot = self.snapshot_file_version(&dep)?;
        Ok(repository::file_artifacts(
            &self.repositories,
            &dep,
            snapshot.as_deref(),
        ))
    }

    /// The root's own declarations for `scopes`, overrides applied.
    pub fn get_direct_dependencies(&self, scopes: &[Scope]) -> MarlinResult<Vec<Dependency>> {
        let pom = self.get_maven_pom()?;
        Ok(pom
            .dependencies_for(scopes)
            .iter()
            .map(|declared| self.overrides.override_dependency(&declared.to_dependency()))
            .collect())
    }

    /// The transitive closure of the root over `scopes`.
    ///
    /// Declarations of the current node are queued FIFO; the first queued
    /// entry with an unseen identity becomes the next node to expand. A
    /// candidate is dropped when an exclusion on any node from the current
    /// one up to the root matches it.
    pub fn get_all_dependencies(&self, scopes: &[Scope]) -> MarlinResult<Resolution> {
        let root = self.resolved_root();
        let mut result = DependencySet::new();
        result.add(root.clone());
        let mut parents: HashMap<DependencyKey, DependencyKey> = HashMap::new();
        let mut queued: HashSet<DependencyKey> = HashSet::new();
        let mut queue: VecDeque<(Dependency, DependencyKey)> = VecDeque::new();

        let mut parent = Some(root.clone());
        let mut pending = self.get_direct_dependencies(scopes)?;

        while let Some(current) = parent.take() {
            let exclusions = active_exclusions(&current, &root, &result, &parents);
            for dep in pending.drain(..) {
                if queued.contains(&dep.key()) {
                    continue;
                }
                let excluded_by = exclusions
                    .iter()
                    .find(|e| e.matches(&dep.group_id, &dep.artifact_id));
                if let Some(exclusion) = excluded_by {
                    tracing::trace!("{dep} excluded by {exclusion} under {current}");
                    continue;
                }
                queued.insert(dep.key());
                queue.push_back((dep, current.key()));
            }

            while let Some((dep, from)) = queue.pop_front() {
                if result.contains(&dep) {
                    continue;
                }
                let child = self.for_dependency(dep);
                let resolved = child.resolved_root();
                tracing::trace!("{resolved} via {from}");
                pending = child.get_direct_dependencies(scopes)?;
                parents.insert(resolved.key(), from);
                result.add(resolved.clone());
                parent = Some(resolved);
                break;
            }
        }

        tracing::debug!("{} resolves to {} dependencies", root, result.len());
        Ok(Resolution {
            root,
            dependencies: result,
            parents,
        })
    }
}

/// Exclusions declared on `node` and every ancestor up to the root.
fn active_exclusions(
    node: &Dependency,
    root: &Dependency,
    result: &DependencySet,
    parents: &HashMap<DependencyKey, DependencyKey>,
) -> BTreeSet<Exclusion> {
    let mut exclusions: BTreeSet<Exclusion> = root.exclusions.clone();
    exclusions.extend(node.exclusions.iter().cloned());
    let mut key = node.key();
    while let Some(parent) = parents.get(&key) {
        if let Some(ancestor) = result.get_key(parent) {
            exclusions.extend(ancestor.exclusions.iter().cloned());
        }
        key = parent.clone();
    }
    exclusions
}

fn merge_metadata(mut acc: MavenMetadata, other: MavenMetadata) -> MavenMetadata {
    for version in other.versions {
        if !acc.versions.iter().any(|v| v.to_string() == version.to_string()) {
            acc.versions.push(version);
        }
    }
    version::sort_versions(&mut acc.versions);
    if other.latest > acc.latest {
        acc.latest = other.latest;
    }
    if other.release > acc.release {
        acc.release = other.release;
    }
    acc
}

fn not_found(dep: &Dependency, candidates: &[RepositoryArtifact]) -> MarlinError {
    MarlinError::ArtifactNotFound {
        artifact: dep.to_string(),
        tried: candidates
            .iter()
            .map(RepositoryArtifact::url)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
