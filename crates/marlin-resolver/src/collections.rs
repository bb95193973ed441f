//! Deduplicated dependency sets and per-scope transitive closures.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use marlin_core::dependency::{Dependency, DependencyKey, Scope};
use marlin_core::version::Version;
use marlin_util::errors::MarlinResult;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::resolver::DependencyResolver;

/// One dependency per identity, always the highest version seen.
///
/// Iteration follows insertion order; a replaced entry keeps its slot.
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
    entries: Vec<Dependency>,
    index: HashMap<DependencyKey, usize>,
    locals: BTreeSet<PathBuf>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `dep`, or replace the entry with the same identity when `dep`'s
    /// version is strictly greater. Returns whether the set changed.
    pub fn add(&mut self, dep: Dependency) -> bool {
        let key = dep.key();
        match self.index.get(&key) {
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(dep);
                true
            }
            Some(&slot) if dep.version > self.entries[slot].version => {
                tracing::trace!("{key}: {} replaces {}", dep.version, self.entries[slot].version);
                self.entries[slot] = dep;
                true
            }
            Some(_) => false,
        }
    }

    /// Track a filesystem-pointing dependency that bypasses resolution.
    pub fn add_local(&mut self, path: impl Into<PathBuf>) -> bool {
        self.locals.insert(path.into())
    }

    pub fn locals(&self) -> impl Iterator<Item = &Path> {
        self.locals.iter().map(PathBuf::as_path)
    }

    pub fn get(&self, dep: &Dependency) -> Option<&Dependency> {
        self.get_key(&dep.key())
    }

    pub fn get_key(&self, key: &DependencyKey) -> Option<&Dependency> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, dep: &Dependency) -> bool {
        self.index.contains_key(&dep.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.entries.iter()
    }

    /// Add every entry and local of `other`, with the usual version rule.
    pub fn union(&mut self, other: &DependencySet) {
        for dep in other {
            self.add(dep.clone());
        }
        self.locals.extend(other.locals.iter().cloned());
    }

    /// Drop every identity present in `other`.
    pub fn remove_all(&mut self, other: &DependencySet) {
        self.entries.retain(|dep| !other.contains(dep));
        self.locals.retain(|path| !other.locals.contains(path));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, dep)| (dep.key(), slot))
            .collect();
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Extend<Dependency> for DependencySet {
    fn extend<T: IntoIterator<Item = Dependency>>(&mut self, iter: T) {
        for dep in iter {
            self.add(dep);
        }
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<T: IntoIterator<Item = Dependency>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// How a target scope is computed from the declared scopes.
#[derive(Debug, Clone, Copy)]
pub struct ScopeRule {
    /// Declared scopes whose dependencies are resolved.
    pub consulted: &'static [Scope],
    /// Scopes followed while walking each dependency's transitive closure.
    pub transitive: &'static [Scope],
    /// A target scope whose resolution is subtracted from the result.
    pub excludes: Option<Scope>,
}

impl ScopeRule {
    pub fn for_scope(scope: Scope) -> Self {
        const COMPILE_RUNTIME: &[Scope] = &[Scope::Compile, Scope::Runtime];
        match scope {
            Scope::Compile => Self {
                consulted: &[Scope::Provided, Scope::Compile],
                transitive: &[Scope::Compile],
                excludes: None,
            },
            Scope::Runtime => Self {
                consulted: &[Scope::Provided, Scope::Compile, Scope::Runtime],
                transitive: COMPILE_RUNTIME,
                excludes: Some(Scope::Compile),
            },
            Scope::Standalone => Self {
                consulted: &[Scope::Standalone],
                transitive: COMPILE_RUNTIME,
                excludes: None,
            },
            Scope::Test => Self {
                consulted: &[Scope::Test],
                transitive: COMPILE_RUNTIME,
                excludes: None,
            },
            Scope::Provided => Self {
                consulted: &[Scope::Provided],
                transitive: COMPILE_RUNTIME,
                excludes: None,
            },
        }
    }
}

/// The transitive closure of one target scope.
#[derive(Debug, Default)]
pub struct ScopeResolution {
    pub dependencies: DependencySet,
    pub conflicts: ConflictReport,
}

/// Declared dependencies grouped by scope.
#[derive(Debug, Clone, Default)]
pub struct DependencyScopes {
    declared: BTreeMap<Scope, DependencySet>,
}

impl DependencyScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: Scope, dep: Dependency) -> bool {
        self.declared.entry(scope).or_default().add(dep)
    }

    pub fn add_local(&mut self, scope: Scope, path: impl Into<PathBuf>) -> bool {
        self.declared.entry(scope).or_default().add_local(path)
    }

    /// Dependencies declared directly in `scope`.
    pub fn get(&self, scope: Scope) -> Option<&DependencySet> {
        self.declared.get(&scope)
    }

    /// Resolve the transitive closure of `scope`.
    ///
    /// Every consulted declaration is resolved on its own through a resolver
    /// built by `resolver_for`, and the closures are unioned so the highest
    /// version of each identity wins.
    pub fn resolve<F>(&self, scope: Scope, resolver_for: F) -> MarlinResult<ScopeResolution>
    where
        F: Fn(Dependency) -> DependencyResolver,
    {
        self.resolve_with(scope, &resolver_for)
    }

    fn resolve_with(
        &self,
        scope: Scope,
        resolver_for: &dyn Fn(Dependency) -> DependencyResolver,
    ) -> MarlinResult<ScopeResolution> {
        let rule = ScopeRule::for_scope(scope);
        let mut requests: BTreeMap<DependencyKey, BTreeSet<String>> = BTreeMap::new();
        let mut dependencies = DependencySet::new();

        for consulted in rule.consulted {
            let Some(declared) = self.declared.get(consulted) else {
                continue;
            };
            for dep in declared {
                tracing::debug!("Resolving {dep} for {scope}");
                let resolution = resolver_for(dep.clone()).get_all_dependencies(rule.transitive)?;
                for resolved in &resolution.dependencies {
                    requests
                        .entry(resolved.key())
                        .or_default()
                        .insert(resolved.version.to_string());
                }
                dependencies.union(&resolution.dependencies);
            }
            for path in declared.locals() {
                dependencies.add_local(path);
            }
        }

        if let Some(excluded) = rule.excludes {
            let subtracted = self.resolve_with(excluded, resolver_for)?;
            dependencies.remove_all(&subtracted.dependencies);
        }

        let mut conflicts = ConflictReport::new();
        for (key, versions) in requests {
            let Some(winner) = dependencies.get_key(&key) else {
                continue;
            };
            for requested in versions {
                let requested = Version::parse(&requested);
                if requested != winner.version {
                    conflicts.add(VersionConflict {
                        key: key.clone(),
                        requested,
                        resolved: winner.version.clone(),
                    });
                }
            }
        }
        if !conflicts.is_empty() {
            tracing::debug!("{conflicts}");
        }

        Ok(ScopeResolution {
            dependencies,
            conflicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(s: &str) -> Dependency {
        Dependency::parse(s).unwrap()
    }

    fn versions(set: &DependencySet) -> Vec<String> {
        set.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn add_keeps_the_highest_version() {
        let mut set = DependencySet::new();
        assert!(set.add(dep("a:x:1.0")));
        assert!(set.add(dep("a:y:1.0")));
        assert!(set.add(dep("a:x:2.0")));
        assert!(!set.add(dep("a:x:1.5")));
        assert!(!set.add(dep("a:x:2.0")));
        assert_eq!(versions(&set), ["a:x:2.0", "a:y:1.0"]);
    }

    #[test]
    fn size_is_bounded_by_identities() {
        let set: DependencySet = ["a:x:1", "a:x:3", "a:x:2", "a:x:1:sources", "a:x:1@pom"]
            .into_iter()
            .map(dep)
            .collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(&dep("a:x")).unwrap().version.to_string(), "3");
    }

    #[test]
    fn remove_all_reindexes() {
        let mut set: DependencySet = ["a:x:1", "a:y:1", "a:z:1"].into_iter().map(dep).collect();
        let other: DependencySet = ["a:y:9"].into_iter().map(dep).collect();
        set.remove_all(&other);
        assert_eq!(versions(&set), ["a:x:1", "a:z:1"]);
        assert!(set.contains(&dep("a:z")));
        assert!(!set.contains(&dep("a:y")));
        assert!(set.add(dep("a:z:2")));
        assert_eq!(versions(&set), ["a:x:1", "a:z:2"]);
    }

    #[test]
    fn union_merges_locals() {
        let mut a = DependencySet::new();
        a.add_local("/libs/one.jar");
        let mut b = DependencySet::new();
        b.add_local("/libs/two.jar");
        b.add(dep("a:x:1"));
        a.union(&b);
        assert_eq!(a.locals().count(), 2);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn scope_rules() {
        let runtime = ScopeRule::for_scope(Scope::Runtime);
        assert_eq!(runtime.consulted, [Scope::Provided, Scope::Compile, Scope::Runtime]);
        assert_eq!(runtime.excludes, Some(Scope::Compile));
        assert_eq!(ScopeRule::for_scope(Scope::Compile).transitive, [Scope::Compile]);
        assert_eq!(ScopeRule::for_scope(Scope::Test).consulted, [Scope::Test]);
    }
}
